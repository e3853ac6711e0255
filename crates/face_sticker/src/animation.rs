//! Per-instance sticker animation clock.

use std::time::Instant;

use crate::sticker::StickerDefinition;

/// Opaque handle to a texture owned by a render backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Turns a frame index into a bound texture.
pub trait FrameResolver {
    /// Resolve frame `index` of `definition`, writing into `reuse` if the
    /// implementation can. `None` is a miss; the caller keeps what it had.
    fn resolve_frame(
        &mut self,
        definition: &StickerDefinition,
        index: u32,
        reuse: Option<TextureHandle>,
    ) -> Option<TextureHandle>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationState {
    /// No face, or not started yet.
    #[default]
    Idle,
    Playing { started: Instant },
    /// One-shot animation ran past its last frame.
    Finished,
}

/// Runtime state of one sticker on one face slot.
#[derive(Debug, Clone, Default)]
pub struct StickerInstance {
    state: AnimationState,
    /// Index of the frame currently bound, `None` when unresolved.
    frame_index: Option<u32>,
    texture: Option<TextureHandle>,
    /// Last successfully resolved texture.
    restore: Option<TextureHandle>,
}

impl StickerInstance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn frame_index(&self) -> Option<u32> {
        self.frame_index
    }

    pub fn texture(&self) -> Option<TextureHandle> {
        self.texture
    }

    pub fn restore_texture(&self) -> Option<TextureHandle> {
        self.restore
    }

    /// Advance the clock to `now` and return the texture to draw.
    ///
    /// `present` is whether the face this instance follows was detected
    /// this frame. An absent face resets the clock so the next appearance
    /// starts from frame 0.
    pub fn tick(
        &mut self,
        present: bool,
        now: Instant,
        definition: &StickerDefinition,
        resolver: &mut dyn FrameResolver,
    ) -> Option<TextureHandle> {
        if !present {
            self.state = AnimationState::Idle;
            return self.texture;
        }

        let started = match self.state {
            AnimationState::Finished => return self.texture,
            AnimationState::Idle => {
                self.state = AnimationState::Playing { started: now };
                now
            }
            AnimationState::Playing { started } => started,
        };

        let duration = u128::from(definition.duration.max(1));
        let elapsed = now.saturating_duration_since(started).as_millis();
        let mut index = u32::try_from(elapsed / duration).unwrap_or(u32::MAX);

        if index >= definition.frames {
            if !definition.looping {
                self.state = AnimationState::Finished;
                self.restore = self.texture.or(self.restore);
                self.texture = self.restore;
                self.frame_index = None;
                tracing::trace!(sticker = %definition.name, "animation finished");
                return self.texture;
            }
            index = 0;
            self.state = AnimationState::Playing { started: now };
        }

        if self.frame_index == Some(index) {
            return self.texture;
        }

        match resolver.resolve_frame(definition, index, self.texture.or(self.restore)) {
            Some(handle) => {
                self.texture = Some(handle);
                self.restore = Some(handle);
                self.frame_index = Some(index);
            }
            None => {
                tracing::debug!(sticker = %definition.name, index, "frame unavailable, keeping last texture");
                self.texture = self.restore;
                self.frame_index = None;
            }
        }
        self.texture
    }

    /// Drop all state and hand back the textures this instance owned.
    pub fn release(&mut self) -> Vec<TextureHandle> {
        let mut handles = Vec::with_capacity(2);
        handles.extend(self.texture.take());
        if let Some(restore) = self.restore.take() {
            if !handles.contains(&restore) {
                handles.push(restore);
            }
        }
        self.state = AnimationState::Idle;
        self.frame_index = None;
        handles
    }
}
