//! Per-frame orchestration: camera image, sticker quads, debug points and
//! capture, in that order.

use std::sync::Arc;
use std::time::Instant;

use glam::{Mat4, Vec2};
use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::animation::{FrameResolver, StickerInstance, TextureHandle};
use crate::assets::StickerAssetProvider;
use crate::landmarks::IMAGE_EDGE;
use crate::placement::{PlacementStrategy, StickerPlacement, StickerQuad, Viewport};
use crate::pose::{normalize_face, NormalizedFace, PoseConfig};
use crate::sticker::StickerDefinition;
use crate::store::LandmarkStore;

/// The drawing surface the compositor renders into.
pub trait RenderBackend {
    fn begin_frame(&mut self, viewport: &Viewport);

    /// Draw the camera image full screen, or clear when there is none.
    fn draw_camera(&mut self, frame: Option<&RgbaImage>);

    /// Upload `image`, overwriting `reuse` when given.
    fn upload_texture(&mut self, image: &RgbaImage, reuse: Option<TextureHandle>) -> TextureHandle;

    fn draw_sticker(&mut self, quad: &StickerQuad, mvp: &Mat4, texture: TextureHandle);

    /// Draw points given in normalized device coordinates.
    fn draw_points(&mut self, points: &[Vec2], size: f32, color: [u8; 4]);

    /// Read back the composited frame.
    fn capture(&mut self) -> Option<RgbaImage>;

    fn release_texture(&mut self, handle: TextureHandle);
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositorConfig {
    pub debug_points: bool,
    /// Pixels.
    pub point_size: f32,
    pub point_color: [u8; 4],
    /// Read back each composited frame for the detector.
    pub capture: bool,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            debug_points: false,
            point_size: 4.0,
            point_color: [0, 255, 0, 255],
            capture: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// Store sequence the frame was rendered from.
    pub sequence: u64,
    pub image: RgbaImage,
}

#[derive(Debug)]
pub struct FrameReport {
    pub sequence: u64,
    /// Whether the store changed since the previous frame.
    pub fresh: bool,
    pub faces: usize,
    pub stickers_drawn: usize,
    pub captured: Option<CapturedFrame>,
}

struct StickerLayer {
    definition: StickerDefinition,
    strategy: PlacementStrategy,
    /// One per face slot, up to the definition's `max_count`.
    instances: Vec<StickerInstance>,
}

fn build_layers(assets: &dyn StickerAssetProvider, max_faces: usize) -> Vec<StickerLayer> {
    assets.definitions().iter()
        .map(|definition| StickerLayer {
            definition: definition.clone(),
            strategy: PlacementStrategy::for_kind(definition.kind),
            instances: vec![StickerInstance::new(); definition.max_count.min(max_faces)],
        })
        .collect()
}

/// Frame lookups backed by the asset provider and the backend's textures.
struct AssetResolver<'a, B: RenderBackend + ?Sized> {
    assets: &'a mut dyn StickerAssetProvider,
    backend: &'a mut B,
}

impl<B: RenderBackend + ?Sized> FrameResolver for AssetResolver<'_, B> {
    fn resolve_frame(
        &mut self,
        definition: &StickerDefinition,
        index: u32,
        reuse: Option<TextureHandle>,
    ) -> Option<TextureHandle> {
        let image = self.assets.load_frame(&definition.name, index)?;
        Some(self.backend.upload_texture(&image, reuse))
    }
}

pub struct FrameCompositor {
    store: Arc<LandmarkStore>,
    assets: Box<dyn StickerAssetProvider>,
    layers: Vec<StickerLayer>,
    viewport: Viewport,
    pose: PoseConfig,
    config: CompositorConfig,
    last_sequence: Option<u64>,
}

impl FrameCompositor {
    pub fn new(
        store: Arc<LandmarkStore>,
        assets: Box<dyn StickerAssetProvider>,
        viewport: Viewport,
        pose: PoseConfig,
        config: CompositorConfig,
    ) -> Self {
        let layers = build_layers(assets.as_ref(), store.max_faces());
        tracing::debug!(stickers = layers.len(), "compositor ready");
        Self {
            store,
            assets,
            layers,
            viewport,
            pose,
            config,
            last_sequence: None,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    pub fn definitions(&self) -> impl Iterator<Item = &StickerDefinition> {
        self.layers.iter().map(|layer| &layer.definition)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) != (self.viewport.width, self.viewport.height) {
            tracing::debug!(width, height, "resizing viewport");
            self.viewport = Viewport::new(width, height);
        }
    }

    /// Free every texture held by sticker instances.
    pub fn release<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        for layer in self.layers.iter_mut() {
            for instance in layer.instances.iter_mut() {
                for handle in instance.release() {
                    backend.release_texture(handle);
                }
            }
        }
    }

    /// Swap the sticker pack, releasing the old pack's textures.
    pub fn set_pack<B: RenderBackend + ?Sized>(&mut self, assets: Box<dyn StickerAssetProvider>, backend: &mut B) {
        self.release(backend);
        self.layers = build_layers(assets.as_ref(), self.store.max_faces());
        self.assets = assets;
        tracing::info!(stickers = self.layers.len(), "sticker pack changed");
    }

    fn normalized_faces(&self) -> (u64, Vec<Option<NormalizedFace>>) {
        let snapshot = self.store.snapshot();
        let faces = (0..self.store.max_faces())
            .map(|slot| snapshot.face(slot)
                .and_then(|face| normalize_face(face, snapshot.orientation, snapshot.need_flip, &self.pose)))
            .collect();
        (snapshot.sequence, faces)
    }

    /// Render one frame from whatever the store currently holds.
    pub fn render_frame<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        camera: Option<&RgbaImage>,
        now: Instant,
    ) -> FrameReport {
        let (sequence, faces) = self.normalized_faces();
        let fresh = self.last_sequence != Some(sequence);
        self.last_sequence = Some(sequence);

        backend.begin_frame(&self.viewport);
        backend.draw_camera(camera);

        let mut stickers_drawn = 0;
        for (slot, face) in faces.iter().enumerate() {
            for layer in self.layers.iter_mut() {
                let Some(instance) = layer.instances.get_mut(slot) else {
                    continue;
                };

                let Some(face) = face else {
                    let mut resolver = AssetResolver { assets: self.assets.as_mut(), backend: &mut *backend };
                    instance.tick(false, now, &layer.definition, &mut resolver);
                    continue;
                };

                let texture = {
                    let mut resolver = AssetResolver { assets: self.assets.as_mut(), backend: &mut *backend };
                    instance.tick(true, now, &layer.definition, &mut resolver)
                };
                let Some(texture) = texture else {
                    continue;
                };
                let Some(placement) = layer.strategy.compute_transform(face, &layer.definition, &self.viewport) else {
                    continue;
                };

                backend.draw_sticker(&placement.quad, &placement.mvp, texture);
                stickers_drawn += 1;
            }
        }

        if self.config.debug_points {
            for face in faces.iter().flatten() {
                backend.draw_points(&face.points[..IMAGE_EDGE], self.config.point_size, self.config.point_color);
            }
        }

        let captured = if self.config.capture {
            backend.capture().map(|image| CapturedFrame { sequence, image })
        } else {
            None
        };

        FrameReport {
            sequence,
            fresh,
            faces: faces.iter().flatten().count(),
            stickers_drawn,
            captured,
        }
    }
}
