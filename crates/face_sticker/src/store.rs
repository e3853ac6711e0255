//! Latest-value hand-off between the detection producer and the renderer.
//!
//! The producer overwrites whatever is stored; the renderer reads whatever
//! is there. Neither side waits for the other. Faces are held behind `Arc`
//! and replaced wholesale, so a reader never sees a landmark array that a
//! writer is halfway through.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::face::{Face, Orientation};

/// A complete detection result for one camera frame.
#[derive(Debug, Clone, Default)]
pub struct DetectionFrame {
    pub orientation: Orientation,
    pub need_flip: bool,
    pub faces: Vec<Face>,
}

/// Everything the renderer needs from the store for one frame.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub faces: BTreeMap<usize, Arc<Face>>,
    pub orientation: Orientation,
    pub need_flip: bool,
    pub sequence: u64,
}

impl StoreSnapshot {
    /// The face in `slot`, if one was detected and it carries landmarks.
    pub fn face(&self, slot: usize) -> Option<&Face> {
        self.faces.get(&slot)
            .map(|face| face.as_ref())
            .filter(|face| !face.is_empty())
    }

    pub fn has_face(&self) -> bool {
        !self.faces.is_empty()
    }
}

#[derive(Debug, Default)]
struct StoreState {
    faces: BTreeMap<usize, Arc<Face>>,
    orientation: Orientation,
    need_flip: bool,
    sequence: u64,
}

impl StoreState {
    fn truncate(&mut self, count: usize) {
        self.faces.retain(|&index, _| index < count);
    }

    fn bump(&mut self) {
        self.sequence = self.sequence.wrapping_add(1);
    }
}

#[derive(Debug)]
pub struct LandmarkStore {
    max_faces: usize,
    state: Mutex<StoreState>,
}

impl LandmarkStore {
    pub fn new(max_faces: usize) -> Self {
        Self {
            max_faces,
            state: Mutex::new(StoreState::default()),
        }
    }

    pub fn max_faces(&self) -> usize {
        self.max_faces
    }

    /// Drop every slot at or beyond `count`.
    pub fn set_face_count(&self, count: usize) {
        let mut state = self.state.lock();
        state.truncate(count);
        state.bump();
    }

    /// Replace the face in `index`. Indices beyond the configured maximum
    /// are discarded.
    pub fn put_face(&self, index: usize, face: Face) {
        if index >= self.max_faces {
            tracing::warn!(index, max_faces = self.max_faces, "discarding face beyond maximum face count");
            return;
        }

        let face = Arc::new(face);
        let mut state = self.state.lock();
        state.faces.insert(index, face);
        state.bump();
    }

    /// The face in `index`, or an empty face when there is none.
    pub fn get_face(&self, index: usize) -> Arc<Face> {
        let face = self.state.lock().faces.get(&index).cloned();
        face.unwrap_or_default()
    }

    pub fn has_face(&self) -> bool {
        !self.state.lock().faces.is_empty()
    }

    pub fn face_count(&self) -> usize {
        self.state.lock().faces.len()
    }

    pub fn set_orientation(&self, orientation: Orientation) {
        let mut state = self.state.lock();
        state.orientation = orientation;
        state.bump();
    }

    pub fn orientation(&self) -> Orientation {
        self.state.lock().orientation
    }

    pub fn set_need_flip(&self, need_flip: bool) {
        let mut state = self.state.lock();
        state.need_flip = need_flip;
        state.bump();
    }

    pub fn need_flip(&self) -> bool {
        self.state.lock().need_flip
    }

    /// Empty the store, typically on camera teardown.
    pub fn clear_all(&self) {
        let mut state = self.state.lock();
        state.faces.clear();
        state.bump();
    }

    /// Counter bumped by every producer-side mutation.
    pub fn sequence(&self) -> u64 {
        self.state.lock().sequence
    }

    /// Install a whole detection frame under a single lock acquisition.
    pub fn publish(&self, frame: DetectionFrame) {
        let count = frame.faces.len().min(self.max_faces);
        if frame.faces.len() > self.max_faces {
            tracing::debug!(detected = frame.faces.len(), max_faces = self.max_faces, "dropping surplus faces");
        }

        let faces: Vec<Arc<Face>> = frame.faces.into_iter()
            .take(count)
            .map(Arc::new)
            .collect();

        let mut state = self.state.lock();
        state.orientation = frame.orientation;
        state.need_flip = frame.need_flip;
        state.truncate(count);
        for (index, face) in faces.into_iter().enumerate() {
            state.faces.insert(index, face);
        }
        state.bump();
    }

    /// Read every face and flag in one synchronized block.
    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.state.lock();
        StoreSnapshot {
            faces: state.faces.clone(),
            orientation: state.orientation,
            need_flip: state.need_flip,
            sequence: state.sequence,
        }
    }
}
