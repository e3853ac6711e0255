//! Pose-aware animated face stickers.
//!
//! A detection producer publishes faces into a [`LandmarkStore`]. Each render
//! tick the [`FrameCompositor`] snapshots the store, normalizes every face
//! into the extended point array, places each sticker with its
//! [`PlacementStrategy`], advances the sticker's [`StickerInstance`] clock and
//! draws through a [`RenderBackend`].

pub mod animation;
pub mod assets;
pub mod compositor;
pub mod detection;
pub mod error;
pub mod face;
pub mod landmarks;
pub mod placement;
pub mod pose;
pub mod regions;
pub mod sticker;
pub mod store;

pub use animation::{AnimationState, FrameResolver, StickerInstance, TextureHandle};
pub use assets::{FsStickerPack, StaticStickerPack, StickerAssetProvider};
pub use compositor::{CapturedFrame, CompositorConfig, FrameCompositor, FrameReport, RenderBackend};
pub use detection::{publish_detection, DetectionError, LandmarkSpace, RawFace};
pub use error::{Result, StickerError};
pub use face::{Expression, Face, Orientation};
pub use placement::{AnchorQuad, Placement, PlacementStrategy, StickerPlacement, StickerQuad, Viewport};
pub use pose::{normalize_face, NormalizedFace, PoseAngles, PoseConfig};
pub use sticker::{PlacementKind, StickerDefinition, StickerManifest};
pub use store::{DetectionFrame, LandmarkStore, StoreSnapshot};
