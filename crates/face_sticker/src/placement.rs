//! Sticker placement: quad geometry and model-view-projection per face.
//!
//! World space is set up so that the z = 0 plane shows the input image:
//! a symmetric frustum (`±ratio × ±1` at near = 3) viewed from z = 6 spans
//! `±PROJECTION_SCALE * ratio` by `±PROJECTION_SCALE` at z = 0. Landmark
//! pixels are therefore converted to world units by dividing by the image
//! height and multiplying by [`PROJECTION_SCALE`].

use glam::{Mat4, Vec2, Vec3};

use crate::pose::NormalizedFace;
use crate::sticker::{PlacementKind, StickerDefinition};

/// Half-extent of the visible z = 0 plane, in world units per image height.
pub const PROJECTION_SCALE: f32 = 2.0;

const NEAR: f32 = 3.0;
const FAR: f32 = 9.0;
const EYE_DISTANCE: f32 = 6.0;

/// Fixed projection and view for one input image size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub ratio: f32,
    pub projection: Mat4,
    pub view: Mat4,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        let ratio = if height == 0 { 1.0 } else { width as f32 / height as f32 };
        // Symmetric frustum with top = 1 at the near plane.
        let fov_y = 2.0 * (1.0 / NEAR).atan();
        let projection = Mat4::perspective_rh_gl(fov_y, ratio, NEAR, FAR);
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, EYE_DISTANCE), Vec3::ZERO, Vec3::Y);
        Self {
            width,
            height,
            ratio,
            projection,
            view,
        }
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// Image pixel (bottom-left origin) of a point in normalized coordinates.
    pub fn to_pixels(&self, point: Vec2) -> Vec2 {
        (point * 0.5 + Vec2::splat(0.5)) * Vec2::new(self.width as f32, self.height as f32)
    }

    fn pixel_scale(&self) -> f32 {
        if self.height == 0 {
            0.0
        } else {
            PROJECTION_SCALE / self.height as f32
        }
    }

    /// World position at z = 0 of an image pixel.
    pub fn pixels_to_world(&self, pixels: Vec2) -> Vec2 {
        let scaled = pixels * self.pixel_scale();
        Vec2::new(
            (scaled.x - self.ratio) * PROJECTION_SCALE,
            (scaled.y - 1.0) * PROJECTION_SCALE,
        )
    }
}

/// Texture coordinates of a sticker quad, mirrored horizontally.
pub const STICKER_TEXTURE_COORDINATES: [Vec2; 4] = [
    Vec2::new(1.0, 0.0),
    Vec2::new(0.0, 0.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(0.0, 1.0),
];

/// A quad as a four-vertex triangle strip: bottom-left, bottom-right,
/// top-left, top-right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StickerQuad {
    pub positions: [Vec2; 4],
    pub texture_coordinates: [Vec2; 4],
}

impl StickerQuad {
    pub fn centered(pivot: Vec2, half_extent: Vec2) -> Self {
        Self {
            positions: [
                pivot - half_extent,
                Vec2::new(pivot.x + half_extent.x, pivot.y - half_extent.y),
                Vec2::new(pivot.x - half_extent.x, pivot.y + half_extent.y),
                pivot + half_extent,
            ],
            texture_coordinates: STICKER_TEXTURE_COORDINATES,
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.positions[0] + self.positions[3]) * 0.5
    }

    pub fn size(&self) -> Vec2 {
        self.positions[3] - self.positions[0]
    }
}

/// Placement of one sticker on one face for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub quad: StickerQuad,
    /// Sticker width in image pixels.
    pub pixel_width: f32,
    /// Rotation pivot in world units.
    pub center: Vec2,
    pub model: Mat4,
    pub mvp: Mat4,
}

impl Placement {
    fn degenerate(viewport: &Viewport, pivot: Vec2) -> Self {
        Self {
            quad: StickerQuad::centered(pivot, Vec2::ZERO),
            pixel_width: 0.0,
            center: pivot,
            model: Mat4::IDENTITY,
            mvp: viewport.view_projection(),
        }
    }
}

pub trait StickerPlacement {
    /// Place `definition` on `face`.
    ///
    /// `None` means nothing should be drawn for this face this frame.
    fn compute_transform(
        &self,
        face: &NormalizedFace,
        definition: &StickerDefinition,
        viewport: &Viewport,
    ) -> Option<Placement>;
}

/// Quad anchored to the mean of landmark points, scaled by a reference
/// segment and rotated with the head about the anchor.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnchorQuad;

impl StickerPlacement for AnchorQuad {
    fn compute_transform(
        &self,
        face: &NormalizedFace,
        definition: &StickerDefinition,
        viewport: &Viewport,
    ) -> Option<Placement> {
        let start = face.point(definition.start_index);
        let end = face.point(definition.end_index);
        let centers: Option<Vec<Vec2>> = definition.center_index_list.iter()
            .map(|&i| face.point(i))
            .collect();

        let (Some(start), Some(end), Some(centers)) = (start, end, centers) else {
            return Some(Placement::degenerate(viewport, Vec2::ZERO));
        };
        if centers.is_empty() {
            return Some(Placement::degenerate(viewport, Vec2::ZERO));
        }

        // 1. Width from the reference segment, height from the texture aspect.
        let pixel_width = viewport.to_pixels(start).distance(viewport.to_pixels(end)) * definition.base_scale;
        let pixel_height = pixel_width * definition.aspect_ratio();

        // 2. Anchor: mean of the center points, moved into world space.
        let anchor_pixels = centers.iter()
            .map(|&p| viewport.to_pixels(p))
            .sum::<Vec2>() / centers.len() as f32;
        let center = viewport.pixels_to_world(anchor_pixels);

        // 3. Offset as a fraction of the sticker's own size.
        let scale = viewport.pixel_scale();
        let half_width = pixel_width * scale;
        let half_height = half_width * definition.aspect_ratio();
        let offset = Vec2::new(
            pixel_width * definition.offset_x * scale,
            pixel_height * definition.offset_y * scale,
        ) * PROJECTION_SCALE;
        let pivot = center + offset;

        // 4. Quad around the pivot.
        let quad = StickerQuad::centered(pivot, Vec2::new(half_width, half_height));

        // 5. Rotate about the anchor, roll first.
        let pose = face.pose;
        let model = Mat4::from_translation(center.extend(0.0))
            * Mat4::from_rotation_z(pose.roll.to_radians())
            * Mat4::from_rotation_y(pose.yaw.to_radians())
            * Mat4::from_rotation_x(pose.pitch.to_radians())
            * Mat4::from_translation(-center.extend(0.0));

        // 6. Projection * view * model.
        let mvp = viewport.view_projection() * model;

        Some(Placement {
            quad,
            pixel_width,
            center,
            model,
            mvp,
        })
    }
}

/// Closed set of placement strategies, selected by [`PlacementKind`].
#[derive(Debug, Clone, Copy)]
pub enum PlacementStrategy {
    AnchorQuad(AnchorQuad),
}

impl PlacementStrategy {
    pub fn for_kind(kind: PlacementKind) -> Self {
        match kind {
            PlacementKind::Sticker => PlacementStrategy::AnchorQuad(AnchorQuad),
        }
    }
}

impl StickerPlacement for PlacementStrategy {
    fn compute_transform(
        &self,
        face: &NormalizedFace,
        definition: &StickerDefinition,
        viewport: &Viewport,
    ) -> Option<Placement> {
        match self {
            PlacementStrategy::AnchorQuad(strategy) => strategy.compute_transform(face, definition, viewport),
        }
    }
}
