//! Head pose normalization and the extended face point array.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::face::{Expression, Face, Orientation};
use crate::landmarks::*;

/// Tuning for pose normalization.
///
/// The detector under-reports pitch and yaw, hence the gains. The roll bias
/// turns the sticker texture upright; it was tuned against real footage and
/// is not derived from the geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseConfig {
    pub pitch_gain: f32,
    pub yaw_gain: f32,
    /// Degrees.
    pub max_pitch: f32,
    /// Degrees.
    pub max_yaw: f32,
    /// Degrees.
    pub roll_bias: f32,
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            pitch_gain: 1.5,
            yaw_gain: 1.5,
            max_pitch: 30.0,
            max_yaw: 50.0,
            roll_bias: 180.0,
        }
    }
}

/// Pose angles in degrees, ready for the sticker model matrix.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PoseAngles {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

/// Limit `angle` to `[-limit, limit]`, keeping its sign.
pub fn clamp_angle(angle: f32, limit: f32) -> f32 {
    if angle.abs() > limit {
        limit.copysign(angle)
    } else {
        angle
    }
}

impl PoseConfig {
    pub fn clamp_yaw(&self, yaw: f32) -> f32 {
        clamp_angle(yaw, self.max_yaw)
    }

    pub fn clamp_pitch(&self, pitch: f32) -> f32 {
        clamp_angle(pitch, self.max_pitch)
    }

    /// Roll is passed through unclamped.
    pub fn angles(&self, face: &Face) -> PoseAngles {
        let pitch = -face.pitch.to_degrees() * self.pitch_gain;
        let yaw = face.yaw.to_degrees() * self.yaw_gain;
        PoseAngles {
            pitch: self.clamp_pitch(pitch),
            yaw: self.clamp_yaw(yaw),
            roll: face.roll.to_degrees() + self.roll_bias,
        }
    }
}

/// A face after normalization: extended points plus clamped pose.
#[derive(Debug, Clone)]
pub struct NormalizedFace {
    pub points: Vec<Vec2>,
    pub pose: PoseAngles,
    pub expression: Expression,
}

impl NormalizedFace {
    pub fn point(&self, index: usize) -> Option<Vec2> {
        self.points.get(index).copied()
    }
}

/// Normalize `face`, or `None` for the empty placeholder face.
pub fn normalize_face(
    face: &Face,
    orientation: Orientation,
    need_flip: bool,
    config: &PoseConfig,
) -> Option<NormalizedFace> {
    if face.is_empty() {
        return None;
    }

    Some(NormalizedFace {
        points: extended_points(face, orientation, need_flip),
        pose: config.angles(face),
        expression: face.expression,
    })
}

fn midpoint(points: &[Vec2], a: usize, b: usize) -> Vec2 {
    (points[a] + points[b]) * 0.5
}

/// Fill the synthesized anchors at [`MOUTH_CENTER`]..=[`RIGHT_CHEEK_CENTER`].
///
/// The head center is extrapolated as `2 * eye_center - nose_lower_middle`.
/// That is an approximation of the forehead and the left/right head points
/// derived from it inherit its error.
pub fn synthesize_anchors(points: &mut [Vec2]) {
    debug_assert!(points.len() >= IMAGE_EDGE);

    points[MOUTH_CENTER] = midpoint(points, MOUTH_UPPER_LIP_BOTTOM, MOUTH_LOWER_LIP_TOP);
    points[LEFT_EYEBROW_CENTER] = midpoint(points, LEFT_EYEBROW_UPPER_MIDDLE, LEFT_EYEBROW_LOWER_MIDDLE);
    points[RIGHT_EYEBROW_CENTER] = midpoint(points, RIGHT_EYEBROW_UPPER_MIDDLE, RIGHT_EYEBROW_LOWER_MIDDLE);
    points[HEAD_CENTER] = points[EYE_CENTER] * 2.0 - points[NOSE_LOWER_MIDDLE];
    points[LEFT_HEAD] = midpoint(points, LEFT_EYEBROW_LEFT_TOP_CORNER, HEAD_CENTER);
    points[RIGHT_HEAD] = midpoint(points, RIGHT_EYEBROW_RIGHT_TOP_CORNER, HEAD_CENTER);
    points[LEFT_CHEEK_CENTER] = midpoint(points, LEFT_CHEEK_EDGE_CENTER, NOSE_LEFT);
    points[RIGHT_CHEEK_CENTER] = midpoint(points, RIGHT_CHEEK_EDGE_CENTER, NOSE_RIGHT);
}

/// The eight points describing the visible frame boundary.
pub fn image_edge_points(orientation: Orientation, need_flip: bool) -> [Vec2; 8] {
    let quarter = match orientation {
        Orientation::Portrait =>
            [Vec2::new(0.0, 1.0), Vec2::new(1.0, 1.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, -1.0)],
        Orientation::LandscapeLeft =>
            [Vec2::new(1.0, 0.0), Vec2::new(1.0, -1.0), Vec2::new(0.0, -1.0), Vec2::new(-1.0, -1.0)],
        Orientation::LandscapeRight =>
            [Vec2::new(-1.0, 0.0), Vec2::new(-1.0, 1.0), Vec2::new(0.0, 1.0), Vec2::new(1.0, 1.0)],
        Orientation::PortraitInverted =>
            [Vec2::new(0.0, -1.0), Vec2::new(-1.0, -1.0), Vec2::new(-1.0, 0.0), Vec2::new(-1.0, 1.0)],
    };

    let mut edges = [Vec2::ZERO; 8];
    for (i, point) in quarter.into_iter().enumerate() {
        edges[i] = point;
        edges[i + 4] = -point;
    }

    // Front camera landmarks are mirrored, so the frame edges are too.
    if need_flip {
        for point in edges.iter_mut() {
            *point = -*point;
        }
    }
    edges
}

/// Build the [`EXTENDED_POINTS`] array for `face`.
pub fn extended_points(face: &Face, orientation: Orientation, need_flip: bool) -> Vec<Vec2> {
    let mut points = vec![Vec2::ZERO; EXTENDED_POINTS];
    let count = face.landmarks.len().min(DETECTED_POINTS);
    points[..count].copy_from_slice(&face.landmarks[..count]);

    synthesize_anchors(&mut points);
    points[IMAGE_EDGE..].copy_from_slice(&image_edge_points(orientation, need_flip));
    points
}

/// Texture coordinates matching a vertex array in normalized device space.
pub fn texture_points(vertices: &[Vec2]) -> Vec<Vec2> {
    vertices.iter().map(|v| *v * 0.5 + Vec2::splat(0.5)).collect()
}
