//! Vertex sets for face-region effects (makeup, eye brightening, teeth).
//!
//! The region extractors read detector landmarks only. An empty face
//! yields an empty set.

use glam::Vec2;

use crate::face::{Face, Orientation};
use crate::pose::{extended_points, texture_points};

/// Vertex and texture coordinates of all extended points, used by
/// whole-face reshaping effects.
#[derive(Debug, Clone)]
pub struct FaceAdjustPoints {
    pub vertices: Vec<Vec2>,
    pub texture: Vec<Vec2>,
}

pub fn face_adjust_points(face: &Face, orientation: Orientation, need_flip: bool) -> Option<FaceAdjustPoints> {
    if face.is_empty() {
        return None;
    }
    let vertices = extended_points(face, orientation, need_flip);
    let texture = texture_points(&vertices);
    Some(FaceAdjustPoints { vertices, texture })
}

fn collect(face: &Face, indices: impl IntoIterator<Item = usize>) -> Vec<Vec2> {
    if face.is_empty() {
        return Vec::new();
    }
    indices.into_iter().map(|i| face.landmark(i)).collect()
}

/// 40 points around both eyes and the brows, for eye shadow and liner.
pub fn eye_vertices(face: &Face) -> Vec<Vec2> {
    if face.is_empty() {
        return Vec::new();
    }

    let mut points = collect(face, (0..4).chain(29..34).chain(42..45).chain(52..74));
    points.extend(collect(face, [75, 76, 78, 79]));
    // Below the brows, halfway to the nose bridge.
    points.push((face.landmark(3) + face.landmark(44)) * 0.5);
    points.push((face.landmark(29) + face.landmark(44)) * 0.5);
    points
}

/// 20 lip contour points.
pub fn lips_vertices(face: &Face) -> Vec<Vec2> {
    collect(face, 84..104)
}

/// 16 points outlining both eyes and pupils.
pub fn bright_eye_vertices(face: &Face) -> Vec<Vec2> {
    collect(face, (52..64).chain([72, 73, 75, 76]))
}

/// 12 points around the mouth opening.
pub fn teeth_vertices(face: &Face) -> Vec<Vec2> {
    collect(face, 84..96)
}
