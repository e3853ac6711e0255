//! Producer-side conversion of raw detector output into store faces.

use glam::Vec2;
use thiserror::Error;

use crate::face::{Expression, Face, Orientation};
use crate::landmarks::DETECTED_POINTS;
use crate::store::{DetectionFrame, LandmarkStore};

/// Coordinate convention of incoming landmarks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LandmarkSpace {
    /// Already normalized device coordinates.
    Normalized,
    /// Pixels with a top-left origin. The back camera image is not mirrored,
    /// so its x axis and yaw are flipped to match the preview.
    Pixels { width: u32, height: u32, back_camera: bool },
}

/// A face as the detector reports it.
#[derive(Debug, Clone)]
pub struct RawFace {
    pub landmarks: Vec<Vec2>,
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
    pub expression: Expression,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    #[error("face {face} has {count} landmarks, expected {}", DETECTED_POINTS)]
    LandmarkCount { face: usize, count: usize },

    #[error("landmark image size is zero")]
    EmptyImage,
}

fn to_normalized(point: Vec2, space: LandmarkSpace) -> Vec2 {
    match space {
        LandmarkSpace::Normalized => point,
        LandmarkSpace::Pixels { width, height, back_camera } => {
            let x = point.x / width as f32 * 2.0 - 1.0;
            let y = -(point.y / height as f32 * 2.0 - 1.0);
            if back_camera {
                Vec2::new(-x, y)
            } else {
                Vec2::new(x, y)
            }
        }
    }
}

impl RawFace {
    pub fn into_face(self, space: LandmarkSpace) -> Face {
        let back_camera = matches!(space, LandmarkSpace::Pixels { back_camera: true, .. });
        let landmarks = self.landmarks.into_iter()
            .map(|point| to_normalized(point, space))
            .collect();
        Face {
            landmarks,
            pitch: self.pitch,
            yaw: if back_camera { -self.yaw } else { self.yaw },
            roll: self.roll,
            expression: self.expression,
        }
    }
}

/// Build a [`DetectionFrame`] from raw faces, rejecting faces that do not
/// carry the full landmark set.
pub fn detection_frame(
    orientation: Orientation,
    need_flip: bool,
    space: LandmarkSpace,
    faces: Vec<RawFace>,
) -> Result<DetectionFrame, DetectionError> {
    if let LandmarkSpace::Pixels { width, height, .. } = space {
        if width == 0 || height == 0 {
            return Err(DetectionError::EmptyImage);
        }
    }

    if let Some((face, raw)) = faces.iter().enumerate()
        .find(|(_, raw)| raw.landmarks.len() != DETECTED_POINTS) {
        return Err(DetectionError::LandmarkCount { face, count: raw.landmarks.len() });
    }

    Ok(DetectionFrame {
        orientation,
        need_flip,
        faces: faces.into_iter().map(|raw| raw.into_face(space)).collect(),
    })
}

/// Convert and publish one detector result.
pub fn publish_detection(
    store: &LandmarkStore,
    orientation: Orientation,
    need_flip: bool,
    space: LandmarkSpace,
    faces: Vec<RawFace>,
) -> Result<(), DetectionError> {
    let frame = detection_frame(orientation, need_flip, space, faces)?;
    tracing::trace!(faces = frame.faces.len(), "publishing detection");
    store.publish(frame);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(points: Vec<Vec2>, yaw: f32) -> RawFace {
        RawFace {
            landmarks: points,
            pitch: 0.1,
            yaw,
            roll: 0.3,
            expression: Expression::MOUTH_OPEN,
        }
    }

    #[test]
    fn pixels_to_normalized() {
        let space = LandmarkSpace::Pixels { width: 720, height: 1280, back_camera: false };
        let face = raw(vec![Vec2::new(0.0, 0.0), Vec2::new(360.0, 640.0), Vec2::new(720.0, 1280.0)], 0.2)
            .into_face(space);

        assert_eq!(face.landmarks[0], Vec2::new(-1.0, 1.0));
        assert_eq!(face.landmarks[1], Vec2::new(0.0, 0.0));
        assert_eq!(face.landmarks[2], Vec2::new(1.0, -1.0));
        assert_eq!(face.yaw, 0.2);
        assert_eq!(face.expression, Expression::MOUTH_OPEN);
    }

    #[test]
    fn back_camera_mirrors_x_and_yaw() {
        let space = LandmarkSpace::Pixels { width: 100, height: 100, back_camera: true };
        let face = raw(vec![Vec2::new(25.0, 25.0)], 0.2).into_face(space);

        assert_eq!(face.landmarks[0], Vec2::new(0.5, 0.5));
        assert_eq!(face.yaw, -0.2);
    }

    #[test]
    fn rejects_partial_landmarks() {
        let result = detection_frame(
            Orientation::Portrait,
            false,
            LandmarkSpace::Normalized,
            vec![raw(vec![Vec2::ZERO; DETECTED_POINTS], 0.0), raw(vec![Vec2::ZERO; 10], 0.0)],
        );
        assert_eq!(result.unwrap_err(), DetectionError::LandmarkCount { face: 1, count: 10 });
    }

    #[test]
    fn publish_into_store() {
        let store = LandmarkStore::new(1);
        publish_detection(
            &store,
            Orientation::LandscapeLeft,
            true,
            LandmarkSpace::Normalized,
            vec![raw(vec![Vec2::splat(0.25); DETECTED_POINTS], 0.0)],
        ).unwrap();

        assert_eq!(store.face_count(), 1);
        assert_eq!(store.orientation(), Orientation::LandscapeLeft);
        assert_eq!(store.get_face(0).landmarks[5], Vec2::splat(0.25));
    }
}
