use bitflags::bitflags;
use glam::Vec2;

bitflags! {
    /// Expression attributes reported by the detector.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Expression: u8 {
        const MOUTH_OPEN = 1 << 0;
        const MOUTH_BIG_OPEN = 1 << 1;
        const MOUTH_CLOSED = 1 << 2;
        const EYES_CLOSED = 1 << 3;
    }
}

/// One detected face.
///
/// Landmarks are in normalized device coordinates (`[-1, 1]`, y up). Angles
/// are in radians. A default face has no landmarks and stands for "no
/// detection in this slot".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Face {
    pub landmarks: Vec<Vec2>,
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
    pub expression: Expression,
}

impl Face {
    pub fn new(landmarks: Vec<Vec2>, pitch: f32, yaw: f32, roll: f32) -> Self {
        Self {
            landmarks,
            pitch,
            yaw,
            roll,
            expression: Expression::empty(),
        }
    }

    pub fn with_expression(mut self, expression: Expression) -> Self {
        self.expression = expression;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    /// Landmark `index`, or the origin when the detector did not supply it.
    pub fn landmark(&self, index: usize) -> Vec2 {
        self.landmarks.get(index).copied().unwrap_or(Vec2::ZERO)
    }
}

/// Device rotation relative to the camera sensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    #[default]
    Portrait,
    LandscapeLeft,
    LandscapeRight,
    PortraitInverted,
}

impl Orientation {
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Orientation::Portrait),
            1 => Some(Orientation::LandscapeLeft),
            2 => Some(Orientation::LandscapeRight),
            3 => Some(Orientation::PortraitInverted),
            _ => None,
        }
    }

    pub fn index(self) -> u8 {
        match self {
            Orientation::Portrait => 0,
            Orientation::LandscapeLeft => 1,
            Orientation::LandscapeRight => 2,
            Orientation::PortraitInverted => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_face_is_empty() {
        let face = Face::default();
        assert!(face.is_empty());
        assert_eq!(face.landmark(10), Vec2::ZERO);
        assert_eq!(face.expression, Expression::empty());
    }

    #[test]
    fn orientation_indices() {
        for index in 0..4 {
            assert_eq!(Orientation::from_index(index).unwrap().index(), index);
        }
        assert_eq!(Orientation::from_index(4), None);
    }
}
