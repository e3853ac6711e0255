//! Index scheme of the face point arrays.
//!
//! The detector produces [`DETECTED_POINTS`] landmarks. The pose normalizer
//! appends eight synthesized anchors and eight image-edge points, giving the
//! [`EXTENDED_POINTS`] array that sticker definitions index into.

pub const DETECTED_POINTS: usize = 212;
pub const EXTENDED_POINTS: usize = 228;

pub const LEFT_CHEEK_EDGE_CENTER: usize = 4;
pub const RIGHT_CHEEK_EDGE_CENTER: usize = 28;

pub const LEFT_EYEBROW_LEFT_TOP_CORNER: usize = 34;
pub const LEFT_EYEBROW_UPPER_MIDDLE: usize = 35;
pub const LEFT_EYEBROW_LOWER_MIDDLE: usize = 65;

pub const RIGHT_EYEBROW_UPPER_MIDDLE: usize = 40;
pub const RIGHT_EYEBROW_RIGHT_TOP_CORNER: usize = 41;
pub const RIGHT_EYEBROW_LOWER_MIDDLE: usize = 70;

pub const EYE_CENTER: usize = 43;

pub const NOSE_LOWER_MIDDLE: usize = 49;
pub const NOSE_LEFT: usize = 82;
pub const NOSE_RIGHT: usize = 83;

pub const MOUTH_UPPER_LIP_BOTTOM: usize = 98;
pub const MOUTH_LOWER_LIP_TOP: usize = 102;

// Synthesized anchors.
pub const MOUTH_CENTER: usize = 212;
pub const LEFT_EYEBROW_CENTER: usize = 213;
pub const RIGHT_EYEBROW_CENTER: usize = 214;
pub const HEAD_CENTER: usize = 215;
pub const LEFT_HEAD: usize = 216;
pub const RIGHT_HEAD: usize = 217;
pub const LEFT_CHEEK_CENTER: usize = 218;
pub const RIGHT_CHEEK_CENTER: usize = 219;

/// First of the eight image-edge points.
pub const IMAGE_EDGE: usize = 220;
