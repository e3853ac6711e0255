use serde::{Deserialize, Serialize};

use crate::error::{Result, StickerError};
use crate::landmarks::EXTENDED_POINTS;

/// Which placement strategy a definition uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlacementKind {
    /// A textured quad anchored to landmarks, offset and scaled by the face.
    #[default]
    Sticker,
}

fn default_base_scale() -> f32 {
    1.0
}

fn default_max_count() -> usize {
    1
}

/// Static description of one sticker in a pack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StickerDefinition {
    #[serde(rename = "type", default)]
    pub kind: PlacementKind,
    /// Extended point indices averaged to find the anchor.
    pub center_index_list: Vec<usize>,
    /// Offset of the pivot from the anchor, as a fraction of the sticker width.
    #[serde(default)]
    pub offset_x: f32,
    /// Offset of the pivot from the anchor, as a fraction of the sticker height.
    #[serde(default)]
    pub offset_y: f32,
    #[serde(default = "default_base_scale")]
    pub base_scale: f32,
    /// Reference segment start; its length sets the sticker width.
    pub start_index: usize,
    pub end_index: usize,
    /// Texture width in pixels.
    pub width: u32,
    /// Texture height in pixels.
    pub height: u32,
    pub frames: u32,
    #[serde(default)]
    pub action: i32,
    #[serde(rename = "stickerName")]
    pub name: String,
    /// Frame duration in milliseconds.
    pub duration: u32,
    #[serde(rename = "stickerLooping", default)]
    pub looping: bool,
    #[serde(default = "default_max_count")]
    pub max_count: usize,
}

impl StickerDefinition {
    pub fn aspect_ratio(&self) -> f32 {
        if self.width == 0 {
            0.0
        } else {
            self.height as f32 / self.width as f32
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> StickerError {
        StickerError::InvalidDefinition {
            name: self.name.clone(),
            reason: reason.into(),
        }
    }

    /// Reject definitions the placement engine cannot place.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(self.invalid("missing sticker name"));
        }
        if self.center_index_list.is_empty() {
            return Err(self.invalid("empty center index list"));
        }
        if let Some(index) = self.center_index_list.iter()
            .chain([&self.start_index, &self.end_index])
            .find(|&&i| i >= EXTENDED_POINTS) {
            return Err(self.invalid(format!("point index {} out of range", index)));
        }
        if self.start_index == self.end_index {
            return Err(self.invalid("zero-length reference segment"));
        }
        if self.width == 0 || self.height == 0 {
            return Err(self.invalid("zero texture size"));
        }
        if self.max_count == 0 {
            return Err(self.invalid("max count is zero"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StickerManifest {
    pub sticker_list: Vec<StickerDefinition>,
}

impl StickerManifest {
    pub fn from_slice(src: &[u8]) -> Result<StickerManifest> {
        let manifest = serde_json::from_slice::<StickerManifest>(src)?;
        for definition in manifest.sticker_list.iter() {
            definition.validate()?;
        }
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "stickerList": [{
            "type": "sticker",
            "centerIndexList": [43],
            "offsetX": 0.0,
            "offsetY": 0.5,
            "baseScale": 1.6,
            "startIndex": 4,
            "endIndex": 28,
            "width": 300,
            "height": 150,
            "frames": 12,
            "action": 0,
            "stickerName": "ears",
            "duration": 80,
            "stickerLooping": true,
            "maxCount": 2
        }]
    }"#;

    #[test]
    fn parse_manifest() {
        let manifest = StickerManifest::from_slice(MANIFEST.as_bytes()).unwrap();
        let sticker = &manifest.sticker_list[0];

        assert_eq!(sticker.kind, PlacementKind::Sticker);
        assert_eq!(sticker.name, "ears");
        assert_eq!(sticker.center_index_list, vec![43]);
        assert_eq!(sticker.duration, 80);
        assert!(sticker.looping);
        assert_eq!(sticker.max_count, 2);
        assert_eq!(sticker.aspect_ratio(), 0.5);
    }

    #[test]
    fn optional_fields_default() {
        let manifest = StickerManifest::from_slice(br#"{"stickerList": [{
            "centerIndexList": [1], "startIndex": 0, "endIndex": 1,
            "width": 10, "height": 10, "frames": 1, "stickerName": "dot", "duration": 100
        }]}"#).unwrap();
        let sticker = &manifest.sticker_list[0];

        assert_eq!(sticker.base_scale, 1.0);
        assert_eq!(sticker.max_count, 1);
        assert!(!sticker.looping);
        assert_eq!(sticker.kind, PlacementKind::Sticker);
    }

    #[test]
    fn rejects_out_of_range_index() {
        let manifest = MANIFEST.replace("\"endIndex\": 28", "\"endIndex\": 500");
        let err = StickerManifest::from_slice(manifest.as_bytes()).unwrap_err();
        assert!(matches!(err, StickerError::InvalidDefinition { .. }));
    }

    #[test]
    fn rejects_degenerate_segment() {
        let manifest = MANIFEST.replace("\"endIndex\": 28", "\"endIndex\": 4");
        assert!(StickerManifest::from_slice(manifest.as_bytes()).is_err());
    }

    #[test]
    fn rejects_empty_center_list() {
        let manifest = MANIFEST.replace("[43]", "[]");
        assert!(StickerManifest::from_slice(manifest.as_bytes()).is_err());
    }

    #[test]
    fn rejects_bad_json() {
        let err = StickerManifest::from_slice(b"{").unwrap_err();
        assert!(matches!(err, StickerError::Manifest(_)));
    }
}
