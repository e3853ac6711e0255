//! Sticker packs: definitions plus decoded frame images.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::error::{Result, StickerError};
use crate::sticker::{StickerDefinition, StickerManifest};

/// Manifest file names tried in order inside a pack directory.
pub const MANIFEST_FILES: [&str; 2] = ["json", "manifest.json"];

pub trait StickerAssetProvider: Send {
    fn definitions(&self) -> &[StickerDefinition];

    /// Decode frame `index` of sticker `name`. A miss is `None`, never an
    /// error; the animation clock retries on the next tick.
    fn load_frame(&mut self, name: &str, index: u32) -> Option<RgbaImage>;
}

/// Relative path of a frame inside a pack: `<name>/<name>_007.png`.
pub fn frame_path(name: &str, index: u32) -> PathBuf {
    Path::new(name).join(format!("{}_{:03}.png", name, index))
}

/// A pack on disk, decoding frames on demand.
#[derive(Debug)]
pub struct FsStickerPack {
    root: PathBuf,
    definitions: Vec<StickerDefinition>,
}

impl FsStickerPack {
    pub fn open(root: impl Into<PathBuf>) -> Result<FsStickerPack> {
        let root = root.into();
        let manifest_path = MANIFEST_FILES.iter()
            .map(|name| root.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no sticker manifest in {}", root.display()),
            ))?;

        let bytes = std::fs::read(&manifest_path)?;
        let manifest = StickerManifest::from_slice(&bytes)?;
        if manifest.sticker_list.is_empty() {
            return Err(StickerError::EmptyPack);
        }

        tracing::info!(
            path = %root.display(),
            stickers = manifest.sticker_list.len(),
            "opened sticker pack",
        );
        Ok(FsStickerPack {
            root,
            definitions: manifest.sticker_list,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl StickerAssetProvider for FsStickerPack {
    fn definitions(&self) -> &[StickerDefinition] {
        &self.definitions
    }

    fn load_frame(&mut self, name: &str, index: u32) -> Option<RgbaImage> {
        let path = self.root.join(frame_path(name, index));
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "sticker frame missing");
            return None;
        }

        match image::open(&path) {
            Ok(image) => Some(image.into_rgba8()),
            Err(err) => {
                tracing::warn!(path = %path.display(), "failed to decode sticker frame: {}", err);
                None
            }
        }
    }
}

/// An in-memory pack.
#[derive(Debug, Default)]
pub struct StaticStickerPack {
    definitions: Vec<StickerDefinition>,
    frames: HashMap<(String, u32), RgbaImage>,
}

impl StaticStickerPack {
    pub fn new(definitions: Vec<StickerDefinition>) -> Result<StaticStickerPack> {
        for definition in definitions.iter() {
            definition.validate()?;
        }
        Ok(StaticStickerPack {
            definitions,
            frames: HashMap::new(),
        })
    }

    pub fn insert_frame(&mut self, name: impl Into<String>, index: u32, image: RgbaImage) {
        self.frames.insert((name.into(), index), image);
    }

    pub fn with_frame(mut self, name: impl Into<String>, index: u32, image: RgbaImage) -> Self {
        self.insert_frame(name, index, image);
        self
    }
}

impl StickerAssetProvider for StaticStickerPack {
    fn definitions(&self) -> &[StickerDefinition] {
        &self.definitions
    }

    fn load_frame(&mut self, name: &str, index: u32) -> Option<RgbaImage> {
        self.frames.get(&(name.to_owned(), index)).cloned()
    }
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;

    const MANIFEST: &str = r#"{"stickerList": [{
        "type": "sticker", "centerIndexList": [43], "offsetX": 0.0, "offsetY": 0.0,
        "baseScale": 1.2, "startIndex": 4, "endIndex": 28, "width": 4, "height": 2,
        "frames": 2, "action": 0, "stickerName": "hat", "duration": 50,
        "stickerLooping": true, "maxCount": 1
    }]}"#;

    struct TempDir(PathBuf);

    impl TempDir {
        fn new() -> Self {
            let path = std::env::temp_dir().join(format!("face-sticker-{}", nanoid::nanoid!()));
            std::fs::create_dir_all(&path).unwrap();
            TempDir(path)
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn frame_file_names() {
        assert_eq!(frame_path("hat", 7), Path::new("hat").join("hat_007.png"));
        assert_eq!(frame_path("hat", 123), Path::new("hat").join("hat_123.png"));
    }

    #[test]
    fn open_pack_and_load_frames() {
        let dir = TempDir::new();
        std::fs::write(dir.0.join("json"), MANIFEST).unwrap();
        std::fs::create_dir_all(dir.0.join("hat")).unwrap();
        RgbaImage::from_pixel(4, 2, Rgba([255, 0, 0, 255]))
            .save(dir.0.join(frame_path("hat", 0)))
            .unwrap();

        let mut pack = FsStickerPack::open(&dir.0).unwrap();
        assert_eq!(pack.definitions().len(), 1);
        assert_eq!(pack.definitions()[0].name, "hat");

        let frame = pack.load_frame("hat", 0).unwrap();
        assert_eq!(frame.dimensions(), (4, 2));
        assert_eq!(frame.get_pixel(1, 1), &Rgba([255, 0, 0, 255]));

        assert!(pack.load_frame("hat", 1).is_none());
        assert!(pack.load_frame("scarf", 0).is_none());
    }

    #[test]
    fn manifest_json_fallback_name() {
        let dir = TempDir::new();
        std::fs::write(dir.0.join("manifest.json"), MANIFEST).unwrap();
        assert!(FsStickerPack::open(&dir.0).is_ok());
    }

    #[test]
    fn undecodable_frame_is_a_miss() {
        let dir = TempDir::new();
        std::fs::write(dir.0.join("json"), MANIFEST).unwrap();
        std::fs::create_dir_all(dir.0.join("hat")).unwrap();
        std::fs::write(dir.0.join(frame_path("hat", 0)), b"not a png").unwrap();

        let mut pack = FsStickerPack::open(&dir.0).unwrap();
        assert!(pack.load_frame("hat", 0).is_none());
    }

    #[test]
    fn rejects_bad_packs() {
        let dir = TempDir::new();
        assert!(matches!(FsStickerPack::open(&dir.0), Err(StickerError::Io(_))));

        std::fs::write(dir.0.join("json"), r#"{"stickerList": []}"#).unwrap();
        assert!(matches!(FsStickerPack::open(&dir.0), Err(StickerError::EmptyPack)));

        std::fs::write(dir.0.join("json"), MANIFEST.replace("\"width\": 4", "\"width\": 0")).unwrap();
        assert!(matches!(FsStickerPack::open(&dir.0), Err(StickerError::InvalidDefinition { .. })));
    }

    #[test]
    fn static_pack() {
        let manifest = StickerManifest::from_slice(MANIFEST.as_bytes()).unwrap();
        let mut pack = StaticStickerPack::new(manifest.sticker_list).unwrap()
            .with_frame("hat", 1, RgbaImage::new(4, 2));

        assert!(pack.load_frame("hat", 0).is_none());
        assert!(pack.load_frame("hat", 1).is_some());
    }
}
