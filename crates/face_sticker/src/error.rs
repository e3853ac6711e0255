use thiserror::Error;

/// Errors raised while loading a sticker pack.
///
/// Nothing on the per-frame path returns these; frame misses degrade to
/// `None` instead.
#[derive(Error, Debug)]
pub enum StickerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid sticker manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("failed to decode sticker image: {0}")]
    Image(#[from] image::ImageError),

    #[error("invalid sticker definition {name:?}: {reason}")]
    InvalidDefinition { name: String, reason: String },

    #[error("sticker pack has no stickers")]
    EmptyPack,
}

pub type Result<T> = std::result::Result<T, StickerError>;
