//! Binary media payloads
//!
//! Decodes textures, fonts and sounds into CPU-side payloads. Uploading them
//! to a device or mixer is left to the renderer and audio collaborators.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use image::GenericImageView;
use rodio::Source;

use super::handle::{Asset, AssetKind};

/// Default point size for fonts that do not declare one
pub const DEFAULT_FONT_SIZE: u32 = 16;

/// A decoded RGBA8 image
#[derive(Debug, Clone)]
pub struct Texture {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Tightly packed RGBA8 pixels
    pub pixels: Vec<u8>,
}

impl Texture {
    /// Load a texture from a file path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let bytes = fs::read(path).map_err(|e| AssetError::Io(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Decode a texture from raw bytes (PNG, JPEG)
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a supported image
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        let img =
            image::load_from_memory(bytes).map_err(|e| AssetError::Decode(e.to_string()))?;
        let (width, height) = img.dimensions();

        Ok(Self {
            width,
            height,
            pixels: img.to_rgba8().into_raw(),
        })
    }
}

impl Asset for Texture {
    const KIND: AssetKind = AssetKind::Texture;
}

/// Raw font file plus the requested point size
#[derive(Debug, Clone)]
pub struct Font {
    /// Point size the font was requested at
    pub size: u32,
    /// sfnt file contents
    pub data: Arc<[u8]>,
}

impl Font {
    /// Load a font file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not an sfnt font
    pub fn from_path(path: impl AsRef<Path>, size: u32) -> Result<Self, AssetError> {
        let bytes = fs::read(path).map_err(|e| AssetError::Io(e.to_string()))?;
        Self::from_bytes(bytes, size)
    }

    /// Wrap font bytes after checking the sfnt header tag
    ///
    /// # Errors
    ///
    /// Returns an error if the header is not TrueType, OpenType or a collection
    pub fn from_bytes(bytes: Vec<u8>, size: u32) -> Result<Self, AssetError> {
        const TAGS: [[u8; 4]; 4] = [*b"\0\x01\0\0", *b"OTTO", *b"true", *b"ttcf"];

        match bytes.get(..4) {
            Some(tag) if TAGS.iter().any(|t| t == tag) => Ok(Self {
                size,
                data: bytes.into(),
            }),
            Some(_) => Err(AssetError::Decode("unrecognised font header".to_string())),
            None => Err(AssetError::Decode("font file too short".to_string())),
        }
    }
}

impl Asset for Font {
    const KIND: AssetKind = AssetKind::Font;
}

/// Encoded sound data with its decoded stream parameters
#[derive(Debug, Clone)]
pub struct Sound {
    /// Channel count
    pub channels: u16,
    /// Samples per second
    pub sample_rate: u32,
    /// Total duration, when the container reports one
    pub duration: Option<Duration>,
    /// Encoded bytes, shared with every sink that plays the sound
    pub data: Arc<[u8]>,
}

impl Sound {
    /// Load a sound file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let bytes = fs::read(path).map_err(|e| AssetError::Io(e.to_string()))?;
        Self::from_bytes(bytes)
    }

    /// Probe sound bytes with the decoder
    ///
    /// # Errors
    ///
    /// Returns an error if no decoder accepts the data
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, AssetError> {
        let data: Arc<[u8]> = bytes.into();
        let decoder = rodio::Decoder::new(Cursor::new(data.to_vec()))
            .map_err(|e| AssetError::Decode(e.to_string()))?;

        Ok(Self {
            channels: decoder.channels(),
            sample_rate: decoder.sample_rate(),
            duration: decoder.total_duration(),
            data,
        })
    }
}

impl Asset for Sound {
    const KIND: AssetKind = AssetKind::Sound;
}

/// A decoded media payload of any supported type
#[derive(Debug, Clone)]
pub enum AssetPayload {
    Texture(Texture),
    Font(Font),
    Sound(Sound),
}

impl AssetPayload {
    /// Type tag of the payload
    #[must_use]
    pub fn kind(&self) -> AssetKind {
        match self {
            Self::Texture(_) => AssetKind::Texture,
            Self::Font(_) => AssetKind::Font,
            Self::Sound(_) => AssetKind::Sound,
        }
    }
}

/// Outcome of one load request
#[derive(Debug)]
pub struct LoadedAsset {
    /// Requested type
    pub kind: AssetKind,
    /// Path the request was made for
    pub path: PathBuf,
    /// The payload, or the reason it could not be produced
    pub result: Result<AssetPayload, AssetError>,
}

impl LoadedAsset {
    /// Whether the load succeeded
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Human-readable failure reason, if any
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.result.as_ref().err().map(ToString::to_string)
    }
}

/// Errors that can occur while loading a media file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// File could not be opened or read
    Io(String),
    /// Bytes could not be decoded
    Decode(String),
}

impl std::fmt::Display for AssetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::Decode(e) => write!(f, "Decode error: {e}"),
        }
    }
}

impl std::error::Error for AssetError {}
