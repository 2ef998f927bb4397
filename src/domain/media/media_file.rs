//! Media file value object

use std::fmt;
use std::path::Path;

use crate::domain::error::ValidationError;

/// Media types accepted for submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Mp4,
    Webm,
    Mp3,
    Wav,
}

impl MediaType {
    /// Every admitted media type
    pub const ALL: [MediaType; 4] = [Self::Mp4, Self::Webm, Self::Mp3, Self::Wav];

    /// Get the MIME type string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mp4 => "video/mp4",
            Self::Webm => "video/webm",
            Self::Mp3 => "audio/mpeg",
            Self::Wav => "audio/wav",
        }
    }

    /// Get the file extension
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
        }
    }

    /// Look up an admitted type by file extension (case-insensitive)
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        Self::ALL.into_iter().find(|t| t.extension() == ext)
    }

    /// Look up an admitted type from a file name
    pub fn from_file_name(name: &str) -> Option<Self> {
        Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Value object representing one recording ready for submission.
/// Only constructible for admitted media types, so an invalid file never
/// reaches the transport.
#[derive(Debug, Clone)]
pub struct MediaFile {
    name: String,
    data: Vec<u8>,
    media_type: MediaType,
}

impl MediaFile {
    /// Admit a file from its name and contents
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Result<Self, ValidationError> {
        let name = name.into();
        let media_type = MediaType::from_file_name(&name)
            .ok_or_else(|| ValidationError::UnsupportedType { name: name.clone() })?;

        if data.is_empty() {
            return Err(ValidationError::Empty { name });
        }

        Ok(Self {
            name,
            data,
            media_type,
        })
    }

    /// Read and admit a file from disk.
    /// The extension is checked before the file is read.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ValidationError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        if MediaType::from_file_name(&name).is_none() {
            return Err(ValidationError::UnsupportedType { name });
        }

        let data = tokio::fs::read(path)
            .await
            .map_err(|e| ValidationError::Unreadable {
                path: path.to_string_lossy().into_owned(),
                message: e.to_string(),
            })?;

        Self::new(name, data)
    }

    /// Original file name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the raw file contents
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    /// Get the size in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Get human-readable size
    pub fn human_readable_size(&self) -> String {
        let bytes = self.size_bytes();
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        }
    }
}
