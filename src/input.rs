use bytes::Bytes;
use std::fmt;
use std::path::Path;
use tokio::fs;
use tracing::debug;

use crate::error::{CapflowError, Result};

/// Container formats the extraction service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Mp4,
    Matroska,
    MpegTs,
    QuickTime,
}

impl MediaKind {
    pub const ALL: [MediaKind; 4] = [
        MediaKind::Mp4,
        MediaKind::Matroska,
        MediaKind::MpegTs,
        MediaKind::QuickTime,
    ];

    pub fn media_type(&self) -> &'static str {
        match self {
            Self::Mp4 => "video/mp4",
            Self::Matroska => "video/x-matroska",
            Self::MpegTs => "video/MP2T",
            Self::QuickTime => "video/quicktime",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Matroska => "mkv",
            Self::MpegTs => "ts",
            Self::QuickTime => "mov",
        }
    }

    pub fn from_media_type(media_type: &str) -> Option<Self> {
        let media_type = media_type.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.media_type().eq_ignore_ascii_case(media_type))
    }

    pub fn from_file_name(name: &str) -> Option<Self> {
        let extension = Path::new(name).extension()?.to_str()?;
        Self::ALL
            .into_iter()
            .find(|kind| kind.extension().eq_ignore_ascii_case(extension))
    }
}

/// A single user-provided video file.
///
/// Replaced wholesale on re-selection and never mutated in place.
/// Clones share the content buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedInput {
    pub name: String,
    pub content: Bytes,
    pub media_type: Option<String>,
}

impl SelectedInput {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>, media_type: Option<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            media_type,
        }
    }

    /// Read a file from disk, declaring the media type implied by its extension.
    pub async fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| CapflowError::Config(format!("Invalid input path: {}", path.display())))?;

        let content = fs::read(path).await?;
        let media_type = MediaKind::from_file_name(&name).map(|k| k.media_type().to_string());
        debug!("Read {} ({} bytes, {:?})", name, content.len(), media_type);

        Ok(Self::new(name, content, media_type))
    }

    /// Resolve the container kind, preferring the declared media type over the extension.
    pub fn kind(&self) -> Result<MediaKind> {
        self.media_type
            .as_deref()
            .and_then(MediaKind::from_media_type)
            .or_else(|| MediaKind::from_file_name(&self.name))
            .ok_or_else(|| {
                CapflowError::UnsupportedFileType(format!(
                    "{} ({}). Supported: {}",
                    self.name,
                    self.media_type.as_deref().unwrap_or("unknown type"),
                    MediaKind::ALL.map(|k| format!(".{}", k.extension())).join(", ")
                ))
            })
    }

    /// Media type sent with the upload part
    pub fn upload_media_type(&self) -> &'static str {
        match self.kind() {
            Ok(kind) => kind.media_type(),
            Err(_) => "application/octet-stream",
        }
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }
}

impl fmt::Debug for SelectedInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedInput")
            .field("name", &self.name)
            .field("size", &self.content.len())
            .field("media_type", &self.media_type)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, media_type: Option<&str>) -> SelectedInput {
        SelectedInput::new(name, vec![0u8; 4], media_type.map(str::to_string))
    }

    #[test]
    fn test_accepts_allow_listed_types() {
        assert_eq!(input("clip.mp4", Some("video/mp4")).kind().unwrap(), MediaKind::Mp4);
        assert_eq!(input("clip.mkv", None).kind().unwrap(), MediaKind::Matroska);
        assert_eq!(input("x", Some("video/mp2t")).kind().unwrap(), MediaKind::MpegTs);
        assert_eq!(input("CLIP.MOV", None).kind().unwrap(), MediaKind::QuickTime);
    }

    #[test]
    fn test_extension_rescues_unknown_media_type() {
        let file = input("clip.mp4", Some("application/octet-stream"));
        assert_eq!(file.kind().unwrap(), MediaKind::Mp4);
    }

    #[test]
    fn test_rejects_image() {
        let err = input("image.png", Some("image/png")).kind().unwrap_err();
        assert!(matches!(err, CapflowError::UnsupportedFileType(_)));
        assert!(err.to_string().contains("image.png"));
    }

    #[test]
    fn test_rejects_missing_extension() {
        assert!(input("video", None).kind().is_err());
    }

    #[tokio::test]
    async fn test_from_path_reads_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mkv");
        std::fs::write(&path, b"matroska").unwrap();

        let file = SelectedInput::from_path(&path).await.unwrap();
        assert_eq!(file.name, "clip.mkv");
        assert_eq!(&file.content[..], b"matroska");
        assert_eq!(file.media_type.as_deref(), Some("video/x-matroska"));
    }

    #[test]
    fn test_clone_shares_content() {
        let original = SelectedInput::new("clip.mp4", vec![7u8; 1024], None);
        let copy = original.clone();
        assert_eq!(copy.content.as_ptr(), original.content.as_ptr());
        assert_eq!(copy.size(), 1024);
    }

    #[test]
    fn test_debug_omits_content() {
        let rendered = format!("{:?}", input("clip.mp4", None));
        assert!(rendered.contains("size: 4"));
        assert!(!rendered.contains("content"));
    }
}
