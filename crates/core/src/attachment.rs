use std::fmt;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use thiserror::Error;

/// Errors raised while buffering an attachment into memory.
#[derive(Debug, Error)]
pub enum AttachmentError {
    /// The source reader failed before it was fully drained.
    #[error("failed to read attachment '{name}': {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// The file backing the attachment could not be opened.
    #[error("failed to open attachment file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A file that can be sent alongside a notification.
///
/// The content is buffered into memory once at construction and never read
/// from the source again. The buffer is immutable and reference-counted, so
/// the same attachment can be handed to several services in one dispatch;
/// every call to [`reader`](Self::reader) yields an independent cursor.
#[derive(Clone)]
pub struct Attachment {
    data: Bytes,
    name: String,
    content_type: String,
    inline: bool,
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("size", &self.size())
            .field("inline", &self.inline)
            .finish_non_exhaustive()
    }
}

impl Attachment {
    /// Create an attachment from bytes that are already in memory.
    pub fn from_bytes(
        data: impl Into<Bytes>,
        name: impl Into<String>,
        content_type: impl Into<String>,
        inline: bool,
    ) -> Self {
        Self {
            data: data.into(),
            name: name.into(),
            content_type: content_type.into(),
            inline,
        }
    }

    /// Drain `reader` into memory and wrap the result as an attachment.
    pub fn from_reader(
        mut reader: impl Read,
        name: impl Into<String>,
        content_type: impl Into<String>,
        inline: bool,
    ) -> Result<Self, AttachmentError> {
        let name = name.into();
        let mut buf = Vec::new();
        if let Err(source) = reader.read_to_end(&mut buf) {
            return Err(AttachmentError::Read { name, source });
        }
        Ok(Self::from_bytes(buf, name, content_type, inline))
    }

    /// Read the file at `path` into memory. The file's base name becomes the
    /// attachment name.
    pub fn from_path(
        path: impl AsRef<Path>,
        content_type: impl Into<String>,
        inline: bool,
    ) -> Result<Self, AttachmentError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| AttachmentError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_reader(file, name, content_type, inline)
    }

    /// A fresh reader positioned at the start of the content.
    pub fn reader(&self) -> Cursor<Bytes> {
        Cursor::new(self.data.clone())
    }

    /// The raw content. Cloning [`Bytes`] does not copy the buffer.
    pub fn data(&self) -> Bytes {
        self.data.clone()
    }

    /// Filename presented to the recipient.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// MIME type, possibly empty when the caller did not supply one.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Content length in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Hint to backends that support inline display (e.g. email).
    pub fn is_inline(&self) -> bool {
        self.inline
    }
}
