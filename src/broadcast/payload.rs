//! Broadcast payloads
//!
//! Payloads are cheap to clone: image data is held in `Bytes`, so every
//! destination task shares one allocation.

use std::fmt;

use bytes::Bytes;

/// Which message of a destination a payload targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    /// Attachment of the stream message
    StreamFrameGif,
    /// Text of the status message
    StatusText,
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadKind::StreamFrameGif => write!(f, "stream"),
            PayloadKind::StatusText => write!(f, "status"),
        }
    }
}

/// Data delivered to every destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Replace the stream attachment
    StreamFile {
        /// Attachment file name
        name: String,
        /// Image data
        data: Bytes,
    },

    /// Replace the status text; `None` or empty clears it
    StatusText(Option<String>),
}

impl Payload {
    /// Create a stream attachment payload
    pub fn stream_file(name: impl Into<String>, data: Bytes) -> Self {
        Payload::StreamFile {
            name: name.into(),
            data,
        }
    }

    /// Create a status text payload
    pub fn status_text(text: Option<String>) -> Self {
        Payload::StatusText(text.filter(|t| !t.is_empty()))
    }

    /// Kind of this payload
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::StreamFile { .. } => PayloadKind::StreamFrameGif,
            Payload::StatusText(_) => PayloadKind::StatusText,
        }
    }
}
