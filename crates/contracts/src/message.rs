//! Message - one delimiter-terminated input record

use bytes::{Bytes, BytesMut};

/// Record delimiter for input, spool and log files
pub const DELIMITER: u8 = b'\n';

/// Longest record read in one piece; longer lines are split
///
/// One byte less than the 4096-byte line buffer, which reserves a byte for
/// its terminator, so a chunk holds at most 4095 bytes.
pub const MAX_RECORD_LEN: usize = 4095;

/// Raw message payload
///
/// Holds the bytes exactly as read, trailing delimiter included when the
/// source had one. Cloning is cheap (shared buffer).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Message {
    payload: Bytes,
}

impl Message {
    /// Create a message from raw bytes
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Payload bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.payload
    }

    /// Shared payload buffer
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Whether the payload already ends with [`DELIMITER`]
    pub fn has_delimiter(&self) -> bool {
        self.payload.last() == Some(&DELIMITER)
    }

    /// Bytes to write so that framing splits them back into this message
    ///
    /// A short payload without a delimiter gets one appended. A full-size
    /// chunk of a longer line is written raw: the reader cuts it at
    /// [`MAX_RECORD_LEN`] again, and an added delimiter would come back as an
    /// extra record.
    pub fn to_record(&self) -> Bytes {
        if self.has_delimiter() || self.payload.len() >= MAX_RECORD_LEN {
            self.payload.clone()
        } else {
            let mut buf = BytesMut::with_capacity(self.payload.len() + 1);
            buf.extend_from_slice(&self.payload);
            buf.extend_from_slice(&[DELIMITER]);
            buf.freeze()
        }
    }

    /// Lossy text view for diagnostics
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

impl From<&str> for Message {
    fn from(s: &str) -> Self {
        Self::new(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for Message {
    fn from(s: String) -> Self {
        Self::new(Bytes::from(s))
    }
}

impl From<Vec<u8>> for Message {
    fn from(v: Vec<u8>) -> Self {
        Self::new(Bytes::from(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_record_keeps_existing_delimiter() {
        let msg = Message::from("hello\n");
        assert!(msg.has_delimiter());
        assert_eq!(&msg.to_record()[..], b"hello\n");
    }

    #[test]
    fn test_to_record_appends_missing_delimiter() {
        let msg = Message::from("tail");
        assert!(!msg.has_delimiter());
        assert_eq!(&msg.to_record()[..], b"tail\n");
        assert_eq!(msg.len(), 4);
    }

    #[test]
    fn test_to_record_leaves_full_chunk_raw() {
        let msg = Message::from(vec![b'z'; MAX_RECORD_LEN]);
        assert!(!msg.has_delimiter());
        assert_eq!(msg.to_record().len(), MAX_RECORD_LEN);
    }
}
