//! Delimiter framing shared by the spool file and live input
//!
//! A record is at most [`MAX_RECORD_LEN`] bytes including its `\n`. Longer
//! lines come out as consecutive chunks of that size; only the last chunk
//! carries the delimiter.

use bytes::{Bytes, BytesMut};
use contracts::{Message, DELIMITER, MAX_RECORD_LEN};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Split a buffer into records, in order
///
/// A trailing fragment without a delimiter is returned as the last record.
pub fn split_records(data: Bytes) -> Vec<Message> {
    let mut records = Vec::new();
    let mut rest = data;

    while !rest.is_empty() {
        let window = rest.len().min(MAX_RECORD_LEN);
        let end = match rest[..window].iter().position(|b| *b == DELIMITER) {
            Some(pos) => pos + 1,
            None => window,
        };
        records.push(Message::new(rest.split_to(end)));
    }

    records
}

/// Reads records from an async byte stream
///
/// `next_record` is cancel safe: bytes already taken from the reader are
/// kept in `partial` until a full record is assembled.
#[derive(Debug)]
pub struct RecordReader<R> {
    reader: R,
    partial: BytesMut,
}

impl<R: AsyncBufRead + Unpin> RecordReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            partial: BytesMut::with_capacity(MAX_RECORD_LEN),
        }
    }

    /// Next record, or `None` at end of input
    pub async fn next_record(&mut self) -> std::io::Result<Option<Message>> {
        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                if self.partial.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(Message::new(self.partial.split().freeze())));
            }

            let room = MAX_RECORD_LEN - self.partial.len();
            let window = &available[..available.len().min(room)];
            let (take, complete) = match window.iter().position(|b| *b == DELIMITER) {
                Some(pos) => (pos + 1, true),
                None => (window.len(), window.len() == room),
            };

            self.partial.extend_from_slice(&window[..take]);
            self.reader.consume(take);

            if complete {
                return Ok(Some(Message::new(self.partial.split().freeze())));
            }
        }
    }
}
