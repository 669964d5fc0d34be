//! Incremental decoding session - Unpacker with a streaming API.
//!
//! - [`Unpacker`] - Stateful decoder fed with arbitrary byte slices
//! - `push()` - Feed data in any size, get back every value it completes
//! - `finish()` - End the stream and drop any partial value
//!
//! # Example
//!
//! ```
//! use msgpack_bridge::{Unpacker, UnpackConfig, Value};
//!
//! let mut unpacker = Unpacker::new(UnpackConfig::default());
//!
//! // a one-element array split across two pushes
//! assert!(unpacker.push(&b"\x91"[..])?.is_empty());
//! let values = unpacker.push(&b"\x2a\xc0"[..])?;
//!
//! assert_eq!(values, [Value::Array(vec![Value::from(42)]), Value::Null]);
//! assert_eq!(unpacker.finish(), 0);
//! # Ok::<(), msgpack_bridge::Error>(())
//! ```

use std::io::Read;

use bytes::{Buf, BytesMut};
use tracing::{debug, trace};

use crate::config::UnpackConfig;
use crate::error::{Error, Result};
use crate::value::Value;

use super::iter::ValueIter;
use super::project::project;
use super::template::{Progress, Template};

/// A decoder that turns a byte stream into values.
///
/// Bytes can arrive in pieces of any size. Parse state survives between
/// calls, so tokens already consumed are never scanned again and a value
/// split across any number of pushes decodes exactly as if it had arrived
/// whole.
///
/// # Errors
///
/// A malformed byte or an exceeded limit fails the push. Values the same
/// push completed before the failure are kept for
/// [`Unpacker::take_completed`], and [`Error::Parse`] offsets count from the
/// start of the stream. The session is then stuck on the offending bytes;
/// call [`Unpacker::reset`] before reusing it.
#[derive(Debug)]
pub struct Unpacker {
    template: Template,
    pending: BytesMut,
    parsed: usize,
    offset: u64,
    completed: Vec<Value>,
    config: UnpackConfig,
}

impl Unpacker {
    /// Creates a new session with the given configuration.
    pub fn new(config: UnpackConfig) -> Self {
        Self {
            template: Template::new(config),
            pending: BytesMut::new(),
            parsed: 0,
            offset: 0,
            completed: Vec::new(),
            config,
        }
    }

    /// Pushes data into the session and returns every value it completes,
    /// in stream order.
    pub fn push(&mut self, data: impl AsRef<[u8]>) -> Result<Vec<Value>> {
        self.completed.clear();
        self.pending.extend_from_slice(data.as_ref());

        let mut values = Vec::new();
        loop {
            match self.next_value() {
                Ok(Some(value)) => values.push(value),
                Ok(None) => break,
                Err(e) => {
                    debug!(
                        completed = values.len(),
                        offset = self.offset,
                        error = %e,
                        "unpacker push failed"
                    );
                    self.completed = values;
                    return Err(e);
                }
            }
        }

        trace!(
            values = values.len(),
            pending = self.pending.len(),
            "unpacker push"
        );
        Ok(values)
    }

    fn next_value(&mut self) -> Result<Option<Value>> {
        let progress = self
            .template
            .execute_copied(&self.pending, &mut self.parsed)
            .map_err(|e| self.locate(e))?;
        let root = match progress {
            Progress::Complete { root } => root,
            Progress::Incomplete => return Ok(None),
        };

        let value = project(self.template.arena(), root, self.config.raw_projection())?;

        self.offset += self.parsed as u64;
        self.pending.advance(self.parsed);
        self.parsed = 0;
        self.template.reset();
        Ok(Some(value))
    }

    /// Rebases a parse error from the held-back bytes onto the stream.
    fn locate(&self, err: Error) -> Error {
        match err {
            Error::Parse { offset, byte } => Error::Parse {
                offset: usize::try_from(self.offset)
                    .ok()
                    .and_then(|base| base.checked_add(offset))
                    .unwrap_or(usize::MAX),
                byte,
            },
            other => other,
        }
    }

    /// Takes the values a failed [`Unpacker::push`] completed before it hit
    /// the error.
    ///
    /// They are part of the stream up to [`Unpacker::offset`]. Returns an
    /// empty vector if the last push succeeded.
    pub fn take_completed(&mut self) -> Vec<Value> {
        std::mem::take(&mut self.completed)
    }

    /// Ends the stream.
    ///
    /// Returns the number of bytes that were still waiting to complete a
    /// value; they are discarded. The session is reset and can be reused.
    pub fn finish(&mut self) -> usize {
        let leftover = self.pending.len();
        if leftover > 0 {
            debug!(leftover, offset = self.offset, "stream ended inside a value");
        }
        self.reset();
        leftover
    }

    /// Resets the session for a new stream.
    ///
    /// Clears parse state, pending data, offset and values kept from a
    /// failed push.
    pub fn reset(&mut self) {
        self.template.reset();
        self.pending.clear();
        self.parsed = 0;
        self.offset = 0;
        self.completed.clear();
    }

    /// Returns the stream position just past the last completed value.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns the number of bytes held for the value in progress.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Returns the configuration used by this session.
    pub fn config(&self) -> &UnpackConfig {
        &self.config
    }

    /// Turns the session into an iterator over values read from `reader`.
    pub fn decode_reader<R: Read>(self, reader: R) -> ValueIter<R> {
        ValueIter::new(reader, self)
    }
}

impl Default for Unpacker {
    fn default() -> Self {
        Self::new(UnpackConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    #[test]
    fn test_push_empty() {
        let mut unpacker = Unpacker::default();
        assert!(unpacker.push(Bytes::new()).unwrap().is_empty());
        assert_eq!(unpacker.pending_len(), 0);
        assert_eq!(unpacker.finish(), 0);
    }

    #[test]
    fn test_byte_at_a_time() {
        let stream = b"\x82\xa1a\x01\xa1b\x92\xc3\xcb\x3f\xf8\x00\x00\x00\x00\x00\x00";
        let mut unpacker = Unpacker::default();
        let mut values = Vec::new();
        for byte in stream {
            values.extend(unpacker.push(vec![*byte]).unwrap());
        }

        assert_eq!(values.len(), 1);
        let map = values[0].as_map().unwrap();
        assert_eq!(map.get_str("a"), Some(&Value::Number(1.0)));
        assert_eq!(
            map.get_str("b"),
            Some(&Value::Array(vec![Value::Bool(true), Value::Number(1.5)]))
        );
        assert_eq!(unpacker.offset(), stream.len() as u64);
        assert_eq!(unpacker.pending_len(), 0);
    }

    #[test]
    fn test_several_values_in_one_push() {
        let mut unpacker = Unpacker::default();
        let values = unpacker.push(&b"\x01\x02\xa2h"[..]).unwrap();
        assert_eq!(values, [Value::from(1), Value::from(2)]);
        assert_eq!(unpacker.offset(), 2);
        assert_eq!(unpacker.pending_len(), 2);

        let values = unpacker.push(&b"i"[..]).unwrap();
        assert_eq!(values, [Value::from("hi")]);
        assert_eq!(unpacker.offset(), 5);
    }

    #[test]
    fn test_finish_reports_leftover() {
        let mut unpacker = Unpacker::default();
        assert!(unpacker.push(&b"\x92\x01"[..]).unwrap().is_empty());
        assert_eq!(unpacker.finish(), 2);
        assert_eq!(unpacker.offset(), 0);

        // reusable after finish
        assert_eq!(unpacker.push(&b"\xc2"[..]).unwrap(), [Value::Bool(false)]);
    }

    #[test]
    fn test_error_then_reset() {
        let mut unpacker = Unpacker::default();
        let err = unpacker.push(&b"\x01\xc1"[..]).unwrap_err();
        assert!(matches!(err, Error::Parse { offset: 1, byte: 0xc1 }));

        unpacker.reset();
        assert!(unpacker.take_completed().is_empty());
        assert_eq!(unpacker.push(&b"\x05"[..]).unwrap(), [Value::from(5)]);
    }

    #[test]
    fn test_failed_push_keeps_completed_values() {
        let mut unpacker = Unpacker::default();
        let err = unpacker.push(&b"\x01\x02\xc1"[..]).unwrap_err();

        assert!(matches!(err, Error::Parse { offset: 2, byte: 0xc1 }));
        assert_eq!(unpacker.offset(), 2);
        assert_eq!(unpacker.take_completed(), [Value::from(1), Value::from(2)]);
        assert!(unpacker.take_completed().is_empty());
    }

    #[test]
    fn test_parse_offset_counts_from_stream_start() {
        let mut unpacker = Unpacker::default();
        assert_eq!(unpacker.push(&b"\x01\x02\x92"[..]).unwrap().len(), 2);
        assert_eq!(unpacker.push(&b"\x03"[..]).unwrap().len(), 0);

        // 0xc1 sits at stream position 4, two bytes into the held-back value
        let err = unpacker.push(&b"\xc1"[..]).unwrap_err();
        assert!(matches!(err, Error::Parse { offset: 4, byte: 0xc1 }));
        assert!(unpacker.take_completed().is_empty());
    }

    #[test]
    fn test_large_raw_trickled_in() {
        let text = "x".repeat(70_000);
        let mut stream = vec![0xdb];
        stream.extend_from_slice(&(text.len() as u32).to_be_bytes());
        stream.extend_from_slice(text.as_bytes());
        stream.push(0x07);

        let mut unpacker = Unpacker::default();
        let mut values = Vec::new();
        for piece in stream.chunks(100) {
            values.extend(unpacker.push(piece).unwrap());
        }

        assert_eq!(values, [Value::from(text.as_str()), Value::from(7)]);
        assert_eq!(unpacker.pending_len(), 0);
        assert_eq!(unpacker.offset(), stream.len() as u64);
    }
}
