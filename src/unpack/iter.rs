//! Reader-driven decoding.

use std::collections::VecDeque;
use std::io::{self, Read};

use crate::error::{Error, Result};
use crate::value::Value;

use super::session::Unpacker;

/// Bytes requested from the reader per read call.
const READ_BLOCK_SIZE: usize = 8192;

/// An iterator that yields values decoded from a reader.
///
/// Reads up to 8 KiB at a time and feeds them through an [`Unpacker`].
/// If the reader ends in the middle of a value the last item is an
/// [`io::ErrorKind::UnexpectedEof`] error. A decode error is yielded after
/// the values that precede the bad bytes, and ends the iteration.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use msgpack_bridge::{Unpacker, Value};
///
/// let reader = Cursor::new(b"\x01\xc3".to_vec());
/// let values: Vec<Value> = Unpacker::default()
///     .decode_reader(reader)
///     .collect::<Result<_, _>>()?;
///
/// assert_eq!(values, [Value::from(1), Value::Bool(true)]);
/// # Ok::<(), msgpack_bridge::Error>(())
/// ```
pub struct ValueIter<R> {
    reader: R,
    unpacker: Unpacker,
    ready: VecDeque<Value>,
    block: Vec<u8>,
    failed: Option<Error>,
    finished: bool,
}

impl<R: Read> ValueIter<R> {
    pub(crate) fn new(reader: R, unpacker: Unpacker) -> Self {
        Self {
            reader,
            unpacker,
            ready: VecDeque::new(),
            block: vec![0u8; READ_BLOCK_SIZE],
            failed: None,
            finished: false,
        }
    }

    /// Returns the underlying session.
    pub fn unpacker(&self) -> &Unpacker {
        &self.unpacker
    }
}

impl<R: Read> Iterator for ValueIter<R> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(value) = self.ready.pop_front() {
                return Some(Ok(value));
            }
            if let Some(e) = self.failed.take() {
                return Some(Err(e));
            }
            if self.finished {
                return None;
            }

            match self.reader.read(&mut self.block) {
                Ok(0) => {
                    self.finished = true;
                    let leftover = self.unpacker.finish();
                    if leftover > 0 {
                        return Some(Err(Error::Io(io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            format!("stream ended with {leftover} bytes of an incomplete value"),
                        ))));
                    }
                    return None;
                }
                Ok(n) => match self.unpacker.push(&self.block[..n]) {
                    Ok(values) => self.ready.extend(values),
                    Err(e) => {
                        self.finished = true;
                        self.ready.extend(self.unpacker.take_completed());
                        self.failed = Some(e);
                    }
                },
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e.into()));
                }
            }
        }
    }
}
