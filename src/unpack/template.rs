//! The decoder state machine.
//!
//! Parsing is token-at-a-time with an explicit container stack, so nesting
//! never recurses. Each token (tag plus its fixed-size payload) is read
//! atomically: if the buffer ends inside a token, the offset stays at the
//! token's first byte and the machine reports `Incomplete`. Everything
//! parsed so far stays in the arena and on the stack, so a later call with
//! the same bytes plus more resumes at that token instead of starting over.
//!
//! Raw payloads either slice a shared input buffer or are copied into the
//! arena heap, so a partial value never pins a buffer the caller is still
//! growing.

use bytes::Bytes;

use crate::config::UnpackConfig;
use crate::error::{Error, Result};
use crate::object::{Arena, Object, Raw, RawKind};

/// Outcome of [`Template::execute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Progress {
    /// A top-level value is complete; `root` is its arena index.
    Complete { root: usize },
    /// More bytes are needed.
    Incomplete,
}

/// One token read from the wire.
#[derive(Debug)]
enum Token {
    Scalar(Object),
    /// Payload at `start..start + len` of the input.
    Raw {
        start: usize,
        len: usize,
        kind: RawKind,
    },
    Array(usize),
    Map(usize),
}

/// An open container waiting for children.
#[derive(Debug, Clone, Copy)]
struct Frame {
    first: usize,
    slots: usize,
    filled: usize,
}

/// Resumable parse state for one top-level value.
#[derive(Debug)]
pub(crate) struct Template {
    config: UnpackConfig,
    arena: Arena,
    stack: Vec<Frame>,
    root: Option<usize>,
}

impl Template {
    pub(crate) fn new(config: UnpackConfig) -> Self {
        Self {
            config,
            arena: Arena::new(),
            stack: Vec::new(),
            root: None,
        }
    }

    /// Discards any partial or complete value.
    pub(crate) fn reset(&mut self) {
        self.arena.clear();
        self.stack.clear();
        self.root = None;
    }

    pub(crate) fn arena(&self) -> &Arena {
        &self.arena
    }

    pub(crate) fn into_arena(self) -> Arena {
        self.arena
    }

    /// Parses tokens from `data` starting at `*off` until a top-level value
    /// completes or the data runs out. `*off` is advanced past every token
    /// consumed.
    ///
    /// Raw payloads are slices of `data`.
    pub(crate) fn execute(&mut self, data: &Bytes, off: &mut usize) -> Result<Progress> {
        self.run(data, Some(data), off)
    }

    /// Like [`Template::execute`], but raw payloads are copied into the
    /// arena.
    pub(crate) fn execute_copied(&mut self, data: &[u8], off: &mut usize) -> Result<Progress> {
        self.run(data, None, off)
    }

    fn run(&mut self, data: &[u8], owner: Option<&Bytes>, off: &mut usize) -> Result<Progress> {
        loop {
            if let Some(root) = self.root {
                if self.stack.is_empty() {
                    return Ok(Progress::Complete { root });
                }
            }

            let Some((token, next)) = self.read_token(data, *off)? else {
                return Ok(Progress::Incomplete);
            };
            *off = next;
            self.accept(token, data, owner)?;
        }
    }

    fn accept(&mut self, token: Token, data: &[u8], owner: Option<&Bytes>) -> Result<()> {
        match token {
            Token::Scalar(object) => {
                self.place(object);
            }
            Token::Raw { start, len, kind } => {
                let end = start + len;
                let raw = match owner {
                    Some(owner) => Raw::shared(owner.slice(start..end), kind),
                    None => self.arena.alloc_raw(&data[start..end], kind),
                };
                self.place(Object::Raw(raw));
            }
            Token::Array(0) => {
                let first = self.arena.len();
                self.place(Object::Array { first, len: 0 });
            }
            Token::Map(0) => {
                let first = self.arena.len();
                self.place(Object::Map { first, len: 0 });
            }
            Token::Array(len) => return self.open(Object::Array { first: 0, len }),
            Token::Map(len) => return self.open(Object::Map { first: 0, len }),
        }
        self.close_full_frames();
        Ok(())
    }

    /// Puts a node in the next open slot, or makes it the root.
    fn place(&mut self, object: Object) -> usize {
        match self.stack.last_mut() {
            Some(frame) => {
                let index = frame.first + frame.filled;
                frame.filled += 1;
                self.arena.set(index, object);
                index
            }
            None => {
                let index = self.arena.push(object);
                self.root = Some(index);
                index
            }
        }
    }

    fn open(&mut self, container: Object) -> Result<()> {
        if let Some(max) = self.config.max_depth() {
            if self.stack.len() >= max {
                return Err(Error::LimitExceeded {
                    what: "nesting depth",
                    actual: self.stack.len() + 1,
                    max,
                });
            }
        }

        let slot = self.place(Object::Vacant);
        let slots = container.slot_count();
        let first = self.arena.reserve(slots);
        let object = match container {
            Object::Map { len, .. } => Object::Map { first, len },
            Object::Array { len, .. } => Object::Array { first, len },
            other => other,
        };
        self.arena.set(slot, object);
        self.stack.push(Frame {
            first,
            slots,
            filled: 0,
        });
        Ok(())
    }

    fn close_full_frames(&mut self) {
        while let Some(frame) = self.stack.last() {
            if frame.filled < frame.slots {
                break;
            }
            self.stack.pop();
        }
    }

    /// Reads the token at `pos`. Returns `None` if it is not complete.
    fn read_token(&self, data: &[u8], pos: usize) -> Result<Option<(Token, usize)>> {
        let Some(&byte) = data.get(pos) else {
            return Ok(None);
        };
        let mut r = Reader { data, pos: pos + 1 };

        macro_rules! need {
            ($e:expr) => {
                match $e {
                    Some(v) => v,
                    None => return Ok(None),
                }
            };
        }

        let token = match byte {
            0x00..=0x7f => Token::Scalar(Object::PositiveInteger(byte as u64)),
            0x80..=0x8f => Token::Map((byte & 0x0f) as usize),
            0x90..=0x9f => Token::Array((byte & 0x0f) as usize),
            0xa0..=0xbf => need!(r.raw((byte & 0x1f) as usize, RawKind::Text)),
            0xc0 => Token::Scalar(Object::Nil),
            0xc2 => Token::Scalar(Object::Boolean(false)),
            0xc3 => Token::Scalar(Object::Boolean(true)),
            0xc4 => {
                let len = need!(r.u8()) as usize;
                need!(r.raw(len, RawKind::Binary))
            }
            0xc5 => {
                let len = need!(r.u16()) as usize;
                need!(r.raw(len, RawKind::Binary))
            }
            0xc6 => {
                let len = need!(r.u32()) as usize;
                need!(r.raw(len, RawKind::Binary))
            }
            0xca => Token::Scalar(Object::Float(f32::from_be_bytes(need!(r.array())) as f64)),
            0xcb => Token::Scalar(Object::Float(f64::from_be_bytes(need!(r.array())))),
            0xcc => Token::Scalar(Object::PositiveInteger(need!(r.u8()) as u64)),
            0xcd => Token::Scalar(Object::PositiveInteger(need!(r.u16()) as u64)),
            0xce => Token::Scalar(Object::PositiveInteger(need!(r.u32()) as u64)),
            0xcf => Token::Scalar(Object::PositiveInteger(u64::from_be_bytes(need!(r.array())))),
            0xd0 => Token::Scalar(signed(i8::from_be_bytes(need!(r.array())) as i64)),
            0xd1 => Token::Scalar(signed(i16::from_be_bytes(need!(r.array())) as i64)),
            0xd2 => Token::Scalar(signed(i32::from_be_bytes(need!(r.array())) as i64)),
            0xd3 => Token::Scalar(signed(i64::from_be_bytes(need!(r.array())))),
            0xd9 => {
                let len = need!(r.u8()) as usize;
                need!(r.raw(len, RawKind::Text))
            }
            0xda => {
                let len = need!(r.u16()) as usize;
                need!(r.raw(len, RawKind::Text))
            }
            0xdb => {
                let len = need!(r.u32()) as usize;
                need!(r.raw(len, RawKind::Text))
            }
            0xdc => Token::Array(need!(r.u16()) as usize),
            0xdd => Token::Array(need!(r.u32()) as usize),
            0xde => Token::Map(need!(r.u16()) as usize),
            0xdf => Token::Map(need!(r.u32()) as usize),
            0xe0..=0xff => Token::Scalar(Object::NegativeInteger(byte as i8 as i64)),
            // 0xc1 is never used; ext and fixext types are not supported
            0xc1 | 0xc7..=0xc9 | 0xd4..=0xd8 => {
                return Err(Error::Parse { offset: pos, byte });
            }
        };

        if let Token::Array(len) | Token::Map(len) = token {
            if let Some(max) = self.config.max_container_len() {
                if len > max {
                    return Err(Error::LimitExceeded {
                        what: "container length",
                        actual: len,
                        max,
                    });
                }
            }
            // Every child takes at least one byte; a length the buffer
            // cannot possibly satisfy yet is not worth reserving slots for.
            let slots = if matches!(token, Token::Map(_)) {
                len.saturating_mul(2)
            } else {
                len
            };
            if slots > r.remaining() {
                return Ok(None);
            }
        }

        Ok(Some((token, r.pos)))
    }
}

/// Normalizes a signed wire integer.
fn signed(n: i64) -> Object {
    if n >= 0 {
        Object::PositiveInteger(n as u64)
    } else {
        Object::NegativeInteger(n)
    }
}

/// Bounds-checked big-endian reads over a buffer.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    fn array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos.checked_add(N)?)?;
        self.pos += N;
        bytes.try_into().ok()
    }

    fn u8(&mut self) -> Option<u8> {
        self.array::<1>().map(|b| b[0])
    }

    fn u16(&mut self) -> Option<u16> {
        self.array().map(u16::from_be_bytes)
    }

    fn u32(&mut self) -> Option<u32> {
        self.array().map(u32::from_be_bytes)
    }

    fn raw(&mut self, len: usize, kind: RawKind) -> Option<Token> {
        if len > self.remaining() {
            return None;
        }
        let start = self.pos;
        self.pos += len;
        Some(Token::Raw { start, len, kind })
    }
}
