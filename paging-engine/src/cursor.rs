// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

//! Opaque cursor tokens.
//!
//! A token is URL-safe base64 (no padding) over a versioned binary frame:
//!
//! ```text
//! version:u8 | kind:u8 | key_count:u16 | key_count * (tag:u8 | len:u32 | payload) | metadata*
//! metadata = field_id:u8 | len:u16 | payload
//! ```
//!
//! Integers are big-endian. Metadata fields unknown to this version are
//! skipped on decode, so newer writers can append fields.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::DateTime;
use chrono::Utc;

use crate::error::CursorDecodeError;
use crate::error::PagingError;
use crate::order::OrderSpec;
use crate::query::project;
use crate::query::Record;
use crate::value::Value;

pub const CURSOR_VERSION: u8 = 1;

// Decode bound for untrusted token input.
const MAX_CURSOR_TOKEN_LEN: usize = 8 * 1024;

const KIND_ABSOLUTE: u8 = 0;
const KIND_RELATIVE: u8 = 1;

const FIELD_OFFSET: u8 = 1;
const FIELD_PAGE_INDEX: u8 = 2;
const FIELD_TOTAL_COUNT: u8 = 3;

/// Page metadata carried by a relative cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorPageInfo {
    /// Whole pages to jump past the boundary item. Positive moves forward.
    pub offset: i64,
    pub page_index: Option<usize>,
    pub total_count: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cursor {
    /// Anchors "continue from this boundary item".
    Absolute { values: Vec<Value> },
    /// Boundary item plus page metadata for page jumps.
    Relative { values: Vec<Value>, page: CursorPageInfo },
}

impl Cursor {
    pub fn values(&self) -> &[Value] {
        match self {
            Cursor::Absolute { values } | Cursor::Relative { values, .. } => values,
        }
    }

    pub fn into_values(self) -> Vec<Value> {
        match self {
            Cursor::Absolute { values } | Cursor::Relative { values, .. } => values,
        }
    }

    pub fn is_relative(&self) -> bool {
        matches!(self, Cursor::Relative { .. })
    }

    pub fn page_info(&self) -> Option<&CursorPageInfo> {
        match self {
            Cursor::Absolute { .. } => None,
            Cursor::Relative { page, .. } => Some(page),
        }
    }

    pub fn offset(&self) -> i64 {
        self.page_info().map(|page| page.offset).unwrap_or(0)
    }

    pub fn page_index(&self) -> Option<usize> {
        self.page_info().and_then(|page| page.page_index)
    }

    pub fn total_count(&self) -> Option<usize> {
        self.page_info().and_then(|page| page.total_count)
    }
}

pub struct CursorCodec;

impl CursorCodec {
    pub fn encode(values: &[Value], page: Option<&CursorPageInfo>) -> String {
        let mut frame = Vec::with_capacity(16 + values.len() * 12);
        frame.push(CURSOR_VERSION);
        frame.push(if page.is_some() { KIND_RELATIVE } else { KIND_ABSOLUTE });
        frame.extend_from_slice(&(values.len() as u16).to_be_bytes());

        for value in values {
            let payload = value_payload(value);
            frame.push(value.type_tag());
            frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
            frame.extend_from_slice(&payload);
        }

        if let Some(page) = page {
            write_field(&mut frame, FIELD_OFFSET, &page.offset.to_be_bytes());
            if let Some(page_index) = page.page_index {
                write_field(&mut frame, FIELD_PAGE_INDEX, &(page_index as u64).to_be_bytes());
            }
            if let Some(total_count) = page.total_count {
                write_field(&mut frame, FIELD_TOTAL_COUNT, &(total_count as u64).to_be_bytes());
            }
        }

        URL_SAFE_NO_PAD.encode(frame)
    }

    /// Projects the order keys of `item` and encodes them.
    pub fn encode_item<R: Record + ?Sized>(
        item: &R,
        spec: &OrderSpec,
        page: Option<&CursorPageInfo>,
    ) -> Result<String, PagingError> {
        Ok(Self::encode(&project(item, spec)?, page))
    }

    pub fn decode(token: &str) -> Result<Cursor, CursorDecodeError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(CursorDecodeError::Empty);
        }
        if token.len() > MAX_CURSOR_TOKEN_LEN {
            return Err(CursorDecodeError::TooLong {
                len: token.len(),
                max: MAX_CURSOR_TOKEN_LEN,
            });
        }

        let frame = URL_SAFE_NO_PAD.decode(token).map_err(|_| CursorDecodeError::InvalidBase64)?;
        let mut reader = FrameReader::new(&frame);

        let version = reader.u8()?;
        if version != CURSOR_VERSION {
            return Err(CursorDecodeError::UnsupportedVersion(version));
        }

        let kind = reader.u8()?;
        if kind != KIND_ABSOLUTE && kind != KIND_RELATIVE {
            return Err(CursorDecodeError::UnknownKind(kind));
        }

        let key_count = reader.u16()? as usize;
        let mut values = Vec::with_capacity(key_count);
        for _ in 0..key_count {
            let tag = reader.u8()?;
            let len = reader.u32()? as usize;
            values.push(decode_value(tag, reader.take(len)?)?);
        }

        let mut page = CursorPageInfo::default();
        while !reader.is_done() {
            let field = reader.u8()?;
            let len = reader.u16()? as usize;
            let payload = reader.take(len)?;
            match field {
                FIELD_OFFSET => page.offset = i64::from_be_bytes(fixed(field, payload)?),
                FIELD_PAGE_INDEX => {
                    page.page_index = Some(u64::from_be_bytes(fixed(field, payload)?) as usize)
                }
                FIELD_TOTAL_COUNT => {
                    page.total_count = Some(u64::from_be_bytes(fixed(field, payload)?) as usize)
                }
                unknown => {
                    tracing::trace!(target: "paging", field = unknown, "skip unknown cursor field");
                }
            }
        }

        Ok(match kind {
            KIND_RELATIVE => Cursor::Relative { values, page },
            _ => Cursor::Absolute { values },
        })
    }

    /// Decodes `token` and checks it against the current order.
    pub fn decode_for(token: &str, spec: &OrderSpec) -> Result<Cursor, CursorDecodeError> {
        let cursor = Self::decode(token)?;
        if cursor.values().len() != spec.len() {
            return Err(CursorDecodeError::KeyCountMismatch {
                expected: spec.len(),
                actual: cursor.values().len(),
            });
        }
        Ok(cursor)
    }
}

fn write_field(frame: &mut Vec<u8>, field: u8, payload: &[u8]) {
    frame.push(field);
    frame.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    frame.extend_from_slice(payload);
}

fn value_payload(value: &Value) -> Vec<u8> {
    match value {
        Value::Null => Vec::new(),
        Value::Bool(v) => vec![*v as u8],
        Value::Int(v) => v.to_be_bytes().to_vec(),
        Value::Float(v) => v.to_bits().to_be_bytes().to_vec(),
        Value::Text(v) => v.as_bytes().to_vec(),
        Value::Bytes(v) => v.clone(),
        Value::Timestamp(v) => {
            let mut payload = v.timestamp().to_be_bytes().to_vec();
            payload.extend_from_slice(&v.timestamp_subsec_nanos().to_be_bytes());
            payload
        }
    }
}

fn decode_value(tag: u8, payload: &[u8]) -> Result<Value, CursorDecodeError> {
    Ok(match tag {
        0 => Value::Null,
        1 => match payload {
            [0] => Value::Bool(false),
            [1] => Value::Bool(true),
            _ => return Err(CursorDecodeError::InvalidPayload(tag)),
        },
        2 => Value::Int(i64::from_be_bytes(fixed(tag, payload)?)),
        3 => Value::Float(f64::from_bits(u64::from_be_bytes(fixed(tag, payload)?))),
        4 => Value::Text(
            String::from_utf8(payload.to_vec()).map_err(|_| CursorDecodeError::InvalidUtf8)?,
        ),
        5 => Value::Bytes(payload.to_vec()),
        6 => {
            let raw: [u8; 12] = fixed(tag, payload)?;
            let (secs, nanos) = raw.split_at(8);
            let secs = i64::from_be_bytes(fixed(tag, secs)?);
            let nanos = u32::from_be_bytes(fixed(tag, nanos)?);
            let timestamp = DateTime::<Utc>::from_timestamp(secs, nanos)
                .ok_or(CursorDecodeError::InvalidPayload(tag))?;
            Value::Timestamp(timestamp)
        }
        unknown => return Err(CursorDecodeError::UnknownValueTag(unknown)),
    })
}

fn fixed<const N: usize>(tag: u8, payload: &[u8]) -> Result<[u8; N], CursorDecodeError> {
    payload.try_into().map_err(|_| CursorDecodeError::InvalidPayload(tag))
}

struct FrameReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> FrameReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    fn is_done(&self) -> bool {
        self.position >= self.bytes.len()
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CursorDecodeError> {
        let end = self.position.checked_add(len).ok_or(CursorDecodeError::Truncated)?;
        let slice = self.bytes.get(self.position..end).ok_or(CursorDecodeError::Truncated)?;
        self.position = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, CursorDecodeError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, CursorDecodeError> {
        let raw = self.take(2)?;
        Ok(u16::from_be_bytes([raw[0], raw[1]]))
    }

    fn u32(&mut self) -> Result<u32, CursorDecodeError> {
        let raw = self.take(4)?;
        Ok(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }
}
