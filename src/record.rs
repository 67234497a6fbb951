// Copyright (C) 2026 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of gelf-udp.
//
// gelf-udp is free software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// gelf-udp is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without
// even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with gelf-udp.  If not,
// see <http://www.gnu.org/licenses/>.

//! GELF log records & their JSON encoding.
//!
//! A [`LogRecord`] is the decoded form of a GELF message: a mapping from field name to [`Value`].
//! [`Value`] is [`serde_json::Value`]-- a tagged variant over null, booleans, numbers, strings,
//! sequences & nested mappings-- so every field a caller can express survives encoding.
//!
//! [`encode`] is the step between a caller's raw message & the bytes handed to the chunker: it
//! decodes text to a [`LogRecord`] where necessary, runs the [`Validator`] against the structured
//! form, then serializes it.
//!
//! # Examples
//!
//! ```rust
//! use gelf_udp::record::{encode, LogRecord, RawMessage};
//! use gelf_udp::validate::Validator;
//!
//! let raw = RawMessage::from(r#"{"version": "1.1", "host": "bree", "short_message": "Hi!"}"#);
//! let bytes = encode(&raw, &Validator::default()).unwrap();
//! let record = LogRecord::from_slice(&bytes).unwrap();
//! assert_eq!(record.get("host").unwrap(), "bree");
//!
//! let raw = RawMessage::from(r#"{"_id": "23", "short_message": "Hi!"}"#);
//! assert!(encode(&raw, &Validator::default()).is_err());
//! ```

use crate::{
    error::{Error, Result},
    validate::Validator,
};

use backtrace::Backtrace;

type StdResult<T, E> = std::result::Result<T, E>;

/// The value of a single GELF field
pub type Value = serde_json::Value;

/// A decoded GELF message: field names mapped to [`Value`]s.
///
/// Keys iterate in sorted order, which makes both the encoding & validation diagnostics
/// deterministic.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LogRecord(serde_json::Map<String, Value>);

impl LogRecord {
    pub fn new() -> LogRecord {
        LogRecord(serde_json::Map::new())
    }
    /// Decode `text`, which must be a JSON object.
    pub fn from_json(text: &str) -> Result<LogRecord> {
        LogRecord::from_value(serde_json::from_str(text).map_err(|err| Error::Decode {
            source: Box::new(err),
            back: Backtrace::new(),
        })?)
    }
    /// Decode `buf`, which must be a UTF-8 encoded JSON object.
    pub fn from_slice(buf: &[u8]) -> Result<LogRecord> {
        LogRecord::from_value(serde_json::from_slice(buf).map_err(|err| Error::Decode {
            source: Box::new(err),
            back: Backtrace::new(),
        })?)
    }
    fn from_value(value: Value) -> Result<LogRecord> {
        match value {
            Value::Object(map) => Ok(LogRecord(map)),
            other => Err(Error::Decode {
                source: format!("expected a JSON object, got {}", other).into(),
                back: Backtrace::new(),
            }),
        }
    }
    /// Set field `name` to `value`, returning the prior value, if any.
    pub fn insert<K: Into<String>, V: Into<Value>>(&mut self, name: K, value: V) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }
    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    /// Serialize this record to compact JSON.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.0).map_err(|err| Error::Encode {
            source: Box::new(err),
            back: Backtrace::new(),
        })
    }
}

impl std::convert::From<serde_json::Map<String, Value>> for LogRecord {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        LogRecord(map)
    }
}

impl std::convert::TryFrom<Value> for LogRecord {
    type Error = Error;
    fn try_from(value: Value) -> StdResult<Self, Self::Error> {
        LogRecord::from_value(value)
    }
}

/// A message as handed to us by a caller: either JSON text, or an already-decoded record.
#[derive(Clone, Debug, PartialEq)]
pub enum RawMessage {
    Text(String),
    Record(LogRecord),
}

impl std::convert::From<&str> for RawMessage {
    fn from(text: &str) -> Self {
        RawMessage::Text(text.to_owned())
    }
}

impl std::convert::From<String> for RawMessage {
    fn from(text: String) -> Self {
        RawMessage::Text(text)
    }
}

impl std::convert::From<LogRecord> for RawMessage {
    fn from(record: LogRecord) -> Self {
        RawMessage::Record(record)
    }
}

/// Produce the bytes to be transmitted for `raw`.
///
/// Text is always decoded first, so that `validator` sees the structured form before a single
/// byte is produced; what goes out on the wire is the canonical re-encoding of that form.
pub fn encode(raw: &RawMessage, validator: &Validator) -> Result<Vec<u8>> {
    match raw {
        RawMessage::Text(text) => {
            let record = LogRecord::from_json(text)?;
            validator.validate(&record)?;
            record.to_bytes()
        }
        RawMessage::Record(record) => {
            validator.validate(record)?;
            record.to_bytes()
        }
    }
}
