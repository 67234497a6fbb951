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

//! Reserved-field checks.
//!
//! Graylog assigns `_id` itself; a message that sets it will be rejected or misfiled by the
//! server, silently, since nothing comes back over UDP. [`Validator`] catches that before anything
//! is sent.

use crate::{
    error::{Error, Result},
    record::LogRecord,
};

use backtrace::Backtrace;

use std::collections::HashSet;

/// Field names Graylog reserves by default
pub const RESERVED_FIELDS: &[&str] = &["_id"];

/// Rejects [`LogRecord`]s carrying reserved top-level field names.
///
/// Matching is exact & case-sensitive; nested mappings aren't inspected.
#[derive(Clone, Debug)]
pub struct Validator {
    reserved: HashSet<String>,
}

impl std::default::Default for Validator {
    fn default() -> Self {
        Validator::new(RESERVED_FIELDS.iter().copied())
    }
}

impl Validator {
    /// Construct a [`Validator`] reserving exactly `names`.
    pub fn new<I, S>(names: I) -> Validator
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Validator {
            reserved: names.into_iter().map(Into::into).collect(),
        }
    }
    /// Reserve `name` in addition to whatever this [`Validator`] already rejects.
    pub fn with_reserved<S: Into<String>>(mut self, name: S) -> Validator {
        self.reserved.insert(name.into());
        self
    }
    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.contains(name)
    }
    /// Fail with [`Error::ForbiddenField`] naming the first reserved key in `record`.
    pub fn validate(&self, record: &LogRecord) -> Result<()> {
        match record.keys().find(|k| self.is_reserved(k)) {
            Some(name) => Err(Error::ForbiddenField {
                name: name.to_owned(),
                back: Backtrace::new(),
            }),
            None => Ok(()),
        }
    }
}
