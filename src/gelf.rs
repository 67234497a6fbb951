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

//! GELF 1.1 message construction.
//!
//! [GELF] messages are JSON objects with a handful of well-known fields (`version`, `host`,
//! `short_message`, `full_message`, `timestamp` & `level`) plus any number of "additional" fields,
//! whose names must begin with an underscore. [`GelfMessage`] assembles such an object into a
//! [`LogRecord`] ready for a [`Client`].
//!
//! [GELF]: https://go2docs.graylog.org/current/getting_in_log_data/gelf.html
//! [`Client`]: crate::client::Client
//!
//! ```rust
//! use gelf_udp::{gelf::GelfMessage, level::Level};
//!
//! let record = GelfMessage::builder("Hello, world!")
//!     .host("bree.local")
//!     .level(Level::LOG_NOTICE)
//!     .additional("user_id", 9001)
//!     .build()
//!     .into_record();
//! assert_eq!(record.get("short_message").unwrap(), "Hello, world!");
//! assert_eq!(record.get("_user_id").unwrap(), 9001);
//! ```

use crate::{
    error::{Error, Result},
    level::Level,
    record::{LogRecord, Value},
};

use backtrace::Backtrace;
use chrono::prelude::*;

/// The GELF version we speak
pub const GELF_VERSION: &str = "1.1";

/// Attempt to figure-out the name of this host, for the GELF `host` field.
pub fn discover_hostname() -> Result<String> {
    hostname::get()
        .map_err(|err| Error::NoHostname {
            source: Box::new(err),
            back: Backtrace::new(),
        })
        // `hostname::get()` returns an `OsString`; GELF wants UTF-8, & an empty host is useless
        .and_then(|hn| match hn.into_string() {
            Ok(s) if !s.is_empty() => Ok(s),
            Ok(_) => Err(Error::NoHostname {
                source: "empty hostname".into(),
                back: Backtrace::new(),
            }),
            Err(os) => Err(Error::NoHostname {
                source: format!("{:?} is not UTF-8", os).into(),
                back: Backtrace::new(),
            }),
        })
}

/// Pick a value for the GELF `host` field; this cannot fail.
///
/// The order of preference is:
///
/// 1. the host name as reported by [gethostname()]
/// 2. a local IP address
/// 3. "localhost"
///
/// [gethostname()]: https://man7.org/linux/man-pages/man2/gethostname.2.html
pub fn default_host() -> String {
    discover_hostname()
        .or_else(|_| local_ip_address::local_ip().map(|ip| ip.to_string()))
        .unwrap_or_else(|_| "localhost".to_owned())
}

/// Prefix `name` with an underscore, unless it has one already.
pub fn additional_field_name(name: &str) -> String {
    if name.starts_with('_') {
        name.to_owned()
    } else {
        format!("_{}", name)
    }
}

/// A single GELF message.
#[derive(Clone, Debug, PartialEq)]
pub struct GelfMessage {
    host: String,
    short_message: String,
    full_message: Option<String>,
    timestamp: DateTime<Utc>,
    level: Level,
    additional: Vec<(String, Value)>,
}

impl GelfMessage {
    pub fn builder<S: Into<String>>(short_message: S) -> GelfMessageBuilder {
        GelfMessageBuilder {
            host: None,
            short_message: short_message.into(),
            full_message: None,
            timestamp: None,
            level: Level::default(),
            additional: Vec::new(),
        }
    }
    pub fn host(&self) -> &str {
        &self.host
    }
    pub fn short_message(&self) -> &str {
        &self.short_message
    }
    pub fn level(&self) -> Level {
        self.level
    }
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
    /// Lay this message out as a GELF JSON object.
    ///
    /// `timestamp` is seconds since the epoch with millisecond precision, as GELF prescribes.
    /// Later additional fields with the same name replace earlier ones.
    pub fn into_record(self) -> LogRecord {
        let mut record = LogRecord::new();
        record.insert("version", GELF_VERSION);
        record.insert("host", self.host);
        record.insert("short_message", self.short_message);
        if let Some(full) = self.full_message {
            record.insert("full_message", full);
        }
        record.insert(
            "timestamp",
            self.timestamp.timestamp_millis() as f64 / 1000.0,
        );
        record.insert("level", self.level as u8);
        for (name, value) in self.additional {
            record.insert(name, value);
        }
        record
    }
}

pub struct GelfMessageBuilder {
    host: Option<String>,
    short_message: String,
    full_message: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    level: Level,
    additional: Vec<(String, Value)>,
}

impl GelfMessageBuilder {
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = Some(host.into());
        self
    }
    pub fn full_message<S: Into<String>>(mut self, full_message: S) -> Self {
        self.full_message = Some(full_message.into());
        self
    }
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }
    /// Add field `name` (an underscore will be prepended if needed)
    pub fn additional<V: Into<Value>>(mut self, name: &str, value: V) -> Self {
        self.additional
            .push((additional_field_name(name), value.into()));
        self
    }
    /// Host defaults to [`default_host`], timestamp to now.
    pub fn build(self) -> GelfMessage {
        GelfMessage {
            host: self.host.unwrap_or_else(default_host),
            short_message: self.short_message,
            full_message: self.full_message,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            level: self.level,
            additional: self.additional,
        }
    }
}

#[cfg(test)]
mod test {

    use super::*;

    use crate::validate::Validator;

    #[test]
    fn host_discovery() {
        // At least _exercise_ these
        let _ = discover_hostname();
        assert!(!default_host().is_empty());
    }

    #[test]
    fn field_names() {
        assert_eq!(additional_field_name("user"), "_user");
        assert_eq!(additional_field_name("_user"), "_user");
        assert_eq!(additional_field_name(""), "_");
    }

    #[test]
    fn layout() {
        let record = GelfMessage::builder("Hello, 世界!")
            .host("bree.local")
            .full_message("Hello, 世界!\nwith a backtrace")
            .timestamp(Utc.timestamp_millis_opt(1_385_053_862_307).unwrap())
            .level(Level::LOG_ERR)
            .additional("user_id", 9001)
            .additional("_some_info", "foo")
            .build()
            .into_record();

        assert_eq!(
            std::str::from_utf8(&record.to_bytes().unwrap()).unwrap(),
            r#"{"_some_info":"foo","_user_id":9001,"full_message":"Hello, 世界!\nwith a backtrace","host":"bree.local","level":3,"short_message":"Hello, 世界!","timestamp":1385053862.307,"version":"1.1"}"#
        );
        assert!(Validator::default().validate(&record).is_ok());
    }

    #[test]
    fn defaults() {
        let before = Utc::now();
        let msg = GelfMessage::builder("Hi").build();
        assert_eq!(msg.short_message(), "Hi");
        assert_eq!(msg.level(), Level::LOG_INFO);
        assert_eq!(msg.host(), default_host());
        assert!(msg.timestamp() >= before);

        let record = msg.into_record();
        assert!(!record.contains_key("full_message"));
        assert_eq!(record.get("version").unwrap(), "1.1");
        assert_eq!(record.get("level").unwrap(), 6);
    }

    #[test]
    fn reserved_additional_field() {
        // "id" becomes "_id", which Graylog reserves
        let record = GelfMessage::builder("Hi").additional("id", 1).build().into_record();
        assert!(Validator::default().validate(&record).is_err());
    }
}
