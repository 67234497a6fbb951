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

//! Client configuration.
//!
//! [`Config`] is a plain, immutable value; every field has a default, so
//! `Config::default()` sends to Graylog's standard GELF UDP port on the local host, sizing chunks
//! for a WAN path:
//!
//! ```rust
//! use gelf_udp::config::{Config, Connection};
//! let config = Config::builder()
//!     .hostname("graylog.example.com")
//!     .connection(Connection::Lan)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.destination(), "graylog.example.com:12201");
//! assert_eq!(config.chunk_ceiling(), 8154);
//! ```

use crate::error::{Error, Result};

use backtrace::Backtrace;

type StdResult<T, E> = std::result::Result<T, E>;

pub const DEFAULT_GRAYLOG_HOSTNAME: &str = "127.0.0.1";
pub const DEFAULT_GRAYLOG_PORT: u16 = 12201;
pub const DEFAULT_MAX_CHUNK_SIZE_WAN: usize = 1420;
pub const DEFAULT_MAX_CHUNK_SIZE_LAN: usize = 8154;

/// The class of network path between us & Graylog.
///
/// LAN segments will carry larger UDP payloads than WAN paths before IP fragmentation kicks-in,
/// so each gets its own chunk ceiling.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Connection {
    #[default]
    Wan,
    Lan,
}

impl std::fmt::Display for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(
            f,
            "{}",
            match self {
                Connection::Wan => "wan",
                Connection::Lan => "lan",
            }
        )
    }
}

/// Only exactly "lan" names a LAN; anything else is treated as a WAN.
impl std::convert::From<&str> for Connection {
    fn from(s: &str) -> Self {
        if s == "lan" {
            Connection::Lan
        } else {
            Connection::Wan
        }
    }
}

impl std::str::FromStr for Connection {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> StdResult<Self, Self::Err> {
        Ok(Connection::from(s))
    }
}

/// Where & how to send GELF messages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    hostname: String,
    port: u16,
    connection: Connection,
    max_chunk_size_wan: usize,
    max_chunk_size_lan: usize,
}

impl std::default::Default for Config {
    fn default() -> Self {
        Config {
            hostname: DEFAULT_GRAYLOG_HOSTNAME.to_owned(),
            port: DEFAULT_GRAYLOG_PORT,
            connection: Connection::Wan,
            max_chunk_size_wan: DEFAULT_MAX_CHUNK_SIZE_WAN,
            max_chunk_size_lan: DEFAULT_MAX_CHUNK_SIZE_LAN,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder {
            imp: Config::default(),
        }
    }
    pub fn hostname(&self) -> &str {
        &self.hostname
    }
    pub fn port(&self) -> u16 {
        self.port
    }
    pub fn connection(&self) -> Connection {
        self.connection
    }
    pub fn max_chunk_size_wan(&self) -> usize {
        self.max_chunk_size_wan
    }
    pub fn max_chunk_size_lan(&self) -> usize {
        self.max_chunk_size_lan
    }
    /// "hostname:port", suitable for [`std::net::ToSocketAddrs`]
    pub fn destination(&self) -> String {
        if self.hostname.contains(':') && !self.hostname.starts_with('[') {
            // bare IPv6 literal
            format!("[{}]:{}", self.hostname, self.port)
        } else {
            format!("{}:{}", self.hostname, self.port)
        }
    }
    /// The largest payload that may be sent without chunking, given our [`Connection`].
    pub fn chunk_ceiling(&self) -> usize {
        chunk_ceiling(self)
    }
}

/// Select the chunk ceiling for `config`: the LAN ceiling for [`Connection::Lan`], the WAN
/// ceiling otherwise.
pub fn chunk_ceiling(config: &Config) -> usize {
    match config.connection {
        Connection::Lan => config.max_chunk_size_lan,
        Connection::Wan => config.max_chunk_size_wan,
    }
}

pub struct ConfigBuilder {
    imp: Config,
}

impl ConfigBuilder {
    pub fn hostname<S: Into<String>>(mut self, hostname: S) -> Self {
        self.imp.hostname = hostname.into();
        self
    }
    pub fn port(mut self, port: u16) -> Self {
        self.imp.port = port;
        self
    }
    pub fn connection(mut self, connection: Connection) -> Self {
        self.imp.connection = connection;
        self
    }
    pub fn connection_as_str(mut self, connection: &str) -> Self {
        self.imp.connection = Connection::from(connection);
        self
    }
    pub fn max_chunk_size_wan(mut self, size: usize) -> Self {
        self.imp.max_chunk_size_wan = size;
        self
    }
    pub fn max_chunk_size_lan(mut self, size: usize) -> Self {
        self.imp.max_chunk_size_lan = size;
        self
    }
    /// Produce the [`Config`]; fails on port zero or on a zero chunk ceiling.
    pub fn build(self) -> Result<Config> {
        if self.imp.port == 0 {
            return Err(Error::BadPort);
        }
        for size in [self.imp.max_chunk_size_wan, self.imp.max_chunk_size_lan] {
            if size == 0 {
                return Err(Error::BadChunkSize {
                    size,
                    back: Backtrace::new(),
                });
            }
        }
        Ok(self.imp)
    }
}
