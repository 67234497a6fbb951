// Copyright (C) 2022 Michael Herstine <sp1ff@pobox.com>
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
//! [gelf-udp](crate) errors

use backtrace::Backtrace;

/// [gelf-udp](crate) error type
///
/// [gelf-udp](crate) eschews libraries like [thiserror], [anyhow] & [Snafu] in favor of a
/// straightforward enumeration with a few match arms chosen on the basis what the caller will need
/// to repond.
///
/// [thiserror]: https://docs.rs/thiserror
/// [anyhow]: https://docs.rs/anyhow
/// [Snafu]: https://docs.rs/snafu/latest/snafu
#[non_exhaustive]
pub enum Error {
    /// A chunk header violated `sequence < total <= 128`, or a datagram couldn't be parsed as a
    /// chunk
    BadChunk {
        reason: String,
        back: Backtrace,
    },
    /// A maximum chunk size of zero was configured or requested
    BadChunkSize {
        size: usize,
        back: Backtrace,
    },
    /// Port zero isn't a valid destination
    BadPort,
    /// Raw message text was not a JSON object
    Decode {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// A record could not be serialized
    Encode {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// A record carried a field name reserved by Graylog
    ForbiddenField {
        name: String,
        back: Backtrace,
    },
    /// The payload would need more chunks than GELF permits
    MessageTooLarge {
        len: usize,
        chunks: usize,
        back: Backtrace,
    },
    /// Failed to fetch hostname (via libc)
    NoHostname {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// General transport layer error
    Transport {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
}

impl std::fmt::Display for Error {
    // `Error` is non-exhaustive so that adding variants won't be a breaking change to our
    // callers. That means the compiler won't catch us if we miss a variant here, so we
    // always include a `_` arm.
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::BadChunk { reason, .. } => write!(f, "Invalid GELF chunk: {}", reason),
            Error::BadChunkSize { size, .. } => {
                write!(f, "{} is not a usable maximum chunk size", size)
            }
            Error::BadPort => write!(f, "Port 0 is not a valid Graylog port"),
            Error::Decode { source, .. } => {
                write!(f, "The message could not be decoded as a JSON object: {}", source)
            }
            Error::Encode { source, .. } => write!(f, "While encoding a message, got {}", source),
            Error::ForbiddenField { name, .. } => {
                write!(f, "The field '{}' is reserved and may not be sent", name)
            }
            Error::MessageTooLarge { len, chunks, .. } => write!(
                f,
                "A {}-byte message would need {} chunks; GELF allows at most 128",
                len, chunks
            ),
            Error::NoHostname { source, .. } => {
                write!(f, "Couldn't determine the local hostname: {}", source)
            }
            Error::Transport { source, .. } => write!(f, "Transport error: {:?}", source),
            _ => write!(f, "Other gelf-udp error"),
        }
    }
}

impl std::fmt::Debug for Error {
    // `Error` is non-exhaustive so that adding variants won't be a breaking change to our
    // callers. That means the compiler won't catch us if we miss a variant here, so we
    // always include a `_` arm.
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::BadChunk { reason: _, back } => write!(f, "{}\n{:?}", self, back),
            Error::BadChunkSize { size: _, back } => write!(f, "{}\n{:?}", self, back),
            Error::BadPort => write!(f, "{}", self),
            Error::Decode { source: _, back } => write!(f, "{}\n{:?}", self, back),
            Error::Encode { source: _, back } => write!(f, "{}\n{:?}", self, back),
            Error::ForbiddenField { name: _, back } => write!(f, "{}\n{:?}", self, back),
            Error::MessageTooLarge { back, .. } => write!(f, "{}\n{:?}", self, back),
            Error::Transport { source: _, back } => write!(f, "{}\n{:?}", self, back),
            err => write!(f, "gelf-udp error: {}", err),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
