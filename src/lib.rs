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
//! Send [GELF] messages to [Graylog] over UDP.
//!
//! [GELF]: https://go2docs.graylog.org/current/getting_in_log_data/gelf.html
//! [Graylog]: https://graylog.org
//!
//! # Introduction
//!
//! GELF, the Graylog Extended Log Format, is a JSON-based message schema. Over UDP, each message
//! ordinarily travels as a single datagram holding nothing but its JSON; messages too large for
//! that are split into up to 128 "chunks", each prefixed with a twelve-byte header that lets
//! Graylog reassemble them no matter the order in which they arrive.
//!
//! The path from caller to socket is one-way:
//!
//! 1. a raw message (JSON text, or a [`LogRecord`]) is decoded & checked for reserved fields
//!    ([`validate`])
//!
//! 2. it is encoded to JSON ([`record`]) and framed: as-is if it fits within the configured chunk
//!    ceiling, as a sequence of chunks otherwise ([`chunk`])
//!
//! 3. the resulting datagrams are written to a [`Transport`] ([`transport`])
//!
//! [`Client`] (in [`client`]) composes these steps. Nothing ever comes back over the wire: UDP is
//! fire-and-forget, & this crate neither retries nor waits for acknowledgement.
//!
//! [`LogRecord`]: crate::record::LogRecord
//! [`Transport`]: crate::transport::Transport
//! [`Client`]: crate::client::Client
//!
//! # Usage
//!
//! ```no_run
//! use gelf_udp::client::Client;
//! use gelf_udp::config::{Config, Connection};
//!
//! // Chunk for a LAN path to a Graylog instance on another host
//! let client = Client::new(
//!     Config::builder()
//!         .hostname("graylog.local")
//!         .connection(Connection::Lan)
//!         .build()
//!         .unwrap(),
//! )
//! .unwrap();
//!
//! client
//!     .log(r#"{"version": "1.1", "host": "bree", "short_message": "Hello, world!"}"#)
//!     .unwrap();
//! ```
//!
//! For applications instrumented with [`tracing`], [`layer::Layer`] forwards events to Graylog:
//!
//! [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
//!
//! ```no_run
//! use tracing::info;
//! use gelf_udp::layer::Layer;
//! use tracing_subscriber::registry::Registry;
//! use tracing_subscriber::layer::SubscriberExt; // Needed to get `with()`
//!
//! let subscriber = Registry::default().with(Layer::try_default().unwrap());
//! let _guard = tracing::subscriber::set_default(subscriber);
//!
//! info!(user = "sp1ff", "Hello, world!");
//! ```

pub mod chunk;
pub mod client;
pub mod config;
pub mod error;
pub mod gelf;
pub mod layer;
pub mod level;
pub mod record;
pub mod transport;
pub mod validate;
