// Copyright (C) 2022-2025 Michael Herstine <sp1ff@pobox.com>
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

//! [gelf-udp](crate) [`Layer`] implementation.
//!
//! [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
//!
//! [`Layer`] maps each [`tracing`] [`Event`] to a GELF message & hands it to a [`Client`]:
//!
//! - the `message` field becomes `short_message`
//! - the event's level is mapped to a syslog severity for `level`
//! - every other field becomes an additional field (`user = "sp1ff"` is sent as `_user`)
//! - the event's target, module, file & line are sent as `_target`, `_module`, `_file` & `_line`
//!
//! [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
//! [`Event`]: https://docs.rs/tracing/0.1.35/tracing/struct.Event.html
//!
//! ```rust
//! use tracing::info;
//! use gelf_udp::layer::Layer;
//! use tracing_subscriber::registry::Registry;
//! use tracing_subscriber::layer::SubscriberExt; // Needed to get `with()`
//!
//! // The default configuration is to send GELF messages via UDP to port 12201 on the localhost.
//! let subscriber = Registry::default().with(Layer::try_default().unwrap());
//!
//! info!(user = "sp1ff", "Hello, world!");
//! ```

use crate::{
    client::Client,
    config::Config,
    error::Result,
    gelf::{additional_field_name, default_host, GelfMessage},
    level::default_level_mapping,
    record::Value,
    transport::{Transport, UdpTransport},
};

use tracing::{field::Field, Event};
use tracing_subscriber::layer::Context;

// When the tracing-log feature is enabled, use NormalizeEvent to extract file/line metadata
// from events that originated from the `log` crate. This follows the same pattern used by
// tracing-subscriber's fmt layer.
// See: https://github.com/tokio-rs/tracing/blob/master/tracing-subscriber/src/fmt/fmt_layer.rs
#[cfg(feature = "tracing-log")]
use tracing_log::NormalizeEvent;

/// Events from this crate are never forwarded; the client's own diagnostics would otherwise be fed
/// straight back into it.
fn is_own_event(target: &str) -> bool {
    let crate_name = env!("CARGO_CRATE_NAME");
    target == crate_name
        || target
            .strip_prefix(crate_name)
            .is_some_and(|rest| rest.starts_with("::"))
}

/// Collects an [`Event`]'s fields.
///
/// [`Event`]: https://docs.rs/tracing/0.1.35/tracing/struct.Event.html
#[derive(Default)]
struct GelfVisitor {
    message: Option<String>,
    fields: Vec<(String, Value)>,
}

impl GelfVisitor {
    fn add(&mut self, field: &Field, value: Value) {
        // tracing-log's bookkeeping fields; they're folded into the normalized metadata
        if field.name().starts_with("log.") {
            return;
        }
        self.fields
            .push((additional_field_name(field.name()), value));
    }
}

impl tracing::field::Visit for GelfVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.add(field, value.into());
    }
    fn record_i64(&mut self, field: &Field, value: i64) {
        self.add(field, value.into());
    }
    fn record_u64(&mut self, field: &Field, value: u64) {
        self.add(field, value.into());
    }
    fn record_bool(&mut self, field: &Field, value: bool) {
        self.add(field, value.into());
    }
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_owned());
        } else {
            self.add(field, value.into());
        }
    }
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        // The tracing macros "pre-format" the `message` field so that `value` refers to a
        // `std::fmt::Arguments` instance, which prints without enclosing double-quotes.
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else {
            self.add(field, format!("{:?}", value).into());
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                          struct Layer                                          //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// A [`tracing-subscriber`]-compliant [`Layer`] implementation that will send [`Event`]s to
/// Graylog.
///
/// [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
/// [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
/// [`Event`]: https://docs.rs/tracing/0.1.35/tracing/struct.Event.html
pub struct Layer<T: Transport = UdpTransport> {
    client: Client<T>,
    host: String,
}

impl Layer<UdpTransport> {
    /// Attempt to construct a [`Layer`] that will send GELF messages via UDP to port 12201 on
    /// localhost
    pub fn try_default() -> Result<Self> {
        Layer::new(Config::default())
    }
    /// Attempt to construct a [`Layer`] that will send GELF messages via UDP as per `config`
    pub fn new(config: Config) -> Result<Self> {
        Ok(Layer::with_client(Client::new(config)?))
    }
}

impl<T: Transport> Layer<T> {
    /// Construct a [`Layer`] that will send messages through `client`
    pub fn with_client(client: Client<T>) -> Self {
        Layer {
            client,
            host: default_host(),
        }
    }
    /// Override the `host` field of every message
    pub fn with_host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = host.into();
        self
    }
    pub fn client(&self) -> &Client<T> {
        &self.client
    }
    fn format_event(&self, event: &Event<'_>, meta: &tracing::Metadata<'_>) -> GelfMessage {
        let mut visitor = GelfVisitor::default();
        event.record(&mut visitor);

        let mut builder = GelfMessage::builder(
            visitor
                .message
                .unwrap_or_else(|| meta.name().to_owned()),
        )
        .host(self.host.clone())
        .level(default_level_mapping(meta.level()))
        .additional("target", meta.target());
        if let Some(module) = meta.module_path() {
            builder = builder.additional("module", module);
        }
        if let Some(file) = meta.file() {
            builder = builder.additional("file", file);
        }
        if let Some(line) = meta.line() {
            builder = builder.additional("line", line);
        }
        for (name, value) in visitor.fields {
            // Graylog would drop the entire message over a single reserved field
            if self.client.validator().is_reserved(&name) {
                continue;
            }
            builder = builder.additional(&name, value);
        }
        builder.build()
    }
}

/// The [`Layer`] implementation proper.
///
/// [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
impl<S, T> tracing_subscriber::layer::Layer<S> for Layer<T>
where
    S: tracing::Subscriber,
    T: Transport + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        // When the tracing-log feature is enabled, use normalized_metadata() to get
        // file/line info for events that originated from the `log` crate.
        // For native tracing events, normalized_metadata() returns None and we use
        // the event's own metadata.
        #[cfg(feature = "tracing-log")]
        let normalized_meta = event.normalized_metadata();
        #[cfg(feature = "tracing-log")]
        let meta = normalized_meta.as_ref().unwrap_or_else(|| event.metadata());
        #[cfg(not(feature = "tracing-log"))]
        let meta = event.metadata();

        if is_own_event(meta.target()) {
            return;
        }

        let record = self.format_event(event, meta).into_record();
        if let Err(err) = self.client.log_record(&record) {
            ::tracing::error!("Failed to send a GELF message: {}", err);
        }
    }
}
