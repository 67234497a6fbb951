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

//! The GELF client.
//!
//! [`Client`] ties the pieces together: a raw message is decoded, validated & encoded
//! ([`record::encode`]), framed according to the configured chunk ceiling ([`chunk::chunk`]), and
//! each resulting datagram is handed to a [`Transport`] in order.
//!
//! [`record::encode`]: crate::record::encode
//! [`chunk::chunk`]: crate::chunk::chunk
//!
//! ```no_run
//! use gelf_udp::{client::Client, config::Config};
//!
//! let client = Client::new(Config::default()).unwrap();
//! client
//!     .log(r#"{"version": "1.1", "host": "bree", "short_message": "Hello, world!"}"#)
//!     .unwrap();
//! ```
//!
//! Delivery is best-effort: UDP offers no acknowledgement. If a transport error interrupts a
//! chunked message part-way through, the chunks already sent stay sent; Graylog will discard the
//! incomplete message on its own.

use crate::{
    chunk::chunk,
    config::Config,
    error::Result,
    record::{encode, LogRecord, RawMessage},
    transport::{Transport, UdpTransport},
    validate::Validator,
};

use tracing::{trace, warn};

/// Sends GELF messages to a single Graylog destination.
///
/// A [`Client`] holds no mutable state; it may be shared between threads whenever its
/// [`Transport`] may.
#[derive(Debug)]
pub struct Client<T: Transport = UdpTransport> {
    config: Config,
    validator: Validator,
    transport: T,
}

impl Client<UdpTransport> {
    /// Construct a [`Client`] sending over UDP to the destination named in `config`.
    pub fn new(config: Config) -> Result<Self> {
        let transport = UdpTransport::new(config.destination())?;
        Ok(Client::with_transport(config, transport))
    }
}

impl<T: Transport> Client<T> {
    /// Construct a [`Client`] with a custom [`Transport`]; `config`'s hostname & port are not
    /// consulted.
    pub fn with_transport(config: Config, transport: T) -> Self {
        Client {
            config,
            validator: Validator::default(),
            transport,
        }
    }
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }
    pub fn config(&self) -> &Config {
        &self.config
    }
    pub fn validator(&self) -> &Validator {
        &self.validator
    }
    pub fn transport(&self) -> &T {
        &self.transport
    }
    pub fn chunk_ceiling(&self) -> usize {
        self.config.chunk_ceiling()
    }
    /// Decode, validate, encode & send `raw`.
    pub fn log<M: Into<RawMessage>>(&self, raw: M) -> Result<()> {
        let payload = encode(&raw.into(), &self.validator)?;
        self.send(&payload).map(|_| ())
    }
    /// Validate, encode & send `record`.
    pub fn log_record(&self, record: &LogRecord) -> Result<()> {
        self.validator.validate(record)?;
        self.send(&record.to_bytes()?).map(|_| ())
    }
    /// Send an already-encoded `payload`, chunking it if need be; returns the number of datagrams
    /// written.
    ///
    /// No validation takes place: the payload goes out as given.
    pub fn send(&self, payload: &[u8]) -> Result<usize> {
        let packets = chunk(payload, self.chunk_ceiling())?;
        let count = packets.count();
        for (i, datagram) in packets.iter().enumerate() {
            trace!("Sending datagram {} of {} ({} bytes)", i + 1, count, datagram.len());
            self.transport.send(datagram).map_err(|err| {
                warn!("Sent {} of {} datagrams before failing: {}", i, count, err);
                err
            })?;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod test {

    use super::*;

    use crate::{
        chunk::{ChunkPacket, MessageId, CHUNK_MAGIC},
        error::Error,
    };

    use backtrace::Backtrace;

    use std::{
        collections::{BTreeMap, HashMap, HashSet},
        net::UdpSocket,
        sync::{Arc, Mutex},
        time::Duration,
    };

    /// A minimal Graylog stand-in: collects datagrams, reassembling chunked messages.
    struct Reassembler {
        partial: HashMap<MessageId, BTreeMap<u8, Vec<u8>>>,
    }

    impl Reassembler {
        fn new() -> Reassembler {
            Reassembler {
                partial: HashMap::new(),
            }
        }
        /// Feed a datagram; returns a message once complete.
        fn accept(&mut self, datagram: &[u8]) -> Option<(Option<MessageId>, Vec<u8>)> {
            if !datagram.starts_with(&CHUNK_MAGIC) {
                return Some((None, datagram.to_vec()));
            }
            let packet = ChunkPacket::parse(datagram).unwrap();
            let id = packet.message_id();
            let parts = self.partial.entry(id).or_default();
            parts.insert(packet.sequence(), packet.payload().to_vec());
            if parts.len() == packet.total() as usize {
                let parts = self.partial.remove(&id).unwrap();
                Some((Some(id), parts.into_values().flatten().collect()))
            } else {
                None
            }
        }
        fn receive(&mut self, server: &UdpSocket) -> (Option<MessageId>, Vec<u8>) {
            let mut buf = [0u8; 65536];
            loop {
                let n = server.recv(&mut buf).unwrap();
                if let Some(msg) = self.accept(&buf[..n]) {
                    return msg;
                }
            }
        }
    }

    fn server() -> UdpSocket {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        server
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        server
    }

    fn client_for(server: &UdpSocket, ceiling: usize) -> Client {
        Client::new(
            Config::builder()
                .port(server.local_addr().unwrap().port())
                .max_chunk_size_wan(ceiling)
                .max_chunk_size_lan(ceiling)
                .build()
                .unwrap(),
        )
        .unwrap()
    }

    /// Records every datagram; optionally fails the n-th send
    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<Vec<u8>>>,
        fail_at: Option<usize>,
    }

    impl Transport for Recorder {
        fn send(&self, buf: &[u8]) -> Result<usize> {
            let mut sent = self.sent.lock().unwrap();
            if Some(sent.len()) == self.fail_at {
                return Err(Error::Transport {
                    source: "network unreachable".into(),
                    back: Backtrace::new(),
                });
            }
            sent.push(buf.to_vec());
            Ok(buf.len())
        }
    }

    #[test]
    fn send_single_datagram() {
        let server = server();
        let client = client_for(&server, 1420);
        assert_eq!(client.send(b"Hello Graylog").unwrap(), 1);

        let mut buf = [0u8; 1024];
        let n = server.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"Hello Graylog");
    }

    #[test]
    fn send_chunked_messages() {
        let server = server();
        let client = client_for(&server, 1);
        assert_eq!(client.send(b"11111").unwrap(), 5);
        assert_eq!(client.send(b"123jjdd").unwrap(), 7);

        let mut reassembler = Reassembler::new();
        let (id1, msg1) = reassembler.receive(&server);
        let (id2, msg2) = reassembler.receive(&server);
        assert_eq!(msg1, b"11111");
        assert_eq!(msg2, b"123jjdd");
        assert!(id1.is_some() && id2.is_some());
        assert_ne!(id1, id2);
    }

    #[test]
    fn log_over_the_wire() {
        let server = server();
        let client = client_for(&server, 16);
        let text =
            r#"{"version": "1.1", "host": "bree", "short_message": "Hello, world!", "_n": 1}"#;
        client.log(text).unwrap();

        let (id, msg) = Reassembler::new().receive(&server);
        assert!(id.is_some());
        assert_eq!(
            LogRecord::from_slice(&msg).unwrap(),
            LogRecord::from_json(text).unwrap()
        );
    }

    #[test]
    fn nothing_sent_on_bad_input() {
        let client = Client::with_transport(Config::default(), Recorder::default());

        assert!(matches!(client.log("Hello Graylog"), Err(Error::Decode { .. })));
        assert!(matches!(
            client.log(r#"{"_id": "23", "short_message": "Hi"}"#),
            Err(Error::ForbiddenField { .. })
        ));
        let mut record = LogRecord::new();
        record.insert("_id", 23);
        assert!(matches!(
            client.log_record(&record),
            Err(Error::ForbiddenField { .. })
        ));

        let config = Config::builder()
            .max_chunk_size_wan(1)
            .build()
            .unwrap();
        let tiny = Client::with_transport(config, Recorder::default());
        assert!(matches!(
            tiny.send(&[b'x'; 129]),
            Err(Error::MessageTooLarge { .. })
        ));

        assert!(client.transport().sent.lock().unwrap().is_empty());
        assert!(tiny.transport().sent.lock().unwrap().is_empty());
    }

    #[test]
    fn ceiling_follows_connection() {
        let config = Config::builder()
            .connection_as_str("lan")
            .max_chunk_size_wan(4)
            .max_chunk_size_lan(8)
            .build()
            .unwrap();
        let client = Client::with_transport(config, Recorder::default());
        assert_eq!(client.chunk_ceiling(), 8);
        assert_eq!(client.send(b"0123456789abcdef").unwrap(), 2);

        let config = Config::builder()
            .max_chunk_size_wan(4)
            .max_chunk_size_lan(8)
            .build()
            .unwrap();
        let client = Client::with_transport(config, Recorder::default());
        assert_eq!(client.send(b"0123456789abcdef").unwrap(), 4);
    }

    #[test]
    fn custom_validator() {
        let client = Client::with_transport(Config::default(), Recorder::default())
            .with_validator(Validator::default().with_reserved("_password"));
        assert!(client.validator().is_reserved("_id"));
        assert!(client.log(r#"{"short_message": "Hi", "_password": "hunter2"}"#).is_err());
        assert!(client.log(r#"{"short_message": "Hi"}"#).is_ok());
        assert_eq!(client.transport().sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn partial_failure() {
        let config = Config::builder().max_chunk_size_wan(2).build().unwrap();
        let client = Client::with_transport(
            config,
            Recorder {
                sent: Mutex::new(Vec::new()),
                fail_at: Some(2),
            },
        );
        assert!(matches!(
            client.send(b"0123456789"),
            Err(Error::Transport { .. })
        ));
        // The first two chunks went out & stay out
        let sent = client.transport().sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(ChunkPacket::parse(&sent[1]).unwrap().payload(), b"23");
    }

    #[test]
    fn concurrent_logging() {
        let config = Config::builder().max_chunk_size_wan(3).build().unwrap();
        let client = Arc::new(Client::with_transport(config, Recorder::default()));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let client = Arc::clone(&client);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        client.send(format!("thread {} message {}", t, i).as_bytes()).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let mut reassembler = Reassembler::new();
        let mut ids = HashSet::new();
        let mut messages = HashSet::new();
        for datagram in client.transport().sent.lock().unwrap().iter() {
            if let Some((id, msg)) = reassembler.accept(datagram) {
                assert!(ids.insert(id.unwrap()));
                messages.insert(String::from_utf8(msg).unwrap());
            }
        }
        assert_eq!(messages.len(), 200);
        assert!(messages.contains("thread 7 message 24"));
    }

    #[test]
    #[cfg(feature = "graylog")]
    fn test_graylog_via_udp() {
        let client = Client::new(Config::default()).unwrap();
        client
            .log(r#"{"version": "1.1", "host": "gelf-udp", "short_message": "Hello, 世界!"}"#)
            .unwrap();
        let long = "x".repeat(10_000);
        let mut record = LogRecord::new();
        record.insert("version", "1.1");
        record.insert("host", "gelf-udp");
        record.insert("short_message", "a chunked message");
        record.insert("full_message", long);
        client.log_record(&record).unwrap();
    }
}
