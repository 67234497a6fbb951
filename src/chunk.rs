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

//! GELF chunking.
//!
//! # Introduction
//!
//! A GELF message that fits within the chunk ceiling goes out as a single datagram containing
//! nothing but the JSON. Anything larger is split into at most 128 chunks, each sent as its own
//! datagram & laid-out like so:
//!
//! ```text
//!  0      2                 10         11      12
//! +------+-----------------+----------+-------+-------------------------+
//! | 1e0f |   message id    | sequence | total | payload (<= ceiling)... |
//! +------+-----------------+----------+-------+-------------------------+
//! ```
//!
//! Every chunk of a message carries the same [`MessageId`] & total; the sequence number runs from
//! zero to one less than the total. That's enough for Graylog to put the message back together no
//! matter the order in which the datagrams arrive, and to notice when one goes missing.
//!
//! # Examples
//!
//! ```rust
//! use gelf_udp::chunk::{chunk, Packets};
//!
//! let packets = chunk(b"Hello, world!", 5).unwrap();
//! assert_eq!(3, packets.count());
//! if let Packets::Chunked(chunks) = packets {
//!     assert_eq!(b"Hello", chunks[0].payload());
//!     assert_eq!(b"ld!", chunks[2].payload());
//! }
//! ```

use crate::error::{Error, Result};

use backtrace::Backtrace;
use bytes::BufMut;
use chrono::prelude::*;
use tracing::debug;

type StdResult<T, E> = std::result::Result<T, E>;

/// The two bytes that open every chunk
pub const CHUNK_MAGIC: [u8; 2] = [0x1e, 0x0f];
/// GELF permits no more than this many chunks per message
pub const MAX_CHUNKS: usize = 128;
/// magic + message id + sequence number + sequence count
pub const CHUNK_HEADER_LEN: usize = 12;

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                           message ids                                          //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Eight opaque bytes correlating all the chunks of a single message.
///
/// Ids need to be distinct across messages that may be in flight at the same time, not
/// unpredictable; [`MessageId::generate`] mixes a nanosecond timestamp with the output of the
/// calling thread's PRNG, so no generator state is shared between threads or clients.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MessageId([u8; 8]);

impl MessageId {
    pub fn generate() -> MessageId {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default() as u64;
        let noise: u64 = rand::random();
        MessageId((nanos.rotate_left(32) ^ noise).to_be_bytes())
    }
    pub fn from_bytes(bytes: [u8; 8]) -> MessageId {
        MessageId(bytes)
    }
    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        self.0.iter().try_for_each(|b| write!(f, "{:02x}", b))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                             packets                                            //
////////////////////////////////////////////////////////////////////////////////////////////////////

fn check_header(sequence: u8, total: u8) -> Result<()> {
    if total as usize > MAX_CHUNKS || sequence >= total {
        Err(Error::BadChunk {
            reason: format!("sequence number {} of {} is out of range", sequence, total),
            back: Backtrace::new(),
        })
    } else {
        Ok(())
    }
}

/// A single wire-ready GELF chunk: header followed by a slice of the message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkPacket(Vec<u8>);

impl ChunkPacket {
    /// Build chunk `sequence` (zero-based) of `total` for the message identified by `id`.
    pub fn new(id: MessageId, sequence: u8, total: u8, payload: &[u8]) -> Result<ChunkPacket> {
        check_header(sequence, total)?;
        let mut buf = Vec::with_capacity(CHUNK_HEADER_LEN + payload.len());
        buf.put_slice(&CHUNK_MAGIC);
        buf.put_slice(id.as_bytes());
        buf.put_u8(sequence);
        buf.put_u8(total);
        buf.put_slice(payload);
        Ok(ChunkPacket(buf))
    }
    /// Interpret a received datagram as a GELF chunk.
    pub fn parse(buf: &[u8]) -> Result<ChunkPacket> {
        if buf.len() < CHUNK_HEADER_LEN {
            return Err(Error::BadChunk {
                reason: format!("{} bytes is too short for a chunk header", buf.len()),
                back: Backtrace::new(),
            });
        }
        if buf[..2] != CHUNK_MAGIC {
            return Err(Error::BadChunk {
                reason: format!("bad magic {:02x}{:02x}", buf[0], buf[1]),
                back: Backtrace::new(),
            });
        }
        check_header(buf[10], buf[11])?;
        Ok(ChunkPacket(buf.to_vec()))
    }
    pub fn message_id(&self) -> MessageId {
        let mut id = [0u8; 8];
        id.copy_from_slice(&self.0[2..10]);
        MessageId(id)
    }
    pub fn sequence(&self) -> u8 {
        self.0[10]
    }
    pub fn total(&self) -> u8 {
        self.0[11]
    }
    pub fn payload(&self) -> &[u8] {
        &self.0[CHUNK_HEADER_LEN..]
    }
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// The datagram(s) that make up one GELF message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Packets {
    /// The message fit; it goes out as-is.
    Single(Vec<u8>),
    /// The message didn't fit; chunks are in sequence order.
    Chunked(Vec<ChunkPacket>),
}

impl Packets {
    /// The number of datagrams
    pub fn count(&self) -> usize {
        match self {
            Packets::Single(_) => 1,
            Packets::Chunked(chunks) => chunks.len(),
        }
    }
    pub fn is_chunked(&self) -> bool {
        matches!(self, Packets::Chunked(_))
    }
    /// Datagram payloads in the order in which they should be sent
    pub fn iter(&self) -> Box<dyn Iterator<Item = &[u8]> + '_> {
        match self {
            Packets::Single(buf) => Box::new(std::iter::once(buf.as_slice())),
            Packets::Chunked(chunks) => Box::new(chunks.iter().map(ChunkPacket::as_bytes)),
        }
    }
}

/// Frame `payload` for transmission, given a maximum of `max_chunk_size` payload bytes per
/// datagram.
///
/// A payload no longer than `max_chunk_size` comes back unwrapped (and no [`MessageId`] is
/// generated). Otherwise the payload is split into `ceil(len / max_chunk_size)` chunks; if that's
/// more than [`MAX_CHUNKS`], this fails with [`Error::MessageTooLarge`]. The caller is responsible
/// for choosing a ceiling large enough for the messages they intend to send.
pub fn chunk(payload: &[u8], max_chunk_size: usize) -> Result<Packets> {
    if max_chunk_size == 0 {
        return Err(Error::BadChunkSize {
            size: max_chunk_size,
            back: Backtrace::new(),
        });
    }
    if payload.len() <= max_chunk_size {
        return Ok(Packets::Single(payload.to_vec()));
    }

    let total = payload.len().div_ceil(max_chunk_size);
    if total > MAX_CHUNKS {
        return Err(Error::MessageTooLarge {
            len: payload.len(),
            chunks: total,
            back: Backtrace::new(),
        });
    }

    let id = MessageId::generate();
    debug!(
        "Splitting a {}-byte message into {} chunks with id {}",
        payload.len(),
        total,
        id
    );
    payload
        .chunks(max_chunk_size)
        .enumerate()
        .map(|(i, slice)| ChunkPacket::new(id, i as u8, total as u8, slice))
        .collect::<Result<Vec<ChunkPacket>>>()
        .map(Packets::Chunked)
}

#[cfg(test)]
mod test {

    use super::*;

    use std::collections::HashSet;

    fn reassemble(packets: &Packets) -> Vec<u8> {
        match packets {
            Packets::Single(buf) => buf.clone(),
            Packets::Chunked(chunks) => {
                let mut chunks = chunks.clone();
                chunks.sort_by_key(|c| c.sequence());
                chunks.iter().flat_map(|c| c.payload().to_vec()).collect()
            }
        }
    }

    #[test]
    fn magic_number() {
        let id = MessageId::from_bytes(*b"01234567");
        let packet = ChunkPacket::new(id, 0, 1, b"message").unwrap();
        assert_eq!(&packet.as_bytes()[..2], &[0x1e, 0x0f]);
    }

    #[test]
    fn header_fields() {
        let id = MessageId::from_bytes(*b"myId0000");
        let packet = ChunkPacket::new(id, 13, 42, b"message").unwrap();
        assert_eq!(&packet.as_bytes()[2..10], b"myId0000");
        assert_eq!(packet.message_id(), id);
        assert_eq!(packet.sequence(), 13);
        assert_eq!(packet.total(), 42);
        assert_eq!(packet.payload(), b"message");
        assert_eq!(packet.as_bytes().len(), CHUNK_HEADER_LEN + 7);

        let copy = ChunkPacket::parse(packet.as_bytes()).unwrap();
        assert_eq!(copy, packet);
        assert_eq!(copy.into_bytes(), packet.into_bytes());
    }

    #[test]
    fn header_invariants() {
        let id = MessageId::generate();
        assert!(ChunkPacket::new(id, 0, 0, b"x").is_err());
        assert!(ChunkPacket::new(id, 1, 1, b"x").is_err());
        assert!(ChunkPacket::new(id, 0, 129, b"x").is_err());
        assert!(ChunkPacket::new(id, 127, 128, b"x").is_ok());
        assert!(ChunkPacket::new(id, 0, 1, b"").is_ok());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            ChunkPacket::parse(b"\x1e\x0f0123"),
            Err(Error::BadChunk { .. })
        ));
        assert!(matches!(
            ChunkPacket::parse(b"{\"short_message\": \"hi\"}"),
            Err(Error::BadChunk { .. })
        ));
        let mut buf = vec![0x1e, 0x0f];
        buf.extend_from_slice(b"01234567");
        buf.extend_from_slice(&[3, 3]);
        buf.extend_from_slice(b"payload");
        assert!(matches!(
            ChunkPacket::parse(&buf),
            Err(Error::BadChunk { .. })
        ));
        buf[10] = 2;
        assert!(ChunkPacket::parse(&buf).is_ok());
    }

    #[test]
    fn small_payloads_are_not_chunked() {
        let payload = b"Hello Graylog";
        for ceiling in [13, 14, 1420] {
            let packets = chunk(payload, ceiling).unwrap();
            assert_eq!(packets, Packets::Single(payload.to_vec()));
            assert_eq!(packets.count(), 1);
            assert!(!packets.is_chunked());
            assert_eq!(packets.iter().collect::<Vec<&[u8]>>(), vec![&payload[..]]);
        }
        assert_eq!(chunk(b"", 1).unwrap(), Packets::Single(vec![]));
    }

    #[test]
    fn large_payloads_are_chunked() {
        let payload: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();
        for ceiling in [1usize, 8, 10, 99, 100, 999] {
            if payload.len().div_ceil(ceiling) > MAX_CHUNKS {
                continue;
            }
            let packets = chunk(&payload, ceiling).unwrap();
            let expected = payload.len().div_ceil(ceiling);
            assert_eq!(packets.count(), expected);
            assert!(packets.is_chunked());

            let Packets::Chunked(chunks) = &packets else {
                panic!("expected chunks");
            };
            let id = chunks[0].message_id();
            for (i, c) in chunks.iter().enumerate() {
                assert_eq!(&c.as_bytes()[..2], &CHUNK_MAGIC);
                assert_eq!(c.message_id(), id);
                assert_eq!(c.sequence() as usize, i);
                assert_eq!(c.total() as usize, expected);
                assert!(c.payload().len() <= ceiling);
            }
            assert_eq!(reassemble(&packets), payload);
        }
    }

    #[test]
    fn reassembly_is_order_independent() {
        let payload = b"sdfsdsdfdsfdsddddfsdfsdsdfdsfdsddddfsdfsdsdfdsfdsddddf".to_vec();
        let Packets::Chunked(mut chunks) = chunk(&payload, 10).unwrap() else {
            panic!("expected chunks");
        };
        assert_eq!(chunks.len(), 6);
        assert_eq!(payload.len(), 54);
        assert_eq!(chunks[5].payload(), &payload[50..]);
        assert_eq!(chunks[5].payload(), b"dddf");
        chunks.reverse();
        assert_eq!(reassemble(&Packets::Chunked(chunks)), payload);
    }

    #[test]
    fn boundaries() {
        assert!(!chunk(&[7u8; 10], 10).unwrap().is_chunked());
        assert_eq!(chunk(&[7u8; 11], 10).unwrap().count(), 2);
        assert_eq!(chunk(&[7u8; 128], 1).unwrap().count(), 128);
        assert_eq!(chunk(&[7u8; 1280], 10).unwrap().count(), 128);

        match chunk(&[7u8; 129], 1) {
            Err(Error::MessageTooLarge { len, chunks, .. }) => {
                assert_eq!(len, 129);
                assert_eq!(chunks, 129);
            }
            _ => panic!("129 chunks should have been refused"),
        }
        assert!(matches!(
            chunk(&[7u8; 1281], 10),
            Err(Error::MessageTooLarge { .. })
        ));
        assert!(matches!(
            chunk(b"anything", 0),
            Err(Error::BadChunkSize { size: 0, .. })
        ));
    }

    #[test]
    fn message_ids_are_distinct() {
        let ids: HashSet<MessageId> = (0..10_000).map(|_| MessageId::generate()).collect();
        assert_eq!(ids.len(), 10_000);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                std::thread::spawn(|| {
                    (0..1000)
                        .map(|_| MessageId::generate())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let ids: HashSet<MessageId> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        assert_eq!(ids.len(), 8000);

        let a = chunk(b"11111", 1).unwrap();
        let b = chunk(b"11111", 1).unwrap();
        match (a, b) {
            (Packets::Chunked(a), Packets::Chunked(b)) => {
                assert_ne!(a[0].message_id(), b[0].message_id())
            }
            _ => panic!("expected chunks"),
        }
        let id = MessageId::from_bytes([0, 1, 2, 3, 0xa, 0xb, 0xc, 0xff]);
        assert_eq!(format!("{}", id), "000102030a0b0cff");
    }
}
