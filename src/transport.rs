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

//! The GELF transport layer.
//!
//! This module defines the [`Transport`] trait that all implementations must support, as well as
//! the UDP implementation. GELF chunking is a UDP concern, so UDP is all we offer.
//!
//! # Examples
//!
//! To send GELF messages over UDP to Graylog listening on port 12201 (the default) on localhost:
//!
//! ```rust
//! use gelf_udp::transport::UdpTransport;
//! let transpo = UdpTransport::local().unwrap();
//! ```
//!
//! On a non-standard port on another host:
//!
//! ```rust
//! use gelf_udp::transport::UdpTransport;
//! let transpo = UdpTransport::new("some-host.invalid:5514");
//! assert!(transpo.is_err()); // no such host, after all
//! ```

use crate::error::{Error, Result};

use backtrace::Backtrace;

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                      transport mechanisms                                      //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Operations all transport layers must support.
pub trait Transport {
    /// Send a slice of bytes as a single datagram on this transport mechanism.
    ///
    /// Chunking happens upstream: by the time a buffer reaches this method it is either a complete
    /// GELF message or a single, complete chunk, so implementations must not split it further.
    fn send(&self, buf: &[u8]) -> Result<usize>;
}

/// Sending GELF messages via UDP datagrams.
///
/// The destination is resolved once, at construction. [`UdpSocket::send`] takes `&self` & each
/// call writes one whole datagram, so a [`UdpTransport`] may be shared between threads.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    peer: SocketAddr,
}

impl UdpTransport {
    /// Construct a [`Transport`] implementation via UDP at `addr`.
    pub fn new<A: ToSocketAddrs>(addr: A) -> Result<UdpTransport> {
        let peer = addr
            .to_socket_addrs()
            .map_err(|err| Error::Transport {
                source: Box::new(err),
                back: Backtrace::new(),
            })?
            .next()
            .ok_or_else(|| Error::Transport {
                source: "destination resolved to no addresses".into(),
                back: Backtrace::new(),
            })?;
        // Bind to any available port in the destination's address family...
        let local: SocketAddr = match peer {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(local).map_err(|err| Error::Transport {
            source: Box::new(err),
            back: Backtrace::new(),
        })?;
        // and connect to Graylog at `peer`:
        socket.connect(peer).map_err(|err| Error::Transport {
            source: Box::new(err),
            back: Backtrace::new(),
        })?;
        Ok(UdpTransport { socket, peer })
    }
    /// Construct a [`Transport`] implementation via UDP at 127.0.0.1:12201
    pub fn local() -> Result<UdpTransport> {
        UdpTransport::new("127.0.0.1:12201")
    }
    /// The address to which we're sending
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

impl Transport for UdpTransport {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        self.socket.send(buf).map_err(|err| Error::Transport {
            source: Box::new(err),
            back: Backtrace::new(),
        })
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        (**self).send(buf)
    }
}
