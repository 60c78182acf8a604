// Copyright 2015 The tiny-http Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//	http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A sans-I/O HTTP/1.1 protocol engine.
//!
//! This crate contains no sockets, no TLS, no timers and no threads. It is
//! a pure state machine that turns a stream of bytes into a stream of
//! protocol [`Event`]s and back again, for both the client and server
//! roles of a single connection. Callers -- a blocking server, an async
//! runtime, a test harness -- feed it bytes received from the network and
//! events to send, and get back events to act on and bytes to transmit.
//!
//! The object most callers touch is [`Connection`]. Construct one with a
//! [`Role`] and push bytes and events through its four-operation contract:
//!
//! - [`Connection::send`] -- hand it an outgoing [`Event`], get back the
//!   bytes to transmit.
//! - [`Connection::receive_data`] -- hand it bytes read off the wire.
//! - [`Connection::next_event`] -- pull the next parsed [`Event`], or a
//!   sentinel ([`NextEvent::NeedData`] / [`NextEvent::Paused`]).
//! - [`Connection::start_next_cycle`] -- once both parties are `Done`,
//!   reset them to `Idle` for the next request on a keep-alive connection.
//!
//! ```
//! use http_engine::{Connection, ConnectionConfig, Event, Header, HTTPVersion, Method, Request, Role};
//!
//! let mut client = Connection::new(Role::Client, ConnectionConfig::default());
//! let method = Method::from_bytes(b"GET".to_vec()).unwrap();
//! let host = Header::from_bytes(&b"Host"[..], &b"example.com"[..]).unwrap();
//! let bytes = client.send(Event::Request(Request {
//!     method,
//!     target: b"/".to_vec(),
//!     http_version: HTTPVersion::HTTP_11,
//!     headers: vec![host],
//! })).unwrap();
//! assert_eq!(bytes, b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n");
//! client.send(Event::end_of_message()).unwrap();
//! ```
//!
//! Sockets, TLS, DNS, URL parsing, content-encoding, cookies, routing and
//! timeouts are all the caller's job.

mod buffer;
mod common;
mod connection;
mod error;
mod event;
mod framing;
mod log;
mod reader;
mod state;
mod writer;

pub use common::{HTTPVersion, Header, HeaderField, Method, StatusCode};
pub use connection::{Connection, ConnectionConfig};
pub use error::{ConnectionError, LocalProtocolError, RemoteProtocolError};
pub use event::{Data, EndOfMessage, Event, InformationalResponse, NextEvent, Request, Response};
pub use framing::BodyFraming;
pub use state::{Role, State, SwitchState};
