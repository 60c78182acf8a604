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

//! The `Event` sum type: every kind of thing that can be sent into or
//! pulled out of a `Connection`. Modeled as an exhaustive tagged enum so
//! transition tables can match over `(state, event discriminant)` and the
//! compiler proves every case is handled.

use crate::common::{HTTPVersion, Header, Method, StatusCode};

/// A request line plus headers, sent client-to-server.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub target: Vec<u8>,
    pub http_version: HTTPVersion,
    pub headers: Vec<Header>,
}

/// A 1xx response, server-to-client. Never carries a body.
#[derive(Debug, Clone)]
pub struct InformationalResponse {
    pub status: StatusCode,
    pub http_version: HTTPVersion,
    pub headers: Vec<Header>,
    pub reason: Vec<u8>,
}

/// A final (`>= 200`) response, server-to-client.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub http_version: HTTPVersion,
    pub headers: Vec<Header>,
    pub reason: Vec<u8>,
}

/// A chunk of message body, either direction.
#[derive(Debug, Clone)]
pub struct Data {
    pub payload: Vec<u8>,
}

/// Marks the end of a message body. Trailers are empty unless the body
/// was chunked and a trailer block was present.
#[derive(Debug, Clone, Default)]
pub struct EndOfMessage {
    pub trailers: Vec<Header>,
}

/// An outgoing or incoming protocol event.
#[derive(Debug, Clone)]
pub enum Event {
    Request(Request),
    InformationalResponse(InformationalResponse),
    Response(Response),
    Data(Data),
    EndOfMessage(EndOfMessage),
    ConnectionClosed,
}

impl Event {
    pub fn data(payload: impl Into<Vec<u8>>) -> Event {
        Event::Data(Data {
            payload: payload.into(),
        })
    }

    pub fn end_of_message() -> Event {
        Event::EndOfMessage(EndOfMessage::default())
    }

    pub fn end_of_message_with_trailers(trailers: Vec<Header>) -> Event {
        Event::EndOfMessage(EndOfMessage { trailers })
    }
}

/// The result of `next_event`: either a parsed event, or one of two
/// read-only sentinels.
#[derive(Debug, Clone)]
pub enum NextEvent {
    Event(Event),
    /// More bytes are required before an event can be produced.
    NeedData,
    /// The state machine has intentionally stopped reading: after we've
    /// sent `MUST_CLOSE` but before the socket is actually closed, or
    /// after entering `SWITCHED_PROTOCOL`.
    Paused,
}
