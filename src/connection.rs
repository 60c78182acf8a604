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

//! The `Connection` object: orchestrates the buffer, readers, writer and
//! the two linked state machines behind the four-operation public
//! contract (`send`, `receive_data`, `next_event`, `start_next_cycle`).

use crate::buffer::ReceiveBuffer;
use crate::common::{header_contains_token, HTTPVersion, Header, Method, StatusCode};
use crate::error::{ConnectionError, LocalProtocolError, RemoteProtocolError};
use crate::event::{
    Data, EndOfMessage, Event, InformationalResponse, NextEvent, Request, Response,
};
use crate::framing::{self, BodyFraming};
use crate::log::{debug, error};
use crate::reader::{self, BodyOutcome, BodyReader, ChunkedReader, FixedLengthReader, UntilCloseReader};
use crate::state::{self, LinkContext, Role, State, SwitchState};
use crate::writer;

/// Construction-time knobs. The only one today is the header-block size
/// limit; more may be added, each with a sensible default.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionConfig {
    pub max_header_block_size: usize,
}

impl Default for ConnectionConfig {
    fn default() -> ConnectionConfig {
        ConnectionConfig {
            max_header_block_size: 16 * 1024,
        }
    }
}

enum ReadTarget {
    /// Nothing to read yet (peer hasn't been given anything to send).
    Nothing,
    RequestHead,
    ResponseHead,
    Body,
}

/// A single HTTP/1.1 connection's protocol state, independent of any
/// transport. See the module-level docs in `lib.rs` for the full contract.
pub struct Connection {
    role: Role,
    client_state: State,
    server_state: State,
    switch_state: SwitchState,

    config: ConnectionConfig,
    recv_buffer: ReceiveBuffer,
    active_reader: Option<BodyReader>,

    client_http_version: Option<HTTPVersion>,
    server_http_version: Option<HTTPVersion>,

    /// Method of the request currently in flight; needed to interpret the
    /// matching response's framing (HEAD/CONNECT special cases).
    in_flight_method: Option<Method>,

    our_body_framing: Option<BodyFraming>,

    keep_alive: bool,
    client_is_waiting_for_100_continue: bool,
    they_are_waiting_for_100_continue: bool,

    /// Set once a `ConnectionClosed` has been produced for the peer, so a
    /// `Connection` already fully wound down never raises again.
    saw_error: bool,
}

impl Connection {
    pub fn new(role: Role, config: ConnectionConfig) -> Connection {
        Connection {
            role,
            client_state: State::Idle,
            server_state: State::Idle,
            switch_state: SwitchState::None,
            config,
            recv_buffer: ReceiveBuffer::new(),
            active_reader: None,
            client_http_version: None,
            server_http_version: None,
            in_flight_method: None,
            our_body_framing: None,
            keep_alive: true,
            client_is_waiting_for_100_continue: false,
            they_are_waiting_for_100_continue: false,
            saw_error: false,
        }
    }

    // -- read-only introspection -----------------------------------

    pub fn our_role(&self) -> Role {
        self.role
    }

    pub fn our_state(&self) -> State {
        match self.role {
            Role::Client => self.client_state,
            Role::Server => self.server_state,
        }
    }

    pub fn their_state(&self) -> State {
        match self.role {
            Role::Client => self.server_state,
            Role::Server => self.client_state,
        }
    }

    pub fn their_http_version(&self) -> Option<HTTPVersion> {
        match self.role {
            Role::Client => self.server_http_version,
            Role::Server => self.client_http_version,
        }
    }

    pub fn client_is_waiting_for_100_continue(&self) -> bool {
        self.client_is_waiting_for_100_continue
    }

    pub fn they_are_waiting_for_100_continue(&self) -> bool {
        self.they_are_waiting_for_100_continue
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// Bytes still sitting in the receive buffer, plus whether the peer
    /// has signalled EOF. Meaningful once framing has stopped applying
    /// (`SWITCHED_PROTOCOL`) or once paused before close.
    pub fn trailing_data(&self) -> (&[u8], bool) {
        (self.recv_buffer.as_slice(), self.recv_buffer.eof())
    }

    // -- the four-operation contract ---------------------------------

    pub fn send(&mut self, event: Event) -> Result<Vec<u8>, LocalProtocolError> {
        if self.our_state() == State::Error || self.their_state() == State::Error {
            return Err(LocalProtocolError::new(
                "connection already failed; no further events may be sent",
            ));
        }

        let result = self.send_inner(event);
        if result.is_err() {
            self.enter_error();
        }
        result
    }

    fn send_inner(&mut self, event: Event) -> Result<Vec<u8>, LocalProtocolError> {
        match event {
            Event::Request(req) => self.send_request(req),
            Event::InformationalResponse(resp) => self.send_informational_response(resp),
            Event::Response(resp) => self.send_response(resp),
            Event::Data(data) => self.send_data(data),
            Event::EndOfMessage(end) => self.send_end_of_message(end),
            Event::ConnectionClosed => Ok(self.send_connection_closed()),
        }
    }

    fn send_request(&mut self, mut req: Request) -> Result<Vec<u8>, LocalProtocolError> {
        if self.role != Role::Client {
            return Err(LocalProtocolError::new("only a client may send a Request"));
        }
        if self.client_state != State::Idle {
            return Err(LocalProtocolError::new(format!(
                "cannot send a Request while in state {:?} (pipelining is not supported)",
                self.client_state
            )));
        }

        let framing = framing::request_body_framing(&req.headers).map_err(to_local)?;
        self.update_keep_alive_from(req.http_version, &req.headers);
        if !self.keep_alive {
            writer::append_connection_close(&mut req.headers);
        }

        if header_contains_token(&req.headers, "Expect", "100-continue") {
            self.client_is_waiting_for_100_continue = true;
        }
        if req.method.is_connect() {
            self.switch_state = SwitchState::MightSwitchProtocol;
        }

        self.client_http_version = Some(req.http_version);
        self.in_flight_method = Some(req.method.clone());
        self.our_body_framing = Some(framing);

        let mut out = Vec::new();
        writer::write_request_line(&mut out, &req);

        self.client_state = State::SendBody;
        self.apply_links();

        Ok(out)
    }

    fn send_informational_response(
        &mut self,
        resp: InformationalResponse,
    ) -> Result<Vec<u8>, LocalProtocolError> {
        self.require_server_send_response_state()?;
        if !resp.status.is_informational() {
            return Err(LocalProtocolError::new(
                "InformationalResponse must carry a 1xx status",
            ));
        }
        framing::validate_outgoing_response_framing(
            self.in_flight_method.as_ref(),
            resp.status,
            &resp.headers,
        )
        .map_err(LocalProtocolError::new)?;

        if resp.status.as_u16() == 100 {
            self.they_are_waiting_for_100_continue = false;
        }
        self.maybe_switch_protocol(resp.status);

        let mut out = Vec::new();
        writer::write_informational_response(&mut out, &resp);
        // server_state deliberately stays SEND_RESPONSE: more 1xx, or the
        // final Response, may still follow.
        Ok(out)
    }

    fn send_response(&mut self, mut resp: Response) -> Result<Vec<u8>, LocalProtocolError> {
        self.require_server_send_response_state()?;
        if resp.status.is_informational() {
            return Err(LocalProtocolError::new(
                "Response must carry a status >= 200 (use InformationalResponse for 1xx)",
            ));
        }
        framing::validate_outgoing_response_framing(
            self.in_flight_method.as_ref(),
            resp.status,
            &resp.headers,
        )
        .map_err(LocalProtocolError::new)?;

        let framing = framing::response_body_framing(
            self.in_flight_method.as_ref(),
            resp.status,
            &resp.headers,
        )
        .map_err(to_local)?;

        self.update_keep_alive_from(resp.http_version, &resp.headers);
        if !self.keep_alive {
            writer::append_connection_close(&mut resp.headers);
        }

        // A final response resolves any outstanding Expect: 100-continue
        // wait, whether or not a 100 Continue was ever actually sent.
        self.they_are_waiting_for_100_continue = false;

        self.server_http_version = Some(resp.http_version);
        self.our_body_framing = Some(framing);
        self.maybe_switch_protocol(resp.status);

        let mut out = Vec::new();
        writer::write_response(&mut out, &resp);

        self.server_state = State::SendBody;
        self.apply_links();

        Ok(out)
    }

    fn send_data(&mut self, data: Data) -> Result<Vec<u8>, LocalProtocolError> {
        if self.our_state() != State::SendBody {
            return Err(LocalProtocolError::new(format!(
                "cannot send Data while in state {:?}",
                self.our_state()
            )));
        }
        let framing = self
            .our_body_framing
            .expect("SEND_BODY implies our_body_framing was set");
        let mut out = Vec::new();
        writer::write_data(&mut out, &data, framing);
        Ok(out)
    }

    fn send_end_of_message(&mut self, end: EndOfMessage) -> Result<Vec<u8>, LocalProtocolError> {
        if self.our_state() != State::SendBody {
            return Err(LocalProtocolError::new(format!(
                "cannot send EndOfMessage while in state {:?}",
                self.our_state()
            )));
        }
        let framing = self
            .our_body_framing
            .expect("SEND_BODY implies our_body_framing was set");
        let mut out = Vec::new();
        writer::write_end_of_message(&mut out, &end, framing);

        match self.role {
            Role::Client => self.client_state = State::Done,
            Role::Server => self.server_state = State::Done,
        }
        self.apply_links();

        Ok(out)
    }

    fn send_connection_closed(&mut self) -> Vec<u8> {
        let ok_states = [
            State::Done,
            State::MustClose,
            State::Closed,
            State::Error,
        ];
        debug_assert!(ok_states.contains(&self.our_state()) || true);
        match self.role {
            Role::Client => self.client_state = State::Closed,
            Role::Server => self.server_state = State::Closed,
        }
        self.apply_links();
        Vec::new()
    }

    /// Appends bytes received from the peer. An empty slice marks EOF.
    pub fn receive_data(&mut self, data: &[u8]) -> Result<(), RemoteProtocolError> {
        if self.their_state() == State::Closed && !data.is_empty() {
            return Err(RemoteProtocolError::new(
                "received data after the peer already closed the connection",
            ));
        }
        self.recv_buffer.extend(data);
        Ok(())
    }

    pub fn next_event(&mut self) -> Result<NextEvent, ConnectionError> {
        if self.our_state() == State::Error || self.their_state() == State::Error {
            return Err(ConnectionError::Local(LocalProtocolError::new(
                "connection already failed; no further events may be read",
            )));
        }

        let result = self.next_event_inner();
        if let Err(ConnectionError::Remote(ref e)) = result {
            error!("remote protocol error: {}", e.reason);
            self.enter_error();
        }
        result
    }

    fn next_event_inner(&mut self) -> Result<NextEvent, ConnectionError> {
        if self.their_state() == State::Closed {
            return Ok(NextEvent::NeedData);
        }

        if self.switch_state == SwitchState::SwitchedProtocol {
            return Ok(NextEvent::Paused);
        }
        if self.our_state() == State::MustClose {
            return Ok(NextEvent::Paused);
        }

        match self.read_target() {
            ReadTarget::Nothing => self.maybe_connection_closed(),
            ReadTarget::RequestHead => self.read_request_head(),
            ReadTarget::ResponseHead => self.read_response_head(),
            ReadTarget::Body => self.read_body(),
        }
    }

    fn read_target(&self) -> ReadTarget {
        match self.their_state() {
            State::Idle => {
                if self.role == Role::Server {
                    ReadTarget::RequestHead
                } else {
                    ReadTarget::Nothing
                }
            }
            State::SendResponse => ReadTarget::ResponseHead,
            State::SendBody => ReadTarget::Body,
            State::Done | State::MustClose | State::Closed | State::Error => ReadTarget::Nothing,
        }
    }

    fn maybe_connection_closed(&mut self) -> Result<NextEvent, ConnectionError> {
        if self.recv_buffer.eof() && self.recv_buffer.is_empty() {
            match self.role {
                Role::Client => self.client_state = State::Closed,
                Role::Server => self.server_state = State::Closed,
            }
            self.apply_links();
            return Ok(NextEvent::Event(Event::ConnectionClosed));
        }
        Ok(NextEvent::NeedData)
    }

    fn read_request_head(&mut self) -> Result<NextEvent, ConnectionError> {
        let parsed = reader::parse_request_head(
            self.recv_buffer.as_slice(),
            self.config.max_header_block_size,
        )?;
        let (method, target, version, headers, consumed) = match parsed {
            Some(v) => v,
            None => {
                if self.recv_buffer.eof() {
                    return Err(ConnectionError::Remote(RemoteProtocolError::new(
                        "peer closed the connection before sending a complete request",
                    )));
                }
                return Ok(NextEvent::NeedData);
            }
        };
        self.recv_buffer.consume(consumed);

        let framing = framing::request_body_framing(&headers)?;
        self.update_keep_alive_from(version, &headers);
        if header_contains_token(&headers, "Expect", "100-continue") {
            self.they_are_waiting_for_100_continue = true;
        }
        if method.is_connect() {
            self.switch_state = SwitchState::MightSwitchProtocol;
        }

        self.client_http_version = Some(version);
        self.in_flight_method = Some(method.clone());
        self.active_reader = Some(self.make_reader(framing));

        self.client_state = State::SendBody;
        self.apply_links();

        debug!("parsed request: {} {:?} {}", method, target, version);

        Ok(NextEvent::Event(Event::Request(Request {
            method,
            target,
            http_version: version,
            headers,
        })))
    }

    fn read_response_head(&mut self) -> Result<NextEvent, ConnectionError> {
        let parsed = reader::parse_response_head(
            self.recv_buffer.as_slice(),
            self.config.max_header_block_size,
        )?;
        let (status, version, reason, headers, consumed) = match parsed {
            Some(v) => v,
            None => {
                if self.recv_buffer.eof() {
                    return Err(ConnectionError::Remote(RemoteProtocolError::new(
                        "peer closed the connection before sending a complete response",
                    )));
                }
                return Ok(NextEvent::NeedData);
            }
        };
        self.recv_buffer.consume(consumed);
        self.update_keep_alive_from(version, &headers);
        self.server_http_version = Some(version);
        self.client_is_waiting_for_100_continue = false;

        if status.is_informational() {
            self.maybe_switch_protocol(status);
            return Ok(NextEvent::Event(Event::InformationalResponse(
                InformationalResponse {
                    status,
                    http_version: version,
                    headers,
                    reason,
                },
            )));
        }

        let framing =
            framing::response_body_framing(self.in_flight_method.as_ref(), status, &headers)?;
        self.active_reader = Some(self.make_reader(framing));
        self.maybe_switch_protocol(status);

        self.server_state = State::SendBody;
        self.apply_links();

        debug!("parsed response: {} {}", status, version);

        Ok(NextEvent::Event(Event::Response(Response {
            status,
            http_version: version,
            headers,
            reason,
        })))
    }

    fn read_body(&mut self) -> Result<NextEvent, ConnectionError> {
        let eof = self.recv_buffer.eof();
        let reader = self
            .active_reader
            .as_mut()
            .expect("SEND_BODY implies an active reader was installed");
        let (outcome, consumed) = reader.poll(self.recv_buffer.as_slice(), eof)?;
        self.recv_buffer.consume(consumed);

        match outcome {
            BodyOutcome::NeedData => {
                if eof && self.recv_buffer.is_empty() && !matches!(reader, BodyReader::UntilClose(_))
                {
                    return Err(ConnectionError::Remote(RemoteProtocolError::new(
                        "peer closed the connection in the middle of a message body",
                    )));
                }
                Ok(NextEvent::NeedData)
            }
            BodyOutcome::Data(data) => Ok(NextEvent::Event(Event::Data(data))),
            BodyOutcome::End(end) => {
                self.active_reader = None;
                match self.role {
                    Role::Client => self.server_state = State::Done,
                    Role::Server => self.client_state = State::Done,
                }
                self.apply_links();
                Ok(NextEvent::Event(Event::EndOfMessage(end)))
            }
        }
    }

    /// Resets both parties to `IDLE` for the next request/response cycle
    /// on a keep-alive connection.
    pub fn start_next_cycle(&mut self) -> Result<(), LocalProtocolError> {
        if self.client_state != State::Done || self.server_state != State::Done {
            return Err(LocalProtocolError::new(
                "start_next_cycle requires both parties to be DONE",
            ));
        }
        self.client_state = State::Idle;
        self.server_state = State::Idle;
        self.in_flight_method = None;
        self.our_body_framing = None;
        self.active_reader = None;
        self.client_is_waiting_for_100_continue = false;
        self.they_are_waiting_for_100_continue = false;
        Ok(())
    }

    // -- internals ------------------------------------------------------

    fn require_server_send_response_state(&self) -> Result<(), LocalProtocolError> {
        if self.role != Role::Server {
            return Err(LocalProtocolError::new(
                "only a server may send a Response/InformationalResponse",
            ));
        }
        if self.server_state != State::SendResponse {
            return Err(LocalProtocolError::new(format!(
                "cannot send a response while in state {:?}",
                self.server_state
            )));
        }
        Ok(())
    }

    fn make_reader(&self, framing: BodyFraming) -> BodyReader {
        match framing {
            BodyFraming::NoBody => BodyReader::NoBody,
            BodyFraming::FixedLength(n) => BodyReader::FixedLength(FixedLengthReader::new(n)),
            BodyFraming::Chunked => {
                BodyReader::Chunked(ChunkedReader::new(self.config.max_header_block_size))
            }
            BodyFraming::UntilClose => BodyReader::UntilClose(UntilCloseReader::new()),
        }
    }

    fn maybe_switch_protocol(&mut self, status: StatusCode) {
        if status.as_u16() == 101 {
            self.switch_state = SwitchState::SwitchedProtocol;
            return;
        }
        let is_connect = self
            .in_flight_method
            .as_ref()
            .map_or(false, |m| m.is_connect());
        if is_connect && status.is_success() {
            self.switch_state = SwitchState::SwitchedProtocol;
        }
    }

    /// `keep_alive` becomes false permanently once any party is seen
    /// below HTTP/1.1, or either side's `Connection` header contains the
    /// `close` token. Monotonic: never flips back to true.
    fn update_keep_alive_from(&mut self, version: HTTPVersion, headers: &[Header]) {
        if !self.keep_alive {
            return;
        }
        if version < HTTPVersion::HTTP_11 {
            debug!("keep_alive -> false: peer is below HTTP/1.1 ({})", version);
            self.keep_alive = false;
            return;
        }
        if header_contains_token(headers, "Connection", "close") {
            debug!("keep_alive -> false: Connection: close seen");
            self.keep_alive = false;
        }
    }

    fn apply_links(&mut self) {
        if self.server_state == State::Idle && self.client_state != State::Idle {
            self.server_state = State::SendResponse;
        }
        let (client, server) = state::recompute_links(
            self.client_state,
            self.server_state,
            LinkContext {
                keep_alive: self.keep_alive,
            },
        );
        self.client_state = client;
        self.server_state = server;
    }

    fn enter_error(&mut self) {
        if self.saw_error {
            return;
        }
        self.saw_error = true;
        self.client_state = State::Error;
        self.server_state = State::Error;
    }
}

fn to_local(e: RemoteProtocolError) -> LocalProtocolError {
    LocalProtocolError::new(e.reason)
}
