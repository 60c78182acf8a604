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

//! Event serialization. Every function appends to a caller-owned
//! `Vec<u8>` and returns nothing else -- nothing here buffers outgoing
//! bytes across calls; whatever a `send()` call produces is returned
//! synchronously and the caller owns transmitting it.

use crate::common::{HTTPVersion, Header, StatusCode};
use crate::event::{Data, EndOfMessage, InformationalResponse, Request, Response};
use crate::framing::BodyFraming;

pub fn write_request_line(out: &mut Vec<u8>, req: &Request) {
    out.extend_from_slice(req.method.as_str().as_bytes());
    out.push(b' ');
    out.extend_from_slice(&req.target);
    out.push(b' ');
    write_version(out, req.http_version);
    out.extend_from_slice(b"\r\n");
    write_headers(out, &req.headers);
}

pub fn write_response_line(
    out: &mut Vec<u8>,
    status: StatusCode,
    version: HTTPVersion,
    reason: &[u8],
    headers: &[Header],
) {
    write_version(out, version);
    out.push(b' ');
    out.extend_from_slice(status.as_u16().to_string().as_bytes());
    out.push(b' ');
    if reason.is_empty() {
        out.extend_from_slice(status.default_reason_phrase().as_bytes());
    } else {
        out.extend_from_slice(reason);
    }
    out.extend_from_slice(b"\r\n");
    write_headers(out, headers);
}

pub fn write_informational_response(out: &mut Vec<u8>, resp: &InformationalResponse) {
    write_response_line(out, resp.status, resp.http_version, &resp.reason, &resp.headers);
}

pub fn write_response(out: &mut Vec<u8>, resp: &Response) {
    write_response_line(out, resp.status, resp.http_version, &resp.reason, &resp.headers);
}

fn write_version(out: &mut Vec<u8>, version: HTTPVersion) {
    out.extend_from_slice(format!("HTTP/{}.{}", version.0, version.1).as_bytes());
}

fn write_headers(out: &mut Vec<u8>, headers: &[Header]) {
    for header in headers {
        out.extend_from_slice(header.field.as_str().as_bytes());
        out.extend_from_slice(b": ");
        out.extend_from_slice(header.value.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"\r\n");
}

/// Appends a `Connection: close` header, used when `keep_alive` has
/// become false and the caller didn't already set one themselves.
pub fn append_connection_close(headers: &mut Vec<Header>) {
    if !headers.iter().any(|h| h.field.equiv("Connection")) {
        headers.push(Header::from_bytes(&b"Connection"[..], &b"close"[..]).unwrap());
    }
}

/// Serializes a `Data` event's payload under the given framing mode.
/// `Chunked` wraps the payload in a chunk-size line plus CRLF envelope;
/// anything else passes the bytes through unchanged.
pub fn write_data(out: &mut Vec<u8>, data: &Data, framing: BodyFraming) {
    match framing {
        BodyFraming::Chunked => {
            if !data.payload.is_empty() {
                out.extend_from_slice(format!("{:x}\r\n", data.payload.len()).as_bytes());
                out.extend_from_slice(&data.payload);
                out.extend_from_slice(b"\r\n");
            }
        }
        _ => out.extend_from_slice(&data.payload),
    }
}

/// Serializes an `EndOfMessage` event under the given framing mode.
/// Chunked framing gets the terminating zero chunk plus any trailers;
/// other modes produce nothing (the body length was already fully
/// determined by what was written).
pub fn write_end_of_message(out: &mut Vec<u8>, end: &EndOfMessage, framing: BodyFraming) {
    if framing != BodyFraming::Chunked {
        return;
    }
    out.extend_from_slice(b"0\r\n");
    write_headers(out, &end.trailers);
}
