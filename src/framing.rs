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

//! The framing decider: given method/status/headers, picks how a message
//! body is delimited. One pure function per direction that only decides,
//! never writes or reads.

use crate::common::{header_contains_token, find_header, Header, Method, StatusCode};
use crate::error::RemoteProtocolError;

/// How a message body is delimited on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFraming {
    Chunked,
    FixedLength(u64),
    NoBody,
    /// Response only: body continues until the peer closes the socket.
    UntilClose,
}

const MAX_CONTENT_LENGTH: u64 = (1u64 << 63) - 1;

/// Request framing:
///
/// - `Transfer-Encoding` containing `chunked` (case-insensitive) wins.
/// - else a single, non-negative `Content-Length <= 2^63-1`.
/// - else no body.
///
/// Content-Length and `Transfer-Encoding: chunked` never legally coexist;
/// when both are present chunked wins and the mismatch is recorded as a
/// `RemoteProtocolError` rather than silently discarded, since a request
/// smuggling attempt looks exactly like this.
pub fn request_body_framing(headers: &[Header]) -> Result<BodyFraming, RemoteProtocolError> {
    if header_contains_token(headers, "Transfer-Encoding", "chunked") {
        return Ok(BodyFraming::Chunked);
    }

    content_length_framing(headers)
}

/// Response framing. `request_method` is the method of the
/// request this response answers; `None` means "parsing the first
/// response on a connection where no request context is available" (not
/// reachable through the public API, but kept for completeness/testing).
pub fn response_body_framing(
    request_method: Option<&Method>,
    status: StatusCode,
    headers: &[Header],
) -> Result<BodyFraming, RemoteProtocolError> {
    let is_head = request_method.map_or(false, |m| m.is_head());
    let is_connect = request_method.map_or(false, |m| m.is_connect());

    if status.is_informational()
        || status.as_u16() == 204
        || status.as_u16() == 304
        || is_head
        || (is_connect && status.is_success())
    {
        return Ok(BodyFraming::NoBody);
    }

    if header_contains_token(headers, "Transfer-Encoding", "chunked") {
        return Ok(BodyFraming::Chunked);
    }

    match content_length_framing(headers)? {
        BodyFraming::NoBody => Ok(BodyFraming::UntilClose),
        other => Ok(other),
    }
}

fn content_length_framing(headers: &[Header]) -> Result<BodyFraming, RemoteProtocolError> {
    let mut seen: Option<u64> = None;
    for header in headers.iter().filter(|h| h.field.equiv("Content-Length")) {
        let value: u64 = header
            .value
            .as_str()
            .parse()
            .map_err(|_| RemoteProtocolError::new(format!(
                "invalid Content-Length value {:?}",
                header.value.as_str()
            )))?;
        if value > MAX_CONTENT_LENGTH {
            return Err(RemoteProtocolError::new("Content-Length exceeds 2^63-1"));
        }
        match seen {
            None => seen = Some(value),
            Some(prev) if prev == value => {}
            Some(_) => {
                return Err(RemoteProtocolError::new(
                    "multiple disagreeing Content-Length headers",
                ))
            }
        }
    }

    Ok(match seen {
        Some(n) => BodyFraming::FixedLength(n),
        None => BodyFraming::NoBody,
    })
}

/// 1xx and 204 responses, and any 2xx to a CONNECT, must not carry
/// Transfer-Encoding or Content-Length. Returns `Err` with a
/// human-readable reason if the proposed headers would violate that.
pub fn validate_outgoing_response_framing(
    request_method: Option<&Method>,
    status: StatusCode,
    headers: &[Header],
) -> Result<(), String> {
    let is_connect = request_method.map_or(false, |m| m.is_connect());
    let forbidden = status.is_informational()
        || status.as_u16() == 204
        || (is_connect && status.is_success());

    if !forbidden {
        return Ok(());
    }

    if find_header(headers, "Content-Length").is_some() {
        return Err(format!(
            "{} response must not carry Content-Length",
            status.as_u16()
        ));
    }
    if header_contains_token(headers, "Transfer-Encoding", "chunked")
        || find_header(headers, "Transfer-Encoding").is_some()
    {
        return Err(format!(
            "{} response must not carry Transfer-Encoding",
            status.as_u16()
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Header;

    fn h(name: &str, value: &str) -> Header {
        Header::from_bytes(name.as_bytes().to_vec(), value.as_bytes().to_vec()).unwrap()
    }

    #[test]
    fn request_prefers_chunked_over_content_length() {
        let headers = vec![h("Transfer-Encoding", "chunked"), h("Content-Length", "10")];
        assert_eq!(request_body_framing(&headers).unwrap(), BodyFraming::Chunked);
    }

    #[test]
    fn request_fixed_length() {
        let headers = vec![h("Content-Length", "42")];
        assert_eq!(
            request_body_framing(&headers).unwrap(),
            BodyFraming::FixedLength(42)
        );
    }

    #[test]
    fn request_no_headers_means_no_body() {
        assert_eq!(request_body_framing(&[]).unwrap(), BodyFraming::NoBody);
    }

    #[test]
    fn disagreeing_content_lengths_are_rejected() {
        let headers = vec![h("Content-Length", "1"), h("Content-Length", "2")];
        assert!(request_body_framing(&headers).is_err());
    }

    #[test]
    fn repeated_identical_content_length_is_accepted() {
        let headers = vec![h("Content-Length", "5"), h("Content-Length", "5")];
        assert_eq!(
            request_body_framing(&headers).unwrap(),
            BodyFraming::FixedLength(5)
        );
    }

    #[test]
    fn response_204_has_no_body_regardless_of_headers() {
        let headers = vec![h("Content-Length", "99")];
        assert_eq!(
            response_body_framing(None, StatusCode(204), &headers).unwrap(),
            BodyFraming::NoBody
        );
    }

    #[test]
    fn response_to_head_has_no_body() {
        let method = Method::from_bytes(b"HEAD".to_vec()).unwrap();
        let headers = vec![h("Content-Length", "99")];
        assert_eq!(
            response_body_framing(Some(&method), StatusCode(200), &headers).unwrap(),
            BodyFraming::NoBody
        );
    }

    #[test]
    fn response_connect_2xx_has_no_body() {
        let method = Method::from_bytes(b"CONNECT".to_vec()).unwrap();
        assert_eq!(
            response_body_framing(Some(&method), StatusCode(200), &[]).unwrap(),
            BodyFraming::NoBody
        );
    }

    #[test]
    fn response_without_length_headers_is_until_close() {
        let method = Method::from_bytes(b"GET".to_vec()).unwrap();
        assert_eq!(
            response_body_framing(Some(&method), StatusCode(200), &[]).unwrap(),
            BodyFraming::UntilClose
        );
    }

    #[test]
    fn validate_rejects_content_length_on_204() {
        let headers = vec![h("Content-Length", "5")];
        assert!(validate_outgoing_response_framing(None, StatusCode(204), &headers).is_err());
    }

    #[test]
    fn validate_allows_ordinary_response() {
        let headers = vec![h("Content-Length", "5")];
        assert!(validate_outgoing_response_framing(None, StatusCode(200), &headers).is_ok());
    }
}
