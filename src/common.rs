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

//! Wire-level value types shared by the reader and writer: status codes,
//! header fields/values, request methods and the HTTP version pair.

use ascii::{AsciiStr, AsciiString};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Status code of a response (always `>= 100`).
#[derive(Eq, PartialEq, Clone, Copy, Debug, Ord, PartialOrd, Hash)]
pub struct StatusCode(pub u16);

impl StatusCode {
    #[inline]
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    #[inline]
    pub fn is_informational(&self) -> bool {
        (100..200).contains(&self.0)
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.0)
    }

    /// The default reason phrase for this status code, or `"Unknown"`.
    pub fn default_reason_phrase(&self) -> &'static str {
        match self.0 {
            100 => "Continue",
            101 => "Switching Protocols",
            200 => "OK",
            201 => "Created",
            202 => "Accepted",
            203 => "Non-Authoritative Information",
            204 => "No Content",
            205 => "Reset Content",
            206 => "Partial Content",
            300 => "Multiple Choices",
            301 => "Moved Permanently",
            302 => "Found",
            303 => "See Other",
            304 => "Not Modified",
            305 => "Use Proxy",
            307 => "Temporary Redirect",
            308 => "Permanent Redirect",
            400 => "Bad Request",
            401 => "Unauthorized",
            402 => "Payment Required",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            406 => "Not Acceptable",
            407 => "Proxy Authentication Required",
            408 => "Request Timeout",
            409 => "Conflict",
            410 => "Gone",
            411 => "Length Required",
            412 => "Precondition Failed",
            413 => "Payload Too Large",
            414 => "URI Too Long",
            415 => "Unsupported Media Type",
            416 => "Range Not Satisfiable",
            417 => "Expectation Failed",
            426 => "Upgrade Required",
            431 => "Request Header Fields Too Large",
            500 => "Internal Server Error",
            501 => "Not Implemented",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            504 => "Gateway Timeout",
            505 => "HTTP Version Not Supported",
            _ => "Unknown",
        }
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> StatusCode {
        StatusCode(code)
    }
}

impl Display for StatusCode {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Field name of a header (e.g. `Content-Type`, `Content-Length`).
///
/// Comparison between two `HeaderField`s ignores case; the originally
/// received case is preserved for serialization.
#[derive(Debug, Clone)]
pub struct HeaderField(AsciiString);

impl HeaderField {
    pub fn from_bytes<B>(bytes: B) -> Result<HeaderField, ()>
    where
        B: Into<Vec<u8>>,
    {
        AsciiString::from_ascii(bytes.into())
            .map(HeaderField)
            .map_err(|_| ())
    }

    pub fn as_str(&self) -> &AsciiStr {
        &self.0
    }

    pub fn equiv(&self, other: &str) -> bool {
        self.0.as_str().eq_ignore_ascii_case(other)
    }
}

impl Display for HeaderField {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "{}", self.0.as_str())
    }
}

impl PartialEq for HeaderField {
    fn eq(&self, other: &HeaderField) -> bool {
        self.0.as_str().eq_ignore_ascii_case(other.0.as_str())
    }
}

impl Eq for HeaderField {}

/// A single wire header: field name plus raw value bytes.
///
/// Values are not required to be valid UTF-8; RFC 7230 only guarantees
/// visible US-ASCII plus SP/HT, so the value is kept as an `AsciiString`.
#[derive(Debug, Clone)]
pub struct Header {
    pub field: HeaderField,
    pub value: AsciiString,
}

impl Header {
    pub fn from_bytes<B1, B2>(field: B1, value: B2) -> Result<Header, ()>
    where
        B1: Into<Vec<u8>>,
        B2: Into<Vec<u8>>,
    {
        let field = HeaderField::from_bytes(field)?;
        let value = AsciiString::from_ascii(value.into()).map_err(|_| ())?;
        Ok(Header { field, value })
    }
}

impl Display for Header {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "{}: {}", self.field, self.value.as_str())
    }
}

/// HTTP request method (e.g. `GET`, `POST`, `CONNECT`).
///
/// Any token is accepted; comparison ignores case. Methods are technically
/// case-sensitive on the wire, but this engine only needs case-insensitive
/// comparison for its own `CONNECT`/`HEAD` framing checks, so the looser
/// comparison is harmless and convenient.
#[derive(Debug, Clone)]
pub struct Method(AsciiString);

impl Method {
    pub fn from_bytes<B>(bytes: B) -> Result<Method, ()>
    where
        B: Into<Vec<u8>>,
    {
        AsciiString::from_ascii(bytes.into())
            .map(Method)
            .map_err(|_| ())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_connect(&self) -> bool {
        self.0.as_str().eq_ignore_ascii_case("CONNECT")
    }

    pub fn is_head(&self) -> bool {
        self.0.as_str().eq_ignore_ascii_case("HEAD")
    }
}

impl FromStr for Method {
    type Err = ();

    fn from_str(s: &str) -> Result<Method, ()> {
        Method::from_bytes(s.as_bytes().to_vec())
    }
}

impl Display for Method {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "{}", self.0.as_str())
    }
}

impl PartialEq for Method {
    fn eq(&self, other: &Method) -> bool {
        self.0.as_str().eq_ignore_ascii_case(other.0.as_str())
    }
}

impl Eq for Method {}

/// HTTP version, e.g. `HTTPVersion(1, 1)` for HTTP/1.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HTTPVersion(pub u8, pub u8);

impl HTTPVersion {
    pub const HTTP_10: HTTPVersion = HTTPVersion(1, 0);
    pub const HTTP_11: HTTPVersion = HTTPVersion(1, 1);
}

impl Display for HTTPVersion {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "HTTP/{}.{}", self.0, self.1)
    }
}

/// Finds the last occurrence of `name` among `headers` and returns its value.
pub fn find_header<'a>(headers: &'a [Header], name: &str) -> Option<&'a AsciiString> {
    headers
        .iter()
        .rev()
        .find(|h| h.field.equiv(name))
        .map(|h| &h.value)
}

/// `true` if any occurrence of `name` has a comma-separated value containing
/// `token` (case-insensitive). Used for `Connection` and `Transfer-Encoding`,
/// the two list-valued headers this engine needs to inspect (§4.4 of the
/// spec: "comma-joining is only performed for specific list-valued headers").
pub fn header_contains_token(headers: &[Header], name: &str, token: &str) -> bool {
    headers.iter().filter(|h| h.field.equiv(name)).any(|h| {
        h.value
            .as_str()
            .split(',')
            .any(|part| part.trim().eq_ignore_ascii_case(token))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_field_equiv_ignores_case() {
        let h = Header::from_bytes(&b"Content-Type"[..], &b"text/html"[..]).unwrap();
        assert!(h.field.equiv("content-type"));
        assert!(h.field.equiv("CONTENT-TYPE"));
        assert_eq!(h.value.as_str(), "text/html");
    }

    #[test]
    fn method_is_connect() {
        assert!(Method::from_bytes(&b"connect"[..]).unwrap().is_connect());
        assert!(!Method::from_bytes(&b"GET"[..]).unwrap().is_connect());
    }

    #[test]
    fn header_contains_token_is_case_insensitive_and_comma_split() {
        let headers =
            vec![Header::from_bytes(&b"Transfer-Encoding"[..], &b"gzip, chunked"[..]).unwrap()];
        assert!(header_contains_token(&headers, "transfer-encoding", "CHUNKED"));
        assert!(!header_contains_token(&headers, "transfer-encoding", "identity"));
    }

    #[test]
    fn find_header_returns_last_occurrence() {
        let headers = vec![
            Header::from_bytes(&b"X-Foo"[..], &b"1"[..]).unwrap(),
            Header::from_bytes(&b"X-Foo"[..], &b"2"[..]).unwrap(),
        ];
        assert_eq!(find_header(&headers, "x-foo").unwrap().as_str(), "2");
    }
}
