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

//! Incremental readers: small state machines that pull from the shared
//! receive buffer and return either a parsed piece or "need more data".
//!
//! The request-line/status-line/header-block tokenizer is built on
//! `httparse`, a sans-I/O incremental HTTP tokenizer well suited to parsing
//! against a buffer this crate doesn't own the I/O for. The chunked-body
//! tokenizer is hand-rolled as a resumable state machine over the buffer,
//! since nothing in the dependency tree does incremental chunked decoding
//! without also owning a blocking `Read`.

use crate::common::{HTTPVersion, Header, Method, StatusCode};
use crate::error::RemoteProtocolError;
use crate::event::{Data, EndOfMessage};

/// Maximum number of headers httparse will parse into per call. Not a
/// protocol limit by itself -- `max_header_block_size` is what actually
/// bounds the wire bytes a malicious peer can make us buffer -- but
/// httparse needs a fixed-size scratch array, so this is generous enough
/// for any real message while still being a finite stack allocation.
const MAX_HEADERS: usize = 128;

/// Outcome of trying to parse a request-line + header block out of
/// `buf`. `None` means more bytes are needed.
pub fn parse_request_head(
    buf: &[u8],
    max_header_block_size: usize,
) -> Result<Option<(Method, Vec<u8>, HTTPVersion, Vec<Header>, usize)>, RemoteProtocolError> {
    let mut raw_headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut req = httparse::Request::new(&mut raw_headers);

    match req.parse(buf) {
        Ok(httparse::Status::Complete(consumed)) => {
            let method = Method::from_bytes(req.method.unwrap().as_bytes().to_vec())
                .map_err(|_| RemoteProtocolError::new("request method is not valid ASCII"))?;
            let target = req.path.unwrap().as_bytes().to_vec();
            let version = httparse_version(req.version.unwrap());
            let headers = convert_headers(req.headers)?;
            Ok(Some((method, target, version, headers, consumed)))
        }
        Ok(httparse::Status::Partial) => {
            if buf.len() >= max_header_block_size {
                Err(oversize_header_block())
            } else {
                Ok(None)
            }
        }
        Err(e) => Err(parse_error(e)),
    }
}

/// Outcome of trying to parse a status-line + header block out of `buf`.
pub fn parse_response_head(
    buf: &[u8],
    max_header_block_size: usize,
) -> Result<Option<(StatusCode, HTTPVersion, Vec<u8>, Vec<Header>, usize)>, RemoteProtocolError> {
    let mut raw_headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut resp = httparse::Response::new(&mut raw_headers);

    match resp.parse(buf) {
        Ok(httparse::Status::Complete(consumed)) => {
            let status = StatusCode(resp.code.unwrap());
            let version = httparse_version(resp.version.unwrap());
            let reason = resp.reason.unwrap_or("").as_bytes().to_vec();
            let headers = convert_headers(resp.headers)?;
            Ok(Some((status, version, reason, headers, consumed)))
        }
        Ok(httparse::Status::Partial) => {
            if buf.len() >= max_header_block_size {
                Err(oversize_header_block())
            } else {
                Ok(None)
            }
        }
        Err(e) => Err(parse_error(e)),
    }
}

fn httparse_version(v: u8) -> HTTPVersion {
    if v == 0 {
        HTTPVersion::HTTP_10
    } else {
        HTTPVersion::HTTP_11
    }
}

fn convert_headers(raw: &[httparse::Header]) -> Result<Vec<Header>, RemoteProtocolError> {
    raw.iter()
        .filter(|h| *h != &httparse::EMPTY_HEADER)
        .map(|h| {
            Header::from_bytes(h.name.as_bytes().to_vec(), h.value.to_vec())
                .map_err(|_| RemoteProtocolError::new("header value is not valid ASCII"))
        })
        .collect()
}

fn oversize_header_block() -> RemoteProtocolError {
    RemoteProtocolError::with_status(
        "request-line + headers exceeded the configured maximum size",
        StatusCode(431),
    )
}

fn parse_error(e: httparse::Error) -> RemoteProtocolError {
    match e {
        httparse::Error::TooManyHeaders => RemoteProtocolError::with_status(
            "too many headers",
            StatusCode(431),
        ),
        httparse::Error::Version => RemoteProtocolError::with_status(
            "unsupported HTTP version",
            StatusCode(505),
        ),
        other => RemoteProtocolError::new(format!("malformed message: {:?}", other)),
    }
}

/// What a body reader produced after being driven once.
pub enum BodyOutcome {
    NeedData,
    Data(Data),
    End(EndOfMessage),
}

/// Per-direction body reader, selected by the framing mode computed for
/// the in-flight message.
pub enum BodyReader {
    NoBody,
    FixedLength(FixedLengthReader),
    Chunked(ChunkedReader),
    UntilClose(UntilCloseReader),
}

impl BodyReader {
    /// `buf` is the unconsumed slice of the receive buffer; `eof` is
    /// whether the peer has signalled EOF. Returns how many bytes of
    /// `buf` were consumed alongside the outcome.
    pub fn poll(&mut self, buf: &[u8], eof: bool) -> Result<(BodyOutcome, usize), RemoteProtocolError> {
        match self {
            BodyReader::NoBody => Ok((BodyOutcome::End(EndOfMessage::default()), 0)),
            BodyReader::FixedLength(r) => r.poll(buf),
            BodyReader::Chunked(r) => r.poll(buf),
            BodyReader::UntilClose(r) => Ok(r.poll(buf, eof)),
        }
    }
}

/// Maximum size of a single `Data` event this engine will ever emit from
/// a single buffer poll. There is no wire meaning to this boundary --
/// chunking granularity on read is purely an implementation choice.
const MAX_DATA_EVENT: usize = 64 * 1024;

#[derive(Debug)]
pub struct FixedLengthReader {
    remaining: u64,
}

impl FixedLengthReader {
    pub fn new(length: u64) -> FixedLengthReader {
        FixedLengthReader { remaining: length }
    }

    fn poll(&mut self, buf: &[u8]) -> Result<(BodyOutcome, usize), RemoteProtocolError> {
        if self.remaining == 0 {
            return Ok((BodyOutcome::End(EndOfMessage::default()), 0));
        }
        if buf.is_empty() {
            return Ok((BodyOutcome::NeedData, 0));
        }
        let take = (buf.len() as u64).min(self.remaining).min(MAX_DATA_EVENT as u64) as usize;
        self.remaining -= take as u64;
        Ok((
            BodyOutcome::Data(Data {
                payload: buf[..take].to_vec(),
            }),
            take,
        ))
    }
}

/// Emits everything buffered, then `EndOfMessage` once the peer has
/// signalled EOF and nothing remains buffered.
#[derive(Debug, Default)]
pub struct UntilCloseReader {
    ended: bool,
}

impl UntilCloseReader {
    pub fn new() -> UntilCloseReader {
        UntilCloseReader::default()
    }

    fn poll(&mut self, buf: &[u8], eof: bool) -> (BodyOutcome, usize) {
        if !buf.is_empty() {
            let take = buf.len().min(MAX_DATA_EVENT);
            return (
                BodyOutcome::Data(Data {
                    payload: buf[..take].to_vec(),
                }),
                take,
            );
        }
        if eof && !self.ended {
            self.ended = true;
            return (BodyOutcome::End(EndOfMessage::default()), 0);
        }
        (BodyOutcome::NeedData, 0)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ChunkPhase {
    Size,
    Data(u64),
    DataCrlf,
    Trailers,
    Done,
}

/// `chunk-size [chunk-ext] CRLF chunk-data CRLF` repeated until a
/// zero-sized chunk, then an optional trailer header block, then the
/// final `EndOfMessage`. A buffer-driven pull loop rather than a blocking
/// read: each phase only advances as far as what's already buffered.
pub struct ChunkedReader {
    phase: ChunkPhase,
    max_header_block_size: usize,
}

impl ChunkedReader {
    pub fn new(max_header_block_size: usize) -> ChunkedReader {
        ChunkedReader {
            phase: ChunkPhase::Size,
            max_header_block_size,
        }
    }

    /// Drives the phase machine forward over `buf`, advancing through as
    /// many chunk boundaries as are already fully buffered. A chunk-size
    /// line or a chunk's trailing CRLF only transitions the phase and
    /// doesn't itself produce an event, so those steps loop back around
    /// rather than recursing -- a buffer containing thousands of small
    /// chunks from a single `receive_data` call must not grow the stack
    /// with it.
    fn poll(&mut self, buf: &[u8]) -> Result<(BodyOutcome, usize), RemoteProtocolError> {
        let mut offset = 0;
        loop {
            let remaining = &buf[offset..];
            let step = match self.phase {
                ChunkPhase::Size => self.step_size(remaining)?,
                ChunkPhase::Data(left) => self.step_data(remaining, left),
                ChunkPhase::DataCrlf => self.step_data_crlf(remaining)?,
                ChunkPhase::Trailers => self.step_trailers(remaining)?,
                ChunkPhase::Done => Step::Produced(BodyOutcome::End(EndOfMessage::default()), 0),
            };
            match step {
                Step::Consumed(n) => offset += n,
                Step::Produced(outcome, n) => return Ok((outcome, offset + n)),
                Step::NeedMoreData => return Ok((BodyOutcome::NeedData, offset)),
            }
        }
    }

    fn step_size(&mut self, buf: &[u8]) -> Result<Step, RemoteProtocolError> {
        let line_end = match find_crlf(buf) {
            Some(pos) => pos,
            None => {
                if buf.len() >= self.max_header_block_size {
                    return Err(RemoteProtocolError::new("chunk-size line too long"));
                }
                return Ok(Step::NeedMoreData);
            }
        };
        let line = &buf[..line_end];
        // chunk-ext (the part after ';') carries no information this
        // engine needs and is discarded.
        let size_part = match line.iter().position(|&b| b == b';') {
            Some(idx) => &line[..idx],
            None => line,
        };
        let size_str = std::str::from_utf8(size_part)
            .map_err(|_| RemoteProtocolError::new("chunk-size is not valid UTF-8"))?
            .trim();
        let size = u64::from_str_radix(size_str, 16)
            .map_err(|_| RemoteProtocolError::new(format!("invalid chunk-size {:?}", size_str)))?;

        let consumed = line_end + 2;
        self.phase = if size == 0 {
            ChunkPhase::Trailers
        } else {
            ChunkPhase::Data(size)
        };
        Ok(Step::Consumed(consumed))
    }

    fn step_data(&mut self, buf: &[u8], remaining: u64) -> Step {
        if buf.is_empty() {
            return Step::NeedMoreData;
        }
        let take = (buf.len() as u64).min(remaining).min(MAX_DATA_EVENT as u64) as usize;
        let left = remaining - take as u64;
        self.phase = if left == 0 {
            ChunkPhase::DataCrlf
        } else {
            ChunkPhase::Data(left)
        };
        Step::Produced(
            BodyOutcome::Data(Data {
                payload: buf[..take].to_vec(),
            }),
            take,
        )
    }

    fn step_data_crlf(&mut self, buf: &[u8]) -> Result<Step, RemoteProtocolError> {
        if buf.len() < 2 {
            return Ok(Step::NeedMoreData);
        }
        if &buf[..2] != b"\r\n" {
            return Err(RemoteProtocolError::new("chunk data not followed by CRLF"));
        }
        self.phase = ChunkPhase::Size;
        Ok(Step::Consumed(2))
    }

    fn step_trailers(&mut self, buf: &[u8]) -> Result<Step, RemoteProtocolError> {
        let mut raw_headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
        match httparse::parse_headers(buf, &mut raw_headers) {
            Ok(httparse::Status::Complete((consumed, raw))) => {
                let trailers = convert_headers(raw)?;
                self.phase = ChunkPhase::Done;
                Ok(Step::Produced(BodyOutcome::End(EndOfMessage { trailers }), consumed))
            }
            Ok(httparse::Status::Partial) => {
                if buf.len() >= self.max_header_block_size {
                    Err(oversize_header_block())
                } else {
                    Ok(Step::NeedMoreData)
                }
            }
            Err(e) => Err(parse_error(e)),
        }
    }
}

/// Outcome of driving the chunk phase machine forward by one step.
enum Step {
    /// The phase transitioned; no event yet, keep looping with `n` more
    /// bytes consumed.
    Consumed(usize),
    /// An event is ready, having consumed `n` bytes in this step.
    Produced(BodyOutcome, usize),
    /// Not enough bytes buffered to complete this step.
    NeedMoreData,
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}
