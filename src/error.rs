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

//! The two fatal error kinds a `Connection` can raise. Both move every
//! party on the connection to `State::Error`; neither is recoverable.

use crate::common::StatusCode;
use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};

/// The caller used the API incorrectly: an event illegal in the current
/// state, conflicting framing headers on an outgoing message, client-side
/// pipelining, etc. Raised from `send` (or from `next_event` when the
/// failure traces back to our own earlier action).
#[derive(Debug, Clone)]
pub struct LocalProtocolError {
    pub reason: String,
}

impl LocalProtocolError {
    pub fn new<S: Into<String>>(reason: S) -> LocalProtocolError {
        LocalProtocolError {
            reason: reason.into(),
        }
    }
}

impl Display for LocalProtocolError {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "local protocol error: {}", self.reason)
    }
}

impl StdError for LocalProtocolError {}

/// The peer violated HTTP: malformed bytes, impossible framing, an
/// oversize header block, invalid chunk encoding, EOF mid-message. Raised
/// from `next_event`. Carries a suggested status code a server caller may
/// use to write a last-gasp error response before closing the socket.
#[derive(Debug, Clone)]
pub struct RemoteProtocolError {
    pub reason: String,
    pub error_status_hint: StatusCode,
}

impl RemoteProtocolError {
    pub fn new<S: Into<String>>(reason: S) -> RemoteProtocolError {
        RemoteProtocolError {
            reason: reason.into(),
            error_status_hint: StatusCode(400),
        }
    }

    pub fn with_status<S: Into<String>>(reason: S, status: StatusCode) -> RemoteProtocolError {
        RemoteProtocolError {
            reason: reason.into(),
            error_status_hint: status,
        }
    }
}

impl Display for RemoteProtocolError {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "remote protocol error: {}", self.reason)
    }
}

impl StdError for RemoteProtocolError {}

/// Unifies both error kinds for call sites (`next_event`) that can raise
/// either, as a small internal enum rather than pulling in an error
/// framework for two variants.
#[derive(Debug, Clone)]
pub enum ConnectionError {
    Local(LocalProtocolError),
    Remote(RemoteProtocolError),
}

impl From<LocalProtocolError> for ConnectionError {
    fn from(e: LocalProtocolError) -> ConnectionError {
        ConnectionError::Local(e)
    }
}

impl From<RemoteProtocolError> for ConnectionError {
    fn from(e: RemoteProtocolError) -> ConnectionError {
        ConnectionError::Remote(e)
    }
}

impl Display for ConnectionError {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        match self {
            ConnectionError::Local(e) => Display::fmt(e, formatter),
            ConnectionError::Remote(e) => Display::fmt(e, formatter),
        }
    }
}

impl StdError for ConnectionError {}
