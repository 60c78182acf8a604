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

//! The receive buffer: an append-only byte buffer with an advancing read
//! cursor. `receive_data` appends to it; readers `consume()` bytes off the
//! front once they've been turned into events. Owned outright by the
//! `Connection` -- sans-I/O, so nothing here ever touches a socket.

/// Caller-fed bytes awaiting parsing, plus whether the peer has signalled
/// EOF (a zero-length `receive_data` call).
#[derive(Debug, Default)]
pub struct ReceiveBuffer {
    data: Vec<u8>,
    consumed: usize,
    eof: bool,
}

impl ReceiveBuffer {
    pub fn new() -> ReceiveBuffer {
        ReceiveBuffer {
            data: Vec::new(),
            consumed: 0,
            eof: false,
        }
    }

    /// Appends `chunk` to the buffer. An empty chunk marks EOF.
    pub fn extend(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            self.eof = true;
            return;
        }
        self.compact();
        self.data.extend_from_slice(chunk);
    }

    pub fn eof(&self) -> bool {
        self.eof
    }

    /// The unconsumed bytes currently buffered.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[self.consumed..]
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Advances the read cursor past `n` already-parsed bytes.
    pub fn consume(&mut self, n: usize) {
        assert!(
            self.consumed + n <= self.data.len(),
            "consumed more bytes than are buffered"
        );
        self.consumed += n;
    }

    /// Drops everything still unconsumed and returns it; used to surface
    /// `trailing_data` once framing stops applying (`SWITCHED_PROTOCOL`).
    pub fn take_remaining(&mut self) -> Vec<u8> {
        let remaining = self.data.split_off(self.consumed);
        self.data.clear();
        self.consumed = 0;
        remaining
    }

    fn compact(&mut self) {
        if self.consumed == 0 {
            return;
        }
        self.data.drain(..self.consumed);
        self.consumed = 0;
    }
}
