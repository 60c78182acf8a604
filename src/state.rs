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

//! The per-party state machine and the cross-party linking rule.
//!
//! Each party is modeled as an independent enum, with a pure
//! `recompute_links` function run after every individual transition to
//! apply the rules that couple the two parties together.

/// Which side of the connection this `Connection` is playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Client,
    Server,
}

/// One party's position in the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    /// Server only: request line seen, response not yet started.
    SendResponse,
    SendBody,
    Done,
    MustClose,
    Closed,
    Error,
}

/// Cross-cutting substate tracked only on the client, for CONNECT/Upgrade
/// handoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchState {
    None,
    MightSwitchProtocol,
    SwitchedProtocol,
}

/// Inputs to `recompute_links` beyond the two states themselves.
#[derive(Debug, Clone, Copy)]
pub struct LinkContext {
    pub keep_alive: bool,
}

/// Applies the cross-party linking rules after an individual transition:
///
/// - on reaching `Done` with `keep_alive == false`, that party moves to
///   `MustClose`;
/// - if either party is `Closed` while the other is `Done`/`Idle`, the
///   other is forced to `MustClose`.
///
/// `Error` is sticky and is never overridden here; callers raise it
/// directly and must not call `recompute_links` afterwards for that party.
pub fn recompute_links(ours: State, theirs: State, ctx: LinkContext) -> (State, State) {
    let mut ours = ours;
    let mut theirs = theirs;

    if ours == State::Done && !ctx.keep_alive {
        ours = State::MustClose;
    }
    if theirs == State::Done && !ctx.keep_alive {
        theirs = State::MustClose;
    }

    if ours == State::Closed && matches!(theirs, State::Done | State::Idle) {
        theirs = State::MustClose;
    }
    if theirs == State::Closed && matches!(ours, State::Done | State::Idle) {
        ours = State::MustClose;
    }

    (ours, theirs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn done_without_keep_alive_forces_must_close() {
        let (ours, _) = recompute_links(State::Done, State::Idle, LinkContext { keep_alive: false });
        assert_eq!(ours, State::MustClose);
    }

    #[test]
    fn done_with_keep_alive_stays_done() {
        let (ours, _) = recompute_links(State::Done, State::Idle, LinkContext { keep_alive: true });
        assert_eq!(ours, State::Done);
    }

    #[test]
    fn closed_peer_forces_must_close_on_done_or_idle_party() {
        let (ours, theirs) =
            recompute_links(State::Done, State::Closed, LinkContext { keep_alive: true });
        assert_eq!(ours, State::MustClose);
        assert_eq!(theirs, State::Closed);

        let (ours, theirs) =
            recompute_links(State::Idle, State::Closed, LinkContext { keep_alive: true });
        assert_eq!(ours, State::MustClose);
        assert_eq!(theirs, State::Closed);
    }

    #[test]
    fn closed_peer_does_not_touch_error_or_must_close() {
        let (ours, theirs) =
            recompute_links(State::Error, State::Closed, LinkContext { keep_alive: true });
        assert_eq!(ours, State::Error);
        assert_eq!(theirs, State::Closed);
    }
}
