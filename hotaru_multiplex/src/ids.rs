//! Connection/stream identifiers and the small enums that tag connection state.
//!
//! Grounded on `hotaru_core::connection::protocol::{Transport, Stream}`, which use an
//! opaque `i128`/`u32` id; here the spec's `bid`/`sid` vocabulary is kept verbatim as the
//! public API surface since callers of this crate think in those terms.

use std::fmt;

/// Opaque per-connection handle assigned by the transport adapter. Stable for the
/// connection's life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bid:{}", self.0)
    }
}

/// Handle identifying the listener ("scheme") that accepted a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchemeId(pub u16);

impl fmt::Display for SchemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sid16:{}", self.0)
    }
}

/// HTTP/2 stream identifier. For HTTP/1.1 this is always [`StreamId::HTTP1`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId(pub i32);

impl StreamId {
    /// Synthetic stream id used for every HTTP/1.1 request (HTTP/1 has no multiplexing).
    pub const HTTP1: StreamId = StreamId(-1);

    pub fn is_client_initiated(&self) -> bool {
        self.0 > 0 && self.0 % 2 == 1
    }

    pub fn is_server_push(&self) -> bool {
        self.0 > 0 && self.0 % 2 == 0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sid32:{}", self.0)
    }
}

/// Wire protocol negotiated for a connection. Immutable once ALPN/upgrade completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Http1_1,
    Http2,
}

/// Which protocol role is currently active on a connection.
///
/// For HTTP/1.1, WebSocket is a per-connection upgrade. For HTTP/2, the connection stays
/// fully HTTP except for the single stream that switched to WebSocket via RFC 8441 —
/// Agent still models this at connection granularity per spec.md §3, since a connection
/// is "either fully HTTP or switched to WebSocket on its single upgraded stream."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Agent {
    Http,
    WebSocket,
}

/// Advertised server role; decides which status code an auth challenge uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    Http,
    Ws,
    Proxy,
}

impl Identity {
    /// Status code used to challenge an unauthenticated client.
    pub fn challenge_status(&self) -> u16 {
        match self {
            Identity::Http | Identity::Ws => 401,
            Identity::Proxy => 407,
        }
    }
}

/// Direction a frame signal travels, used by [`crate::http2_session::Http2Session`]'s
/// frame-event callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Send,
    Recv,
}

/// Connect/disconnect discriminator passed to the `"active"` callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnMode {
    Connect,
    Disconnect,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_id_parity_classifies_initiator() {
        assert!(StreamId(1).is_client_initiated());
        assert!(!StreamId(1).is_server_push());
        assert!(StreamId(2).is_server_push());
        assert!(!StreamId(2).is_client_initiated());
        assert!(!StreamId::HTTP1.is_client_initiated());
    }

    #[test]
    fn identity_challenge_status_matches_proxy_semantics() {
        assert_eq!(Identity::Http.challenge_status(), 401);
        assert_eq!(Identity::Ws.challenge_status(), 401);
        assert_eq!(Identity::Proxy.challenge_status(), 407);
    }
}
