//! The event source the [`crate::multiplexer::Multiplexer`] consumes (spec.md §4.1).
//!
//! Grounded on `hotaru_core::connection::protocol::{Transport, Protocol}` and on
//! `hotaru_core::connection::stream::TcpConnectionStream`'s Tcp/Tls split — the
//! multiplexer does not own a socket directly, it is driven by whatever adapter wraps
//! one, exactly the way `hotaru_core`'s `ProtocolRegistry::run_multi` byte-sniffs and
//! dispatches without owning the listener itself.

use crate::ids::{ConnectionId, Protocol, SchemeId};
use async_trait::async_trait;

/// Per-bid event source and sink consumed by the Multiplexer.
///
/// Implementors serialize events per [`ConnectionId`] (spec.md §4.1: "per-bid event
/// ordering"); the Multiplexer assumes `read`/`write` events reflect completed transport
/// operations and that [`TransportAdapter::proto`] is stable once `connect` has fired.
#[async_trait]
pub trait TransportAdapter: Send + Sync + 'static {
    /// Listener readiness notification.
    async fn open(&self, sid: SchemeId);

    /// Accept/deny a new connection before it is handed a [`ConnectionId`].
    async fn accept(&self, host: &str, ip: &str, port: u16, bid: ConnectionId) -> bool;

    /// Connection lifecycle edges.
    async fn connect(&self, bid: ConnectionId, sid: SchemeId);
    async fn disconnect(&self, bid: ConnectionId, sid: SchemeId);

    /// Raw byte delivery in both directions.
    async fn read(&self, bid: ConnectionId, sid: SchemeId, buf: &[u8]);
    async fn write(&self, bid: ConnectionId, sid: SchemeId, buf: &[u8]);

    /// Negotiated wire protocol, queryable once stable after `connect` (post-ALPN).
    fn proto(&self, bid: ConnectionId) -> Option<Protocol>;

    /// Pushes bytes out on the transport for `bid`. `false` indicates the transport
    /// refused or the connection is gone.
    async fn send(&self, bid: ConnectionId, buf: &[u8]) -> bool;

    /// Tears down the transport-level connection for `bid`.
    async fn close(&self, bid: ConnectionId);
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingAdapter {
        sent: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    #[async_trait]
    impl TransportAdapter for RecordingAdapter {
        async fn open(&self, _sid: SchemeId) {}
        async fn accept(&self, _host: &str, _ip: &str, _port: u16, _bid: ConnectionId) -> bool {
            true
        }
        async fn connect(&self, _bid: ConnectionId, _sid: SchemeId) {}
        async fn disconnect(&self, _bid: ConnectionId, _sid: SchemeId) {}
        async fn read(&self, _bid: ConnectionId, _sid: SchemeId, _buf: &[u8]) {}
        async fn write(&self, _bid: ConnectionId, _sid: SchemeId, _buf: &[u8]) {}
        fn proto(&self, _bid: ConnectionId) -> Option<Protocol> {
            Some(Protocol::Http1_1)
        }
        async fn send(&self, _bid: ConnectionId, buf: &[u8]) -> bool {
            self.sent.lock().push(buf.to_vec());
            true
        }
        async fn close(&self, _bid: ConnectionId) {}
    }

    #[tokio::test]
    async fn send_is_recorded_and_reports_success() {
        let adapter = RecordingAdapter::default();
        let ok = adapter.send(ConnectionId(1), b"hello").await;
        assert!(ok);
        assert_eq!(adapter.sent.lock().len(), 1);
    }

    #[tokio::test]
    async fn accept_defaults_to_allow() {
        let adapter = RecordingAdapter::default();
        assert!(adapter.accept("host", "127.0.0.1", 443, ConnectionId(1)).await);
    }
}
