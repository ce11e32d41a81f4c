//! Named, type-tagged callback registry shared by the Multiplexer and its sub-engines.
//!
//! Grounded on Design Notes §9 ("callback bus with type-erased signatures" → "tagged
//! variants per known event name") and on `hotaru_core::alias::PRwLock` for interior
//! mutability, since the bus is mutated at setup time but read on every dispatch from a
//! single-threaded event loop.
//!
//! The `"active"` slot is deliberately *not* part of this struct: spec.md §9 records that
//! whether `"active"` should fan out into sub-engine buses is ambiguous in the source, and
//! SPEC_FULL.md resolves it as "do not fan out." The cleanest way to guarantee that is to
//! give `"active"` its own home on [`crate::multiplexer::Multiplexer`] and keep it out of
//! the bus that sub-engines share.

use crate::error::MultiplexError;
use crate::ids::{Agent, ConnectionId, Direction, StreamId};
use hotaru_core::alias::PRwLock;
use std::sync::Arc;

pub type RawCallback = Arc<dyn Fn(ConnectionId, &[u8]) -> bool + Send + Sync>;
pub type StreamOpenCallback = Arc<dyn Fn(StreamId, ConnectionId) + Send + Sync>;
pub type EndCallback = Arc<dyn Fn(StreamId, ConnectionId, Direction) + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(ConnectionId, MultiplexError) + Send + Sync>;
pub type StreamIdCallback = Arc<dyn Fn(StreamId, ConnectionId) + Send + Sync>;
pub type HeaderCallback = Arc<dyn Fn(StreamId, ConnectionId, &str, &str) + Send + Sync>;
pub type ChunkCallback = Arc<dyn Fn(StreamId, ConnectionId, &[u8]) + Send + Sync>;
pub type ChunkingCallback = Arc<dyn Fn(StreamId, ConnectionId, &[u8]) + Send + Sync>;
pub type HandshakeCallback = Arc<dyn Fn(ConnectionId, Agent) + Send + Sync>;
pub type AcceptCallback = Arc<dyn Fn(&str, &str, u16, ConnectionId) -> bool + Send + Sync>;
pub type EraseCallback = Arc<dyn Fn(ConnectionId) + Send + Sync>;
pub type LaunchedCallback = Arc<dyn Fn() + Send + Sync>;
pub type CheckPasswordCallback = Arc<dyn Fn(ConnectionId, &str, &str) -> bool + Send + Sync>;
pub type ExtractPasswordCallback = Arc<dyn Fn(ConnectionId, &str) -> Option<String> + Send + Sync>;
pub type ErrorWebsocketCallback = Arc<dyn Fn(ConnectionId, StreamId, MultiplexError) + Send + Sync>;
pub type MessageWebsocketCallback = Arc<dyn Fn(ConnectionId, StreamId, &[u8], bool) + Send + Sync>;

/// Which slot, for `is(..)` introspection and documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Raw,
    Stream,
    End,
    Error,
    Entity,
    Chunks,
    Chunking,
    Header,
    Headers,
    Request,
    Handshake,
    Complete,
    Accept,
    Erase,
    Launched,
    CheckPassword,
    ExtractPassword,
    ErrorWebsocket,
    MessageWebsocket,
}

#[derive(Default)]
struct Inner {
    raw: Option<RawCallback>,
    stream_open: Option<StreamOpenCallback>,
    stream_close: Option<StreamOpenCallback>,
    end: Option<EndCallback>,
    error: Option<ErrorCallback>,
    entity: Option<StreamIdCallback>,
    chunks: Option<ChunkCallback>,
    chunking: Option<ChunkingCallback>,
    header: Option<HeaderCallback>,
    headers: Option<StreamIdCallback>,
    request: Option<StreamIdCallback>,
    handshake: Option<HandshakeCallback>,
    complete: Option<StreamIdCallback>,
    accept: Option<AcceptCallback>,
    erase: Option<EraseCallback>,
    launched: Option<LaunchedCallback>,
    check_password: Option<CheckPasswordCallback>,
    extract_password: Option<ExtractPasswordCallback>,
    error_websocket: Option<ErrorWebsocketCallback>,
    message_websocket: Option<MessageWebsocketCallback>,
}

/// Shared callback registry. Cloning is cheap (`Arc`); all clones see the same slots,
/// which is how "propagate to sub-engines" is realized in practice — Http1Engine and
/// Ws2Engine are constructed with a clone of the Multiplexer's bus.
#[derive(Clone, Default)]
pub struct CallbackBus {
    inner: Arc<PRwLock<Inner>>,
}

macro_rules! slot_accessors {
    ($set_name:ident, $is_name:ident, $field:ident, $ty:ty) => {
        pub fn $set_name(&self, f: $ty) {
            self.inner.write().$field = Some(f);
        }

        pub fn $is_name(&self) -> bool {
            self.inner.read().$field.is_some()
        }
    };
}

impl CallbackBus {
    pub fn new() -> Self {
        Self::default()
    }

    slot_accessors!(set_raw, is_raw, raw, RawCallback);
    slot_accessors!(set_stream_open, is_stream_open, stream_open, StreamOpenCallback);
    slot_accessors!(set_stream_close, is_stream_close, stream_close, StreamOpenCallback);
    slot_accessors!(set_end, is_end, end, EndCallback);
    slot_accessors!(set_error, is_error, error, ErrorCallback);
    slot_accessors!(set_entity, is_entity, entity, StreamIdCallback);
    slot_accessors!(set_chunks, is_chunks, chunks, ChunkCallback);
    slot_accessors!(set_chunking, is_chunking, chunking, ChunkingCallback);
    slot_accessors!(set_header, is_header, header, HeaderCallback);
    slot_accessors!(set_headers, is_headers, headers, StreamIdCallback);
    slot_accessors!(set_request, is_request, request, StreamIdCallback);
    slot_accessors!(set_handshake, is_handshake, handshake, HandshakeCallback);
    slot_accessors!(set_complete, is_complete, complete, StreamIdCallback);
    slot_accessors!(set_accept, is_accept, accept, AcceptCallback);
    slot_accessors!(set_erase, is_erase, erase, EraseCallback);
    slot_accessors!(set_launched, is_launched, launched, LaunchedCallback);
    slot_accessors!(set_check_password, is_check_password, check_password, CheckPasswordCallback);
    slot_accessors!(
        set_extract_password,
        is_extract_password,
        extract_password,
        ExtractPasswordCallback
    );
    slot_accessors!(set_error_websocket, is_error_websocket, error_websocket, ErrorWebsocketCallback);
    slot_accessors!(
        set_message_websocket,
        is_message_websocket,
        message_websocket,
        MessageWebsocketCallback
    );

    pub fn call_raw(&self, bid: ConnectionId, data: &[u8]) -> bool {
        match self.inner.read().raw.clone() {
            Some(f) => f(bid, data),
            None => true,
        }
    }

    pub fn call_stream_open(&self, sid: StreamId, bid: ConnectionId) {
        if let Some(f) = self.inner.read().stream_open.clone() {
            f(sid, bid);
        }
    }

    pub fn call_stream_close(&self, sid: StreamId, bid: ConnectionId) {
        if let Some(f) = self.inner.read().stream_close.clone() {
            f(sid, bid);
        }
    }

    pub fn call_end(&self, sid: StreamId, bid: ConnectionId, dir: Direction) {
        if let Some(f) = self.inner.read().end.clone() {
            f(sid, bid, dir);
        }
    }

    /// No-throw at the boundary: this is the single place application error callbacks are
    /// invoked, so a panicking callback only unwinds up to here in debug builds; release
    /// behavior relies on the application not panicking inside callbacks, per spec.md §7.
    pub fn call_error(&self, bid: ConnectionId, error: MultiplexError) {
        if let Some(f) = self.inner.read().error.clone() {
            f(bid, error);
        }
    }

    pub fn call_entity(&self, sid: StreamId, bid: ConnectionId) {
        if let Some(f) = self.inner.read().entity.clone() {
            f(sid, bid);
        }
    }

    pub fn call_chunks(&self, sid: StreamId, bid: ConnectionId, data: &[u8]) {
        if let Some(f) = self.inner.read().chunks.clone() {
            f(sid, bid, data);
        }
    }

    pub fn call_chunking(&self, sid: StreamId, bid: ConnectionId, data: &[u8]) {
        if let Some(f) = self.inner.read().chunking.clone() {
            f(sid, bid, data);
        }
    }

    pub fn call_header(&self, sid: StreamId, bid: ConnectionId, key: &str, value: &str) {
        if let Some(f) = self.inner.read().header.clone() {
            f(sid, bid, key, value);
        }
    }

    pub fn call_headers(&self, sid: StreamId, bid: ConnectionId) {
        if let Some(f) = self.inner.read().headers.clone() {
            f(sid, bid);
        }
    }

    pub fn call_request(&self, sid: StreamId, bid: ConnectionId) {
        if let Some(f) = self.inner.read().request.clone() {
            f(sid, bid);
        }
    }

    pub fn call_handshake(&self, bid: ConnectionId, agent: Agent) {
        if let Some(f) = self.inner.read().handshake.clone() {
            f(bid, agent);
        }
    }

    pub fn call_complete(&self, sid: StreamId, bid: ConnectionId) {
        if let Some(f) = self.inner.read().complete.clone() {
            f(sid, bid);
        }
    }

    pub fn call_accept(&self, host: &str, ip: &str, port: u16, bid: ConnectionId) -> bool {
        match self.inner.read().accept.clone() {
            Some(f) => f(host, ip, port, bid),
            None => true,
        }
    }

    pub fn call_erase(&self, bid: ConnectionId) {
        if let Some(f) = self.inner.read().erase.clone() {
            f(bid);
        }
    }

    pub fn call_check_password(&self, bid: ConnectionId, user: &str, pass: &str) -> bool {
        match self.inner.read().check_password.clone() {
            Some(f) => f(bid, user, pass),
            None => false,
        }
    }

    pub fn call_extract_password(&self, bid: ConnectionId, user: &str) -> Option<String> {
        self.inner.read().extract_password.clone().and_then(|f| f(bid, user))
    }

    pub fn call_error_websocket(&self, bid: ConnectionId, sid: StreamId, error: MultiplexError) {
        if let Some(f) = self.inner.read().error_websocket.clone() {
            f(bid, sid, error);
        }
    }

    pub fn call_message_websocket(&self, bid: ConnectionId, sid: StreamId, data: &[u8], text: bool) {
        if let Some(f) = self.inner.read().message_websocket.clone() {
            f(bid, sid, data, text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn unset_raw_slot_defaults_to_allow() {
        let bus = CallbackBus::new();
        assert!(bus.call_raw(ConnectionId(1), b"data"));
    }

    #[test]
    fn set_slot_is_observed_through_clones() {
        let bus = CallbackBus::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        bus.set_header(Arc::new(move |_sid, _bid, _k, _v| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        }));
        let shared = bus.clone();
        assert!(shared.is_header());
        shared.call_header(StreamId::HTTP1, ConnectionId(1), "host", "x");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
