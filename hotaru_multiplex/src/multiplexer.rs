//! The connection-level hub (spec.md §4.6): dispatches transport events by `(proto,
//! agent)`, owns per-connection options/streams/sessions, and drives the deferred-erase
//! sweep and ping timer.
//!
//! Grounded on `examples/original_source/src/server/web/http2.cpp`'s `web2_t` class, whose
//! `connectEvents`/`disconnectEvents`/`readEvents`/`writeEvents`/`prepare`/`websocket`/
//! `pinging`/`erase`/`close` methods this module names identically (spec.md §4.6
//! preserves the original's method list almost verbatim). Design Notes §9 flattens that
//! class's inheritance ladder into composition: `Multiplexer` owns value-typed
//! [`Http1Engine`] and [`Ws2Engine`] instances and a map of [`crate::http2_session`]
//! handles, selecting behavior by tag rather than virtual dispatch.
//!
//! One architectural seam is worth naming up front: [`crate::http2_session::Http2Session`]
//! is built directly on `h2::server::Connection`, which owns its socket's I/O end to end
//! (this is how `h2per`'s own `hyper::server::conn::http2` usage works, and the lower-level
//! equivalent is the same). That means the byte-oriented `(proto=Http2, agent=Http)` arm of
//! [`Multiplexer::read_events`]/[`Multiplexer::write_events`] is a deliberate no-op here —
//! the spawned `drive` future already pumps reads/writes for that bid — while the HTTP/1.1
//! and WebSocket-over-HTTP/2 arms (which do not own a socket) are driven the way spec.md
//! §4.6.3/§4.6.4 literally describes. This is recorded in DESIGN.md.

use crate::callbacks::CallbackBus;
use crate::config::{Mode, ServiceConfig};
use crate::error::{ErrorKind, H2ErrorCode, MultiplexError};
use crate::http1_engine::Http1Engine;
use crate::http2_session::{self, FrameFlags, FrameKind, Http2Handle, Http2SignalSink, Http2Session, PingKeepAlive};
use crate::http_parser::HttpParser;
use crate::ids::{Agent, ConnMode, ConnectionId, Direction, Identity, Protocol, SchemeId, StreamId};
use crate::transport::TransportAdapter;
use crate::ws2_engine::Ws2Engine;
use async_trait::async_trait;
use bytes::Bytes;
use hotaru_core::alias::PRwLock;
use hotaru_lib::compression::Compressor;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};

pub type ActiveCallback = Arc<dyn Fn(ConnectionId, ConnMode) + Send + Sync>;

/// Wall-clock milliseconds since `UNIX_EPOCH`. [`Http2SignalSink`]'s callbacks (unlike
/// [`Multiplexer::read_events`]/[`Multiplexer::pinging`]) carry no externally-supplied
/// timestamp, so the HTTP/2 path reads the clock directly where Digest nonce freshness
/// needs "now" (spec.md §4.7).
fn current_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Per-connection option bag (spec.md §3 `ConnectionOptions`).
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    pub proto: Protocol,
    pub agent: Agent,
    pub close: bool,
    pub stopped: bool,
    pub alive: bool,
    pub requests: u32,
    pub send_ping_ms: u64,
    pub crypted: bool,
    pub compressor: Compressor,
}

impl ConnectionOptions {
    fn new(alive: bool) -> Self {
        Self {
            proto: Protocol::Http1_1,
            agent: Agent::Http,
            close: false,
            stopped: false,
            alive,
            requests: 0,
            send_ping_ms: 0,
            crypted: false,
            compressor: Compressor::Identity,
        }
    }
}

/// Per-(stream, connection) HTTP/2 parser state (spec.md §3 `Stream`).
struct Http2Stream {
    http: HttpParser,
    crypted: bool,
    compressor: Compressor,
}

struct Http2SessionEntry {
    session: Arc<Http2Session>,
    handle: Http2Handle,
    ping: Option<Arc<PingKeepAlive>>,
    last_stream: i32,
}

/// The hub described in spec.md §4.6. Construct one per listener; feed it transport
/// events via [`Multiplexer::connect_events`]/[`Multiplexer::disconnect_events`]/
/// [`Multiplexer::read_events`]/[`Multiplexer::write_events`], and call
/// [`Multiplexer::pinging`] on every tick of an external timer.
pub struct Multiplexer {
    config: Arc<ServiceConfig>,
    core: Arc<dyn TransportAdapter>,
    http1: Arc<Http1Engine>,
    ws2: Arc<Ws2Engine>,
    callbacks: CallbackBus,
    active: PRwLock<Option<ActiveCallback>>,

    options: PRwLock<HashMap<ConnectionId, ConnectionOptions>>,
    streams: PRwLock<HashMap<(StreamId, ConnectionId), Http2Stream>>,
    sessions: PRwLock<HashMap<ConnectionId, Http2SessionEntry>>,
    agents: PRwLock<HashMap<ConnectionId, Agent>>,
    disconnected: PRwLock<crate::erase::DisconnectQueue>,
}

impl Multiplexer {
    pub fn new(config: Arc<ServiceConfig>, core: Arc<dyn TransportAdapter>) -> Arc<Self> {
        let callbacks = CallbackBus::new();
        let http1 = Arc::new(Http1Engine::new(callbacks.clone(), config.clone()));
        http1.set_core(core.clone());
        let ws2 = Arc::new(Ws2Engine::new(callbacks.clone()));
        Arc::new(Self {
            config,
            core,
            http1,
            ws2,
            callbacks,
            active: PRwLock::new(None),
            options: PRwLock::new(HashMap::new()),
            streams: PRwLock::new(HashMap::new()),
            sessions: PRwLock::new(HashMap::new()),
            agents: PRwLock::new(HashMap::new()),
            disconnected: PRwLock::new(crate::erase::DisconnectQueue::new()),
        })
    }

    pub fn callbacks(&self) -> &CallbackBus {
        &self.callbacks
    }

    /// Sets the `"active"` callback. Deliberately not part of [`CallbackBus`] — spec.md §9
    /// records the fan-out of `"active"` into sub-engine buses as ambiguous in the source,
    /// and SPEC_FULL.md §6 resolves it as "do not fan out," so the slot lives here instead.
    pub fn set_active(&self, f: ActiveCallback) {
        *self.active.write() = Some(f);
    }

    fn fire_active(&self, bid: ConnectionId, mode: ConnMode) {
        if let Some(f) = self.active.read().clone() {
            f(bid, mode);
        }
    }

    // -- §4.6.1 connectEvents ------------------------------------------------

    pub fn connect_events(&self, bid: ConnectionId, sid: SchemeId) {
        self.options.write().insert(bid, ConnectionOptions::new(self.config.alive));
        self.http1.connect_events(bid, sid);
        self.agents.write().insert(bid, Agent::Http);
        self.fire_active(bid, ConnMode::Connect);
    }

    // -- §4.6.2 disconnectEvents ----------------------------------------------

    pub fn disconnect_events(&self, bid: ConnectionId, sid: SchemeId, now_ms: u64) {
        if let Some(entry) = self.sessions.write().remove(&bid) {
            entry.handle.shutdown();
            self.ws2.remove(bid);
        }
        self.disconnected.write().enqueue(bid, now_ms);
        self.fire_active(bid, ConnMode::Disconnect);
        let _ = sid;
    }

    // -- §4.6.3 readEvents -----------------------------------------------------

    pub async fn read_events(&self, buf: &[u8], bid: ConnectionId, sid: SchemeId, now_ms: u64) {
        if !self.callbacks.call_raw(bid, buf) {
            return;
        }
        let proto = {
            let mut opts = self.options.write();
            let Some(opt) = opts.get_mut(&bid) else { return };
            if opt.close {
                None
            } else {
                if let Some(p) = self.core.proto(bid) {
                    opt.proto = p;
                }
                Some(opt.proto)
            }
        };
        let Some(proto) = proto else {
            self.core.close(bid).await;
            return;
        };

        let agent = self.agents.read().get(&bid).copied().unwrap_or(Agent::Http);
        match (proto, agent) {
            (Protocol::Http1_1, _) => self.http1.read_events(buf, bid, now_ms).await,
            (Protocol::Http2, Agent::Http) => {
                // The h2-owned socket already pumps reads inside the `drive` future spawned
                // by `accept_http2`; see the module doc for why this arm is a no-op.
            }
            (Protocol::Http2, Agent::WebSocket) => {
                let frame_size_limit = self.config.chunk_size.max(65536);
                self.ws2.read_events(bid, buf, frame_size_limit);
            }
        }
        let _ = sid;
    }

    // -- §4.6.4 writeEvents -----------------------------------------------------

    pub async fn write_events(&self, bid: ConnectionId, sid: SchemeId) {
        let agent = self.agents.read().get(&bid).copied().unwrap_or(Agent::Http);
        let proto = self.options.read().get(&bid).map(|o| o.proto).unwrap_or(Protocol::Http1_1);
        match (proto, agent) {
            (Protocol::Http2, Agent::Http) => {
                let should_close = {
                    let mut opts = self.options.write();
                    match opts.get_mut(&bid) {
                        Some(opt) if !opt.close && opt.stopped => {
                            opt.close = true;
                            true
                        }
                        _ => false,
                    }
                };
                if should_close {
                    self.core.close(bid).await;
                }
            }
            (Protocol::Http2, Agent::WebSocket) => {}
            (Protocol::Http1_1, _) => {}
        }
        let _ = sid;
    }

    // -- HTTP/2 acceptance -----------------------------------------------------

    /// Negotiates the HTTP/2 preface on `io` and spawns the per-connection frame-pump task.
    /// Called by the caller once ALPN (or prior knowledge) has picked `h2` for `bid` — the
    /// raw socket itself is a Core/TransportAdapter concern (spec.md §1 Non-goals), this is
    /// the one seam where this crate must still touch it directly, since `h2::server::
    /// Connection` owns the I/O end of the connection it negotiates (see module doc).
    pub async fn accept_http2<T>(self: &Arc<Self>, bid: ConnectionId, sid: SchemeId, io: T) -> Result<(), h2::Error>
    where
        T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let enable_connect = self.config.mode(Mode::ConnectMethodEnable);
        let (session, rx, mut connection) = http2_session::handshake(io, 200, 65_535, 16_384, 16_384, enable_connect).await?;
        let ping = connection.ping_pong().map(|pp| Arc::new(PingKeepAlive::new(pp)));
        let session = Arc::new(session);
        let handle = Http2Handle::new(&session);

        self.options.write().entry(bid).or_insert_with(|| ConnectionOptions::new(self.config.alive)).proto = Protocol::Http2;
        self.agents.write().insert(bid, Agent::Http);
        self.sessions.write().insert(bid, Http2SessionEntry { session: session.clone(), handle, ping, last_stream: 0 });

        let sink = self.clone();
        let drive_session = session.clone();
        tokio::spawn(async move {
            drive_session.drive(bid, connection, rx, sink).await;
        });
        let _ = sid;
        Ok(())
    }

    // -- §4.6.5 HTTP/2 stream signals (Http2SignalSink impl below) -------------

    fn track_last_stream(&self, bid: ConnectionId, sid: StreamId) {
        if let Some(entry) = self.sessions.write().get_mut(&bid) {
            entry.last_stream = entry.last_stream.max(sid.0);
        }
    }

    fn session_handle(&self, bid: ConnectionId) -> Option<Http2Handle> {
        self.sessions.read().get(&bid).map(|e| e.handle.clone())
    }

    // -- §4.6.6 prepare ---------------------------------------------------------

    async fn prepare(&self, sid: StreamId, bid: ConnectionId, now_ms: u64) {
        let config = self.config.clone();

        let finalize_err = {
            let mut streams = self.streams.write();
            match streams.get_mut(&(sid, bid)) {
                Some(stream) => {
                    stream.http.negotiate_inbound_compressor();
                    stream.http.finalize_inbound_body().err()
                }
                None => return,
            }
        };
        if let Some(err) = finalize_err {
            let kind = if config.encryption.enabled { ErrorKind::Encryption } else { ErrorKind::Compression };
            self.callbacks.call_error(bid, MultiplexError::critical(kind, err));
            self.respond_simple(bid, sid, 400, "Bad Request").await;
            return;
        }

        {
            let mut opts = self.options.write();
            if let Some(opt) = opts.get_mut(&bid) {
                if !config.alive && !opt.alive {
                    opt.requests += 1;
                    opt.close = config.max_requests > 0 && opt.requests >= config.max_requests;
                } else {
                    opt.requests = 0;
                }
            }
        }

        let (crypted, compressor) = {
            let streams = self.streams.read();
            match streams.get(&(sid, bid)) {
                Some(s) => (s.http.crypted(), s.http.compression()),
                None => return,
            }
        };
        if let Some(opt) = self.options.write().get_mut(&bid) {
            opt.crypted = crypted;
            opt.compressor = compressor;
        }

        let (verdict, identity, has_body) = {
            let mut streams = self.streams.write();
            let Some(stream) = streams.get_mut(&(sid, bid)) else { return };
            let identity = if stream.http.handshake() { Identity::Ws } else { Identity::Http };
            stream.http.identity(identity);
            let verdict = stream.http.auth(now_ms);
            (verdict, identity, !stream.http.body().is_empty())
        };

        match verdict {
            crate::auth::AuthVerdict::Good if identity == Identity::Ws => {
                if config.websocket_enabled() {
                    self.websocket(sid, bid).await;
                } else {
                    self.respond_simple(bid, sid, 505, "Requested protocol is not supported by this server").await;
                    self.callbacks.call_error(
                        bid,
                        MultiplexError::critical(ErrorKind::Http1Recv, "Requested protocol is not supported by this server"),
                    );
                }
            }
            crate::auth::AuthVerdict::Good => {
                self.callbacks.call_handshake(bid, Agent::Http);
                if has_body {
                    self.callbacks.call_entity(sid, bid);
                }
                self.callbacks.call_complete(sid, bid);
            }
            crate::auth::AuthVerdict::Fault => {
                let (status, header_name, value) = {
                    let streams = self.streams.read();
                    streams.get(&(sid, bid)).map(|s| s.http.challenge()).unwrap_or((500, "", String::new()))
                };
                self.respond_challenge(bid, sid, status, header_name, &value).await;
                self.callbacks.call_error(bid, MultiplexError::critical(ErrorKind::Http1Recv, "authorization failed"));
            }
        }
    }

    /// Response synthesis (SPEC_FULL.md §3): send a full `:status` header block plus body.
    /// If the session is already gone (first tier of the fallback ladder fails), fall back
    /// to RST_STREAM and finally a hard transport close — the two tiers `prepare`'s other
    /// callers reach for when a send itself is impossible.
    async fn respond_simple(&self, bid: ConnectionId, sid: StreamId, status: u16, body: &str) {
        let Some(handle) = self.session_handle(bid) else {
            self.core.close(bid).await;
            return;
        };
        let headers = vec![(":status".to_string(), status.to_string()), ("content-length".to_string(), body.len().to_string())];
        handle.send_headers(sid, headers, FrameFlags::NONE);
        handle.send_data(sid, Bytes::copy_from_slice(body.as_bytes()), FrameFlags::END_STREAM);
        self.mark_stopped(bid);
    }

    async fn respond_challenge(&self, bid: ConnectionId, sid: StreamId, status: u16, header_name: &str, value: &str) {
        let Some(handle) = self.session_handle(bid) else {
            self.core.close(bid).await;
            return;
        };
        let headers = vec![
            (":status".to_string(), status.to_string()),
            (header_name.to_ascii_lowercase(), value.to_string()),
            ("content-length".to_string(), "0".to_string()),
        ];
        handle.send_headers(sid, headers, FrameFlags::END_STREAM);
        self.mark_stopped(bid);
    }

    fn mark_stopped(&self, bid: ConnectionId) {
        if let Some(opt) = self.options.write().get_mut(&bid) {
            opt.stopped = true;
        }
    }

    // -- §4.6.7 websocket (WS-over-H2 upgrade) -----------------------------------

    async fn websocket(&self, sid: StreamId, bid: ConnectionId) {
        let config = self.config.clone();
        let Some(handle) = self.session_handle(bid) else { return };

        let handshake_ok = {
            let streams = self.streams.read();
            streams.get(&(sid, bid)).map(|s| s.http.handshake()).unwrap_or(false)
        };
        if !handshake_ok {
            self.respond_simple(bid, sid, 400, "WebSocket handshake version mismatch").await;
            self.callbacks.call_error(bid, MultiplexError::critical(ErrorKind::Handshake, "WebSocket handshake failed"));
            self.core.close(bid).await;
            return;
        }

        {
            let mut streams = self.streams.write();
            if let Some(stream) = streams.get_mut(&(sid, bid)) {
                stream.http.set_takeover(false, config.mode(Mode::TakeoverServer));
                stream.http.set_takeover(true, config.mode(Mode::TakeoverClient));
            }
        }

        self.ws2.insert(bid, sid, &config, handle.clone());
        self.agents.write().insert(bid, Agent::WebSocket);
        if let Some(opt) = self.options.write().get_mut(&bid) {
            opt.agent = Agent::WebSocket;
        }

        handle.send_headers(sid, vec![(":status".to_string(), "200".to_string())], FrameFlags::NONE);

        self.callbacks.call_stream_open(sid, bid);
        self.callbacks.call_handshake(bid, Agent::WebSocket);
        let has_body = {
            let streams = self.streams.read();
            streams.get(&(sid, bid)).map(|s| !s.http.body().is_empty()).unwrap_or(false)
        };
        if has_body {
            self.callbacks.call_entity(sid, bid);
        }
        self.callbacks.call_complete(sid, bid);
    }

    // -- §4.6.8 pinging -----------------------------------------------------------

    pub async fn pinging(&self, now_ms: u64) {
        if !self.config.pinging_enabled() {
            return;
        }
        self.http1.pinging(now_ms, self.config.ping_interval_ms, self.config.ping_interval_ms).await;

        let half_interval = self.config.ping_interval_ms / 2;
        let due: Vec<(ConnectionId, Arc<PingKeepAlive>)> = {
            let mut opts = self.options.write();
            let agents = self.agents.read();
            let mut sessions = self.sessions.write();
            let mut out = Vec::new();
            for (bid, agent) in agents.iter() {
                if *agent != Agent::Http {
                    continue;
                }
                let Some(opt) = opts.get_mut(bid) else { continue };
                if opt.proto != Protocol::Http2 {
                    continue;
                }
                if now_ms.saturating_sub(opt.send_ping_ms) <= half_interval {
                    continue;
                }
                if let Some(entry) = sessions.get_mut(bid) {
                    if let Some(ping) = entry.ping.clone() {
                        out.push((*bid, ping));
                        opt.send_ping_ms = now_ms;
                    }
                }
            }
            out
        };
        for (bid, ping) in due {
            let wait = std::time::Duration::from_millis(self.config.ping_interval_ms / 2);
            if ping.ping_and_wait(wait).await.is_err() {
                self.core.close(bid).await;
            }
        }

        self.ws2.pinging(now_ms, self.config.ping_interval_ms, self.config.ping_interval_ms);
    }

    // -- §4.6.9 erase --------------------------------------------------------------

    pub async fn erase(&self, bid: Option<ConnectionId>, now_ms: u64) {
        let eligible = match bid {
            Some(bid) => {
                if self.disconnected.write().take_if_eligible(bid, now_ms) {
                    vec![bid]
                } else {
                    Vec::new()
                }
            }
            None => self.disconnected.write().drain_eligible(now_ms),
        };
        for bid in eligible {
            if let Some(opt) = self.options.write().get_mut(&bid) {
                opt.close = true;
            }
            let agent = self.agents.read().get(&bid).copied().unwrap_or(Agent::Http);
            let proto = self.options.read().get(&bid).map(|o| o.proto).unwrap_or(Protocol::Http1_1);
            match (proto, agent) {
                (Protocol::Http1_1, _) => self.http1.erase(bid),
                (Protocol::Http2, Agent::Http) => {
                    self.sessions.write().remove(&bid);
                }
                (Protocol::Http2, Agent::WebSocket) => {
                    self.ws2.erase(bid);
                    self.sessions.write().remove(&bid);
                }
            }
            self.streams.write().retain(|(_, sbid), _| *sbid != bid);
            self.agents.write().remove(&bid);
            self.options.write().remove(&bid);
            self.callbacks.call_erase(bid);
        }
    }

    // -- §4.6.10 close --------------------------------------------------------------

    pub async fn close(&self, bid: ConnectionId) {
        let agent = self.agents.read().get(&bid).copied().unwrap_or(Agent::Http);
        let proto = self.options.read().get(&bid).map(|o| o.proto).unwrap_or(Protocol::Http1_1);
        match (proto, agent) {
            (Protocol::Http2, Agent::Http) => {
                if let Some(entry) = self.sessions.read().get(&bid) {
                    entry.handle.shutdown();
                } else {
                    self.core.close(bid).await;
                }
                self.ws2.erase(bid);
            }
            (Protocol::Http2, Agent::WebSocket) => {
                self.ws2.erase(bid);
                if let Some(entry) = self.sessions.read().get(&bid) {
                    entry.handle.shutdown();
                }
            }
            (Protocol::Http1_1, _) => self.core.close(bid).await,
        }
    }

    // -- Public emission surface (spec.md §4.3 "Emission") --------------------------

    pub fn send2(&self, bid: ConnectionId, sid: StreamId, headers: Vec<(String, String)>, flag: FrameFlags) {
        if let Some(handle) = self.session_handle(bid) {
            handle.send_headers(sid, headers, flag);
            if flag.end_stream {
                self.mark_stopped(bid);
            }
        }
    }

    pub fn send_data2(&self, bid: ConnectionId, sid: StreamId, data: Bytes, flag: FrameFlags) {
        if let Some(handle) = self.session_handle(bid) {
            handle.send_data(sid, data, flag);
            if flag.end_stream {
                self.mark_stopped(bid);
            }
        }
    }

    pub fn send_trailers2(&self, bid: ConnectionId, sid: StreamId, trailers: Vec<(String, String)>) {
        if let Some(handle) = self.session_handle(bid) {
            handle.send_trailers(sid, trailers);
            self.mark_stopped(bid);
        }
    }

    pub fn push(&self, bid: ConnectionId, sid: StreamId, headers: Vec<(String, String)>, flag: FrameFlags) {
        self.send2(bid, sid, headers, flag);
    }

    pub fn reject2(&self, bid: ConnectionId, sid: StreamId, code: H2ErrorCode) {
        if let Some(handle) = self.session_handle(bid) {
            handle.reject(sid, code);
        }
    }

    /// GOAWAY with an optional diagnostic `extra` payload (SPEC_FULL.md §3; logged only).
    pub fn goaway(&self, bid: ConnectionId, code: H2ErrorCode, extra: Option<&str>) {
        let last_stream = self.sessions.read().get(&bid).map(|e| e.last_stream).unwrap_or(0);
        if let Some(handle) = self.session_handle(bid) {
            if let Some(extra) = extra {
                tracing::debug!(bid = %bid, extra, "GOAWAY debug data");
            }
            handle.goaway(StreamId(last_stream), code);
        }
    }

    /// Graceful shutdown: GOAWAY(NO_ERROR) plus final flush (spec.md §4.3 `shutdown()`,
    /// S6 in spec.md §8).
    pub fn shutdown2(&self, bid: ConnectionId) {
        if let Some(handle) = self.session_handle(bid) {
            handle.shutdown();
        }
    }
}

#[async_trait]
impl Http2SignalSink for Multiplexer {
    async fn begin(&self, bid: ConnectionId, sid: StreamId) {
        self.track_last_stream(bid, sid);
        let mut stream = Http2Stream { http: HttpParser::new(bid), crypted: false, compressor: Compressor::Identity };
        stream.http.chunk(self.config.chunk_size);
        stream.http.compressors(self.config.compressors.clone());
        stream
            .http
            .ident(self.config.ident.id.clone(), self.config.ident.name.clone(), self.config.ident.version.clone());
        if self.config.encryption.enabled {
            stream.http.encryption(true, self.config.encryption.pass.clone(), self.config.encryption.salt.clone());
        }
        stream.http.auth_type(self.config.auth_type, self.config.hash);
        stream.http.realm(self.config.realm.clone());
        stream.http.opaque(self.config.opaque.clone());
        let callbacks = self.callbacks.clone();
        stream.http.auth_callback(Arc::new(move |bid, user: &str, pass: &str| callbacks.call_check_password(bid, user, pass)));
        let callbacks = self.callbacks.clone();
        stream.http.extract_pass_callback(Arc::new(move |bid, user: &str| callbacks.call_extract_password(bid, user)));
        self.streams.write().insert((sid, bid), stream);
    }

    async fn header(&self, bid: ConnectionId, sid: StreamId, key: &str, value: &str) {
        if let Some(stream) = self.streams.write().get_mut(&(sid, bid)) {
            stream.http.header2(key, value);
        }
        self.callbacks.call_header(sid, bid, key, value);
    }

    async fn trailer(&self, bid: ConnectionId, sid: StreamId, key: &str, value: &str) {
        if let Some(stream) = self.streams.write().get_mut(&(sid, bid)) {
            stream.http.trailer_in(key, value);
        }
        self.callbacks.call_header(sid, bid, key, value);
    }

    async fn chunk(&self, bid: ConnectionId, sid: StreamId, data: &[u8]) {
        if self.callbacks.is_chunking() {
            self.callbacks.call_chunking(sid, bid, data);
        } else {
            let agent = self.agents.read().get(&bid).copied().unwrap_or(Agent::Http);
            match agent {
                Agent::Http => {
                    if let Some(stream) = self.streams.write().get_mut(&(sid, bid)) {
                        stream.http.append_body(data);
                    }
                }
                Agent::WebSocket => {
                    let limit = self.config.chunk_size.max(65536);
                    self.ws2.read_events(bid, data, limit);
                }
            }
        }
        if let Some(opt) = self.options.write().get_mut(&bid) {
            opt.send_ping_ms = current_ms();
        }
        self.callbacks.call_chunks(sid, bid, data);
    }

    async fn frame(&self, bid: ConnectionId, sid: StreamId, dir: Direction, kind: FrameKind, flags: FrameFlags) {
        match dir {
            Direction::Send => {
                let agent = self.agents.read().get(&bid).copied().unwrap_or(Agent::Http);
                if flags.end_stream && agent == Agent::Http {
                    let should_close = {
                        let mut opts = self.options.write();
                        match opts.get_mut(&bid) {
                            Some(opt) if opt.stopped && !opt.close => {
                                opt.close = true;
                                true
                            }
                            _ => false,
                        }
                    };
                    if should_close {
                        if let Some(handle) = self.session_handle(bid) {
                            handle.shutdown();
                        }
                        self.streams.write().remove(&(sid, bid));
                    }
                }
                self.callbacks.call_end(sid, bid, dir);
            }
            Direction::Recv => {
                match kind {
                    FrameKind::Data if flags.end_stream => {
                        {
                            let mut streams = self.streams.write();
                            if let Some(stream) = streams.get_mut(&(sid, bid)) {
                                stream.http.commit();
                            }
                        }
                        self.prepare(sid, bid, current_ms()).await;
                        self.callbacks.call_stream_close(sid, bid);
                    }
                    FrameKind::Headers if flags.end_headers => {
                        {
                            let mut streams = self.streams.write();
                            if let Some(stream) = streams.get_mut(&(sid, bid)) {
                                stream.http.commit();
                            }
                        }
                        self.callbacks.call_request(sid, bid);
                        self.callbacks.call_headers(sid, bid);
                        let identity_ws_or_proxy = {
                            let streams = self.streams.read();
                            streams.get(&(sid, bid)).map(|s| s.http.handshake()).unwrap_or(false)
                        };
                        if flags.end_stream || identity_ws_or_proxy {
                            self.prepare(sid, bid, current_ms()).await;
                        }
                    }
                    _ => {}
                }
                self.callbacks.call_end(sid, bid, dir);
            }
        }
    }

    async fn closed(&self, bid: ConnectionId, sid: StreamId, err: H2ErrorCode) {
        self.streams.write().remove(&(sid, bid));
        if err != H2ErrorCode::NoError {
            self.core.close(bid).await;
        }
        self.callbacks.call_stream_close(sid, bid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthType;
    use crate::ids::Protocol as P;
    use async_trait::async_trait;
    use parking_lot::Mutex as StdMutex;

    #[derive(Default)]
    struct RecordingAdapter {
        sent: Arc<StdMutex<Vec<Vec<u8>>>>,
        closed: Arc<StdMutex<Vec<ConnectionId>>>,
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
        fn proto(&self, _bid: ConnectionId) -> Option<P> {
            Some(P::Http1_1)
        }
        async fn send(&self, _bid: ConnectionId, buf: &[u8]) -> bool {
            self.sent.lock().push(buf.to_vec());
            true
        }
        async fn close(&self, bid: ConnectionId) {
            self.closed.lock().push(bid);
        }
    }

    fn mux_with(config: ServiceConfig) -> (Arc<Multiplexer>, Arc<RecordingAdapter>) {
        let adapter = Arc::new(RecordingAdapter::default());
        let mux = Multiplexer::new(Arc::new(config), adapter.clone());
        (mux, adapter)
    }

    #[tokio::test]
    async fn connect_events_seeds_http_agent_and_options() {
        let (mux, _adapter) = mux_with(ServiceConfig::builder().build());
        mux.connect_events(ConnectionId(1), SchemeId(1));
        assert_eq!(mux.agents.read().get(&ConnectionId(1)), Some(&Agent::Http));
        assert!(mux.options.read().contains_key(&ConnectionId(1)));
    }

    #[tokio::test]
    async fn http1_request_round_trips_through_the_hub() {
        let (mux, adapter) = mux_with(ServiceConfig::builder().build());
        mux.connect_events(ConnectionId(1), SchemeId(1));
        mux.read_events(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n", ConnectionId(1), SchemeId(1), 0).await;
        let sent = adapter.sent.lock();
        assert_eq!(sent.len(), 1);
        assert!(String::from_utf8_lossy(&sent[0]).starts_with("HTTP/1.1 200 OK"));
    }

    #[tokio::test]
    async fn disconnect_then_erase_respects_deferred_window() {
        let (mux, _adapter) = mux_with(ServiceConfig::builder().build());
        mux.connect_events(ConnectionId(1), SchemeId(1));
        mux.disconnect_events(ConnectionId(1), SchemeId(1), 1_000);
        mux.erase(None, 2_000).await;
        assert!(mux.options.read().contains_key(&ConnectionId(1)));
        mux.erase(None, 4_500).await;
        assert!(!mux.options.read().contains_key(&ConnectionId(1)));
    }

    #[tokio::test]
    async fn max_requests_latches_connection_close_header() {
        let (mux, adapter) = mux_with(ServiceConfig::builder().max_requests(1).build());
        mux.connect_events(ConnectionId(1), SchemeId(1));
        mux.read_events(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n", ConnectionId(1), SchemeId(1), 0).await;
        let sent = adapter.sent.lock();
        assert!(String::from_utf8_lossy(&sent[0]).contains("Connection: close"));
        drop(sent);
        assert_eq!(adapter.closed.lock().as_slice(), &[ConnectionId(1)]);
    }

    #[tokio::test]
    async fn basic_auth_fault_through_the_hub_emits_401() {
        let config = ServiceConfig::builder().auth(AuthType::Basic, crate::config::HashAlg::Sha256).realm("r").build();
        let (mux, adapter) = mux_with(config);
        mux.callbacks().set_check_password(Arc::new(|_, _, _| false));
        mux.connect_events(ConnectionId(1), SchemeId(1));
        mux.read_events(
            b"GET /p HTTP/1.1\r\nHost: x\r\nAuthorization: Basic dXNlcjpwYXNz\r\n\r\n",
            ConnectionId(1),
            SchemeId(1),
            0,
        )
        .await;
        let sent = adapter.sent.lock();
        assert!(String::from_utf8_lossy(&sent[0]).starts_with("HTTP/1.1 401"));
    }
}
