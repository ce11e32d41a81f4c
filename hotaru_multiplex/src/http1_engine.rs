//! Per-connection HTTP/1.1 state machine, hosting WebSocket-over-HTTP/1 upgrade
//! (spec.md §4.5). The sibling to [`crate::http2_session::Http2Session`] for the
//! HTTP/1.1 side of the bifurcation that [`crate::multiplexer::Multiplexer`] drives.
//!
//! Grounded on `examples/original_source/src/server/web/http2.cpp`'s delegation pattern:
//! `Http2::connectEvents`/`readEvents`/`writeEvents`/`pinging` all forward to a private
//! `_http1` member keyed by its own `_agents` map (spec.md §3: "HTTP/1 tracks separately"),
//! and on that file's `prepare()`/`websocket()` GOOD/FAULT/upgrade dispatch, adapted to
//! HTTP/1's request/response framing instead of HTTP/2 HEADERS/DATA frames. Line/header
//! tokenizing is delegated to `httparse` (spec.md §1 treats this as an assumed-correct
//! external primitive), leaving this module to own the state machine wrapped around it.

use crate::auth::AuthVerdict;
use crate::callbacks::CallbackBus;
use crate::config::{Mode, ServiceConfig};
use crate::error::{ErrorKind, MultiplexError};
use crate::http_parser::{self, ClearSuite, Direction as ParseDirection, HttpParser};
use crate::ids::{Agent, ConnectionId, Identity, SchemeId, StreamId};
use crate::transport::TransportAdapter;
use crate::ws_framer::{self, FragmentAssembler, WsConnectionCodec, WsFrame, WsFramerError, WsOpcode};
use base64::Engine as _;
use hotaru_core::alias::PRwLock;
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use std::sync::Arc;
use tungstenite::protocol::frame::coding::CloseCode;

/// RFC 6455 §1.3 fixed GUID used to derive `Sec-WebSocket-Accept`.
const WS_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Per-connection state, spec.md §4.5's diagram collapsed onto what a synchronous
/// `readEvents` call can observe in one pass: header assembly, body accumulation, and
/// (once a full request is in hand) dispatch happen inside a single state transition;
/// `ResponsePending` is the window the pipelining check (spec.md §4.5) watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingHead,
    AwaitingBody,
    ResponsePending,
    WsFraming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyMode {
    None,
    ContentLength(usize),
    Chunked,
}

struct Connection {
    sid: SchemeId,
    state: State,
    agent: Agent,
    buffer: Vec<u8>,
    body_mode: BodyMode,
    body_received: usize,
    parser: HttpParser,
    alive: bool,
    requests: u32,
    close: bool,
    ws_codec: Option<WsConnectionCodec>,
    ws_assembler: FragmentAssembler,
}

impl Connection {
    fn new(bid: ConnectionId, sid: SchemeId) -> Self {
        Self {
            sid,
            state: State::AwaitingHead,
            agent: Agent::Http,
            buffer: Vec::new(),
            body_mode: BodyMode::None,
            body_received: 0,
            parser: HttpParser::new(bid),
            alive: false,
            requests: 0,
            close: false,
            ws_codec: None,
            ws_assembler: FragmentAssembler::new(),
        }
    }
}

/// Per-connection HTTP/1.1 engine. One instance is shared (via `Arc`) by the
/// Multiplexer and, once upgraded, feeds decoded WebSocket messages through the same
/// `CallbackBus` Ws2Engine uses — there is no separate "Ws1Engine", matching spec.md §4.5
/// ("hosts WebSocket-over-HTTP/1 upgrade" rather than naming a distinct component).
pub struct Http1Engine {
    callbacks: CallbackBus,
    config: PRwLock<Arc<ServiceConfig>>,
    core: PRwLock<Option<Arc<dyn TransportAdapter>>>,
    connections: PRwLock<HashMap<ConnectionId, Connection>>,
}

impl Http1Engine {
    pub fn new(callbacks: CallbackBus, config: Arc<ServiceConfig>) -> Self {
        Self {
            callbacks,
            config: PRwLock::new(config),
            core: PRwLock::new(None),
            connections: PRwLock::new(HashMap::new()),
        }
    }

    /// Mirrors `this->_http1._core = this->_core` in the original: the Multiplexer hands
    /// down its transport handle the first time a connection negotiates HTTP/1.1.
    pub fn set_core(&self, core: Arc<dyn TransportAdapter>) {
        *self.core.write() = Some(core);
    }

    pub fn set_config(&self, config: Arc<ServiceConfig>) {
        *self.config.write() = config;
    }

    pub fn agent(&self, bid: ConnectionId) -> Option<Agent> {
        self.connections.read().get(&bid).map(|c| c.agent)
    }

    pub fn contains(&self, bid: ConnectionId) -> bool {
        self.connections.read().contains_key(&bid)
    }

    pub fn connect_events(&self, bid: ConnectionId, sid: SchemeId) {
        let config = self.config.read().clone();
        let mut conn = Connection::new(bid, sid);
        conn.alive = config.alive;
        conn.parser.chunk(config.chunk_size);
        conn.parser.compressors(config.compressors.clone());
        conn.parser.ident(config.ident.id.clone(), config.ident.name.clone(), config.ident.version.clone());
        if config.encryption.enabled {
            conn.parser.encryption(true, config.encryption.pass.clone(), config.encryption.salt.clone());
        }
        conn.parser.auth_type(config.auth_type, config.hash);
        conn.parser.realm(config.realm.clone());
        conn.parser.opaque(config.opaque.clone());
        if let Some(f) = self.check_password_fn() {
            conn.parser.auth_callback(f);
        }
        if let Some(f) = self.extract_password_fn() {
            conn.parser.extract_pass_callback(f);
        }
        self.connections.write().insert(bid, conn);
    }

    pub fn erase(&self, bid: ConnectionId) {
        self.connections.write().remove(&bid);
    }

    fn check_password_fn(&self) -> Option<http_parser::CheckPasswordFn> {
        let bus = self.callbacks.clone();
        Some(Arc::new(move |bid, user: &str, pass: &str| bus.call_check_password(bid, user, pass)))
    }

    fn extract_password_fn(&self) -> Option<http_parser::ExtractPasswordFn> {
        let bus = self.callbacks.clone();
        Some(Arc::new(move |bid, user: &str| bus.call_extract_password(bid, user)))
    }

    /// Feeds freshly read bytes through the state machine, dispatching as many complete
    /// requests as `buf` contains. spec.md §4.5: pipelining is rejected — a second request
    /// line arriving while `ResponsePending` is still set elicits `PROTOCOL_ERROR` + close.
    pub async fn read_events(&self, buf: &[u8], bid: ConnectionId, now_ms: u64) {
        let core = self.core.read().clone();
        let Some(core) = core else { return };

        enum Intake {
            Buffered,
            Ws,
            Pipelined,
            NoOp,
        }

        let intake = {
            let mut conns = self.connections.write();
            let Some(conn) = conns.get_mut(&bid) else { return };
            match conn.state {
                State::WsFraming => Intake::Ws,
                // Pipelined bytes arriving before the prior response finished: spec.md
                // §4.5 "elicits PROTOCOL_ERROR and close."
                State::ResponsePending if !buf.is_empty() => Intake::Pipelined,
                State::ResponsePending => Intake::NoOp,
                _ => {
                    conn.buffer.extend_from_slice(buf);
                    Intake::Buffered
                }
            }
        };
        match intake {
            Intake::Pipelined => {
                self.callbacks.call_error(
                    bid,
                    MultiplexError::critical(ErrorKind::Protocol, "pipelining is not supported"),
                );
                core.close(bid).await;
                return;
            }
            Intake::NoOp => return,
            Intake::Ws => {
                self.feed_ws_bytes(bid, buf, now_ms, &*core).await;
                return;
            }
            Intake::Buffered => {}
        }

        // Bytes have been appended exactly once above; re-drive the state machine until
        // it can't make forward progress with what's buffered.
        loop {
            let step = self.advance(bid);
            match step {
                Advance::NeedMoreBytes => break,
                Advance::HeadReady => continue,
                Advance::BodyReady => {
                    self.dispatch(bid, now_ms, &*core).await;
                    // dispatch() resets state to AwaitingHead (keep-alive) or leaves the
                    // connection closing; either way, loop to drain any pipelined-but-legal
                    // next keep-alive request already sitting in the buffer.
                    let has_more = self.connections.read().get(&bid).map(|c| !c.buffer.is_empty()).unwrap_or(false);
                    if !has_more {
                        break;
                    }
                }
                Advance::MalformedHead => {
                    self.callbacks.call_error(bid, MultiplexError::critical(ErrorKind::Http1Recv, "malformed request line"));
                    core.close(bid).await;
                    break;
                }
                Advance::ConnectionGone => break,
            }
        }
    }

    /// Advances the header/body assembly as far as the buffered bytes allow.
    fn advance(&self, bid: ConnectionId) -> Advance {
        let mut conns = self.connections.write();
        let Some(conn) = conns.get_mut(&bid) else { return Advance::ConnectionGone };
        match conn.state {
            State::AwaitingHead => {
                let mut headers_storage = [httparse::EMPTY_HEADER; 64];
                let mut request = httparse::Request::new(&mut headers_storage);
                match request.parse(&conn.buffer) {
                    Ok(httparse::Status::Complete(consumed)) => {
                        let method = request.method.unwrap_or("GET").to_string();
                        let path = request.path.unwrap_or("/").to_string();
                        let version = if request.version == Some(1) { "HTTP/1.1" } else { "HTTP/1.0" }.to_string();
                        conn.parser.clear(ClearSuite::Header);
                        conn.parser.request_line(method, path, version);
                        for h in request.headers.iter() {
                            if let Ok(v) = std::str::from_utf8(h.value) {
                                conn.parser.header(h.name, v);
                            }
                        }
                        conn.parser.commit();
                        conn.buffer.drain(..consumed);

                        conn.body_mode = body_mode_of(&conn.parser);
                        conn.body_received = 0;
                        conn.state = if matches!(conn.body_mode, BodyMode::None) {
                            State::ResponsePending
                        } else {
                            State::AwaitingBody
                        };
                        Advance::HeadReady
                    }
                    Ok(httparse::Status::Partial) => Advance::NeedMoreBytes,
                    Err(_) => Advance::MalformedHead,
                }
            }
            State::AwaitingBody => match conn.body_mode {
                BodyMode::ContentLength(total) => {
                    let remaining = total - conn.body_received;
                    let take = remaining.min(conn.buffer.len());
                    if take > 0 {
                        let chunk: Vec<u8> = conn.buffer.drain(..take).collect();
                        conn.parser.append_body(&chunk);
                        conn.body_received += take;
                    }
                    if conn.body_received >= total {
                        conn.state = State::ResponsePending;
                        Advance::BodyReady
                    } else {
                        Advance::NeedMoreBytes
                    }
                }
                BodyMode::Chunked => match take_chunked_body(&mut conn.buffer) {
                    ChunkedResult::Done(body, trailers) => {
                        conn.parser.append_body(&body);
                        for (k, v) in trailers {
                            conn.parser.trailer_in(&k, &v);
                        }
                        conn.state = State::ResponsePending;
                        Advance::BodyReady
                    }
                    ChunkedResult::NeedMore => Advance::NeedMoreBytes,
                    ChunkedResult::Malformed => Advance::MalformedHead,
                },
                BodyMode::None => {
                    conn.state = State::ResponsePending;
                    Advance::BodyReady
                }
            },
            State::ResponsePending | State::WsFraming => Advance::NeedMoreBytes,
        }
    }

    /// Evaluates auth, synthesizes and sends the response, and either re-arms the
    /// connection for the next keep-alive request or latches it closed — spec.md §4.6.6
    /// `prepare`, specialized to HTTP/1 framing (status line, not `:status` pseudo-header).
    async fn dispatch(&self, bid: ConnectionId, now_ms: u64, core: &dyn TransportAdapter) {
        let config = self.config.read().clone();

        let finalize_err = {
            let mut conns = self.connections.write();
            let Some(conn) = conns.get_mut(&bid) else { return };
            conn.parser.negotiate_inbound_compressor();
            conn.parser.finalize_inbound_body().err()
        };
        if let Some(err) = finalize_err {
            let kind = if config.encryption.enabled { ErrorKind::Encryption } else { ErrorKind::Compression };
            self.callbacks.call_error(bid, MultiplexError::critical(kind, err));
            self.send_simple_response(bid, 400, "Bad Request", core).await;
            self.finish_request(bid, core).await;
            return;
        }

        let (_identity, verdict, is_ws_request) = {
            let mut conns = self.connections.write();
            let Some(conn) = conns.get_mut(&bid) else { return };
            if config.alive || conn.alive {
                conn.requests = 0;
            } else {
                conn.requests += 1;
                conn.close = config.max_requests > 0 && conn.requests >= config.max_requests;
            }
            let identity = if conn.parser.handshake() { Identity::Ws } else { Identity::Http };
            conn.parser.identity(identity);
            let verdict = conn.parser.auth(now_ms);
            (identity, verdict, conn.parser.handshake())
        };

        match verdict {
            AuthVerdict::Good if is_ws_request => {
                if config.websocket_enabled() {
                    self.upgrade_to_websocket(bid, core).await;
                } else {
                    self.send_simple_response(bid, 505, "Requested protocol is not supported by this server", core).await;
                    self.callbacks.call_error(
                        bid,
                        MultiplexError::critical(ErrorKind::Http1Recv, "Requested protocol is not supported by this server"),
                    );
                    self.finish_request(bid, core).await;
                }
            }
            AuthVerdict::Good => {
                self.callbacks.call_handshake(bid, Agent::Http);
                let has_body = {
                    let conns = self.connections.read();
                    conns.get(&bid).map(|c| !c.parser.body().is_empty()).unwrap_or(false)
                };
                if has_body {
                    self.callbacks.call_entity(StreamId::HTTP1, bid);
                }
                self.callbacks.call_complete(StreamId::HTTP1, bid);
                self.send_ok_response(bid, core).await;
                self.finish_request(bid, core).await;
            }
            AuthVerdict::Fault => {
                let (status, header_name, value) = {
                    let conns = self.connections.read();
                    conns.get(&bid).map(|c| c.parser.challenge()).unwrap_or((500, "", String::new()))
                };
                self.send_challenge_response(bid, status, header_name, &value, core).await;
                self.callbacks.call_error(bid, MultiplexError::critical(ErrorKind::Http1Recv, "authorization failed"));
                self.finish_request(bid, core).await;
            }
        }
    }

    async fn send_ok_response(&self, bid: ConnectionId, core: &dyn TransportAdapter) {
        let config = self.config.read().clone();
        let wire = {
            let mut conns = self.connections.write();
            let Some(conn) = conns.get_mut(&bid) else { return };
            let mut headers = vec![("Content-Length".to_string(), "0".to_string())];
            if conn.close {
                headers.push(("Connection".to_string(), "close".to_string()));
            } else {
                headers.push(("Connection".to_string(), "keep-alive".to_string()));
            }
            if !config.ident.name.is_empty() {
                headers.push(("Server".to_string(), config.ident.name.clone()));
            }
            conn.parser.process(ParseDirection::Response, "200", &headers, &[])
        };
        core.send(bid, &wire).await;
    }

    async fn send_simple_response(&self, bid: ConnectionId, status: u16, body: &str, core: &dyn TransportAdapter) {
        let wire = {
            let mut conns = self.connections.write();
            let Some(conn) = conns.get_mut(&bid) else { return };
            let headers = vec![("Content-Length".to_string(), body.len().to_string())];
            conn.parser.process(ParseDirection::Response, &status.to_string(), &headers, body.as_bytes())
        };
        core.send(bid, &wire).await;
    }

    async fn send_challenge_response(&self, bid: ConnectionId, status: u16, header_name: &str, value: &str, core: &dyn TransportAdapter) {
        let wire = {
            let mut conns = self.connections.write();
            let Some(conn) = conns.get_mut(&bid) else { return };
            let headers = vec![(header_name.to_string(), value.to_string()), ("Content-Length".to_string(), "0".to_string())];
            conn.parser.process(ParseDirection::Response, &status.to_string(), &headers, &[])
        };
        core.send(bid, &wire).await;
    }

    /// Re-arms the connection for the next keep-alive request, or closes it — spec.md §4.5
    /// `max-requests` rule and §3's `stopped`→`close` latch.
    async fn finish_request(&self, bid: ConnectionId, core: &dyn TransportAdapter) {
        let should_close = {
            let mut conns = self.connections.write();
            let Some(conn) = conns.get_mut(&bid) else { return };
            if conn.state == State::WsFraming {
                return;
            }
            conn.parser.reset();
            conn.state = State::AwaitingHead;
            conn.body_mode = BodyMode::None;
            conn.body_received = 0;
            conn.close
        };
        if should_close {
            core.close(bid).await;
        }
    }

    /// RFC 6455 handshake over HTTP/1.1: computes `Sec-WebSocket-Accept`, sends `101
    /// Switching Protocols`, and flips the connection into [`State::WsFraming`].
    async fn upgrade_to_websocket(&self, bid: ConnectionId, core: &dyn TransportAdapter) {
        let config = self.config.read().clone();
        let (accept_key, frame_size_limit) = {
            let conns = self.connections.read();
            let Some(conn) = conns.get(&bid) else { return };
            let key = conn.parser.headers().get_first("sec-websocket-key").unwrap_or("").to_string();
            (compute_accept_key(&key), config.chunk_size.max(65536))
        };

        let wire = {
            let mut conns = self.connections.write();
            let Some(conn) = conns.get_mut(&bid) else { return };
            let headers = vec![
                ("Upgrade".to_string(), "websocket".to_string()),
                ("Connection".to_string(), "Upgrade".to_string()),
                ("Sec-WebSocket-Accept".to_string(), accept_key),
            ];
            conn.parser.process(ParseDirection::Response, "101", &headers, &[])
        };
        core.send(bid, &wire).await;

        let mut conns = self.connections.write();
        let Some(conn) = conns.get_mut(&bid) else { return };
        let deflate = config
            .websocket_enabled()
            .then(|| hotaru_lib::compression::DeflateContext::new(config.mode(Mode::TakeoverServer)));
        conn.ws_codec = Some(WsConnectionCodec::new(deflate, frame_size_limit));
        conn.agent = Agent::WebSocket;
        conn.state = State::WsFraming;
        drop(conns);

        self.callbacks.call_handshake(bid, Agent::WebSocket);
        self.callbacks.call_complete(StreamId::HTTP1, bid);
    }

    /// Decodes and dispatches RFC 6455 frames once a connection is [`State::WsFraming`].
    async fn feed_ws_bytes(&self, bid: ConnectionId, buf: &[u8], _now_ms: u64, core: &dyn TransportAdapter) {
        let frame_size_limit = {
            let conns = self.connections.read();
            conns.get(&bid).and_then(|c| c.ws_codec.as_ref()).map(|c| c.frame_size_limit).unwrap_or(1 << 20)
        };
        let mut scratch = {
            let mut conns = self.connections.write();
            let Some(conn) = conns.get_mut(&bid) else { return };
            conn.buffer.extend_from_slice(buf);
            std::mem::take(&mut conn.buffer)
        };

        loop {
            match ws_framer::decode_frame(&scratch, true, frame_size_limit) {
                Ok(Some((frame, consumed))) => {
                    scratch.drain(..consumed);
                    self.handle_ws_frame(bid, frame, core).await;
                }
                Ok(None) => break,
                Err(e) => {
                    self.callbacks.call_error_websocket(bid, StreamId::HTTP1, MultiplexError::critical(ErrorKind::Protocol, format!("{e:?}")));
                    self.close_ws(bid, CloseCode::Protocol, "frame error", core).await;
                    scratch.clear();
                    break;
                }
            }
        }

        if let Some(conn) = self.connections.write().get_mut(&bid) {
            conn.buffer = scratch;
        }
    }

    async fn handle_ws_frame(&self, bid: ConnectionId, frame: WsFrame, core: &dyn TransportAdapter) {
        match frame.opcode {
            WsOpcode::Ping => {
                let pong = WsFrame { fin: true, opcode: WsOpcode::Pong, compressed: false, payload: frame.payload };
                core.send(bid, &ws_framer::encode_frame(&pong)).await;
            }
            WsOpcode::Pong => {
                if let Some(conn) = self.connections.write().get_mut(&bid) {
                    if let Some(codec) = conn.ws_codec.as_mut() {
                        codec.note_pong_received();
                    }
                }
            }
            WsOpcode::Close => {
                self.callbacks.call_message_websocket(bid, StreamId::HTTP1, &frame.payload, false);
                self.close_ws(bid, CloseCode::Normal, "peer close", core).await;
            }
            WsOpcode::Text | WsOpcode::Binary | WsOpcode::Continuation => {
                let assembled = {
                    let mut conns = self.connections.write();
                    let Some(conn) = conns.get_mut(&bid) else { return };
                    conn.ws_assembler.feed(frame)
                };
                if let Ok(Some((opcode, compressed, mut payload))) = assembled {
                    if compressed {
                        if let Some(conn) = self.connections.write().get_mut(&bid) {
                            if let Some(deflate) = conn.ws_codec.as_mut().and_then(|c| c.deflate.as_mut()) {
                                if let Ok(decompressed) = deflate.decompress(&payload) {
                                    payload = decompressed;
                                }
                            }
                        }
                    }
                    self.callbacks.call_message_websocket(bid, StreamId::HTTP1, &payload, opcode == WsOpcode::Text);
                }
            }
        }
    }

    async fn close_ws(&self, bid: ConnectionId, code: CloseCode, reason: &str, core: &dyn TransportAdapter) {
        let payload = ws_framer::build_close_payload(code, reason);
        let frame = WsFrame { fin: true, opcode: WsOpcode::Close, compressed: false, payload };
        core.send(bid, &ws_framer::encode_frame(&frame)).await;
        core.close(bid).await;
    }

    /// Sends one outbound WebSocket message over a `WsFraming` connection.
    pub async fn send_ws_message(&self, bid: ConnectionId, payload: &[u8], text: bool, core: &dyn TransportAdapter) {
        let frame = WsFrame { fin: true, opcode: if text { WsOpcode::Text } else { WsOpcode::Binary }, compressed: false, payload: payload.to_vec() };
        core.send(bid, &ws_framer::encode_frame(&frame)).await;
        if let Some(conn) = self.connections.write().get_mut(&bid) {
            if let Some(codec) = conn.ws_codec.as_mut() {
                codec.note_outbound(0);
            }
        }
    }

    /// Drives ping/pong liveness for `WsFraming` connections (spec.md §4.4, §4.6.8).
    pub async fn pinging(&self, now_ms: u64, ping_interval_ms: u64, pong_wait_ms: u64) {
        let core = self.core.read().clone();
        let Some(core) = core else { return };
        let mut to_ping = Vec::new();
        let mut to_close = Vec::new();
        {
            let mut conns = self.connections.write();
            for (bid, conn) in conns.iter_mut() {
                if conn.state != State::WsFraming {
                    continue;
                }
                let Some(codec) = conn.ws_codec.as_mut() else { continue };
                if codec.pong_overdue(now_ms, pong_wait_ms) {
                    to_close.push(*bid);
                } else if codec.should_send_ping(now_ms, ping_interval_ms) {
                    codec.mark_ping_sent(now_ms);
                    to_ping.push(*bid);
                }
            }
        }
        for bid in to_ping {
            let ping = WsFrame { fin: true, opcode: WsOpcode::Ping, compressed: false, payload: Vec::new() };
            core.send(bid, &ws_framer::encode_frame(&ping)).await;
        }
        for bid in to_close {
            self.close_ws(bid, CloseCode::Error, "pong not received in time", &*core).await;
        }
    }
}

enum Advance {
    NeedMoreBytes,
    HeadReady,
    BodyReady,
    MalformedHead,
    ConnectionGone,
}

fn body_mode_of(parser: &HttpParser) -> BodyMode {
    if parser.headers().get_first("transfer-encoding").map(|v| v.eq_ignore_ascii_case("chunked")).unwrap_or(false) {
        BodyMode::Chunked
    } else if let Some(len) = parser.headers().get_first("content-length").and_then(|v| v.trim().parse::<usize>().ok()) {
        if len == 0 { BodyMode::None } else { BodyMode::ContentLength(len) }
    } else {
        BodyMode::None
    }
}

enum ChunkedResult {
    Done(Vec<u8>, Vec<(String, String)>),
    NeedMore,
    Malformed,
}

/// Decodes an RFC 7230 §4.1 chunked body (including trailers) from the front of `buf`,
/// consuming it on success.
fn take_chunked_body(buf: &mut Vec<u8>) -> ChunkedResult {
    let mut body = Vec::new();
    let mut cursor = 0usize;
    loop {
        let Some(line_end) = find_crlf(&buf[cursor..]) else { return ChunkedResult::NeedMore };
        let size_line = &buf[cursor..cursor + line_end];
        let size_str = std::str::from_utf8(size_line).unwrap_or("").split(';').next().unwrap_or("").trim();
        let Ok(size) = usize::from_str_radix(size_str, 16) else { return ChunkedResult::Malformed };
        let chunk_start = cursor + line_end + 2;
        if size == 0 {
            // final chunk: optional trailer headers terminated by a blank line.
            let mut trailers = Vec::new();
            let mut tcursor = chunk_start;
            loop {
                let Some(tline_end) = find_crlf(&buf[tcursor..]) else { return ChunkedResult::NeedMore };
                if tline_end == 0 {
                    tcursor += 2;
                    break;
                }
                let line = &buf[tcursor..tcursor + tline_end];
                if let Some(colon) = line.iter().position(|b| *b == b':') {
                    let k = String::from_utf8_lossy(&line[..colon]).trim().to_string();
                    let v = String::from_utf8_lossy(&line[colon + 1..]).trim().to_string();
                    trailers.push((k, v));
                }
                tcursor += tline_end + 2;
            }
            buf.drain(..tcursor);
            return ChunkedResult::Done(body, trailers);
        }
        if buf.len() < chunk_start + size + 2 {
            return ChunkedResult::NeedMore;
        }
        body.extend_from_slice(&buf[chunk_start..chunk_start + size]);
        cursor = chunk_start + size + 2;
    }
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

fn compute_accept_key(client_key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(client_key.as_bytes());
    hasher.update(WS_GUID.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SchemeId;
    use async_trait::async_trait;
    use parking_lot::Mutex as StdMutex;

    #[derive(Default)]
    struct RecordingAdapter {
        sent: Arc<StdMutex<Vec<Vec<u8>>>>,
        closed: Arc<StdMutex<bool>>,
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
        fn proto(&self, _bid: ConnectionId) -> Option<crate::ids::Protocol> {
            Some(crate::ids::Protocol::Http1_1)
        }
        async fn send(&self, _bid: ConnectionId, buf: &[u8]) -> bool {
            self.sent.lock().push(buf.to_vec());
            true
        }
        async fn close(&self, _bid: ConnectionId) {
            *self.closed.lock() = true;
        }
    }

    fn engine_with(config: ServiceConfig) -> (Arc<Http1Engine>, Arc<RecordingAdapter>) {
        let callbacks = CallbackBus::new();
        let engine = Arc::new(Http1Engine::new(callbacks, Arc::new(config)));
        let adapter = Arc::new(RecordingAdapter::default());
        engine.set_core(adapter.clone());
        (engine, adapter)
    }

    #[tokio::test]
    async fn simple_get_is_answered_with_200() {
        let (engine, adapter) = engine_with(ServiceConfig::builder().build());
        engine.connect_events(ConnectionId(1), SchemeId(1));
        engine.read_events(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n", ConnectionId(1), 0).await;
        let sent = adapter.sent.lock();
        assert_eq!(sent.len(), 1);
        assert!(String::from_utf8_lossy(&sent[0]).starts_with("HTTP/1.1 200 OK"));
    }

    #[tokio::test]
    async fn max_requests_closes_after_second_response() {
        let (engine, adapter) = engine_with(ServiceConfig::builder().max_requests(2).build());
        engine.connect_events(ConnectionId(1), SchemeId(1));
        engine.read_events(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n", ConnectionId(1), 0).await;
        assert!(!*adapter.closed.lock());
        engine.read_events(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n", ConnectionId(1), 0).await;
        let sent = adapter.sent.lock();
        assert_eq!(sent.len(), 2);
        assert!(String::from_utf8_lossy(&sent[1]).contains("Connection: close"));
        drop(sent);
        assert!(*adapter.closed.lock());
    }

    #[tokio::test]
    async fn basic_auth_failure_yields_401_with_challenge() {
        let config = ServiceConfig::builder().auth(crate::config::AuthType::Basic, crate::config::HashAlg::Sha256).realm("test").build();
        let (engine, adapter) = engine_with(config);
        engine.callbacks.set_check_password(Arc::new(|_, _, _| false));
        engine.connect_events(ConnectionId(1), SchemeId(1));
        engine
            .read_events(b"GET /private HTTP/1.1\r\nHost: x\r\nAuthorization: Basic dXNlcjpwYXNz\r\n\r\n", ConnectionId(1), 0)
            .await;
        let sent = adapter.sent.lock();
        let text = String::from_utf8_lossy(&sent[0]);
        assert!(text.starts_with("HTTP/1.1 401"));
        assert!(text.contains("WWW-Authenticate: Basic realm=\"test\""));
    }

    #[tokio::test]
    async fn pipelined_second_request_before_response_is_rejected() {
        let (engine, adapter) = engine_with(ServiceConfig::builder().build());
        engine.connect_events(ConnectionId(1), SchemeId(1));
        {
            let mut conns = engine.connections.write();
            conns.get_mut(&ConnectionId(1)).unwrap().state = State::ResponsePending;
        }
        engine.read_events(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n", ConnectionId(1), 0).await;
        assert!(*adapter.closed.lock());
    }

    #[tokio::test]
    async fn gzip_content_encoding_round_trips_through_the_engine() {
        let config = ServiceConfig::builder().compressors(vec![hotaru_lib::compression::Compressor::Gzip]).build();
        let (engine, adapter) = engine_with(config);
        engine.connect_events(ConnectionId(1), SchemeId(1));
        let compressed = hotaru_lib::compression::compress(hotaru_lib::compression::Compressor::Gzip, b"hello").unwrap();
        let mut req = format!("POST / HTTP/1.1\r\nHost: x\r\nContent-Encoding: gzip\r\nContent-Length: {}\r\n\r\n", compressed.len()).into_bytes();
        req.extend_from_slice(&compressed);
        engine.read_events(&req, ConnectionId(1), 0).await;
        assert!(String::from_utf8_lossy(&adapter.sent.lock()[0]).starts_with("HTTP/1.1 200 OK"));
    }

    #[tokio::test]
    async fn corrupt_gzip_content_encoding_is_rejected_instead_of_treated_as_literal_bytes() {
        let config = ServiceConfig::builder().compressors(vec![hotaru_lib::compression::Compressor::Gzip]).build();
        let (engine, adapter) = engine_with(config);
        let errors = Arc::new(StdMutex::new(0usize));
        let errors_clone = errors.clone();
        engine.callbacks.set_error(Arc::new(move |_, _| *errors_clone.lock() += 1));
        engine.connect_events(ConnectionId(1), SchemeId(1));
        let garbage = b"not actually gzip data";
        let req = format!("POST / HTTP/1.1\r\nHost: x\r\nContent-Encoding: gzip\r\nContent-Length: {}\r\n\r\n", garbage.len());
        let mut req = req.into_bytes();
        req.extend_from_slice(garbage);
        engine.read_events(&req, ConnectionId(1), 0).await;
        assert!(String::from_utf8_lossy(&adapter.sent.lock()[0]).starts_with("HTTP/1.1 400"));
        assert_eq!(*errors.lock(), 1);
    }

    #[tokio::test]
    async fn websocket_upgrade_sends_101_with_computed_accept() {
        let config = ServiceConfig::builder().mode(Mode::WebsocketEnable).build();
        let (engine, adapter) = engine_with(config);
        engine.connect_events(ConnectionId(1), SchemeId(1));
        let req = b"GET /ws HTTP/1.1\r\nHost: x\r\nUpgrade: websocket\r\nConnection: Upgrade\r\nSec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\nSec-WebSocket-Version: 13\r\n\r\n";
        engine.read_events(req, ConnectionId(1), 0).await;
        let sent = adapter.sent.lock();
        let text = String::from_utf8_lossy(&sent[0]);
        assert!(text.starts_with("HTTP/1.1 101"));
        assert!(text.contains("s3pPLMBiTxaQ9kYGzzhZRbK+xOo=")); // RFC 6455 worked example
        assert_eq!(engine.agent(ConnectionId(1)), Some(Agent::WebSocket));
    }
}
