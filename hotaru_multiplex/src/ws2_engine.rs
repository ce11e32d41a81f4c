//! WebSocket-over-HTTP/2 bridge, RFC 8441 (spec.md §4.4).
//!
//! `Ws2Engine` differs from a direct RFC 6455 connection only in where the bytes travel:
//! control and data frames are WebSocket-framed (via [`crate::ws_framer`]) but carried
//! inside the single upgraded HTTP/2 stream's DATA frames rather than raw TCP. Grounded on
//! `h2per`'s `WebSocketTransport` (`examples/Field-of-Dreams-Studio-hotaru/h2per/src/websocket.rs`),
//! whose `UpgradeSource::Http2Stream(stream_id)` variant already models "this WS connection
//! lives on top of one H2 stream" — generalized here into the engine that actually drives it.

use crate::callbacks::CallbackBus;
use crate::config::ServiceConfig;
use crate::error::{ErrorKind, MultiplexError};
use crate::http2_session::{FrameFlags, Http2Handle};
use crate::ids::{ConnectionId, StreamId};
use crate::ws_framer::{self, FragmentAssembler, WsConnectionCodec, WsFrame, WsFramerError, WsOpcode};
use hotaru_core::alias::PRwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tungstenite::protocol::frame::coding::CloseCode;

struct Ws2Connection {
    sid: StreamId,
    codec: WsConnectionCodec,
    assembler: FragmentAssembler,
    h2: Http2Handle,
    closing: bool,
}

/// Per-bid table of WebSocket-over-H2 connections, keyed the same way spec.md §4.6 keys
/// `ws2.sessions[bid]` — the Multiplexer moves a bid's H2 session handle in here on a
/// successful upgrade and back out (conceptually) when the WS stream ends.
pub struct Ws2Engine {
    connections: PRwLock<HashMap<ConnectionId, Ws2Connection>>,
    callbacks: CallbackBus,
}

impl Ws2Engine {
    pub fn new(callbacks: CallbackBus) -> Self {
        Self { connections: PRwLock::new(HashMap::new()), callbacks }
    }

    /// Registers a newly upgraded WS-over-H2 stream (spec.md §4.6.7 step 3).
    pub fn insert(&self, bid: ConnectionId, sid: StreamId, config: &ServiceConfig, h2: Http2Handle) {
        let deflate = config
            .websocket_enabled()
            .then(|| hotaru_lib::compression::DeflateContext::new(config.mode(crate::config::Mode::TakeoverServer)));
        let codec = WsConnectionCodec::new(deflate, config.chunk_size.max(65536));
        self.connections.write().insert(
            bid,
            Ws2Connection { sid, codec, assembler: FragmentAssembler::new(), h2, closing: false },
        );
    }

    pub fn remove(&self, bid: ConnectionId) {
        self.connections.write().remove(&bid);
    }

    pub fn contains(&self, bid: ConnectionId) -> bool {
        self.connections.read().contains_key(&bid)
    }

    /// Feeds bytes arriving as one HTTP/2 DATA chunk on the upgraded stream; emits
    /// `"messageWebsocket"`/`"errorWebsocket"` as complete frames/messages are decoded.
    pub fn read_events(&self, bid: ConnectionId, chunk: &[u8], frame_size_limit: usize) {
        let mut buf = chunk.to_vec();
        loop {
            let decoded = {
                let conns = self.connections.read();
                let Some(conn) = conns.get(&bid) else { return };
                ws_framer::decode_frame(&buf, true, frame_size_limit)
            };
            match decoded {
                Ok(Some((frame, consumed))) => {
                    buf.drain(..consumed);
                    self.handle_frame(bid, frame);
                    if buf.is_empty() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    self.callbacks.call_error_websocket(
                        bid,
                        self.connections.read().get(&bid).map(|c| c.sid).unwrap_or(StreamId::HTTP1),
                        MultiplexError::critical(ErrorKind::Protocol, format!("{e:?}")),
                    );
                    self.close(bid, CloseCode::Protocol, "frame error");
                    return;
                }
            }
        }
    }

    fn handle_frame(&self, bid: ConnectionId, frame: WsFrame) {
        let sid = match self.connections.read().get(&bid) {
            Some(c) => c.sid,
            None => return,
        };
        match frame.opcode {
            WsOpcode::Ping => {
                let pong = WsFrame { fin: true, opcode: WsOpcode::Pong, compressed: false, payload: frame.payload };
                self.send_raw_frame(bid, &pong);
            }
            WsOpcode::Pong => {
                if let Some(conn) = self.connections.write().get_mut(&bid) {
                    conn.codec.note_pong_received();
                }
            }
            WsOpcode::Close => {
                self.callbacks.call_message_websocket(bid, sid, &frame.payload, false);
                self.close(bid, CloseCode::Normal, "peer close");
            }
            WsOpcode::Text | WsOpcode::Binary | WsOpcode::Continuation => {
                let assembled = {
                    let mut conns = self.connections.write();
                    match conns.get_mut(&bid) {
                        Some(conn) => conn.assembler.feed(frame),
                        None => return,
                    }
                };
                if let Ok(Some((opcode, compressed, mut payload))) = assembled {
                    if compressed {
                        if let Some(conn) = self.connections.write().get_mut(&bid) {
                            if let Some(deflate) = conn.codec.deflate.as_mut() {
                                if let Ok(decompressed) = deflate.decompress(&payload) {
                                    payload = decompressed;
                                }
                            }
                        }
                    }
                    self.callbacks.call_message_websocket(bid, sid, &payload, opcode == WsOpcode::Text);
                }
            }
        }
    }

    /// Wraps `payload` in a DATA frame on the upgraded stream, per RFC 8441 (bytes only,
    /// never masked — the server never masks, same as direct RFC 6455).
    pub fn send_message(&self, bid: ConnectionId, payload: &[u8], text: bool) {
        let frame = WsFrame {
            fin: true,
            opcode: if text { WsOpcode::Text } else { WsOpcode::Binary },
            compressed: false,
            payload: payload.to_vec(),
        };
        self.send_raw_frame(bid, &frame);
    }

    fn send_raw_frame(&self, bid: ConnectionId, frame: &WsFrame) {
        let conns = self.connections.read();
        let Some(conn) = conns.get(&bid) else { return };
        let wire = ws_framer::encode_frame(frame);
        conn.h2.send_data(conn.sid, bytes::Bytes::from(wire), FrameFlags::NONE);
    }

    /// Drives the PING/PONG liveness rule shared with direct RFC 6455 (spec.md §4.4, §4.6.8).
    pub fn pinging(&self, now_ms: u64, ping_interval_ms: u64, pong_wait_ms: u64) {
        let mut closes = Vec::new();
        {
            let mut conns = self.connections.write();
            for (bid, conn) in conns.iter_mut() {
                if conn.codec.pong_overdue(now_ms, pong_wait_ms) {
                    closes.push(*bid);
                    continue;
                }
                if conn.codec.should_send_ping(now_ms, ping_interval_ms) {
                    conn.codec.mark_ping_sent(now_ms);
                    let ping = WsFrame { fin: true, opcode: WsOpcode::Ping, compressed: false, payload: Vec::new() };
                    let wire = ws_framer::encode_frame(&ping);
                    conn.h2.send_data(conn.sid, bytes::Bytes::from(wire), FrameFlags::NONE);
                }
            }
        }
        for bid in closes {
            self.close(bid, CloseCode::Error, "pong not received in time");
        }
    }

    pub fn close(&self, bid: ConnectionId, code: CloseCode, reason: &str) {
        let mut conns = self.connections.write();
        if let Some(conn) = conns.get_mut(&bid) {
            if !conn.closing {
                conn.closing = true;
                let payload = ws_framer::build_close_payload(code, reason);
                let frame = WsFrame { fin: true, opcode: WsOpcode::Close, compressed: false, payload };
                let wire = ws_framer::encode_frame(&frame);
                conn.h2.send_data(conn.sid, bytes::Bytes::from(wire), FrameFlags::END_STREAM);
            }
        }
    }

    pub fn erase(&self, bid: ConnectionId) {
        self.remove(bid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_contains_round_trip() {
        let engine = Ws2Engine::new(CallbackBus::new());
        let config = ServiceConfig::builder().mode(crate::config::Mode::WebsocketEnable).build();
        let h2 = Http2Handle::detached_for_test();
        engine.insert(ConnectionId(1), StreamId(1), &config, h2);
        assert!(engine.contains(ConnectionId(1)));
        engine.remove(ConnectionId(1));
        assert!(!engine.contains(ConnectionId(1)));
    }
}
