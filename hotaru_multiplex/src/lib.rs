//! Per-connection protocol multiplexer for Hotaru.
//!
//! This crate braids HTTP/1.1, HTTP/2, and WebSocket (both RFC 6455-over-HTTP/1.1 and
//! RFC 8441-over-HTTP/2) around a single transport connection. It consumes a
//! [`transport::TransportAdapter`] implementation and drives four cooperating state
//! machines — [`http1_engine::Http1Engine`], [`http2_session::Http2Session`],
//! [`ws_framer::WsFramer`], [`ws2_engine::Ws2Engine`] — from one hub,
//! [`multiplexer::Multiplexer`].
//!
//! Low-level codecs (HTTP/1 line tokenizing, HPACK/H2 framing, WebSocket frame masking)
//! and cryptographic primitives are treated as trusted libraries (`h2`, `tungstenite`,
//! `aes-gcm`, `sha2`/`sha1`/`md-5`); this crate owns the protocol *state machine* wired
//! around them, not the wire codecs themselves.

pub mod auth;
pub mod callbacks;
pub mod config;
pub mod erase;
pub mod error;
pub mod http1_engine;
pub mod http2_session;
pub mod http_parser;
pub mod ids;
pub mod multiplexer;
pub mod transport;
pub mod ws2_engine;
pub mod ws_framer;

pub use config::ServiceConfig;
pub use ids::{Agent, ConnectionId, Identity, Protocol, SchemeId, StreamId};
pub use multiplexer::Multiplexer;
