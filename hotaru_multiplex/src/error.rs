//! Error taxonomy surfaced through the `"error"` callback, per spec.md §7.
//!
//! Grounded on `hotaru_core::connection::error::ConnectionError`: a hand-rolled enum with
//! `Display`/`std::error::Error`, not `thiserror`, matching the rest of the workspace.

use std::fmt;

/// Severity attached to every error dispatch. Auth failures are `Info`, not `Critical` —
/// per spec.md §7, "authentication failure is not an error in the fatal sense."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Critical,
}

/// Error kind vocabulary from spec.md §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Http1Send,
    Http1Recv,
    Http2Send,
    Http2Recv,
    Protocol,
    Hpack,
    FlowControl,
    Handshake,
    Authorization,
    Compression,
    Encryption,
    Transport,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Http1Send => "HTTP1_SEND",
            ErrorKind::Http1Recv => "HTTP1_RECV",
            ErrorKind::Http2Send => "HTTP2_SEND",
            ErrorKind::Http2Recv => "HTTP2_RECV",
            ErrorKind::Protocol => "PROTOCOL",
            ErrorKind::Hpack => "HPACK",
            ErrorKind::FlowControl => "FLOW_CONTROL",
            ErrorKind::Handshake => "HANDSHAKE",
            ErrorKind::Authorization => "AUTHORIZATION",
            ErrorKind::Compression => "COMPRESSION",
            ErrorKind::Encryption => "ENCRYPTION",
            ErrorKind::Transport => "TRANSPORT",
        };
        f.write_str(s)
    }
}

/// One dispatch of the `"error"` callback: `(severity, kind, message)`.
#[derive(Debug, Clone)]
pub struct MultiplexError {
    pub severity: Severity,
    pub kind: ErrorKind,
    pub message: String,
}

impl MultiplexError {
    pub fn critical(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { severity: Severity::Critical, kind, message: message.into() }
    }

    pub fn info(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { severity: Severity::Info, kind, message: message.into() }
    }
}

impl fmt::Display for MultiplexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}/{}] {}", self.severity, self.kind, self.message)
    }
}

impl std::error::Error for MultiplexError {}

/// HTTP/2 error codes per RFC 7540 §7, taxonomy from spec.md §4.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum H2ErrorCode {
    NoError,
    ProtocolError,
    Internal,
    FlowControl,
    SettingsTimeout,
    StreamClosed,
    FrameSize,
    RefusedStream,
    Cancel,
    Compression,
    ConnectError,
    EnhanceYourCalm,
    InadequateSecurity,
    Http11Required,
}

impl H2ErrorCode {
    pub fn code(&self) -> u32 {
        match self {
            H2ErrorCode::NoError => 0x0,
            H2ErrorCode::ProtocolError => 0x1,
            H2ErrorCode::Internal => 0x2,
            H2ErrorCode::FlowControl => 0x3,
            H2ErrorCode::SettingsTimeout => 0x4,
            H2ErrorCode::StreamClosed => 0x5,
            H2ErrorCode::FrameSize => 0x6,
            H2ErrorCode::RefusedStream => 0x7,
            H2ErrorCode::Cancel => 0x8,
            H2ErrorCode::Compression => 0x9,
            H2ErrorCode::ConnectError => 0xa,
            H2ErrorCode::EnhanceYourCalm => 0xb,
            H2ErrorCode::InadequateSecurity => 0xc,
            H2ErrorCode::Http11Required => 0xd,
        }
    }
}

impl From<h2::Reason> for H2ErrorCode {
    fn from(reason: h2::Reason) -> Self {
        match reason {
            h2::Reason::NO_ERROR => H2ErrorCode::NoError,
            h2::Reason::PROTOCOL_ERROR => H2ErrorCode::ProtocolError,
            h2::Reason::INTERNAL_ERROR => H2ErrorCode::Internal,
            h2::Reason::FLOW_CONTROL_ERROR => H2ErrorCode::FlowControl,
            h2::Reason::SETTINGS_TIMEOUT => H2ErrorCode::SettingsTimeout,
            h2::Reason::STREAM_CLOSED => H2ErrorCode::StreamClosed,
            h2::Reason::FRAME_SIZE_ERROR => H2ErrorCode::FrameSize,
            h2::Reason::REFUSED_STREAM => H2ErrorCode::RefusedStream,
            h2::Reason::CANCEL => H2ErrorCode::Cancel,
            h2::Reason::COMPRESSION_ERROR => H2ErrorCode::Compression,
            h2::Reason::CONNECT_ERROR => H2ErrorCode::ConnectError,
            h2::Reason::ENHANCE_YOUR_CALM => H2ErrorCode::EnhanceYourCalm,
            h2::Reason::INADEQUATE_SECURITY => H2ErrorCode::InadequateSecurity,
            h2::Reason::HTTP_1_1_REQUIRED => H2ErrorCode::Http11Required,
            _ => H2ErrorCode::Internal,
        }
    }
}

impl From<H2ErrorCode> for h2::Reason {
    fn from(code: H2ErrorCode) -> Self {
        h2::Reason::from(code.code())
    }
}
