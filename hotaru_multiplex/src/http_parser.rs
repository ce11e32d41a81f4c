//! Per-request HTTP parsing/serialization state (spec.md §4.2).
//!
//! Grounded on `hotaru_core::http::traits::HttpTransport` (request counter, keep-alive,
//! role fields) for the shape of per-connection HTTP bookkeeping, and on
//! `examples/original_source/src/server/web/http2.cpp`'s `prepare()` for the exact
//! GOOD/FAULT auth dispatch and identity-based challenge-status selection. Compression
//! and AEAD encryption are delegated to `hotaru_lib`'s `compression`/`ende` features —
//! this module owns negotiation and sequencing, not the codecs themselves.

use crate::auth::{self, AuthVerdict, Nonce};
use crate::config::{AuthType, EncryptionConfig, HashAlg, Ident};
use crate::ids::{ConnectionId, Identity};
use hotaru_lib::compression::Compressor;
use std::sync::Arc;

pub type CheckPasswordFn = Arc<dyn Fn(ConnectionId, &str, &str) -> bool + Send + Sync>;
pub type ExtractPasswordFn = Arc<dyn Fn(ConnectionId, &str) -> Option<String> + Send + Sync>;

/// Which part of accumulated state `clear()` should drop, per spec.md §4.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearSuite {
    Header,
    Body,
    Trailers,
}

/// The request/status line (or HTTP/2 pseudo-header equivalent).
#[derive(Debug, Clone, Default)]
pub struct RequestLine {
    pub method: String,
    pub url: String,
    pub version: String,
}

/// Outcome of `process`/`process2`: which side is being serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Request,
    Response,
}

/// Ordered key/value multimap preserving within-key insertion order (spec.md §8 property 9).
#[derive(Debug, Clone, Default)]
pub struct HeaderMultiMap(Vec<(String, String)>);

impl HeaderMultiMap {
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    pub fn get_first(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, String)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

/// Per-request parser/serializer. One instance lives per HTTP/1 connection or per HTTP/2
/// stream (the `Stream` of spec.md §4.6).
pub struct HttpParser {
    bid: ConnectionId,
    chunk_size: usize,
    identity: Identity,
    compressors: Vec<Compressor>,
    ident: Ident,
    encryption: EncryptionConfig,
    auth_type: AuthType,
    hash: HashAlg,
    realm: String,
    opaque: String,
    check_password: Option<CheckPasswordFn>,
    extract_password: Option<ExtractPasswordFn>,
    nonce: Option<Nonce>,

    request_line: RequestLine,
    headers: HeaderMultiMap,
    body: Vec<u8>,
    pending_payload: Vec<u8>,
    trailers_in: HeaderMultiMap,
    trailers_out: HeaderMultiMap,

    crypted: bool,
    compressor: Compressor,
    ws_wbit_client: u8,
    ws_wbit_server: u8,
    ws_takeover_client: bool,
    ws_takeover_server: bool,
}

impl HttpParser {
    pub fn new(bid: ConnectionId) -> Self {
        Self {
            bid,
            chunk_size: 8192,
            identity: Identity::Http,
            compressors: vec![Compressor::Identity],
            ident: Ident::default(),
            encryption: EncryptionConfig::default(),
            auth_type: AuthType::None,
            hash: HashAlg::Sha256,
            realm: "hotaru".into(),
            opaque: String::new(),
            check_password: None,
            extract_password: None,
            nonce: None,
            request_line: RequestLine::default(),
            headers: HeaderMultiMap::default(),
            body: Vec::new(),
            pending_payload: Vec::new(),
            trailers_in: HeaderMultiMap::default(),
            trailers_out: HeaderMultiMap::default(),
            crypted: false,
            compressor: Compressor::Identity,
            ws_wbit_client: 15,
            ws_wbit_server: 15,
            ws_takeover_client: false,
            ws_takeover_server: false,
        }
    }

    /// Drops all per-request state (used between HTTP/1 requests on a keep-alive connection).
    pub fn reset(&mut self) {
        self.request_line = RequestLine::default();
        self.headers.clear();
        self.body.clear();
        self.pending_payload.clear();
        self.trailers_in.clear();
        self.trailers_out.clear();
        self.crypted = false;
        self.compressor = Compressor::Identity;
    }

    pub fn clear(&mut self, suite: ClearSuite) {
        match suite {
            ClearSuite::Header => {
                self.request_line = RequestLine::default();
                self.headers.clear();
            }
            ClearSuite::Body => {
                self.body.clear();
                self.pending_payload.clear();
            }
            ClearSuite::Trailers => {
                self.trailers_in.clear();
                self.trailers_out.clear();
            }
        }
    }

    // -- configuration -----------------------------------------------------

    pub fn id(&mut self, bid: ConnectionId) {
        self.bid = bid;
    }

    pub fn bid(&self) -> ConnectionId {
        self.bid
    }

    pub fn chunk(&mut self, size: usize) {
        self.chunk_size = size;
    }

    pub fn identity(&mut self, kind: Identity) {
        self.identity = kind;
    }

    pub fn compressors(&mut self, list: Vec<Compressor>) {
        self.compressors = list;
    }

    pub fn ident(&mut self, id: impl Into<String>, name: impl Into<String>, version: impl Into<String>) {
        self.ident = Ident { id: id.into(), name: name.into(), version: version.into() };
    }

    pub fn encryption(&mut self, on: bool, pass: impl Into<String>, salt: Vec<u8>) {
        self.encryption = EncryptionConfig { enabled: on, pass: pass.into(), salt };
    }

    pub fn auth_type(&mut self, auth_type: AuthType, hash: HashAlg) {
        self.auth_type = auth_type;
        self.hash = hash;
    }

    pub fn realm(&mut self, realm: impl Into<String>) {
        self.realm = realm.into();
    }

    pub fn opaque(&mut self, opaque: impl Into<String>) {
        self.opaque = opaque.into();
    }

    pub fn auth_callback(&mut self, f: CheckPasswordFn) {
        self.check_password = Some(f);
    }

    pub fn extract_pass_callback(&mut self, f: ExtractPasswordFn) {
        self.extract_password = Some(f);
    }

    // -- header / request-line assembly -------------------------------------

    /// Sets the HTTP/1.1 request line directly (HTTP/1 path skips pseudo-headers).
    pub fn request_line(&mut self, method: impl Into<String>, url: impl Into<String>, version: impl Into<String>) {
        self.request_line = RequestLine { method: method.into(), url: url.into(), version: version.into() };
    }

    /// Adds one header (HTTP/1 path).
    pub fn header(&mut self, k: &str, v: &str) {
        self.headers.push(k, v);
    }

    /// Adds one header or pseudo-header (HTTP/2 path); pseudo-headers feed the request line.
    pub fn header2(&mut self, k: &str, v: &str) {
        match k {
            ":method" => self.request_line.method = v.to_string(),
            ":path" => self.request_line.url = v.to_string(),
            ":authority" => self.headers.push("host", v),
            ":scheme" => {}
            ":protocol" => self.headers.push("upgrade", v),
            _ => self.headers.push(k, v),
        }
        if self.request_line.version.is_empty() {
            self.request_line.version = "HTTP/2".to_string();
        }
    }

    /// Finalizes the header block; for HTTP/2 this is where `:protocol: websocket` plus a
    /// CONNECT method are folded into an `Identity::Ws` read (the caller still decides the
    /// identity explicitly via [`HttpParser::identity`] — `commit` only validates shape).
    pub fn commit(&mut self) {
        if self.request_line.version.is_empty() {
            self.request_line.version = "HTTP/1.1".to_string();
        }
    }

    pub fn request(&self) -> &RequestLine {
        &self.request_line
    }

    pub fn headers(&self) -> &HeaderMultiMap {
        &self.headers
    }

    // -- body / trailers -----------------------------------------------------

    /// Appends a raw (still chunked-transfer-decoded, still compressed/encrypted) body
    /// slice; the caller must call [`HttpParser::finalize_inbound_body`] once the full
    /// body is buffered to actually decompress/decrypt it per config (spec.md §4.2).
    pub fn append_body(&mut self, data: &[u8]) {
        self.body.extend_from_slice(data);
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Picks the inbound decoder off the request's own `Content-Encoding` header (as
    /// opposed to [`HttpParser::negotiate_compressor`]'s `Accept-Encoding`-driven pick for
    /// the *response* side) — only a compressor already in `self.compressors` is honored.
    pub fn negotiate_inbound_compressor(&mut self) {
        if let Some(content_encoding) = self.headers.get_first("content-encoding").map(str::to_string) {
            self.negotiate_compressor(&content_encoding);
        } else {
            self.compressor = Compressor::Identity;
        }
    }

    /// Finalizes `self.body` by reversing encryption then compression, in that order
    /// (encryption wraps the compressed bytes on the wire, spec.md §4.2). Call once per
    /// request/stream, after the full body has been accumulated via [`HttpParser::append_body`]
    /// and [`HttpParser::negotiate_inbound_compressor`] (or [`HttpParser::header2`]/
    /// [`HttpParser::header`]) has already run, so `self.compressor` reflects the inbound
    /// `Content-Encoding`.
    pub fn finalize_inbound_body(&mut self) -> Result<(), String> {
        if self.encryption.enabled {
            let key = hotaru_lib::ende::derive_key(&self.encryption.pass, &self.encryption.salt);
            self.body = hotaru_lib::ende::open(&key, &self.body).map_err(|e| e.to_string())?;
            self.crypted = true;
        }
        if self.compressor != Compressor::Identity {
            self.body = hotaru_lib::compression::decompress(self.compressor, &self.body)
                .map_err(|e| e.0.to_string())?;
        }
        Ok(())
    }

    /// Queues one outbound streamed chunk (compressed/encrypted per the negotiated values).
    pub fn queue_payload(&mut self, data: &[u8], key: Option<&[u8; 32]>) -> Result<(), String> {
        let mut chunk = if self.compressor != Compressor::Identity {
            hotaru_lib::compression::compress(self.compressor, data).map_err(|e| e.0.to_string())?
        } else {
            data.to_vec()
        };
        if self.encryption.enabled {
            let key = key.ok_or("encryption enabled but no key derived")?;
            chunk = hotaru_lib::ende::seal(key, &chunk).map_err(|e| e.to_string())?;
        }
        self.pending_payload.extend_from_slice(&chunk);
        Ok(())
    }

    /// Drains the queued outbound payload, splitting at `chunk_size`.
    pub fn payload(&mut self) -> Vec<u8> {
        let take = self.chunk_size.min(self.pending_payload.len());
        self.pending_payload.drain(..take).collect()
    }

    pub fn trailer(&mut self, k: &str, v: &str) {
        self.trailers_out.push(k, v);
    }

    pub fn trailer_in(&mut self, k: &str, v: &str) {
        self.trailers_in.push(k, v);
    }

    pub fn trailers(&self) -> usize {
        self.trailers_in.len()
    }

    pub fn trailers2(&self) -> Vec<(String, String)> {
        self.trailers_out.iter().cloned().collect()
    }

    // -- negotiation -----------------------------------------------------

    /// Picks the first of our configured compressors whose token appears in `accept_encoding`.
    pub fn negotiate_compressor(&mut self, accept_encoding: &str) {
        let tokens: Vec<&str> = accept_encoding.split(',').map(|t| t.trim().split(';').next().unwrap_or("").trim()).collect();
        self.compressor = self
            .compressors
            .iter()
            .copied()
            .find(|c| *c == Compressor::Identity || tokens.iter().any(|t| t.eq_ignore_ascii_case(c.token())))
            .unwrap_or(Compressor::Identity);
    }

    pub fn crypted(&self) -> bool {
        self.crypted
    }

    pub fn set_crypted(&mut self, crypted: bool) {
        self.crypted = crypted;
    }

    pub fn compression(&self) -> Compressor {
        self.compressor
    }

    pub fn wbit(&self, client_side: bool) -> u8 {
        if client_side {
            self.ws_wbit_client
        } else {
            self.ws_wbit_server
        }
    }

    pub fn set_wbit(&mut self, client_side: bool, bits: u8) {
        if client_side {
            self.ws_wbit_client = bits;
        } else {
            self.ws_wbit_server = bits;
        }
    }

    pub fn takeover(&self, client_side: bool) -> bool {
        if client_side {
            self.ws_takeover_client
        } else {
            self.ws_takeover_server
        }
    }

    pub fn set_takeover(&mut self, client_side: bool, value: bool) {
        if client_side {
            self.ws_takeover_client = value;
        } else {
            self.ws_takeover_server = value;
        }
    }

    /// `true` only once every WebSocket handshake token is present and well-formed
    /// (`Sec-WebSocket-Key`, `-Version: 13`); `Sec-WebSocket-Accept` is computed by the
    /// caller from the key once this returns true (spec.md §4.2).
    pub fn handshake(&self) -> bool {
        let has_key = self.headers.get_first("sec-websocket-key").is_some();
        let version_ok = self.headers.get_first("sec-websocket-version") == Some("13");
        let has_upgrade = self
            .headers
            .get_first("upgrade")
            .map(|v| v.eq_ignore_ascii_case("websocket"))
            .unwrap_or(false);
        has_key && version_ok && has_upgrade
    }

    pub fn check(&self, flag: &str) -> bool {
        match flag {
            "crypted" => self.crypted,
            "encryption" => self.encryption.enabled,
            _ => false,
        }
    }

    // -- authentication -----------------------------------------------------

    /// Evaluates `auth()` per spec.md §4.2: BASIC consults `check_password`, DIGEST
    /// consults `extract_password` plus a server-issued nonce. `None` auth type is always
    /// GOOD (no credentials required).
    pub fn auth(&mut self, now_ms: u64) -> AuthVerdict {
        match self.auth_type {
            AuthType::None => AuthVerdict::Good,
            AuthType::Basic => {
                let header = self.headers.get_first("authorization").map(str::to_string);
                let Some(check) = self.check_password.clone() else {
                    return AuthVerdict::Fault;
                };
                let bid = self.bid;
                auth::verify_basic(header.as_deref(), bid, |b, u, p| check(b, u, p))
            }
            AuthType::Digest => {
                if self.nonce.is_none() {
                    self.nonce = Some(auth::generate_nonce(&self.opaque, now_ms));
                }
                let nonce = self.nonce.clone().expect("nonce just set");
                let header = self.headers.get_first("authorization").map(str::to_string);
                let method = self.request_line.method.clone();
                let Some(extract) = self.extract_password.clone() else {
                    return AuthVerdict::Fault;
                };
                let bid = self.bid;
                let config = crate::config::ServiceConfig::builder().auth(self.auth_type, self.hash).realm(&self.realm).opaque(&self.opaque).build();
                auth::verify_digest(header.as_deref(), &method, &config, &nonce, now_ms, |user| extract(bid, user))
            }
        }
    }

    /// Challenge header for a FAULT verdict: `(status, header_name, value)`.
    pub fn challenge(&self) -> (u16, &'static str, String) {
        let config = crate::config::ServiceConfig::builder().auth(self.auth_type, self.hash).realm(&self.realm).opaque(&self.opaque).build();
        auth::challenge_header(self.identity, &config, self.nonce.as_ref())
    }

    // -- serialization -----------------------------------------------------

    /// Default reason phrase for a status code, per spec.md §4.2 `message(code)`.
    pub fn message(code: u16) -> &'static str {
        match code {
            101 => "Switching Protocols",
            200 => "OK",
            204 => "No Content",
            206 => "Partial Content",
            301 => "Moved Permanently",
            304 => "Not Modified",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            407 => "Proxy Authentication Required",
            413 => "Payload Too Large",
            500 => "Internal Server Error",
            505 => "HTTP Version Not Supported",
            _ => "Unknown",
        }
    }

    /// Serializes an HTTP/1.1 request or status line + headers + body into wire bytes.
    pub fn process(&self, direction: Direction, status_or_method: &str, headers: &[(String, String)], body: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        match direction {
            Direction::Request => {
                out.extend_from_slice(format!("{} {} HTTP/1.1\r\n", status_or_method, self.request_line.url).as_bytes());
            }
            Direction::Response => {
                let code: u16 = status_or_method.parse().unwrap_or(500);
                out.extend_from_slice(format!("HTTP/1.1 {} {}\r\n", code, Self::message(code)).as_bytes());
            }
        }
        for (k, v) in headers {
            out.extend_from_slice(format!("{}: {}\r\n", k, v).as_bytes());
        }
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(body);
        out
    }

    /// Serializes a header block as ordered pairs for HPACK encoding (HTTP/2 path),
    /// including the `:status` pseudo-header for responses.
    pub fn process2(&self, direction: Direction, status: u16, headers: &[(String, String)]) -> Vec<(String, String)> {
        let mut out = Vec::with_capacity(headers.len() + 1);
        match direction {
            Direction::Request => {
                out.push((":method".to_string(), self.request_line.method.clone()));
                out.push((":path".to_string(), self.request_line.url.clone()));
            }
            Direction::Response => {
                out.push((":status".to_string(), status.to_string()));
            }
        }
        out.extend(headers.iter().cloned());
        out
    }

    /// Synthesizes rejection headers for a non-2xx status with no body negotiation
    /// (spec.md §4.2 `reject2`).
    pub fn reject2(&self, status: u16) -> Vec<(String, String)> {
        vec![(":status".to_string(), status.to_string()), ("content-length".to_string(), "0".to_string())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthType;

    #[test]
    fn header2_pseudo_headers_populate_request_line() {
        let mut parser = HttpParser::new(ConnectionId(1));
        parser.header2(":method", "POST");
        parser.header2(":path", "/upload");
        parser.header2("content-type", "application/grpc");
        parser.commit();
        assert_eq!(parser.request().method, "POST");
        assert_eq!(parser.request().url, "/upload");
        assert_eq!(parser.headers().get_first("content-type"), Some("application/grpc"));
    }

    #[test]
    fn basic_auth_fault_without_matching_password() {
        let mut parser = HttpParser::new(ConnectionId(1));
        parser.auth_type(AuthType::Basic, HashAlg::Sha256);
        parser.header("authorization", "Basic dXNlcjpwYXNz");
        parser.auth_callback(Arc::new(|_, _, _| false));
        assert_eq!(parser.auth(0), AuthVerdict::Fault);
        let (status, name, value) = parser.challenge();
        assert_eq!(status, 401);
        assert_eq!(name, "WWW-Authenticate");
        assert!(value.starts_with("Basic"));
    }

    #[test]
    fn negotiate_compressor_prefers_first_configured_match() {
        let mut parser = HttpParser::new(ConnectionId(1));
        parser.compressors(vec![Compressor::Gzip, Compressor::Deflate]);
        parser.negotiate_compressor("deflate, gzip;q=0.8");
        assert_eq!(parser.compression(), Compressor::Gzip);
    }

    #[test]
    fn negotiate_compressor_falls_back_to_identity() {
        let mut parser = HttpParser::new(ConnectionId(1));
        parser.compressors(vec![Compressor::Gzip]);
        parser.negotiate_compressor("br");
        assert_eq!(parser.compression(), Compressor::Identity);
    }

    #[test]
    fn finalize_inbound_body_decompresses_gzip_content_encoding() {
        let mut parser = HttpParser::new(ConnectionId(1));
        parser.compressors(vec![Compressor::Gzip]);
        parser.header("content-encoding", "gzip");
        let compressed = hotaru_lib::compression::compress(Compressor::Gzip, b"hello world").unwrap();
        parser.append_body(&compressed);
        parser.negotiate_inbound_compressor();
        parser.finalize_inbound_body().unwrap();
        assert_eq!(parser.body(), b"hello world");
    }

    #[test]
    fn finalize_inbound_body_decrypts_aead_payload() {
        let mut parser = HttpParser::new(ConnectionId(1));
        parser.encryption(true, "hunter2", b"salt".to_vec());
        let key = hotaru_lib::ende::derive_key("hunter2", b"salt");
        let sealed = hotaru_lib::ende::seal(&key, b"secret body").unwrap();
        parser.append_body(&sealed);
        parser.negotiate_inbound_compressor();
        parser.finalize_inbound_body().unwrap();
        assert_eq!(parser.body(), b"secret body");
        assert!(parser.crypted());
    }

    #[test]
    fn handshake_requires_all_three_ws_tokens() {
        let mut parser = HttpParser::new(ConnectionId(1));
        parser.header("upgrade", "websocket");
        parser.header("sec-websocket-version", "13");
        assert!(!parser.handshake());
        parser.header("sec-websocket-key", "dGhlIHNhbXBsZSBub25jZQ==");
        assert!(parser.handshake());
    }

    #[test]
    fn process_serializes_status_line_headers_and_body() {
        let parser = HttpParser::new(ConnectionId(1));
        let wire = parser.process(Direction::Response, "200", &[("content-length".to_string(), "2".to_string())], b"hi");
        let text = String::from_utf8(wire).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.ends_with("hi"));
    }
}
