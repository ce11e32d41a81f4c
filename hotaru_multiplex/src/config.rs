//! Immutable service configuration consumed by the [`crate::multiplexer::Multiplexer`].
//!
//! Grounded on `hotaru_core::app::application::AppBuilder`: a builder that produces one
//! `Arc`-friendly, largely-immutable config value, per Design Notes §9 ("fold into an
//! immutable Config value passed at construction").

use hotaru_lib::compression::Compressor;
use std::collections::HashSet;

/// Authentication scheme advertised by a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthType {
    None,
    Basic,
    Digest,
}

/// Digest hash algorithm. Covers every variant spec.md §3 names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlg {
    Md5,
    Sha1,
    Sha256,
    Sha512,
}

impl HashAlg {
    pub fn algorithm_token(&self) -> &'static str {
        match self {
            HashAlg::Md5 => "MD5",
            HashAlg::Sha1 => "SHA-1",
            HashAlg::Sha256 => "SHA-256",
            HashAlg::Sha512 => "SHA-512",
        }
    }
}

/// Runtime mode flags from spec.md §6.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    NotPing,
    NotStop,
    NotInfo,
    Alive,
    WebsocketEnable,
    TakeoverClient,
    TakeoverServer,
    ConnectMethodEnable,
}

/// AEAD encryption options for payload bodies.
#[derive(Debug, Clone)]
pub struct EncryptionConfig {
    pub enabled: bool,
    pub pass: String,
    pub salt: Vec<u8>,
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self { enabled: false, pass: String::new(), salt: Vec::new() }
    }
}

/// Server identification string triple advertised in responses (name/version banner).
#[derive(Debug, Clone, Default)]
pub struct Ident {
    pub id: String,
    pub name: String,
    pub version: String,
}

/// Immutable, `Arc`-shared configuration for one listener's worth of connections.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub alive: bool,
    pub realm: String,
    pub opaque: String,
    pub auth_type: AuthType,
    pub hash: HashAlg,
    pub encryption: EncryptionConfig,
    pub ident: Ident,
    pub max_requests: u32,
    pub ping_interval_ms: u64,
    pub chunk_size: usize,
    pub compressors: Vec<Compressor>,
    pub modes: HashSet<Mode>,
}

impl ServiceConfig {
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::new()
    }

    pub fn mode(&self, flag: Mode) -> bool {
        self.modes.contains(&flag)
    }

    pub fn pinging_enabled(&self) -> bool {
        self.ping_interval_ms > 0 && !self.mode(Mode::NotPing)
    }

    pub fn websocket_enabled(&self) -> bool {
        self.mode(Mode::WebsocketEnable)
    }
}

pub struct ServiceConfigBuilder {
    alive: bool,
    realm: String,
    opaque: String,
    auth_type: AuthType,
    hash: HashAlg,
    encryption: EncryptionConfig,
    ident: Ident,
    max_requests: u32,
    ping_interval_ms: u64,
    chunk_size: usize,
    compressors: Vec<Compressor>,
    modes: HashSet<Mode>,
}

impl ServiceConfigBuilder {
    pub fn new() -> Self {
        Self {
            alive: false,
            realm: "hotaru".into(),
            opaque: String::new(),
            auth_type: AuthType::None,
            hash: HashAlg::Sha256,
            encryption: EncryptionConfig::default(),
            ident: Ident::default(),
            max_requests: 0,
            ping_interval_ms: 30_000,
            chunk_size: 8192,
            compressors: vec![Compressor::Identity],
            modes: HashSet::new(),
        }
    }

    pub fn alive(mut self, alive: bool) -> Self {
        self.alive = alive;
        self
    }

    pub fn realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = realm.into();
        self
    }

    pub fn opaque(mut self, opaque: impl Into<String>) -> Self {
        self.opaque = opaque.into();
        self
    }

    pub fn auth(mut self, auth_type: AuthType, hash: HashAlg) -> Self {
        self.auth_type = auth_type;
        self.hash = hash;
        self
    }

    pub fn encryption(mut self, pass: impl Into<String>, salt: Vec<u8>) -> Self {
        self.encryption = EncryptionConfig { enabled: true, pass: pass.into(), salt };
        self
    }

    pub fn ident(mut self, id: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.ident = Ident { id: id.into(), name: name.into(), version: version.into() };
        self
    }

    pub fn max_requests(mut self, max: u32) -> Self {
        self.max_requests = max;
        self
    }

    pub fn ping_interval_ms(mut self, ms: u64) -> Self {
        self.ping_interval_ms = ms;
        self
    }

    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    pub fn compressors(mut self, compressors: Vec<Compressor>) -> Self {
        self.compressors = compressors;
        self
    }

    pub fn mode(mut self, flag: Mode) -> Self {
        self.modes.insert(flag);
        self
    }

    pub fn modes(mut self, flags: impl IntoIterator<Item = Mode>) -> Self {
        self.modes.extend(flags);
        self
    }

    pub fn build(self) -> ServiceConfig {
        ServiceConfig {
            alive: self.alive,
            realm: self.realm,
            opaque: self.opaque,
            auth_type: self.auth_type,
            hash: self.hash,
            encryption: self.encryption,
            ident: self.ident,
            max_requests: self.max_requests,
            ping_interval_ms: self.ping_interval_ms,
            chunk_size: self.chunk_size,
            compressors: self.compressors,
            modes: self.modes,
        }
    }
}

impl Default for ServiceConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_are_sane() {
        let cfg = ServiceConfig::builder().build();
        assert_eq!(cfg.max_requests, 0);
        assert!(cfg.pinging_enabled());
        assert!(!cfg.websocket_enabled());
    }

    #[test]
    fn not_ping_mode_disables_pinging() {
        let cfg = ServiceConfig::builder().mode(Mode::NotPing).build();
        assert!(!cfg.pinging_enabled());
    }
}
