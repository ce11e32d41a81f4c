//! Message implementations for different HTTP versions using Hyper.

use std::error::Error;
use bytes::BytesMut;
use hotaru_core::connection::Message;
use hyper::{Request, Response, Version, Method, StatusCode};
use http::{HeaderMap, HeaderName, HeaderValue};
use http_body_util::Full;

// ============================================================================
// Base Hyper Message type
// ============================================================================

use crate::context::Body;

pub enum HyperMessage {
    Request(Request<Body>),
    Response(Response<Body>),
}

// ============================================================================
// HTTP/1.1 Message Implementation
// ============================================================================

pub enum Http1Message {
    Request(Http1Request),
    Response(Http1Response),
}

pub struct Http1Request {
    pub method: Method,
    pub uri: String,
    pub version: Version,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

pub struct Http1Response {
    pub version: Version,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Message for Http1Message {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), Box<dyn Error + Send + Sync>> {
        match self {
            Http1Message::Request(req) => {
                // Encode HTTP/1.1 request
                let request_line = format!("{} {} {:?}\r\n", 
                    req.method, 
                    req.uri,
                    req.version
                );
                buf.extend_from_slice(request_line.as_bytes());
                
                // Encode headers
                for (name, value) in &req.headers {
                    buf.extend_from_slice(name.as_str().as_bytes());
                    buf.extend_from_slice(b": ");
                    buf.extend_from_slice(value.as_bytes());
                    buf.extend_from_slice(b"\r\n");
                }
                
                // End of headers
                buf.extend_from_slice(b"\r\n");
                
                // Body
                buf.extend_from_slice(&req.body);
            }
            Http1Message::Response(res) => {
                // Encode HTTP/1.1 response
                let status_line = format!("{:?} {} {}\r\n",
                    res.version,
                    res.status.as_u16(),
                    res.status.canonical_reason().unwrap_or("")
                );
                buf.extend_from_slice(status_line.as_bytes());
                
                // Encode headers
                for (name, value) in &res.headers {
                    buf.extend_from_slice(name.as_str().as_bytes());
                    buf.extend_from_slice(b": ");
                    buf.extend_from_slice(value.as_bytes());
                    buf.extend_from_slice(b"\r\n");
                }
                
                // End of headers
                buf.extend_from_slice(b"\r\n");
                
                // Body
                buf.extend_from_slice(&res.body);
            }
        }
        Ok(())
    }
    
    fn decode(buf: &mut BytesMut) -> Result<Option<Self>, Box<dyn Error + Send + Sync>>
    where
        Self: Sized
    {
        // Simple HTTP/1.1 parser - in production, use httparse crate
        let data = buf.as_ref();
        
        // Look for end of headers
        if let Some(header_end) = find_subsequence(data, b"\r\n\r\n") {
            let header_bytes = &data[..header_end];
            let header_str = std::str::from_utf8(header_bytes)?;
            let lines: Vec<&str> = header_str.split("\r\n").collect();
            
            if lines.is_empty() {
                return Ok(None);
            }
            
            let first_line = lines[0];
            
            // Check if it's a request or response
            if first_line.starts_with("HTTP/") {
                // Parse response
                let parts: Vec<&str> = first_line.splitn(3, ' ').collect();
                if parts.len() < 2 {
                    return Ok(None);
                }
                
                let version = parse_version(parts[0])?;
                let status = StatusCode::from_u16(parts[1].parse()?)?;
                
                let mut headers = HeaderMap::new();
                for line in &lines[1..] {
                    if let Some(colon_pos) = line.find(':') {
                        let name = &line[..colon_pos];
                        let value = &line[colon_pos + 1..].trim();
                        headers.insert(
                            HeaderName::from_bytes(name.as_bytes())?,
                            HeaderValue::from_str(value)?
                        );
                    }
                }
                
                // For now, consume all data as body
                let body_start = header_end + 4;
                let body = data[body_start..].to_vec();
                let _ = buf.split_to(data.len());
                
                Ok(Some(Http1Message::Response(Http1Response {
                    version,
                    status,
                    headers,
                    body,
                })))
            } else {
                // Parse request
                let parts: Vec<&str> = first_line.splitn(3, ' ').collect();
                if parts.len() < 3 {
                    return Ok(None);
                }
                
                let method = Method::from_bytes(parts[0].as_bytes())?;
                let uri = parts[1].to_string();
                let version = parse_version(parts[2])?;
                
                let mut headers = HeaderMap::new();
                for line in &lines[1..] {
                    if let Some(colon_pos) = line.find(':') {
                        let name = &line[..colon_pos];
                        let value = &line[colon_pos + 1..].trim();
                        headers.insert(
                            HeaderName::from_bytes(name.as_bytes())?,
                            HeaderValue::from_str(value)?
                        );
                    }
                }
                
                // For now, consume all data as body
                let body_start = header_end + 4;
                let body = data[body_start..].to_vec();
                let _ = buf.split_to(data.len());
                
                Ok(Some(Http1Message::Request(Http1Request {
                    method,
                    uri,
                    version,
                    headers,
                    body,
                })))
            }
        } else {
            // Need more data
            Ok(None)
        }
    }
}

// ============================================================================
// HTTP/2 Message Implementation (Frame-based)
// ============================================================================

pub enum Http2Message {
    Data(DataFrame),
    Headers(HeadersFrame),
    Priority(PriorityFrame),
    RstStream(RstStreamFrame),
    Settings(SettingsFrame),
    PushPromise(PushPromiseFrame),
    Ping(PingFrame),
    GoAway(GoAwayFrame),
    WindowUpdate(WindowUpdateFrame),
    Continuation(ContinuationFrame),
}

pub struct DataFrame {
    pub stream_id: u32,
    pub data: Vec<u8>,
    pub end_stream: bool,
}

pub struct HeadersFrame {
    pub stream_id: u32,
    pub headers: Vec<(Vec<u8>, Vec<u8>)>,
    pub end_stream: bool,
    pub end_headers: bool,
    pub priority: Option<PriorityFrame>,
}

pub struct PriorityFrame {
    pub stream_id: u32,
    pub exclusive: bool,
    pub stream_dependency: u32,
    pub weight: u8,
}

pub struct RstStreamFrame {
    pub stream_id: u32,
    pub error_code: u32,
}

pub struct SettingsFrame {
    pub ack: bool,
    pub settings: Vec<(u16, u32)>,
}

pub struct PushPromiseFrame {
    pub stream_id: u32,
    pub promised_stream_id: u32,
    pub headers: Vec<(Vec<u8>, Vec<u8>)>,
    pub end_headers: bool,
}

pub struct PingFrame {
    pub ack: bool,
    pub data: [u8; 8],
}

pub struct GoAwayFrame {
    pub last_stream_id: u32,
    pub error_code: u32,
    pub debug_data: Vec<u8>,
}

pub struct WindowUpdateFrame {
    pub stream_id: u32,
    pub window_size_increment: u32,
}

pub struct ContinuationFrame {
    pub stream_id: u32,
    pub headers: Vec<(Vec<u8>, Vec<u8>)>,
    pub end_headers: bool,
}

impl Message for Http2Message {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), Box<dyn Error + Send + Sync>> {
        // TODO: Implement HTTP/2 frame encoding
        // This will use the HTTP/2 frame format
        Ok(())
    }
    
    fn decode(buf: &mut BytesMut) -> Result<Option<Self>, Box<dyn Error + Send + Sync>>
    where
        Self: Sized
    {
        // TODO: Implement HTTP/2 frame decoding
        // This will parse HTTP/2 frames
        Ok(None)
    }
}

// ============================================================================
// HTTP/3 Message Implementation (QUIC-based)
// ============================================================================

pub enum Http3Message {
    Data(Http3DataFrame),
    Headers(Http3HeadersFrame),
    CancelPush(Http3CancelPushFrame),
    Settings(Http3SettingsFrame),
    PushPromise(Http3PushPromiseFrame),
    GoAway(Http3GoAwayFrame),
    MaxPushId(Http3MaxPushIdFrame),
}

pub struct Http3DataFrame {
    pub data: Vec<u8>,
}

pub struct Http3HeadersFrame {
    pub headers: Vec<(Vec<u8>, Vec<u8>)>,
}

pub struct Http3CancelPushFrame {
    pub push_id: u64,
}

pub struct Http3SettingsFrame {
    pub settings: Vec<(u64, u64)>,
}

pub struct Http3PushPromiseFrame {
    pub push_id: u64,
    pub headers: Vec<(Vec<u8>, Vec<u8>)>,
}

pub struct Http3GoAwayFrame {
    pub id: u64,
}

pub struct Http3MaxPushIdFrame {
    pub push_id: u64,
}

impl Message for Http3Message {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), Box<dyn Error + Send + Sync>> {
        // TODO: Implement HTTP/3 frame encoding
        // This will use the HTTP/3 frame format over QUIC
        Ok(())
    }
    
    fn decode(buf: &mut BytesMut) -> Result<Option<Self>, Box<dyn Error + Send + Sync>>
    where
        Self: Sized
    {
        // TODO: Implement HTTP/3 frame decoding
        // This will parse HTTP/3 frames from QUIC streams
        Ok(None)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len())
        .position(|window| window == needle)
}

fn parse_version(version_str: &str) -> Result<Version, Box<dyn Error + Send + Sync>> {
    match version_str {
        "HTTP/0.9" => Ok(Version::HTTP_09),
        "HTTP/1.0" => Ok(Version::HTTP_10),
        "HTTP/1.1" => Ok(Version::HTTP_11),
        "HTTP/2.0" | "HTTP/2" => Ok(Version::HTTP_2),
        "HTTP/3.0" | "HTTP/3" => Ok(Version::HTTP_3),
        _ => Err(format!("Unknown HTTP version: {}", version_str).into()),
    }
}