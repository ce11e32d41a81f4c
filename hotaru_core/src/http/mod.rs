pub mod request;
pub mod body;
pub mod context;
pub mod cookie;
pub mod encoding;
pub mod form;
pub mod meta;
pub mod http_value;
pub mod response;
pub mod net;
pub mod start_line;
pub mod safety;
pub mod traits;  // Protocol trait implementations for HTTP/1.1

#[cfg(test)]
pub mod test;  // Security tests for HTTP parsing

pub use traits::{Http1Protocol, HTTP, HttpTransport, HttpMessage};
pub use context::{HttpContext, HttpReqCtx, HttpResCtx};
