pub mod http;
pub mod prelude;

pub use hotaru_core::app::application::App; 
pub use hotaru_core::app::application::RunMode; 
pub use hotaru_core::url::PathPattern; 
pub use hotaru_core::url::Url; 
pub use hotaru_core::url::pattern::path_pattern_creator::{
    literal_path as LitUrl, 
    trailing_slash as TrailingSlash, 
    regex_path as RegUrl, 
    any as AnyUrl, 
    any_path as AnyPath, 
}; 

pub use hotaru_core::app::middleware::AsyncMiddleware; 
pub use hotaru_core::app::protocol::{ProtocolHandlerBuilder, ProtocolRegistryKind, ProtocolRegistryBuilder}; 

pub use hotaru_core::Value; 
pub use hotaru_core::TemplateManager; 
pub use hotaru_core::object; 

pub use hotaru_core::connection::{Protocol, RequestContext, Transport, Stream, Message, ProtocolRole};
#[allow(deprecated)]
pub use hotaru_core::connection::{TcpConnectionStream, ConnectionBuilder, LegacyConnectionBuilder, LegacyProtocol}; 
pub use hotaru_core::connection::error::{ConnectionError, Result}; 
pub use hotaru_core::client::{Client, ClientBuilder, ClientRegistry, SClient, ConnectionTarget};

pub use hotaru_core::http::request::request_templates; 
pub use hotaru_core::http::response::response_templates; 

pub use hotaru_core::http::response::HttpResponse;  
pub use hotaru_core::http::request::HttpRequest;
pub use hotaru_core::http::context::{HttpContext, Executable};
pub use hotaru_core::http::client_context::HttpClientContext;
pub use hotaru_core::http::traits::{HTTP, HTTP_CLIENT, HttpTransport, HttpMessage, HttpClientProtocol}; 

pub use hotaru_core::http::meta::*; 
pub use hotaru_core::http::http_value::*; 
pub use hotaru_core::http::cookie::*; 
pub use hotaru_core::http::body::*; 
pub use hotaru_core::http::form::*; 
pub use hotaru_core::http::encoding::*; 
pub use hotaru_core::http::safety::HttpSafety;

pub use hotaru_core::extensions::*; 

pub use hotaru_core;
pub use akari; 

pub use hotaru_trans as hrt; 
pub use hrt::endpoint;
pub use hrt::outpoint;
pub use hrt::middleware;
pub use hrt::{LApp, LClient, LUrl, LPattern}; 
pub use hrt::ctor as hrt_ctor; 

pub use ahttpm; 

pub use hotaru_lib;
