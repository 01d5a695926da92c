//! Cachew proxy service library
//!
//! A forwarding HTTP proxy that relays GET/POST to the origin and keeps an
//! on-disk cache of GET responses, revalidated with conditional GET / 304.

use bytes::Bytes;

pub mod error;
pub use error::{CacheError, FetchError, ParseError, SessionError, SetupError};

pub mod option;
pub use option::ProxyOption;

pub mod packet;
pub use packet::{format_get, format_response, parse_request, parse_response, Request, Response};

pub mod origin;
pub use origin::TcpOrigin;

pub mod cache;
pub use cache::CacheStore;

pub mod session;
pub use session::SessionHandler;

pub mod listener;
pub use listener::Listener;

pub type ParseResult<T> = std::result::Result<T, ParseError>;
pub type FetchResult<T> = std::result::Result<T, FetchError>;
pub type CacheResult<T> = std::result::Result<T, CacheError>;
pub type SessionResult<T> = std::result::Result<T, SessionError>;

#[trait_variant::make(OriginFetch: Send + Sync)]
pub trait LocalOriginFetch {
    /// Send one serialized request to the origin and return the complete
    /// raw response bytes.
    async fn fetch(&self, host: &str, request: &[u8]) -> FetchResult<Bytes>;
}
