//! Proxy session - one client connection end to end

use std::{path::PathBuf, sync::Arc};

use bytes::Bytes;
use http::{Method, StatusCode};
use tokio::{
    fs,
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
};

use crate::{
    cache::CacheStore,
    packet::{format_get, format_response, parse_request, parse_response, Request},
    OriginFetch, SessionError, SessionResult,
};

/// Orchestrates one client connection: parse the inbound request, decide
/// hit/miss/stale against the cache, consult the origin, send the reply.
#[derive(Debug)]
pub struct SessionHandler<F> {
    fetcher: F,
    cache: Arc<CacheStore>,
    error_page: PathBuf,
    buf_size: usize,
}

impl<F> SessionHandler<F>
where
    F: OriginFetch,
{
    pub fn new(
        fetcher: F,
        cache: Arc<CacheStore>,
        error_page: impl Into<PathBuf>,
        buf_size: usize,
    ) -> Self {
        Self {
            fetcher,
            cache,
            error_page: error_page.into(),
            buf_size,
        }
    }

    /// Serve one client connection and close it. Any error aborts this
    /// connection only, and a parse failure sends no response at all.
    pub async fn handle<S>(&self, mut stream: S) -> SessionResult<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut buf = vec![0u8; self.buf_size];
        let n = stream.read(&mut buf).await?;
        buf.truncate(n);

        let text = String::from_utf8_lossy(&buf).into_owned();
        let request = parse_request(&text)?;
        tracing::debug!(method = %request.method, url = %request.url, host = %request.host, "request parsed");

        let reply = self.dispatch(&request, &buf).await?;

        stream.write_all(&reply).await?;
        stream.flush().await?;
        stream.shutdown().await?;

        Ok(())
    }

    async fn dispatch(&self, request: &Request, raw: &[u8]) -> SessionResult<Bytes> {
        // POST is forwarded verbatim and never touches the cache.
        if request.method == Method::POST {
            return self
                .forward(request, Bytes::copy_from_slice(raw), None)
                .await;
        }

        let key = CacheStore::key(&request.url);
        let _guard = self.cache.guard(&key).await;

        if self.cache.has(&key).await {
            self.revalidate(request, &key).await
        } else {
            let wire = format_get(&request.url, &request.host, &[]);
            self.forward(request, Bytes::from(wire), Some(&key)).await
        }
    }

    /// Conditional GET against an existing cache entry. The validator is
    /// `Last-Modified` when present, `Date` otherwise.
    async fn revalidate(&self, request: &Request, key: &str) -> SessionResult<Bytes> {
        let cached = self.cache.read(key).await?;
        let cached_text = String::from_utf8_lossy(&cached).into_owned();
        let cached_resp = parse_response(&cached_text)?;

        let validator = cached_resp
            .header("Last-Modified")
            .or_else(|| cached_resp.header("Date"))
            .ok_or(SessionError::MissingValidator)?;

        let wire = format_get(
            &request.url,
            &request.host,
            &[("If_Modified_Since", validator)],
        );
        let fresh = self.fetcher.fetch(&request.host, wire.as_bytes()).await?;
        let fresh_text = String::from_utf8_lossy(&fresh).into_owned();
        let status = parse_response(&fresh_text)?.status()?;

        match status {
            StatusCode::OK => {
                self.cache.write(key, &fresh).await?;
                tracing::info!(%key, "cache entry updated");
                Ok(fresh)
            }
            StatusCode::NOT_MODIFIED => {
                tracing::info!(%key, "cache hit");
                Ok(cached)
            }
            other => Err(SessionError::UnexpectedRevalidationStatus(other)),
        }
    }

    /// Direct path: relay `wire` to the origin. Any non-200 answer is
    /// replaced by the local 404 substitute; a 200 for a GET is stored
    /// under `key` before being relayed unchanged.
    async fn forward(
        &self,
        request: &Request,
        wire: Bytes,
        key: Option<&str>,
    ) -> SessionResult<Bytes> {
        let raw = self.fetcher.fetch(&request.host, &wire).await?;
        let text = String::from_utf8_lossy(&raw).into_owned();
        let status = parse_response(&text)?.status()?;

        if status != StatusCode::OK {
            tracing::warn!(%status, url = %request.url, "substituting local error page");
            let template = fs::read(&self.error_page)
                .await
                .map_err(SessionError::ErrorPage)?;
            return Ok(format_response(StatusCode::NOT_FOUND, "Not Found", &template));
        }

        if let Some(key) = key {
            self.cache.write(key, &raw).await?;
            tracing::info!(%key, "cache entry created");
        }

        Ok(raw)
    }
}
