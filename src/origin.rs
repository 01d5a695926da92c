//! Origin fetcher - one short-lived connection per request

use bytes::Bytes;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};

use crate::{FetchResult, OriginFetch};

pub const ORIGIN_PORT: u16 = 80;

const CONTENT_LENGTH: &[u8] = b"Content-Length:";
const HEADER_END: &[u8] = b"\r\n\r\n";

/// Fetches over a fresh plaintext TCP connection to `host:80`, closed
/// again before the call returns.
#[derive(Debug, Clone)]
pub struct TcpOrigin {
    buf_size: usize,
}

impl TcpOrigin {
    pub fn new(buf_size: usize) -> Self {
        Self { buf_size }
    }
}

impl OriginFetch for TcpOrigin {
    async fn fetch(&self, host: &str, request: &[u8]) -> FetchResult<Bytes> {
        let mut stream = TcpStream::connect((host, ORIGIN_PORT)).await?;
        stream.write_all(request).await?;

        let data = read_message(&mut stream, self.buf_size).await?;
        let _ = stream.shutdown().await;

        Ok(data)
    }
}

/// Receive loop over a stream with no length-prefixing guarantee. One
/// initial read, then keep reading until the total declared by the headers
/// has arrived. Without a `Content-Length` header the initial read is
/// returned as-is, so uncounted bodies larger than one chunk come back
/// truncated.
pub async fn read_message<S>(stream: &mut S, buf_size: usize) -> std::io::Result<Bytes>
where
    S: AsyncReadExt + Unpin,
{
    let mut data = Vec::new();
    let mut chunk = vec![0u8; buf_size];

    let n = stream.read(&mut chunk).await?;
    data.extend_from_slice(&chunk[..n]);

    if let Some(total) = expected_len(&data) {
        while data.len() < total {
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            data.extend_from_slice(&chunk[..n]);
        }
    }

    Ok(Bytes::from(data))
}

/// Total message length declared by the received bytes: position of the
/// header/body boundary plus separator plus the `Content-Length` value.
/// `None` until both the header and the boundary have been seen.
pub fn expected_len(data: &[u8]) -> Option<usize> {
    let digits = find(data, CONTENT_LENGTH)? + CONTENT_LENGTH.len();
    let boundary = find(data, HEADER_END)?;

    let mut len = 0usize;
    let mut seen = false;
    for &byte in &data[digits..] {
        if byte.is_ascii_digit() {
            len = len * 10 + usize::from(byte - b'0');
            seen = true;
        } else if byte != b' ' {
            break;
        }
    }

    seen.then_some(boundary + HEADER_END.len() + len)
}

fn find(data: &[u8], needle: &[u8]) -> Option<usize> {
    data.windows(needle.len()).position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    const PAYLOAD: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Length: 13\r\n\r\nHello, world!";

    #[test]
    fn test_expected_len() {
        let boundary = find(PAYLOAD, HEADER_END).unwrap();

        assert_eq!(
            expected_len(PAYLOAD),
            Some(boundary + HEADER_END.len() + 13)
        );
        assert_eq!(expected_len(PAYLOAD), Some(PAYLOAD.len()));
    }

    #[test]
    fn test_expected_len_skips_spaces() {
        let data = b"HTTP/1.1 200 OK\r\nContent-Length:   7\r\n\r\n1234567";

        assert_eq!(expected_len(data), Some(data.len()));
    }

    #[test]
    fn test_expected_len_without_header() {
        assert_eq!(expected_len(b"HTTP/1.1 200 OK\r\n\r\nhi"), None);
    }

    #[tokio::test]
    async fn test_read_message_accumulates_chunks() {
        let (mut tx, mut rx) = tokio::io::duplex(1024);

        tokio::spawn(async move {
            tx.write_all(&PAYLOAD[..45]).await.unwrap();
            tokio::time::sleep(Duration::from_millis(10)).await;
            tx.write_all(&PAYLOAD[45..]).await.unwrap();
        });

        let data = read_message(&mut rx, 64).await.unwrap();
        assert_eq!(&data[..], PAYLOAD);
    }

    #[tokio::test]
    async fn test_read_message_without_length_stops_after_first_chunk() {
        let (mut tx, mut rx) = tokio::io::duplex(1024);
        let first = b"HTTP/1.1 200 OK\r\n\r\nhi";

        tokio::spawn(async move {
            tx.write_all(first).await.unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
            tx.write_all(b"more that never gets waited for").await.unwrap();
        });

        let data = read_message(&mut rx, 64).await.unwrap();
        assert_eq!(&data[..], first);
    }
}
