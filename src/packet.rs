//! Http packet codec - parse raw request/response text, format requests

use bytes::Bytes;
use http::{Method, StatusCode};

use crate::{ParseError, ParseResult};

pub const CRLF: &str = "\r\n";

const VERSIONS: [&str; 2] = ["HTTP/1.0", "HTTP/1.1"];

#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub host: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Request {
    pub fn header(&self, name: &str) -> Option<&str> {
        header_value(&self.headers, name)
    }
}

#[derive(Debug, Clone)]
pub struct Response {
    /// Status code exactly as received, three digits.
    pub code: String,
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Response {
    pub fn header(&self, name: &str) -> Option<&str> {
        header_value(&self.headers, name)
    }

    pub fn status(&self) -> ParseResult<StatusCode> {
        Ok(self.code.parse()?)
    }
}

fn header_value<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

/// Parse an inbound client request. The start line must be exactly
/// `METHOD SP TARGET SP VERSION` and the method must be GET or POST.
pub fn parse_request(text: &str) -> ParseResult<Request> {
    let mut lines = text.split(CRLF);

    let start = lines.next().unwrap_or_default();
    let tokens: Vec<&str> = start.split(' ').collect();
    if tokens.len() != 3 {
        return Err(ParseError::MissingVersionToken(start.to_string()));
    }
    if !VERSIONS.contains(&tokens[2]) {
        return Err(ParseError::InvalidVersion(tokens[2].to_string()));
    }

    let method: Method = tokens[0].parse()?;
    if method != Method::GET && method != Method::POST {
        return Err(ParseError::UnsupportedMethod(tokens[0].to_string()));
    }
    let url = tokens[1].to_string();

    let (headers, body) = parse_fields(lines)?;
    let host = header_value(&headers, "Host")
        .ok_or(ParseError::MissingHost)?
        .to_string();

    Ok(Request {
        method,
        url,
        host,
        headers,
        body,
    })
}

/// Parse an origin response. The start line is `VERSION SP CODE SP REASON`,
/// with the reason free to contain further spaces.
pub fn parse_response(text: &str) -> ParseResult<Response> {
    let mut lines = text.split(CRLF);

    let start = lines.next().unwrap_or_default();
    let mut tokens = start.splitn(3, ' ');
    let version = tokens.next().unwrap_or_default();
    let (code, reason) = match (tokens.next(), tokens.next()) {
        (Some(code), Some(reason)) => (code, reason),
        _ => return Err(ParseError::MissingVersionToken(start.to_string())),
    };
    if !VERSIONS.contains(&version) {
        return Err(ParseError::InvalidVersion(version.to_string()));
    }

    let (headers, body) = parse_fields(lines)?;

    Ok(Response {
        code: code.to_string(),
        reason: reason.to_string(),
        headers,
        body,
    })
}

/// Header and body section shared by both grammars. Headers run until the
/// first blank line; every remaining non-blank line is re-terminated with
/// CRLF and concatenated into the body.
fn parse_fields<'a, I>(lines: I) -> ParseResult<(Vec<(String, String)>, Bytes)>
where
    I: Iterator<Item = &'a str>,
{
    let mut headers = Vec::new();
    let mut content = String::new();
    let mut in_body = false;

    for line in lines {
        if in_body {
            if !line.is_empty() {
                content.push_str(line);
                content.push_str(CRLF);
            }
            continue;
        }

        if line.is_empty() {
            in_body = true;
            continue;
        }

        let (name, value) = line
            .split_once(": ")
            .ok_or_else(|| ParseError::MalformedHeaderLine(line.to_string()))?;
        headers.push((name.to_string(), value.to_string()));
    }

    Ok((headers, Bytes::from(content)))
}

/// Render a minimal GET request. Underscores in extra header names become
/// hyphens, so `If_Modified_Since` serializes as `If-Modified-Since`.
pub fn format_get(url: &str, host: &str, extra: &[(&str, &str)]) -> String {
    let mut lines = vec![format!("GET {} HTTP/1.1", url), format!("Host: {}", host)];
    for (name, value) in extra {
        lines.push(format!("{}: {}", name.replace('_', "-"), value));
    }

    lines.join(CRLF) + CRLF + CRLF
}

/// Compose a minimal local response around the given body.
pub fn format_response(status: StatusCode, reason: &str, content: &[u8]) -> Bytes {
    let start = format!("HTTP/1.1 {} {}", status.as_str(), reason);

    let mut buf = Vec::with_capacity(start.len() + content.len() + 32);
    buf.extend_from_slice(start.as_bytes());
    buf.extend_from_slice(b"\r\nContent-Type: text/html\r\n\r\n");
    buf.extend_from_slice(content);
    buf.extend_from_slice(b"\r\n");

    Bytes::from(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request() {
        let req = parse_request("GET /foo HTTP/1.1\r\nHost: example.com\r\n\r\n").unwrap();

        assert_eq!(req.method, Method::GET);
        assert_eq!(req.url, "/foo");
        assert_eq!(req.host, "example.com");
        assert!(req.body.is_empty());
    }

    #[test]
    fn test_request_roundtrip() {
        let wire = format_get("/x", "h", &[]);
        let req = parse_request(&wire).unwrap();

        assert_eq!(req.method, Method::GET);
        assert_eq!(req.url, "/x");
        assert_eq!(req.host, "h");
    }

    #[test]
    fn test_format_get_renders_hyphens() {
        let wire = format_get("/a", "h", &[("If_Modified_Since", "D1")]);

        assert_eq!(
            wire,
            "GET /a HTTP/1.1\r\nHost: h\r\nIf-Modified-Since: D1\r\n\r\n"
        );
    }

    #[test]
    fn test_parse_response() {
        let resp = parse_response(
            "HTTP/1.1 200 OK\r\nLast-Modified: D1\r\nContent-Length: 5\r\n\r\nhello",
        )
        .unwrap();

        assert_eq!(resp.code, "200");
        assert_eq!(resp.reason, "OK");
        assert_eq!(resp.status().unwrap(), StatusCode::OK);
        assert_eq!(resp.header("Last-Modified"), Some("D1"));
        assert_eq!(&resp.body[..], b"hello\r\n");
    }

    #[test]
    fn test_reason_keeps_spaces() {
        let resp = parse_response("HTTP/1.1 304 Not Modified\r\n\r\n").unwrap();

        assert_eq!(resp.code, "304");
        assert_eq!(resp.reason, "Not Modified");
    }

    #[test]
    fn test_missing_version_token() {
        let err = parse_request("GET /foo\r\n\r\n").unwrap_err();

        assert!(matches!(err, ParseError::MissingVersionToken(_)));
    }

    #[test]
    fn test_invalid_version() {
        let err = parse_request("GET /foo HTTP/2.0\r\n\r\n").unwrap_err();

        assert!(matches!(err, ParseError::InvalidVersion(_)));
    }

    #[test]
    fn test_unsupported_method() {
        let err = parse_request("DELETE /foo HTTP/1.1\r\nHost: h\r\n\r\n").unwrap_err();

        assert!(matches!(err, ParseError::UnsupportedMethod(_)));
    }

    #[test]
    fn test_malformed_header_line() {
        let err = parse_request("GET /foo HTTP/1.1\r\nHost example.com\r\n\r\n").unwrap_err();

        assert!(matches!(err, ParseError::MalformedHeaderLine(_)));
    }

    #[test]
    fn test_missing_host() {
        let err = parse_request("GET /foo HTTP/1.1\r\n\r\n").unwrap_err();

        assert!(matches!(err, ParseError::MissingHost));
    }

    #[test]
    fn test_format_response() {
        let resp = format_response(StatusCode::NOT_FOUND, "Not Found", b"<h1>gone</h1>");

        assert_eq!(
            &resp[..],
            b"HTTP/1.1 404 Not Found\r\nContent-Type: text/html\r\n\r\n<h1>gone</h1>\r\n"
        );
    }
}
