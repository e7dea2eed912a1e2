//! Header transforms for pass-through forwarding
//!
//! Both directions are pure functions over `HeaderMap`: input headers plus an
//! exclusion set in, output headers out. Repeated headers keep every value in
//! their original order.

use axum::http::{
    HeaderMap, HeaderName, Method,
    header::{
        ALLOW, CONNECTION, CONTENT_DISPOSITION, CONTENT_ENCODING, CONTENT_LANGUAGE,
        CONTENT_LENGTH, CONTENT_LOCATION, CONTENT_RANGE, CONTENT_TYPE, EXPIRES, HOST,
        LAST_MODIFIED, PROXY_AUTHENTICATE, PROXY_AUTHORIZATION, TE, TRAILER, TRANSFER_ENCODING,
        UPGRADE,
    },
};

const KEEP_ALIVE: HeaderName = HeaderName::from_static("keep-alive");

/// Connection-scoped headers, never relayed in either direction
pub const HOP_BY_HOP: [HeaderName; 8] = [
    CONNECTION,
    KEEP_ALIVE,
    PROXY_AUTHENTICATE,
    PROXY_AUTHORIZATION,
    TE,
    TRAILER,
    TRANSFER_ENCODING,
    UPGRADE,
];

/// Request headers the outbound client must regenerate for the new
/// destination and body framing, plus the hop-by-hop set
pub const REQUEST_EXCLUDED: [HeaderName; 10] = [
    HOST,
    CONTENT_LENGTH,
    CONNECTION,
    KEEP_ALIVE,
    PROXY_AUTHENTICATE,
    PROXY_AUTHORIZATION,
    TE,
    TRAILER,
    TRANSFER_ENCODING,
    UPGRADE,
];

/// Response headers dropped before the body is relayed; framing is
/// re-established by the local server
pub const RESPONSE_EXCLUDED: [HeaderName; 8] = HOP_BY_HOP;

/// Request headers split by where they belong on the outbound request
#[derive(Debug, Default, Clone)]
pub struct ForwardHeaders {
    /// Headers describing the exchange (auth, accept, cookies, tracing, ...)
    pub transport: HeaderMap,
    /// Headers describing the body; only sent together with a body
    pub content: HeaderMap,
}

/// Whether `name` describes the message body rather than the exchange
pub fn is_content_header(name: &HeaderName) -> bool {
    *name == CONTENT_TYPE
        || *name == CONTENT_ENCODING
        || *name == CONTENT_LANGUAGE
        || *name == CONTENT_DISPOSITION
        || *name == CONTENT_LOCATION
        || *name == CONTENT_RANGE
        || *name == EXPIRES
        || *name == LAST_MODIFIED
        || *name == ALLOW
        || name.as_str() == "content-md5"
}

/// Header names listed as connection options in `Connection`
///
/// These are hop-by-hop for this message only and must not be relayed.
pub fn connection_options(headers: &HeaderMap) -> Vec<HeaderName> {
    headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect()
}

fn is_excluded(name: &HeaderName, excluded: &[HeaderName], listed: &[HeaderName]) -> bool {
    excluded.contains(name) || listed.contains(name)
}

/// Copy inbound request headers minus `excluded` and any header named in
/// `Connection`, split into transport and content headers
pub fn split_request_headers(headers: &HeaderMap, excluded: &[HeaderName]) -> ForwardHeaders {
    let listed = connection_options(headers);
    let mut out = ForwardHeaders::default();

    for (name, value) in headers.iter() {
        if is_excluded(name, excluded, &listed) {
            continue;
        }
        let target = if is_content_header(name) {
            &mut out.content
        } else {
            &mut out.transport
        };
        target.append(name.clone(), value.clone());
    }

    out
}

/// Copy upstream response headers minus `excluded` and any header named in
/// `Connection`
pub fn filter_headers(headers: &HeaderMap, excluded: &[HeaderName]) -> HeaderMap {
    let listed = connection_options(headers);
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        if !is_excluded(name, excluded, &listed) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}

/// Parse a declared `Content-Length`, ignoring malformed values
pub fn declared_content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

/// Whether the inbound body should be buffered and forwarded
///
/// A positive declared length always carries a body. Without a declared
/// length only POST, PUT and PATCH are assumed to have one.
pub fn should_forward_body(method: &Method, content_length: Option<u64>) -> bool {
    match content_length {
        Some(len) => len > 0,
        None => matches!(*method, Method::POST | Method::PUT | Method::PATCH),
    }
}
