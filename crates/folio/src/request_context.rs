// File: src/request_context.rs
// Purpose: Per-request render context with query params, cookies and render mode

use crate::config::RoutingConfig;
use axum::http::{HeaderMap, Method, Uri};
use std::collections::HashMap;

/// Whether the client wants the whole document or just the content fragment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderMode {
    /// Initial load: page wrapped in its layout
    #[default]
    Full,
    /// Client-side navigation fetch: content fragment plus metadata
    Partial,
}

/// Request context handed to page templates
///
/// Built once per request and owned by that request's render.
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// HTTP method (GET, POST, ...)
    pub method: Method,

    /// Raw request path, before normalization
    pub path: String,

    /// Query parameters from URL (?key=value)
    pub query: QueryParams,

    /// Parsed cookies
    pub cookies: HashMap<String, String>,

    /// Session-scoped CSRF token, filled in by the pipeline
    pub csrf_token: Option<String>,

    pub mode: RenderMode,
}

impl RenderContext {
    /// A full-mode context with no query, cookies or token
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: QueryParams::default(),
            cookies: HashMap::new(),
            csrf_token: None,
            mode: RenderMode::Full,
        }
    }

    /// Build a context from the parts the HTTP layer hands over
    pub fn from_parts(
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        detection: &PartialDetection,
    ) -> Self {
        let query = uri.query().map(QueryParams::parse).unwrap_or_default();
        let mode = if detection.wants_partial(headers, &query) {
            RenderMode::Partial
        } else {
            RenderMode::Full
        };

        Self {
            method: method.clone(),
            path: uri.path().to_string(),
            query,
            cookies: parse_cookies(headers),
            csrf_token: None,
            mode,
        }
    }

    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    pub fn is_partial(&self) -> bool {
        self.mode == RenderMode::Partial
    }

    /// Get a cookie value
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }
}

/// Parse cookies from Cookie header
fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .get_all("cookie")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Query parameters from URL
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    params: HashMap<String, String>,
}

impl QueryParams {
    /// Parse a raw query string (`a=1&b=two%20words`)
    pub fn parse(raw: &str) -> Self {
        let params = raw
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
            .map(|(k, v)| (decode_component(k), decode_component(v)))
            .collect();
        Self { params }
    }

    /// Get a query parameter value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Get as HashMap
    pub fn as_map(&self) -> &HashMap<String, String> {
        &self.params
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .unwrap_or(spaced)
}

/// Decides whether a request is a partial navigation fetch
///
/// A request is partial when the configured header is present (and not
/// `false`/`0`), when it carries `HX-Request`, or when the configured query
/// parameter is `true` or `1`.
#[derive(Debug, Clone)]
pub struct PartialDetection {
    header: String,
    query: String,
}

impl PartialDetection {
    pub fn new(header: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            header: header.into().to_ascii_lowercase(),
            query: query.into(),
        }
    }

    pub fn wants_partial(&self, headers: &HeaderMap, query: &QueryParams) -> bool {
        let header_set = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map_or(false, |value| !matches!(value.trim(), "false" | "0"))
        };

        header_set(&self.header)
            || header_set("hx-request")
            || matches!(query.get(&self.query), Some("true" | "1"))
    }
}

impl Default for PartialDetection {
    fn default() -> Self {
        Self::from(&RoutingConfig::default())
    }
}

impl From<&RoutingConfig> for PartialDetection {
    fn from(routing: &RoutingConfig) -> Self {
        Self::new(routing.partial_header.as_str(), routing.partial_query.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use rstest::rstest;

    fn context(uri: &str, headers: &[(&'static str, &'static str)]) -> RenderContext {
        let mut map = HeaderMap::new();
        for &(name, value) in headers {
            map.insert(name, HeaderValue::from_static(value));
        }
        let uri: Uri = uri.parse().unwrap();
        RenderContext::from_parts(&Method::GET, &uri, &map, &PartialDetection::default())
    }

    #[rstest]
    #[case("/about", &[], RenderMode::Full)]
    #[case("/about?partial=true", &[], RenderMode::Partial)]
    #[case("/about?partial=1", &[], RenderMode::Partial)]
    #[case("/about?partial=no", &[], RenderMode::Full)]
    #[case("/about", &[("x-folio-partial", "true")], RenderMode::Partial)]
    #[case("/about", &[("x-folio-partial", "false")], RenderMode::Full)]
    #[case("/about", &[("hx-request", "true")], RenderMode::Partial)]
    fn test_partial_detection(
        #[case] uri: &str,
        #[case] headers: &[(&'static str, &'static str)],
        #[case] expected: RenderMode,
    ) {
        assert_eq!(context(uri, headers).mode, expected);
    }

    #[test]
    fn test_query_parsing() {
        let query = QueryParams::parse("q=hello+world&tag=r%26d&empty&=x");
        assert_eq!(query.get("q"), Some("hello world"));
        assert_eq!(query.get("tag"), Some("r&d"));
        assert_eq!(query.get("empty"), Some(""));
        assert_eq!(query.get(""), Some("x"));
    }

    #[test]
    fn test_cookies_and_path() {
        let ctx = context("/blog/x?page=2", &[("cookie", "a=1; folio_csrf=tok")]);
        assert_eq!(ctx.path, "/blog/x");
        assert_eq!(ctx.query.get("page"), Some("2"));
        assert_eq!(ctx.cookie("folio_csrf"), Some("tok"));
        assert_eq!(ctx.cookie("a"), Some("1"));
        assert!(ctx.csrf_token.is_none());
    }
}
