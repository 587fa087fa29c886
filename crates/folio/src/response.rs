// File: src/response.rs
// Purpose: Rendered page responses and the fixed error documents

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Json, Response};
use maud::{html, Markup, DOCTYPE};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Header carrying the catalog version a response was served from
pub const CATALOG_VERSION_HEADER: &str = "x-folio-catalog";

/// JSON body of a partial response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub ok: bool,
    pub title: Option<String>,
    pub redirect: Option<String>,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageBody {
    /// Complete HTML document
    Document(String),
    /// Content fragment for client-side navigation
    Fragment(Envelope),
}

/// Outcome of a render, ready to go on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResponse {
    pub status: StatusCode,
    pub body: PageBody,
    /// Set for full-mode redirects
    pub location: Option<String>,
    pub catalog_version: u64,
    pub set_cookies: Vec<String>,
}

impl PageResponse {
    pub fn document(status: StatusCode, html: impl Into<String>) -> Self {
        Self {
            status,
            body: PageBody::Document(html.into()),
            location: None,
            catalog_version: 0,
            set_cookies: Vec::new(),
        }
    }

    pub fn fragment(status: StatusCode, envelope: Envelope) -> Self {
        Self {
            status,
            body: PageBody::Fragment(envelope),
            location: None,
            catalog_version: 0,
            set_cookies: Vec::new(),
        }
    }

    /// 303 to `location`, with an empty body
    pub fn see_other(location: impl Into<String>) -> Self {
        Self {
            location: Some(location.into()),
            ..Self::document(StatusCode::SEE_OTHER, String::new())
        }
    }

    pub fn with_catalog_version(mut self, version: u64) -> Self {
        self.catalog_version = version;
        self
    }

    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.set_cookies.push(cookie.into());
        self
    }

    /// Document HTML, or the fragment HTML for partial responses
    pub fn html(&self) -> &str {
        match &self.body {
            PageBody::Document(html) => html,
            PageBody::Fragment(envelope) => &envelope.html,
        }
    }

    pub fn envelope(&self) -> Option<&Envelope> {
        match &self.body {
            PageBody::Fragment(envelope) => Some(envelope),
            PageBody::Document(_) => None,
        }
    }
}

fn insert_header(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.append(name, value);
        }
        Err(e) => warn!(header = %name, error = %e, "dropping invalid response header"),
    }
}

/// Percent-encodes every byte that is not visible ASCII
///
/// Existing escapes pass through unchanged, so `/caf%C3%A9` and `/café`
/// produce the same header.
fn encode_location(location: &str) -> String {
    let mut encoded = String::with_capacity(location.len());
    for byte in location.bytes() {
        if byte.is_ascii_graphic() {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }
    encoded
}

impl IntoResponse for PageResponse {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        insert_header(
            &mut headers,
            HeaderName::from_static(CATALOG_VERSION_HEADER),
            &self.catalog_version.to_string(),
        );
        if let Some(location) = &self.location {
            insert_header(&mut headers, header::LOCATION, &encode_location(location));
        }
        for cookie in &self.set_cookies {
            insert_header(&mut headers, header::SET_COOKIE, cookie);
        }

        match self.body {
            PageBody::Document(html) => (self.status, headers, Html(html)).into_response(),
            PageBody::Fragment(envelope) => (self.status, headers, Json(envelope)).into_response(),
        }
    }
}

fn error_document(title: &str, heading: &str, message: &str) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (title) }
            }
            body {
                main {
                    h1 { (heading) }
                    p { (message) }
                    a href="/" { "Back to home" }
                }
            }
        }
    }
}

/// Generic 500 page; never carries error detail
pub fn internal_error_document() -> String {
    error_document(
        "Server error",
        "Something went wrong",
        "The page could not be rendered. Please try again later.",
    )
    .into_string()
}

/// Served when the configured not-found page is itself missing
pub fn fallback_not_found_document() -> String {
    error_document(
        "Not found",
        "Page not found",
        "The page you are looking for does not exist.",
    )
    .into_string()
}
