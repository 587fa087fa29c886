// File: src/csrf.rs
// Purpose: Session-scoped CSRF tokens exposed to page templates

use crate::request_context::RenderContext;
use uuid::Uuid;

/// Default cookie carrying the token
pub const CSRF_COOKIE: &str = "folio_csrf";

/// A token for the current session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken {
    pub value: String,
    /// Freshly minted: the response must hand it to the client
    pub issued: bool,
}

/// Source of CSRF tokens
pub trait CsrfProvider: Send + Sync {
    /// Token for the session the request belongs to
    fn token(&self, ctx: &RenderContext) -> CsrfToken;

    /// `Set-Cookie` value persisting a newly issued token
    fn set_cookie(&self, token: &CsrfToken) -> Option<String>;
}

/// Double-submit cookie provider
///
/// Reuses a well-formed token from the request cookie, otherwise mints a
/// random UUID v4 and asks for it to be set.
#[derive(Debug, Clone)]
pub struct CookieCsrf {
    cookie_name: String,
}

impl CookieCsrf {
    pub fn new(cookie_name: impl Into<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
        }
    }
}

impl Default for CookieCsrf {
    fn default() -> Self {
        Self::new(CSRF_COOKIE)
    }
}

impl CsrfProvider for CookieCsrf {
    fn token(&self, ctx: &RenderContext) -> CsrfToken {
        match ctx.cookie(&self.cookie_name) {
            Some(value) if Uuid::parse_str(value).is_ok() => CsrfToken {
                value: value.to_string(),
                issued: false,
            },
            _ => CsrfToken {
                value: Uuid::new_v4().simple().to_string(),
                issued: true,
            },
        }
    }

    fn set_cookie(&self, token: &CsrfToken) -> Option<String> {
        token.issued.then(|| {
            format!(
                "{}={}; Path=/; HttpOnly; SameSite=Lax",
                self.cookie_name, token.value
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    #[test]
    fn test_issues_token_without_cookie() {
        let csrf = CookieCsrf::default();
        let token = csrf.token(&RenderContext::new(Method::GET, "/"));
        assert!(token.issued);
        assert_eq!(token.value.len(), 32);

        let cookie = csrf.set_cookie(&token).unwrap();
        assert!(cookie.starts_with(&format!("folio_csrf={}", token.value)));
    }

    #[test]
    fn test_reuses_valid_cookie() {
        let csrf = CookieCsrf::default();
        let existing = Uuid::new_v4().simple().to_string();
        let ctx = RenderContext::new(Method::GET, "/").with_cookie(CSRF_COOKIE, existing.clone());
        let token = csrf.token(&ctx);
        assert_eq!(token.value, existing);
        assert!(!token.issued);
        assert_eq!(csrf.set_cookie(&token), None);
    }

    #[test]
    fn test_replaces_malformed_cookie() {
        let csrf = CookieCsrf::default();
        let ctx = RenderContext::new(Method::GET, "/").with_cookie(CSRF_COOKIE, "<script>");
        let token = csrf.token(&ctx);
        assert!(token.issued);
        assert_ne!(token.value, "<script>");
    }
}
