//! Minimal cookie reading and `Set-Cookie` building.

use axum::http::{header, HeaderMap, HeaderValue};

/// Value of the first cookie called `name` in the request's `Cookie` headers.
pub fn read(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_string())
}

#[derive(Debug, Clone)]
pub struct SetCookie<'a> {
    name: &'a str,
    value: &'a str,
    max_age: i64,
    secure: bool,
}

impl<'a> SetCookie<'a> {
    /// An HTTP-only, path-wide, `SameSite=Lax` cookie.
    pub fn new(name: &'a str, value: &'a str, max_age: i64, secure: bool) -> Self {
        Self {
            name,
            value,
            max_age,
            secure,
        }
    }

    /// Expires `name` immediately.
    pub fn removal(name: &'a str, secure: bool) -> Self {
        Self::new(name, "", 0, secure)
    }

    pub fn to_header(&self) -> Option<HeaderValue> {
        let mut cookie = format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
            self.name, self.value, self.max_age
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie).ok()
    }
}
