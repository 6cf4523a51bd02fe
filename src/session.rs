//! Cookie-carried session.
//!
//! After the external auth provider signs a user in, the UI posts the
//! user's email, role and display name to `/api/session/login`, and the
//! server answers with three plain cookies. Nothing here is signed; the
//! cookies only drive navigation, never authorization of writes.

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use serde::Serialize;
use url::form_urlencoded;

pub const EMAIL_COOKIE: &str = "email";
pub const ROLE_COOKIE: &str = "role";
pub const NAME_COOKIE: &str = "name";

const SESSION_COOKIES: [&str; 3] = [EMAIL_COOKIE, ROLE_COOKIE, NAME_COOKIE];

/// Session values read from a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Session {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut session = Session::default();
        for header in headers.get_all(COOKIE) {
            let Ok(raw) = header.to_str() else {
                continue;
            };
            for pair in raw.split(';') {
                let Some((key, value)) = pair.trim().split_once('=') else {
                    continue;
                };
                let value = decode(value.trim());
                if value.is_empty() {
                    continue;
                }
                match key.trim() {
                    EMAIL_COOKIE => session.email = Some(value),
                    ROLE_COOKIE => session.role = Some(value),
                    NAME_COOKIE => session.name = Some(value),
                    _ => {}
                }
            }
        }
        session
    }

    /// Both email and role must be present for the session to count.
    pub fn is_authenticated(&self) -> bool {
        self.email.is_some() && self.role.is_some()
    }
}

/// Attributes shared by every session cookie.
#[derive(Debug, Clone, Copy)]
pub struct CookiePolicy {
    pub max_age_secs: i64,
    pub secure: bool,
}

impl CookiePolicy {
    fn render(&self, name: &str, value: &str, max_age: i64) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; Max-Age={}; SameSite=Strict",
            name,
            encode(value),
            max_age
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// `Set-Cookie` headers that start a session.
    pub fn login_headers(&self, email: &str, role: &str, name: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (cookie, value) in SESSION_COOKIES.iter().zip([email, role, name]) {
            append(&mut headers, self.render(cookie, value, self.max_age_secs));
        }
        headers
    }

    /// `Set-Cookie` headers that expire every session cookie.
    pub fn logout_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for cookie in SESSION_COOKIES {
            append(&mut headers, self.render(cookie, "", 0));
        }
        headers
    }
}

fn append(headers: &mut HeaderMap, cookie: String) {
    // Encoded values and fixed attributes are always visible ASCII.
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        headers.append(SET_COOKIE, value);
    }
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn decode(value: &str) -> String {
    form_urlencoded::parse(value.as_bytes())
        .next()
        .map(|(k, v)| if v.is_empty() { k.into_owned() } else { format!("{}={}", k, v) })
        .unwrap_or_default()
}
