//! One-shot user messages carried across a redirect in a cookie.
//!
//! The cookie value is the hex encoding of the messages joined by `\n`, which
//! keeps it within the cookie-octet alphabet whatever the message text is.

use axum::http::header::{COOKIE, LOCATION, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

pub const FLASH_COOKIE: &str = "courtfetch_flash";

/// Messages currently pending in the request's cookie.
pub fn pending(headers: &HeaderMap) -> Vec<String> {
    let Some(raw) = cookie_value(headers, FLASH_COOKIE) else {
        return Vec::new();
    };
    let Ok(bytes) = hex::decode(raw) else {
        return Vec::new();
    };
    String::from_utf8_lossy(&bytes)
        .split('\n')
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}

/// 303 to `to`, appending `message` to any flashes not yet shown.
pub fn redirect_with(headers: &HeaderMap, to: &str, message: &str) -> Response {
    let mut messages = pending(headers);
    messages.push(message.replace('\n', " "));
    let value = format!(
        "{FLASH_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
        hex::encode(messages.join("\n"))
    );

    let mut resp = StatusCode::SEE_OTHER.into_response();
    let h = resp.headers_mut();
    if let Ok(loc) = HeaderValue::from_str(to) {
        h.insert(LOCATION, loc);
    }
    if let Ok(cookie) = HeaderValue::from_str(&value) {
        h.insert(SET_COOKIE, cookie);
    }
    resp
}

pub fn clear_cookie() -> HeaderValue {
    HeaderValue::from_static("courtfetch_flash=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
}
