//! Session identity carried in a signed cookie.

use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use pdf_chat_core::SessionId;
use sha2::{Digest, Sha512};

pub const SESSION_COOKIE: &str = "pdf_chat_session";

/// Derives the 64-byte cookie signing key from an arbitrary-length secret.
pub fn cookie_key(secret: &str) -> anyhow::Result<Key> {
    if secret.trim().is_empty() {
        anyhow::bail!("session secret key is empty");
    }
    let digest = Sha512::digest(secret.as_bytes());
    Ok(Key::from(digest.as_slice()))
}

/// The session this request belongs to, if its cookie is present and intact.
pub fn current_session(jar: &SignedCookieJar) -> Option<SessionId> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| cookie.value().parse().ok())
}

/// Returns the caller's session, minting one when the cookie is missing.
pub fn ensure_session(jar: SignedCookieJar) -> (SignedCookieJar, SessionId) {
    if let Some(session) = current_session(&jar) {
        return (jar, session);
    }

    let session = SessionId::new();
    let cookie = Cookie::build((SESSION_COOKIE, session.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    (jar.add(cookie), session)
}

pub fn clear_session(jar: SignedCookieJar) -> SignedCookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}
