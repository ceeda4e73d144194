//! Session token generation/validation and the session cookie.
//!
//! A successful login mints an HS256-signed JWT asserting the single fixed
//! `admin` role, carried in an HttpOnly, Secure, SameSite=Lax cookie. There
//! is no server-side session table; validity is the signature plus `exp`.

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "admin_session";

/// The one role this system knows.
pub const ROLE_ADMIN: &str = "admin";

/// Claims embedded in every session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    /// The fixed role (`"admin"`).
    pub role: String,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
}

/// Mint a session token for the admin role.
pub fn issue_session_token(
    config: &SessionConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = SessionClaims {
        role: ROLE_ADMIN.to_string(),
        exp: now + config.ttl_hours * 3600,
        iat: now,
    };

    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Validate and decode a session token, returning the embedded claims.
///
/// Validates the signature and expiration automatically.
pub fn validate_session_token(
    token: &str,
    config: &SessionConfig,
) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
    let token_data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;
    Ok(token_data.claims)
}

/// `Set-Cookie` value establishing a session.
pub fn session_cookie(token: &str, ttl_hours: i64) -> String {
    format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age={}",
        ttl_hours * 3600
    )
}

/// `Set-Cookie` value clearing the session.
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age=0")
}

/// Pull the session token out of the `Cookie` header, if present.
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(COOKIE)?.to_str().ok()?;
    for pair in cookies.split(';') {
        let Some((name, value)) = pair.trim().split_once('=') else {
            continue;
        };
        if name == SESSION_COOKIE {
            return Some(value.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SessionConfig {
        SessionConfig {
            secret: "test-session-secret-long-enough".to_string(),
            ttl_hours: 24,
        }
    }

    #[test]
    fn issue_and_validate_round_trip() {
        let config = test_config();
        let token = issue_session_token(&config).expect("token generation should succeed");

        let claims = validate_session_token(&token, &config).expect("validation should succeed");
        assert_eq!(claims.role, ROLE_ADMIN);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_fails() {
        let token = issue_session_token(&test_config()).unwrap();
        let other = SessionConfig {
            secret: "another-secret".to_string(),
            ttl_hours: 24,
        };
        assert!(validate_session_token(&token, &other).is_err());
    }

    #[test]
    fn expired_token_fails() {
        let config = test_config();
        let now = chrono::Utc::now().timestamp();
        let claims = SessionClaims {
            role: ROLE_ADMIN.to_string(),
            exp: now - 300, // past the default 60-second leeway
            iat: now - 600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        assert!(validate_session_token(&token, &config).is_err());
    }

    #[test]
    fn cookie_flags_are_set() {
        let cookie = session_cookie("tok", 24);
        assert!(cookie.starts_with("admin_session=tok;"));
        for flag in ["HttpOnly", "Secure", "SameSite=Lax", "Max-Age=86400"] {
            assert!(cookie.contains(flag), "missing {flag}");
        }
        assert!(clear_session_cookie().contains("Max-Age=0"));
    }

    #[test]
    fn token_is_extracted_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            "theme=dark; admin_session=abc.def.ghi; other=1".parse().unwrap(),
        );
        assert_eq!(
            extract_session_token(&headers).as_deref(),
            Some("abc.def.ghi")
        );

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "theme=dark".parse().unwrap());
        assert_eq!(extract_session_token(&headers), None);
    }
}
