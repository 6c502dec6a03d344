//! Custom validation functions used by the config schema.

use lingo_common::LanguageCode;
use std::net::SocketAddr;
use validator::ValidationError;

/// Validate a language tag such as `en`, `ja` or `zh-TW`.
pub fn validate_language_code(code: &str) -> Result<(), ValidationError> {
    if code.is_empty() {
        return Err(ValidationError::new("empty_language_code"));
    }

    LanguageCode::parse(code)
        .map(|_| ())
        .map_err(|_| ValidationError::new("invalid_language_code"))
}

/// Validate a `host:port` socket address.
pub fn validate_socket_addr(addr: &str) -> Result<(), ValidationError> {
    if addr.is_empty() {
        return Err(ValidationError::new("empty_bind_address"));
    }

    addr.parse::<SocketAddr>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("invalid_bind_address"))
}

/// Validate an absolute `http` or `https` URL.
pub fn validate_http_url(raw: &str) -> Result<(), ValidationError> {
    match url::Url::parse(raw) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => Ok(()),
        Ok(_) => Err(ValidationError::new("unsupported_url_scheme")),
        Err(_) => Err(ValidationError::new("invalid_url")),
    }
}
