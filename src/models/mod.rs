// src/models/mod.rs

pub mod blog;
pub mod category;
pub mod comment;
pub mod profile;

use url::Url;
use validator::ValidationError;

/// Shared custom validator: the field must parse as an absolute http(s) URL.
pub(crate) fn validate_http_url(value: &str) -> Result<(), ValidationError> {
    match Url::parse(value) {
        Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => Ok(()),
        _ => Err(ValidationError::new("invalid_url")),
    }
}
