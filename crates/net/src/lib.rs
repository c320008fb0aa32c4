#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for datalift
//!
//! This crate wraps reqwest with connection pooling, retry logic, and
//! bearer-token auth for the cloud JSON APIs and the record store.

mod client;

pub use client::{NetClient, NetConfig};

use datalift_errors::{Error, NetworkError};
use url::Url;

/// Check if a URL is accessible
///
/// # Errors
///
/// Returns an error if there are network issues preventing the request.
/// Note: This function returns `Ok(false)` for inaccessible URLs rather
/// than errors.
pub async fn check_url(client: &NetClient, url: &str) -> Result<bool, Error> {
    match client.get(url).await {
        Ok(response) => Ok(response.status().is_success()),
        Err(_) => Ok(false),
    }
}

/// Parse and validate a URL
///
/// # Errors
///
/// Returns an error if the URL string is malformed or invalid according to RFC 3986.
pub fn parse_url(url: &str) -> Result<Url, Error> {
    Url::parse(url).map_err(|e| NetworkError::InvalidUrl(e.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url() {
        assert!(parse_url("https://example.com").is_ok());
        assert!(parse_url("not a url").is_err());
    }
}
