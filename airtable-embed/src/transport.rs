//! Fetching JSON responses from the Airtable API.

use std::time::Duration;

use log::{debug, trace};
use reqwest::{
    blocking::Client,
    header::{HeaderValue, AUTHORIZATION},
    StatusCode,
};
use serde_json::Value as JsonValue;

use crate::{Config, Error};

/// Used when a failed response does not say what went wrong.
pub const UNKNOWN_API_ERROR: &str = "Unknown API response error";

/// Turns a request path (relative to the configured base) into a decoded JSON
/// response.
pub trait Transport {
    fn get(&self, path: &str) -> Result<JsonValue, Error>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, path: &str) -> Result<JsonValue, Error> {
        (**self).get(path)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn get(&self, path: &str) -> Result<JsonValue, Error> {
        (**self).get(path)
    }
}

/// A blocking HTTP client for the Airtable REST API.
#[derive(Debug)]
pub struct AirtableClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl AirtableClient {
    /// Constructor.
    pub fn new(config: &Config) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::TransportFailure(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: format!(
                "{}/{}",
                config.endpoint.trim_end_matches('/'),
                config.base_id
            ),
            api_key: config.api_key.clone(),
        })
    }

    /// The full URL that the given request path resolves to.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

impl Transport for AirtableClient {
    fn get(&self, path: &str) -> Result<JsonValue, Error> {
        let url = self.url(path);
        debug!("GET {}", url);
        let mut auth = HeaderValue::try_from(format!("Bearer {}", self.api_key))
            .map_err(|e| Error::TransportFailure(format!("invalid API key characters: {}", e)))?;
        auth.set_sensitive(true);
        let response = self
            .client
            .get(url.as_str())
            .header(AUTHORIZATION, auth)
            .send()
            .map_err(|e| Error::TransportFailure(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| Error::TransportFailure(e.to_string()))?;
        trace!("Response ({}) from {}: {}", status, url, body);
        decode_response(status, &body)
    }
}

/// Interprets a raw API response.
///
/// Anything other than `200 OK` is a failure whose message comes from the
/// body's `error` object when there is one.
pub fn decode_response(status: StatusCode, body: &str) -> Result<JsonValue, Error> {
    let parsed = serde_json::from_str::<JsonValue>(body).ok();
    if status != StatusCode::OK {
        debug!("API request failed with status {}", status);
        return Err(Error::TransportFailure(api_error_message(parsed.as_ref())));
    }
    parsed.ok_or_else(|| Error::TransportFailure("undecodable API response".to_string()))
}

// Airtable reports errors either as `{"error": {"type": ..., "message": ...}}`
// or, for some 404s, as `{"error": "NOT_FOUND"}`.
fn api_error_message(body: Option<&JsonValue>) -> String {
    let error = body.and_then(|b| b.get("error"));
    error
        .and_then(|e| e.get("message"))
        .and_then(JsonValue::as_str)
        .or_else(|| error.and_then(JsonValue::as_str))
        .unwrap_or(UNKNOWN_API_ERROR)
        .to_string()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn successful_response_is_decoded() {
        let value = decode_response(StatusCode::OK, r#"{"id": "recA", "fields": {}}"#).unwrap();
        assert_eq!(value["id"], "recA");
    }

    #[test]
    fn error_message_is_extracted() {
        let err = decode_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"error": {"type": "INVALID_FILTER_BY_FORMULA", "message": "The formula is invalid"}}"#,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "The formula is invalid");

        let err = decode_response(StatusCode::NOT_FOUND, r#"{"error": "NOT_FOUND"}"#).unwrap_err();
        assert_eq!(err.to_string(), "NOT_FOUND");
    }

    #[test]
    fn failures_without_details_are_generic() {
        let err = decode_response(StatusCode::BAD_GATEWAY, "<html>oops</html>").unwrap_err();
        assert_eq!(err.to_string(), UNKNOWN_API_ERROR);
    }

    #[test]
    fn undecodable_success_is_a_failure() {
        assert!(matches!(
            decode_response(StatusCode::OK, "not json"),
            Err(Error::TransportFailure(_))
        ));
    }

    #[test]
    fn url_joins_endpoint_base_and_path() {
        let config = Config::new("appBase", "key").with_endpoint("http://localhost:9999/v0/");
        let client = AirtableClient::new(&config).unwrap();
        assert_eq!(
            client.url("tblA/recB"),
            "http://localhost:9999/v0/appBase/tblA/recB"
        );
    }
}
