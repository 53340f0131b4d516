//! Stateless HTTP request builder and response parser for the car inventory API.
//!
//! # Design
//! `InventoryClient` holds only a `base_url` and carries no mutable state
//! between calls. Each operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. The caller executes the actual HTTP round-trip.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{BulkOwnerUpdate, Car, CarDraft, UpdateDraft};

/// Synchronous, stateless client for the car inventory API.
#[derive(Debug, Clone)]
pub struct InventoryClient {
    base_url: String,
}

impl InventoryClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_list_cars(&self) -> HttpRequest {
        self.bare(HttpMethod::Get, "/findAllCars")
    }

    pub fn build_add_car(&self, draft: &CarDraft) -> Result<HttpRequest, ApiError> {
        self.json(HttpMethod::Post, "/addCar", draft)
    }

    /// Cars whose model year is more than five years old. The threshold lives
    /// on the server; the draft is sent along unchanged.
    pub fn build_find_older_than(&self, draft: &CarDraft) -> Result<HttpRequest, ApiError> {
        self.json(HttpMethod::Post, "/findByModel", draft)
    }

    pub fn build_update_by_id(&self, id: &str, overrides: &UpdateDraft) -> Result<HttpRequest, ApiError> {
        self.json(HttpMethod::Put, &format!("/updateById/{}", encode_segment(id)), overrides)
    }

    pub fn build_update_many(&self, input: &BulkOwnerUpdate) -> Result<HttpRequest, ApiError> {
        self.json(HttpMethod::Put, "/updateMultipleCars", input)
    }

    pub fn build_remove_by_id(&self, id: &str) -> HttpRequest {
        self.bare(HttpMethod::Delete, &format!("/removeById/{}", encode_segment(id)))
    }

    pub fn parse_list_cars(&self, response: HttpResponse) -> Result<Vec<Car>, ApiError> {
        check_status(&response)?;
        decode(&response.body)
    }

    /// Returns the created record when the server echoes one back. Any other
    /// success body is ignored.
    pub fn parse_add_car(&self, response: HttpResponse) -> Result<Option<Car>, ApiError> {
        check_status(&response)?;
        Ok(serde_json::from_str::<Car>(&response.body)
            .ok()
            .filter(|car| !car.id.is_empty()))
    }

    pub fn parse_find_older_than(&self, response: HttpResponse) -> Result<Vec<Car>, ApiError> {
        check_status(&response)?;
        decode(&response.body)
    }

    pub fn parse_update_by_id(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    /// A 404 here means no car matched the owner name.
    pub fn parse_update_many(&self, response: HttpResponse) -> Result<Vec<Car>, ApiError> {
        check_status(&response)?;
        decode(&response.body)
    }

    pub fn parse_remove_by_id(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    fn bare(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    fn json<T: Serialize>(&self, method: HttpMethod, path: &str, input: &T) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }
}

/// Percent-encode `raw` for use as one path segment. Only RFC 3986 unreserved
/// bytes pass through, so an id can never reach another route.
fn encode_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
