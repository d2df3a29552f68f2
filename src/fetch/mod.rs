mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::Result;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::Serialize;

/// Builds a `POST` request carrying `body` as JSON.
pub fn json_post(url: &str, body: &impl Serialize) -> Result<reqwest::Request> {
    let mut req = reqwest::Request::new(reqwest::Method::POST, url.parse()?);
    req.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    *req.body_mut() = Some(serde_json::to_vec(body)?.into());
    Ok(req)
}
