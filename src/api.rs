//! Admin API client for the coding-practice platform.
//!
//! Thin wrapper over the platform's `/admin/*` routes: list endpoints for
//! the four hierarchy levels, plus creation endpoints for notes, topics and
//! questions. The client attaches a bearer token when it has one but never
//! refreshes or negotiates credentials.

use crate::catalog::Catalog;
use crate::entity::{self, Entity, Level};
use reqwest::Client;
use std::time::Duration;

/// Validate an API base URL before building a client around it
fn is_valid_base_url(url_str: &str) -> bool {
    let parsed = match url::Url::parse(url_str) {
        Ok(u) => u,
        Err(_) => return false,
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }
    parsed.host_str().is_some()
}

pub struct AdminApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl AdminApi {
    /// Create a client for `base_url` (e.g. `http://localhost:5000/api`).
    /// A trailing slash is tolerated and stripped.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, String> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !is_valid_base_url(&base_url) {
            return Err(format!("Invalid API base URL: {}", base_url));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;
        Ok(AdminApi {
            client,
            base_url,
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    /// Fetch one level's entity list.
    pub async fn fetch_level(&self, level: Level) -> Result<Vec<Entity>, String> {
        let url = format!("{}/admin/{}", self.base_url, level.plural());
        let request = self
            .client
            .get(&url)
            .header("Accept", "application/json");
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| format!("HTTP request failed: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("API error {}: {}", status, body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| format!("Failed to read response: {}", e))?;
        entity::parse_list(level, &body)
    }

    /// Fetch every level concurrently and assemble a catalog. A level that
    /// fails just logs and comes back empty, so the caller always gets a
    /// usable (possibly partial) catalog.
    pub async fn load_catalog(&self, include_topics: bool) -> Catalog {
        let topics = async {
            if include_topics {
                self.fetch_level(Level::Topic).await
            } else {
                Ok(Vec::new())
            }
        };
        let (colleges, departments, batches, topics) = futures::join!(
            self.fetch_level(Level::College),
            self.fetch_level(Level::Department),
            self.fetch_level(Level::Batch),
            topics,
        );

        let mut catalog = Catalog::new();
        catalog.set_level(Level::College, or_empty(Level::College, colleges));
        catalog.set_level(Level::Department, or_empty(Level::Department, departments));
        catalog.set_level(Level::Batch, or_empty(Level::Batch, batches));
        catalog.set_level(Level::Topic, or_empty(Level::Topic, topics));
        catalog
    }

    /// POST a creation payload to `/admin/{kind}` ("notes", "topics",
    /// "questions"). Success is any 2xx; the body is not inspected.
    pub async fn create(&self, kind: &str, payload: &serde_json::Value) -> Result<(), String> {
        let url = format!("{}/admin/{}", self.base_url, kind);
        let request = self.client.post(&url).json(payload);
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| format!("HTTP request failed: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("API error {}: {}", status, body));
        }
        Ok(())
    }
}

fn or_empty(level: Level, result: Result<Vec<Entity>, String>) -> Vec<Entity> {
    match result {
        Ok(entities) => entities,
        Err(e) => {
            eprintln!("[AdminApi] Failed to load {}: {}", level.plural(), e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_base_urls() {
        assert!(is_valid_base_url("http://localhost:5000/api"));
        assert!(is_valid_base_url("https://practice.example.edu/api"));
        assert!(!is_valid_base_url("ftp://example.com/api"));
        assert!(!is_valid_base_url("not a url"));
        assert!(!is_valid_base_url(""));
    }

    #[test]
    fn test_new_strips_trailing_slash() {
        let api = AdminApi::new("http://localhost:5000/api/", None).unwrap();
        assert_eq!(api.base_url(), "http://localhost:5000/api");
    }

    #[test]
    fn test_new_rejects_bad_url() {
        assert!(AdminApi::new("localhost:5000", None).is_err());
        assert!(AdminApi::new("", Some("tok".to_string())).is_err());
    }
}
