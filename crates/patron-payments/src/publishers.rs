//! Publisher service client: registration and custodial-address lookups.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use patron_types::{Publisher, PublisherStatus};

use crate::environment::EnvironmentConfig;
use crate::fetcher::{FetchOptions, UrlFetcher, UrlRequest};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublisherResponse {
    publisher_id: String,
    #[serde(default)]
    registered: bool,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    address: String,
}

/// Typed access to the publisher service.
#[derive(Clone)]
pub struct PublisherService {
    fetcher: Arc<dyn UrlFetcher>,
    config: EnvironmentConfig,
}

impl PublisherService {
    pub fn new(fetcher: Arc<dyn UrlFetcher>, config: EnvironmentConfig) -> Self {
        Self { fetcher, config }
    }

    /// Look up a batch of publishers. Ids the service does not know are
    /// absent from the result.
    pub async fn get_publishers(&self, ids: &[String]) -> HashMap<String, Publisher> {
        if ids.is_empty() {
            return HashMap::new();
        }

        let body = serde_json::json!({ "publisherIds": ids });
        let request =
            UrlRequest::post(self.config.publisher_url("/v1/publishers")).with_json(&body);
        let response = self.fetcher.fetch(request, FetchOptions::default()).await;
        if !response.succeeded() {
            tracing::error!(status = response.status_code, "publisher lookup failed");
            return HashMap::new();
        }

        let rows: Vec<PublisherResponse> = match response.read_body_json() {
            Some(rows) => rows,
            None => {
                tracing::error!("invalid publisher lookup response");
                return HashMap::new();
            }
        };

        rows.into_iter()
            .map(|row| {
                let status = row
                    .status
                    .and_then(|s| s.parse::<PublisherStatus>().ok())
                    .unwrap_or(PublisherStatus::NotVerified);
                (
                    row.publisher_id,
                    Publisher {
                        registered: row.registered,
                        status,
                        address: row.address,
                    },
                )
            })
            .collect()
    }

    /// Look up a single publisher.
    pub async fn get_publisher(&self, id: &str) -> Option<Publisher> {
        let mut publishers = self.get_publishers(&[id.to_string()]).await;
        publishers.remove(id)
    }
}
