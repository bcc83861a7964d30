//! REST-backed campaign store.
//!
//! Speaks the PostgREST wire shape of the hosted backend: filtered reads
//! as query parameters (`status=eq.active`) and keyed partial updates as
//! `PATCH` with an `id=eq.<uuid>` filter. Row-level security on the
//! backend scopes reads to the owning service role.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use tracing::debug;
use uuid::Uuid;

use swishview_core::config::StoreConfig;
use swishview_core::types::{Campaign, ViewUpdate};
use swishview_core::{StoreError, TrackerError, TrackerResult};

use crate::CampaignStore;

pub struct RestStore {
    client: Client,
    base_url: String,
}

impl RestStore {
    pub fn new(config: &StoreConfig) -> TrackerResult<Self> {
        let mut headers = HeaderMap::new();
        if !config.api_key.is_empty() {
            let key = HeaderValue::from_str(&config.api_key)
                .map_err(|e| TrackerError::Config(format!("invalid store api key: {e}")))?;
            let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .map_err(|e| TrackerError::Config(format!("invalid store api key: {e}")))?;
            headers.insert("apikey", key);
            headers.insert(AUTHORIZATION, bearer);
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .default_headers(headers)
            .build()
            .map_err(|e| TrackerError::Config(format!("failed to build store client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn campaigns_url(&self) -> String {
        format!("{}/campaigns", self.base_url)
    }
}

#[async_trait]
impl CampaignStore for RestStore {
    async fn active_campaigns(&self) -> Result<Vec<Campaign>, StoreError> {
        let response = self
            .client
            .get(self.campaigns_url())
            .query(&[("status", "eq.active"), ("select", "*")])
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::Request(format!(
                "active campaign read returned {}",
                response.status()
            )));
        }

        let campaigns: Vec<Campaign> = response
            .json()
            .await
            .map_err(|e| StoreError::Malformed(e.to_string()))?;

        debug!(count = campaigns.len(), "fetched active campaigns");
        Ok(campaigns)
    }

    async fn apply_view_update(&self, id: Uuid, update: ViewUpdate) -> Result<(), StoreError> {
        let response = self
            .client
            .patch(self.campaigns_url())
            .query(&[("id", format!("eq.{id}").as_str())])
            // return=representation lets us distinguish "no matching row"
            // from a successful write.
            .header("Prefer", "return=representation")
            .json(&update)
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::Request(format!(
                "view update for {id} returned {}",
                response.status()
            )));
        }

        let rows: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| StoreError::Malformed(e.to_string()))?;

        if rows.is_empty() {
            return Err(StoreError::NotFound(id));
        }

        debug!(campaign_id = %id, "view update persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use swishview_core::types::CampaignStatus;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(server: &MockServer) -> StoreConfig {
        StoreConfig {
            base_url: server.uri(),
            api_key: "service-role-key".to_string(),
            request_timeout_ms: 2_000,
        }
    }

    fn campaign_row(id: Uuid) -> serde_json::Value {
        json!({
            "id": id,
            "user_id": "user-9",
            "title": "Product Teaser",
            "video_url": "https://youtu.be/teaser01",
            "status": "active",
            "target_views": 2_000,
            "starting_views": 100,
            "current_views": 150,
            "budget": 99.0,
            "last_view_update": null,
            "created_at": "2025-05-01T12:00:00Z",
            "updated_at": "2025-05-02T08:30:00Z"
        })
    }

    #[tokio::test]
    async fn test_active_campaigns_read() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path("/campaigns"))
            .and(query_param("status", "eq.active"))
            .and(header("apikey", "service-role-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([campaign_row(id)])))
            .mount(&server)
            .await;

        let store = RestStore::new(&test_config(&server)).unwrap();
        let campaigns = store.active_campaigns().await.unwrap();
        assert_eq!(campaigns.len(), 1);
        assert_eq!(campaigns[0].id, id);
        assert_eq!(campaigns[0].status, CampaignStatus::Active);
        assert_eq!(campaigns[0].views_gained(), 50);
    }

    #[tokio::test]
    async fn test_apply_view_update_patches_row() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();
        Mock::given(method("PATCH"))
            .and(path("/campaigns"))
            .and(query_param("id", format!("eq.{id}")))
            .and(body_partial_json(json!({
                "current_views": 180,
                "starting_views": 100,
                "status": "active"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([campaign_row(id)])))
            .expect(1)
            .mount(&server)
            .await;

        let store = RestStore::new(&test_config(&server)).unwrap();
        store
            .apply_view_update(
                id,
                ViewUpdate {
                    current_views: 180,
                    starting_views: 100,
                    status: CampaignStatus::Active,
                    last_view_update: Utc::now(),
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_with_no_matching_row_is_not_found() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();
        Mock::given(method("PATCH"))
            .and(path("/campaigns"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let store = RestStore::new(&test_config(&server)).unwrap();
        let err = store
            .apply_view_update(
                id,
                ViewUpdate {
                    current_views: 1,
                    starting_views: 1,
                    status: CampaignStatus::Active,
                    last_view_update: Utc::now(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(found) if found == id));
    }

    #[tokio::test]
    async fn test_read_failure_is_request_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/campaigns"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let store = RestStore::new(&test_config(&server)).unwrap();
        let err = store.active_campaigns().await.unwrap_err();
        assert!(matches!(err, StoreError::Request(_)));
    }
}
