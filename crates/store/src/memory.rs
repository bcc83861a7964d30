//! In-memory campaign store backed by DashMap.
//!
//! Used by tests and local development. Production talks to the hosted
//! record store through [`crate::RestStore`]; this provides the same API
//! surface without the network.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tracing::info;
use uuid::Uuid;

use swishview_core::types::{Campaign, CampaignStatus, ViewUpdate};
use swishview_core::StoreError;

use crate::CampaignStore;

/// Thread-safe in-memory store for campaign rows.
#[derive(Default)]
pub struct MemoryStore {
    campaigns: DashMap<Uuid, Campaign>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            campaigns: DashMap::new(),
        }
    }

    pub fn insert_campaign(&self, campaign: Campaign) {
        self.campaigns.insert(campaign.id, campaign);
    }

    pub fn get_campaign(&self, id: Uuid) -> Option<Campaign> {
        self.campaigns.get(&id).map(|r| r.value().clone())
    }

    pub fn list_by_status(&self, status: CampaignStatus) -> Vec<Campaign> {
        let mut campaigns: Vec<Campaign> = self
            .campaigns
            .iter()
            .filter(|r| r.value().status == status)
            .map(|r| r.value().clone())
            .collect();
        campaigns.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        campaigns
    }

    pub fn len(&self) -> usize {
        self.campaigns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.campaigns.is_empty()
    }
}

#[async_trait]
impl CampaignStore for MemoryStore {
    async fn active_campaigns(&self) -> Result<Vec<Campaign>, StoreError> {
        Ok(self.list_by_status(CampaignStatus::Active))
    }

    async fn apply_view_update(&self, id: Uuid, update: ViewUpdate) -> Result<(), StoreError> {
        let mut entry = self.campaigns.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        let c = entry.value_mut();
        c.current_views = update.current_views;
        c.starting_views = update.starting_views;
        c.status = update.status;
        c.last_view_update = Some(update.last_view_update);
        c.updated_at = Utc::now();

        info!(
            campaign_id = %id,
            current_views = c.current_views,
            status = c.status.as_str(),
            "campaign view update applied"
        );
        Ok(())
    }
}
