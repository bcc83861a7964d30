//! Campaign record store — the external collaborator that owns campaign
//! rows. The tracker only needs two operations: a filtered read of the
//! active set and a keyed partial update.

pub mod memory;
pub mod rest;

use async_trait::async_trait;
use uuid::Uuid;

use swishview_core::types::{Campaign, ViewUpdate};
use swishview_core::StoreError;

#[async_trait]
pub trait CampaignStore: Send + Sync {
    /// All campaigns currently eligible for reconciliation.
    async fn active_campaigns(&self) -> Result<Vec<Campaign>, StoreError>;

    /// Partial update of the tracker-owned fields, keyed by campaign id.
    async fn apply_view_update(&self, id: Uuid, update: ViewUpdate) -> Result<(), StoreError>;
}

pub use memory::MemoryStore;
pub use rest::RestStore;
