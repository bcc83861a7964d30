use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A view-growth campaign as stored in the campaign record store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    /// User-supplied URL of the promoted video. Resolved to a canonical
    /// video id on every tick; an unresolvable URL means the campaign is
    /// skipped, not failed.
    pub video_url: String,
    #[serde(default)]
    pub status: CampaignStatus,
    pub target_views: u64,
    /// Tracking baseline. Zero until the first successful fetch, after
    /// which it is never overwritten.
    #[serde(default)]
    pub starting_views: u64,
    /// Latest absolute view count observed for the video.
    #[serde(default)]
    pub current_views: u64,
    pub budget: f64,
    #[serde(default)]
    pub last_view_update: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// Views accrued since the tracking baseline. Clamped at zero: the
    /// provider offers no monotonicity guarantee, so a count below the
    /// baseline reads as no progress rather than negative progress.
    pub fn views_gained(&self) -> u64 {
        views_gained(self.current_views, self.starting_views)
    }
}

/// Views accrued since `starting`, never negative.
pub fn views_gained(current: u64, starting: u64) -> u64 {
    current.saturating_sub(starting)
}

/// Coarse campaign lifecycle. Only `Active` campaigns are eligible for
/// reconciliation, and the tracker's only transition is
/// `Active -> Completed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    #[default]
    Pending,
    Active,
    Completed,
    Cancelled,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Pending => "pending",
            CampaignStatus::Active => "active",
            CampaignStatus::Completed => "completed",
            CampaignStatus::Cancelled => "cancelled",
        }
    }
}

/// Keyed partial update written back to the record store after a
/// successful reconciliation pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViewUpdate {
    pub current_views: u64,
    pub starting_views: u64,
    pub status: CampaignStatus,
    pub last_view_update: DateTime<Utc>,
}

/// Result of a view-count fetch. The provider either yielded a measured
/// count or it did not; there is no fabricated middle ground.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Measured(u64),
    Unavailable,
}

impl FetchOutcome {
    pub fn measured(&self) -> Option<u64> {
        match self {
            FetchOutcome::Measured(n) => Some(*n),
            FetchOutcome::Unavailable => None,
        }
    }
}

/// Payload handed to the notification sink when a campaign reaches its
/// target. Emitted exactly once per `Active -> Completed` transition.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionNotice {
    pub campaign_id: Uuid,
    pub title: String,
    pub target_views: u64,
    pub views_gained: u64,
}
