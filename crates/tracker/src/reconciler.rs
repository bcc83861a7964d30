//! Campaign reconciliation — one tick of the view-count refresh loop.
//!
//! Each tick reads the active set, fetches current view counts through a
//! bounded worker pool, seeds tracking baselines on first observation,
//! persists progress, and promotes campaigns that reached their target.
//! Failures never cross campaign boundaries: a campaign that cannot be
//! resolved, fetched, or written is skipped this tick and retried on the
//! next one.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use swishview_core::config::TrackerConfig;
use swishview_core::notify::NotificationSink;
use swishview_core::types::{
    views_gained, Campaign, CampaignStatus, CompletionNotice, FetchOutcome, ViewUpdate,
};
use swishview_store::CampaignStore;
use swishview_youtube::{extract_video_id, ViewSource};

use crate::health::{CircuitDecision, FetchHealth};

/// Aggregate result of one reconciliation tick.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickSummary {
    /// Distinct active campaigns observed this tick.
    pub active_seen: usize,
    pub updated: usize,
    pub completed: usize,
    pub skipped_unresolved: usize,
    pub skipped_unavailable: usize,
    pub skipped_circuit_open: usize,
    pub store_failures: usize,
    /// True when the active-set read itself failed and nothing ran.
    pub store_read_failed: bool,
}

impl TickSummary {
    /// Campaigns still active after this tick's completions.
    pub fn remaining_active(&self) -> usize {
        self.active_seen.saturating_sub(self.completed)
    }
}

/// Why a campaign was left untouched this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Skip {
    UnresolvedUrl,
    ProviderUnavailable,
    CircuitOpen,
}

enum PassOutcome {
    Updated { completed: bool },
    Skipped(Skip),
    StoreFailure,
}

pub struct Reconciler {
    store: Arc<dyn CampaignStore>,
    source: Arc<dyn ViewSource>,
    sink: Arc<dyn NotificationSink>,
    health: FetchHealth,
    max_concurrent_fetches: usize,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn CampaignStore>,
        source: Arc<dyn ViewSource>,
        sink: Arc<dyn NotificationSink>,
        config: &TrackerConfig,
    ) -> Self {
        Self {
            store,
            source,
            sink,
            health: FetchHealth::new(config.failure_threshold, config.probe_interval_ticks),
            max_concurrent_fetches: config.max_concurrent_fetches.max(1),
        }
    }

    /// Campaigns whose fetch circuit is currently open.
    pub fn degraded_campaigns(&self) -> Vec<uuid::Uuid> {
        self.health.degraded_campaigns()
    }

    /// Run one reconciliation tick over the active set.
    pub async fn run_tick(self: &Arc<Self>) -> TickSummary {
        let start = std::time::Instant::now();

        let campaigns = match self.store.active_campaigns().await {
            Ok(campaigns) => campaigns,
            Err(e) => {
                error!(error = %e, "failed to read active campaigns; skipping tick");
                return TickSummary {
                    store_read_failed: true,
                    ..TickSummary::default()
                };
            }
        };

        // A campaign id is never processed twice within one tick.
        let mut seen = HashSet::new();
        let campaigns: Vec<Campaign> = campaigns
            .into_iter()
            .filter(|c| seen.insert(c.id))
            .collect();
        self.health.prune(&seen);

        let mut summary = TickSummary {
            active_seen: campaigns.len(),
            ..TickSummary::default()
        };
        if campaigns.is_empty() {
            return summary;
        }

        debug!(count = campaigns.len(), "reconciling active campaigns");

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_fetches));
        let mut tasks = JoinSet::new();
        for campaign in campaigns {
            let reconciler = Arc::clone(self);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("fetch semaphore closed");
                reconciler.process_campaign(campaign).await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(PassOutcome::Updated { completed }) => {
                    summary.updated += 1;
                    if completed {
                        summary.completed += 1;
                    }
                }
                Ok(PassOutcome::Skipped(Skip::UnresolvedUrl)) => summary.skipped_unresolved += 1,
                Ok(PassOutcome::Skipped(Skip::ProviderUnavailable)) => {
                    summary.skipped_unavailable += 1
                }
                Ok(PassOutcome::Skipped(Skip::CircuitOpen)) => summary.skipped_circuit_open += 1,
                Ok(PassOutcome::StoreFailure) => summary.store_failures += 1,
                Err(e) => {
                    error!(error = %e, "campaign task panicked");
                    summary.store_failures += 1;
                }
            }
        }

        metrics::counter!("tracker.ticks").increment(1);
        metrics::counter!("tracker.campaigns_updated").increment(summary.updated as u64);
        metrics::counter!("tracker.campaigns_completed").increment(summary.completed as u64);
        metrics::histogram!("tracker.tick_duration_ms")
            .record(start.elapsed().as_millis() as f64);

        info!(
            active = summary.active_seen,
            updated = summary.updated,
            completed = summary.completed,
            skipped_unresolved = summary.skipped_unresolved,
            skipped_unavailable = summary.skipped_unavailable,
            skipped_circuit_open = summary.skipped_circuit_open,
            store_failures = summary.store_failures,
            "reconciliation tick finished"
        );

        summary
    }

    async fn process_campaign(&self, campaign: Campaign) -> PassOutcome {
        match self.health.check(campaign.id) {
            CircuitDecision::OpenSkip => {
                debug!(campaign_id = %campaign.id, "fetch circuit open; skipping");
                return PassOutcome::Skipped(Skip::CircuitOpen);
            }
            CircuitDecision::OpenProbe => {
                debug!(campaign_id = %campaign.id, "fetch circuit open; probing provider");
            }
            CircuitDecision::Closed => {}
        }

        let Some(video) = extract_video_id(&campaign.video_url) else {
            // Bad URL, not a provider problem: no error, no circuit change.
            debug!(
                campaign_id = %campaign.id,
                url = %campaign.video_url,
                "video URL did not resolve; skipping"
            );
            return PassOutcome::Skipped(Skip::UnresolvedUrl);
        };

        let current_views = match self.source.fetch_views(&video).await {
            FetchOutcome::Measured(views) => {
                self.health.record_success(campaign.id);
                views
            }
            FetchOutcome::Unavailable => {
                self.health.record_failure(campaign.id);
                debug!(campaign_id = %campaign.id, video = %video, "view count unavailable; skipping");
                return PassOutcome::Skipped(Skip::ProviderUnavailable);
            }
        };

        // First successful observation seeds the tracking baseline.
        let starting_views = if campaign.starting_views == 0 {
            debug!(
                campaign_id = %campaign.id,
                baseline = current_views,
                "seeding tracking baseline from first observation"
            );
            current_views
        } else {
            campaign.starting_views
        };

        let gained = views_gained(current_views, starting_views);
        let should_complete = gained >= campaign.target_views;
        let new_status = if should_complete {
            CampaignStatus::Completed
        } else {
            campaign.status
        };

        let update = ViewUpdate {
            current_views,
            starting_views,
            status: new_status,
            last_view_update: Utc::now(),
        };
        if let Err(e) = self.store.apply_view_update(campaign.id, update).await {
            error!(campaign_id = %campaign.id, error = %e, "failed to persist view update");
            return PassOutcome::StoreFailure;
        }

        debug!(
            campaign_id = %campaign.id,
            current_views,
            views_gained = gained,
            target_views = campaign.target_views,
            "campaign progress recorded"
        );

        if should_complete && campaign.status != CampaignStatus::Completed {
            self.sink.notify(CompletionNotice {
                campaign_id: campaign.id,
                title: campaign.title.clone(),
                target_views: campaign.target_views,
                views_gained: gained,
            });
        }

        PassOutcome::Updated {
            completed: should_complete,
        }
    }
}
