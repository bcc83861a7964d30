//! Per-campaign fetch health and circuit breaking.
//!
//! A campaign whose fetches keep failing stops being retried every tick;
//! while its circuit is open the provider is only probed periodically. A
//! single success closes the circuit again. Without this, a total
//! provider outage is invisible: every tick silently skips and nothing
//! ever surfaces as degraded.

use dashmap::DashMap;
use std::collections::HashSet;
use tracing::{info, warn};
use uuid::Uuid;

/// What the reconciler should do with a campaign this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitDecision {
    /// Circuit closed; fetch normally.
    Closed,
    /// Circuit open; skip without touching the provider.
    OpenSkip,
    /// Circuit open, but this tick is a scheduled probe.
    OpenProbe,
}

#[derive(Debug, Default, Clone, Copy)]
struct CampaignHealth {
    consecutive_failures: u32,
    ticks_since_open: u32,
}

/// Tracks consecutive fetch failures per campaign.
pub struct FetchHealth {
    failure_threshold: u32,
    probe_interval_ticks: u32,
    states: DashMap<Uuid, CampaignHealth>,
}

impl FetchHealth {
    pub fn new(failure_threshold: u32, probe_interval_ticks: u32) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            probe_interval_ticks: probe_interval_ticks.max(1),
            states: DashMap::new(),
        }
    }

    /// Decide whether the campaign's fetch should run this tick. Called
    /// once per campaign per tick; open circuits advance their probe
    /// clock here.
    pub fn check(&self, id: Uuid) -> CircuitDecision {
        let mut entry = self.states.entry(id).or_default();
        if entry.consecutive_failures < self.failure_threshold {
            return CircuitDecision::Closed;
        }

        entry.ticks_since_open += 1;
        if entry.ticks_since_open % self.probe_interval_ticks == 0 {
            CircuitDecision::OpenProbe
        } else {
            CircuitDecision::OpenSkip
        }
    }

    pub fn record_failure(&self, id: Uuid) {
        let mut entry = self.states.entry(id).or_default();
        entry.consecutive_failures += 1;
        if entry.consecutive_failures == self.failure_threshold {
            warn!(
                campaign_id = %id,
                failures = entry.consecutive_failures,
                "fetch circuit opened; campaign is degraded"
            );
        }
    }

    pub fn record_success(&self, id: Uuid) {
        if let Some((_, state)) = self.states.remove(&id) {
            if state.consecutive_failures >= self.failure_threshold {
                info!(campaign_id = %id, "fetch circuit closed after successful probe");
            }
        }
    }

    /// Campaigns currently in the degraded (open-circuit) state.
    pub fn degraded_campaigns(&self) -> Vec<Uuid> {
        self.states
            .iter()
            .filter(|e| e.value().consecutive_failures >= self.failure_threshold)
            .map(|e| *e.key())
            .collect()
    }

    /// Drop state for campaigns no longer in the working set.
    pub fn prune(&self, known: &HashSet<Uuid>) {
        self.states.retain(|id, _| known.contains(id));
    }
}
