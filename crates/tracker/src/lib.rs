//! Campaign view-count reconciliation: the periodic loop that refreshes
//! view counts for active campaigns and promotes them when their target
//! is reached.

pub mod health;
pub mod reconciler;
pub mod supervisor;

pub use health::{CircuitDecision, FetchHealth};
pub use reconciler::{Reconciler, TickSummary};
pub use supervisor::TrackerSupervisor;
