//! Shared API state

use std::sync::Arc;
use tokio::sync::Mutex;

use meshgate_overlay::{KeyManager, OverlayOrchestrator, SubnetPool};
use meshgate_registry::TokenManager;

/// State shared across all handlers
///
/// The subnet pool sits behind one coarse lock; every pool mutation goes
/// through it, which keeps the conservation invariant simple to reason
/// about under concurrent requests.
#[derive(Clone)]
pub struct ApiState {
    pub pool: Arc<Mutex<SubnetPool>>,
    pub orchestrator: Arc<OverlayOrchestrator>,
    pub keys: Arc<KeyManager>,
    /// Absent when the deployment runs without an identity provider
    pub tokens: Option<Arc<TokenManager>>,
}
