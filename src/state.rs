use crate::gateway::Gateway;
use crate::leaderboard::Leaderboard;
use crate::orchestrator::Orchestrator;
use std::{sync::Arc, time::Duration};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub refresh_every: Duration,
}

impl AppState {
    pub fn new(gateway: Arc<dyn Gateway>, leaderboard: Arc<Leaderboard>, refresh_every: Duration) -> Self {
        Self {
            orchestrator: Arc::new(Orchestrator::new(gateway, leaderboard)),
            refresh_every,
        }
    }
}
