use crate::errors::GatewayError;
use crate::gateway::Gateway;
use crate::models::LeaderboardEntry;
use crate::view::{
    LeaderboardRow, LeaderboardView, LEADERBOARD_EMPTY, LEADERBOARD_FAILED, LEADERBOARD_LOADING,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

pub const DEFAULT_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaderboardSnapshot {
    Pending,
    Entries(Vec<LeaderboardEntry>),
    Empty,
    Failed,
}

impl LeaderboardSnapshot {
    fn from_result(result: Result<Vec<LeaderboardEntry>, GatewayError>) -> Self {
        match result {
            Ok(entries) if entries.is_empty() => LeaderboardSnapshot::Empty,
            Ok(entries) => LeaderboardSnapshot::Entries(entries),
            Err(_) => LeaderboardSnapshot::Failed,
        }
    }

    pub fn render(&self, viewer_email: Option<&str>) -> LeaderboardView {
        match self {
            LeaderboardSnapshot::Pending => LeaderboardView::placeholder(LEADERBOARD_LOADING),
            LeaderboardSnapshot::Empty => LeaderboardView::placeholder(LEADERBOARD_EMPTY),
            LeaderboardSnapshot::Failed => LeaderboardView::placeholder(LEADERBOARD_FAILED),
            LeaderboardSnapshot::Entries(entries) => LeaderboardView {
                rows: entries
                    .iter()
                    .enumerate()
                    .map(|(index, entry)| LeaderboardRow {
                        rank: index + 1,
                        name: entry.name.clone(),
                        total_completions: entry.total_completions,
                        current_streak: entry.current_streak,
                        top3: index < 3,
                        is_viewer: viewer_email == Some(entry.email.as_str()),
                    })
                    .collect(),
                placeholder: None,
            },
        }
    }
}

struct Applied {
    ticket: u64,
    snapshot: LeaderboardSnapshot,
}

/// Latest top-N ranking shared by every page.
///
/// Each refresh draws a ticket before it calls the backend. A response is
/// applied only when its ticket is newer than the one already shown, so a slow
/// stale fetch cannot overwrite a fresher result.
pub struct Leaderboard {
    limit: usize,
    issued: AtomicU64,
    current: RwLock<Applied>,
}

impl Leaderboard {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            issued: AtomicU64::new(0),
            current: RwLock::new(Applied {
                ticket: 0,
                snapshot: LeaderboardSnapshot::Pending,
            }),
        }
    }

    pub fn ticket(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns whether the result replaced the current snapshot.
    pub async fn apply(
        &self,
        ticket: u64,
        result: Result<Vec<LeaderboardEntry>, GatewayError>,
    ) -> bool {
        let snapshot = LeaderboardSnapshot::from_result(result);
        let mut current = self.current.write().await;
        if ticket <= current.ticket {
            debug!(ticket, applied = current.ticket, "dropping stale leaderboard");
            return false;
        }
        current.ticket = ticket;
        current.snapshot = snapshot;
        true
    }

    pub async fn refresh(&self, gateway: &dyn Gateway) -> LeaderboardSnapshot {
        let ticket = self.ticket();
        let result = gateway.fetch_leaderboard(self.limit).await;
        if let Err(err) = &result {
            warn!("failed to load leaderboard: {err}");
        }
        self.apply(ticket, result).await;
        self.snapshot().await
    }

    pub async fn snapshot(&self) -> LeaderboardSnapshot {
        self.current.read().await.snapshot.clone()
    }

    /// Refreshes on a fixed period for the life of the process.
    ///
    /// The first refresh happens one period after the call.
    pub fn spawn_refresh_loop(
        self: Arc<Self>,
        gateway: Arc<dyn Gateway>,
        every: Duration,
    ) -> JoinHandle<()> {
        info!(every_secs = every.as_secs(), "starting leaderboard refresh loop");
        tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.refresh(gateway.as_ref()).await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MemoryGateway;
    use crate::models::{Completion, SubmitOutcome, UserHandle, UserRecord};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    fn entry(name: &str, total: u32) -> LeaderboardEntry {
        LeaderboardEntry {
            name: name.to_string(),
            email: format!("{}@x.com", name.to_lowercase()),
            total_completions: total,
            current_streak: 1,
        }
    }

    #[test]
    fn render_marks_top3_and_viewer() {
        let snapshot = LeaderboardSnapshot::Entries(vec![
            entry("Ann", 9),
            entry("Bob", 8),
            entry("Cy", 7),
            entry("Dee", 6),
        ]);
        let view = snapshot.render(Some("dee@x.com"));
        assert!(view.placeholder.is_none());
        assert_eq!(view.rows.len(), 4);
        assert_eq!(view.rows[0].rank, 1);
        assert!(view.rows[2].top3);
        assert!(!view.rows[3].top3);
        assert!(view.rows[3].is_viewer);
        assert_eq!(view.rows[3].display_name(), "Dee (You)");
        assert_eq!(view.rows[0].display_name(), "Ann");
    }

    #[test]
    fn empty_and_failed_render_placeholders() {
        let empty = LeaderboardSnapshot::Empty.render(None);
        assert!(empty.rows.is_empty());
        assert_eq!(empty.placeholder.as_deref(), Some(LEADERBOARD_EMPTY));

        let failed = LeaderboardSnapshot::Failed.render(None);
        assert_eq!(failed.placeholder.as_deref(), Some(LEADERBOARD_FAILED));
    }

    #[tokio::test]
    async fn stale_result_is_dropped() {
        let board = Leaderboard::new(DEFAULT_LIMIT);
        let older = board.ticket();
        let newer = board.ticket();

        assert!(board.apply(newer, Ok(vec![entry("Ann", 2)])).await);
        assert!(!board.apply(older, Err(GatewayError::NotFound)).await);
        assert_eq!(
            board.snapshot().await,
            LeaderboardSnapshot::Entries(vec![entry("Ann", 2)])
        );
    }

    #[tokio::test]
    async fn failure_replaces_stale_entries() {
        let board = Leaderboard::new(DEFAULT_LIMIT);
        let first = board.ticket();
        board.apply(first, Ok(vec![entry("Ann", 2)])).await;
        let second = board.ticket();
        board
            .apply(second, Err(GatewayError::Unavailable("down".into())))
            .await;
        assert_eq!(board.snapshot().await, LeaderboardSnapshot::Failed);
    }

    #[tokio::test]
    async fn refresh_reads_through_gateway() {
        let gateway = MemoryGateway::new();
        let board = Leaderboard::new(DEFAULT_LIMIT);
        assert_eq!(board.snapshot().await, LeaderboardSnapshot::Pending);
        assert_eq!(board.refresh(&gateway).await, LeaderboardSnapshot::Empty);
    }

    /// Holds its first leaderboard fetch until released; later fetches answer at once.
    struct SlowFirstFetch {
        calls: AtomicUsize,
        release: Notify,
    }

    #[async_trait]
    impl Gateway for SlowFirstFetch {
        async fn create_or_get_user(&self, _: &str, _: &str) -> Result<UserHandle, GatewayError> {
            unreachable!()
        }
        async fn find_completion(
            &self,
            _: &UserHandle,
            _: NaiveDate,
        ) -> Result<Option<Completion>, GatewayError> {
            unreachable!()
        }
        async fn submit_completion(
            &self,
            _: &str,
            _: &str,
            _: NaiveDate,
        ) -> Result<SubmitOutcome, GatewayError> {
            unreachable!()
        }
        async fn compute_streak(&self, _: &UserHandle) -> Result<u32, GatewayError> {
            unreachable!()
        }
        async fn compute_total(&self, _: &UserHandle) -> Result<u32, GatewayError> {
            unreachable!()
        }
        async fn fetch_user_record(&self, _: &UserHandle) -> Result<UserRecord, GatewayError> {
            unreachable!()
        }
        async fn fetch_leaderboard(&self, _: usize) -> Result<Vec<LeaderboardEntry>, GatewayError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                self.release.notified().await;
                Ok(vec![entry("Old", 1)])
            } else {
                Ok(vec![entry("New", 2)])
            }
        }
    }

    #[tokio::test]
    async fn late_response_never_overwrites_newer_one() {
        let gateway = Arc::new(SlowFirstFetch {
            calls: AtomicUsize::new(0),
            release: Notify::new(),
        });
        let board = Arc::new(Leaderboard::new(DEFAULT_LIMIT));

        let slow = {
            let board = Arc::clone(&board);
            let gateway = Arc::clone(&gateway);
            tokio::spawn(async move { board.refresh(gateway.as_ref()).await })
        };
        while gateway.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        board.refresh(gateway.as_ref()).await;
        gateway.release.notify_one();
        slow.await.unwrap();

        assert_eq!(
            board.snapshot().await,
            LeaderboardSnapshot::Entries(vec![entry("New", 2)])
        );
    }
}
