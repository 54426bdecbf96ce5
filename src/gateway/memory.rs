use super::Gateway;
use crate::errors::GatewayError;
use crate::models::{
    Completion, LeaderboardEntry, Stats, SubmitOutcome, UserHandle, UserRecord,
};
use crate::stats::{day_number_at, streak_at};
use crate::storage::persist_data;
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{error, info};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRow {
    pub id: u64,
    pub email: String,
    pub name: String,
    pub first_completion_date: Option<NaiveDate>,
    /// Completion ids keyed by day; one entry per day at most.
    pub completions: BTreeMap<NaiveDate, u64>,
}

impl UserRow {
    fn completion_days(&self) -> BTreeSet<NaiveDate> {
        self.completions.keys().copied().collect()
    }

    fn total(&self) -> u32 {
        u32::try_from(self.completions.len()).unwrap_or(u32::MAX)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendData {
    next_user_id: u64,
    next_completion_id: u64,
    users: BTreeMap<u64, UserRow>,
}

impl BackendData {
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn user_by_email(&self, email: &str) -> Option<&UserRow> {
        self.users.values().find(|user| user.email == email)
    }

    fn user(&self, handle: &UserHandle) -> Result<&UserRow, GatewayError> {
        handle
            .as_str()
            .parse::<u64>()
            .ok()
            .and_then(|id| self.users.get(&id))
            .ok_or(GatewayError::NotFound)
    }

    fn ensure_user(&mut self, email: &str, name: &str) -> u64 {
        if let Some(user) = self.user_by_email(email) {
            return user.id;
        }
        self.next_user_id += 1;
        let id = self.next_user_id;
        self.users.insert(
            id,
            UserRow {
                id,
                email: email.to_string(),
                name: name.to_string(),
                first_completion_date: None,
                completions: BTreeMap::new(),
            },
        );
        id
    }
}

/// In-process backend with the same server-side rules as the hosted one.
///
/// Completions are unique per user and day, stats are derived from the stored
/// rows, and the leaderboard ranks users by total then streak. Writes are
/// snapshotted to `data_path` when one is set.
pub struct MemoryGateway {
    data: Mutex<BackendData>,
    data_path: Option<PathBuf>,
    pinned_today: Option<NaiveDate>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::from_data(BackendData::default())
    }

    pub fn from_data(data: BackendData) -> Self {
        Self {
            data: Mutex::new(data),
            data_path: None,
            pinned_today: None,
        }
    }

    pub fn persisted(data_path: PathBuf, data: BackendData) -> Self {
        Self {
            data_path: Some(data_path),
            ..Self::from_data(data)
        }
    }

    /// Fixes the backend's notion of "today" used for streaks.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.pinned_today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.pinned_today
            .unwrap_or_else(|| Local::now().date_naive())
    }

    async fn commit(&self, data: &mut BackendData, next: BackendData) -> Result<(), GatewayError> {
        if let Some(path) = &self.data_path {
            persist_data(path, &next).await.map_err(|err| {
                error!("failed to persist check-in data: {err}");
                GatewayError::Unavailable(err.to_string())
            })?;
        }
        *data = next;
        Ok(())
    }

    fn stats_for(&self, user: &UserRow, today: NaiveDate) -> Stats {
        Stats {
            current_streak: streak_at(today, &user.completion_days()),
            total_completions: user.total(),
            day_number: day_number_at(today, user.first_completion_date),
        }
    }
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn create_or_get_user(
        &self,
        email: &str,
        name: &str,
    ) -> Result<UserHandle, GatewayError> {
        let mut data = self.data.lock().await;
        if let Some(user) = data.user_by_email(email) {
            return Ok(UserHandle::new(user.id.to_string()));
        }

        let mut next = data.clone();
        let id = next.ensure_user(email, name);
        self.commit(&mut data, next).await?;
        info!(user_id = id, "created user");
        Ok(UserHandle::new(id.to_string()))
    }

    async fn find_completion(
        &self,
        user: &UserHandle,
        date: NaiveDate,
    ) -> Result<Option<Completion>, GatewayError> {
        let data = self.data.lock().await;
        let user = match data.user(user) {
            Ok(user) => user,
            Err(GatewayError::NotFound) => return Ok(None),
            Err(err) => return Err(err),
        };
        Ok(user.completions.get(&date).map(|id| Completion {
            id: serde_json::Value::from(*id),
        }))
    }

    async fn submit_completion(
        &self,
        email: &str,
        name: &str,
        date: NaiveDate,
    ) -> Result<SubmitOutcome, GatewayError> {
        let mut data = self.data.lock().await;
        let already_recorded = data
            .user_by_email(email)
            .is_some_and(|user| user.completions.contains_key(&date));
        if already_recorded {
            return Ok(SubmitOutcome::Duplicate);
        }

        let mut next = data.clone();
        let id = next.ensure_user(email, name);
        let completion_id = next.next_completion_id + 1;

        let Some(user) = next.users.get_mut(&id) else {
            return Err(GatewayError::NotFound);
        };
        user.completions.insert(date, completion_id);
        user.first_completion_date = Some(match user.first_completion_date {
            Some(first) => first.min(date),
            None => date,
        });
        let stats = self.stats_for(user, date);
        next.next_completion_id = completion_id;

        self.commit(&mut data, next).await?;
        info!(user_id = id, %date, "recorded completion");
        Ok(SubmitOutcome::Recorded(Some(stats)))
    }

    async fn compute_streak(&self, user: &UserHandle) -> Result<u32, GatewayError> {
        let data = self.data.lock().await;
        Ok(streak_at(self.today(), &data.user(user)?.completion_days()))
    }

    async fn compute_total(&self, user: &UserHandle) -> Result<u32, GatewayError> {
        let data = self.data.lock().await;
        Ok(data.user(user)?.total())
    }

    async fn fetch_user_record(&self, user: &UserHandle) -> Result<UserRecord, GatewayError> {
        let data = self.data.lock().await;
        Ok(UserRecord {
            first_completion_date: data.user(user)?.first_completion_date,
        })
    }

    async fn fetch_leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, GatewayError> {
        let today = self.today();
        let data = self.data.lock().await;
        let mut entries: Vec<LeaderboardEntry> = data
            .users
            .values()
            .filter(|user| !user.completions.is_empty())
            .map(|user| LeaderboardEntry {
                name: user.name.clone(),
                email: user.email.clone(),
                total_completions: user.total(),
                current_streak: streak_at(today, &user.completion_days()),
            })
            .collect();

        entries.sort_by(|a, b| {
            b.total_completions
                .cmp(&a.total_completions)
                .then(b.current_streak.cmp(&a.current_streak))
                .then_with(|| a.name.cmp(&b.name))
        });
        entries.truncate(limit);
        Ok(entries)
    }
}
