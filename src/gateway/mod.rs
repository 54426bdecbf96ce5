//! Backend access for the check-in flow.
//!
//! Everything the orchestrator knows about the hosted database goes through
//! [`Gateway`]. Implementations classify backend failures into
//! [`GatewayError`] and [`SubmitOutcome`] once, so callers never inspect raw
//! error payloads.

pub mod memory;
pub mod postgrest;

use crate::errors::GatewayError;
use crate::models::{Completion, LeaderboardEntry, SubmitOutcome, UserHandle, UserRecord};
use async_trait::async_trait;
use chrono::NaiveDate;

pub use memory::MemoryGateway;
pub use postgrest::PostgrestGateway;

#[async_trait]
pub trait Gateway: Send + Sync {
    async fn create_or_get_user(&self, email: &str, name: &str)
        -> Result<UserHandle, GatewayError>;

    /// `Ok(None)` when no completion exists for that user and day.
    async fn find_completion(
        &self,
        user: &UserHandle,
        date: NaiveDate,
    ) -> Result<Option<Completion>, GatewayError>;

    async fn submit_completion(
        &self,
        email: &str,
        name: &str,
        date: NaiveDate,
    ) -> Result<SubmitOutcome, GatewayError>;

    async fn compute_streak(&self, user: &UserHandle) -> Result<u32, GatewayError>;

    async fn compute_total(&self, user: &UserHandle) -> Result<u32, GatewayError>;

    async fn fetch_user_record(&self, user: &UserHandle) -> Result<UserRecord, GatewayError>;

    async fn fetch_leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, GatewayError>;
}
