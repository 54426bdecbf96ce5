pub mod app;
pub mod config;
pub mod control;
pub mod errors;
pub mod gateway;
pub mod handlers;
pub mod identity;
pub mod leaderboard;
pub mod models;
pub mod orchestrator;
pub mod stats;
pub mod storage;
pub mod ui;
pub mod state;
pub mod view;

pub use app::router;
pub use config::{BackendConfig, Config};
pub use gateway::{Gateway, MemoryGateway, PostgrestGateway};
pub use leaderboard::Leaderboard;
pub use orchestrator::{Orchestrator, Session, SubmissionResult};
pub use state::AppState;
pub use storage::load_data;
