//! Check-in orchestration.
//!
//! Sequences the backend calls behind one page: resolve the user, check
//! today's completion, load stats, and on request submit exactly one
//! completion. Read failures degrade to safe defaults; every path ends in a
//! view the page can render.

use crate::control::{ControlEvent, ControlState};
use crate::errors::{CheckinError, GatewayError, IdentityError};
use crate::gateway::Gateway;
use crate::identity::Identity;
use crate::leaderboard::Leaderboard;
use crate::models::{EntryParams, Stats, SubmitOutcome, UserHandle};
use crate::stats::day_number_at;
use crate::view::{
    ButtonView, CheckinView, Feedback, LeaderboardView, PageView, Welcome, ALREADY_COMPLETED_LABEL,
    ALREADY_COMPLETED_ON_LOAD, ALREADY_COMPLETED_ON_SUBMIT, COMPLETED_LABEL, LOAD_FAILED_WELCOME,
    MISSING_EMAIL_WELCOME, SUBMIT_FAILED, SUBMIT_SUCCEEDED, USER_MISSING,
};
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Per-page context: who is checking in, for which day, and where the
/// control stands. "Today" is fixed when the session is created.
#[derive(Debug, Clone)]
pub struct Session {
    pub identity: Identity,
    pub user: Option<UserHandle>,
    pub today: NaiveDate,
    pub control: ControlState,
}

impl Session {
    pub fn new(identity: Identity) -> Self {
        Self::at(identity, Local::now().date_naive())
    }

    pub fn at(identity: Identity, today: NaiveDate) -> Self {
        Self {
            identity,
            user: None,
            today,
            control: ControlState::Unknown,
        }
    }

    fn attach(&mut self, user: UserHandle) {
        self.user = Some(user);
        self.transition(ControlEvent::Resolved);
    }

    fn transition(&mut self, event: ControlEvent) {
        self.control = self.control.apply(event);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionResult {
    /// Stored; stats are the backend's fresh values when it returned any.
    Recorded(Option<Stats>),
    /// The backend already had a completion for this day.
    AlreadyCompleted,
    /// Transient write failure; the user may try again.
    Failed(String),
}

pub struct Orchestrator {
    gateway: Arc<dyn Gateway>,
    leaderboard: Arc<Leaderboard>,
}

impl Orchestrator {
    pub fn new(gateway: Arc<dyn Gateway>, leaderboard: Arc<Leaderboard>) -> Self {
        Self {
            gateway,
            leaderboard,
        }
    }

    pub fn gateway(&self) -> &Arc<dyn Gateway> {
        &self.gateway
    }

    pub fn leaderboard(&self) -> &Arc<Leaderboard> {
        &self.leaderboard
    }

    pub async fn resolve(&self, identity: &Identity) -> Result<UserHandle, CheckinError> {
        if identity.email.trim().is_empty() {
            return Err(IdentityError::MissingEmail.into());
        }
        self.gateway
            .create_or_get_user(&identity.email, &identity.name)
            .await
            .map_err(|err| {
                error!("failed to resolve user: {err}");
                CheckinError::BackendUnavailable(err)
            })
    }

    /// Any failure other than not-found reads as "not completed".
    pub async fn is_completed_today(&self, user: &UserHandle, today: NaiveDate) -> bool {
        match self.gateway.find_completion(user, today).await {
            Ok(found) => found.is_some(),
            Err(GatewayError::NotFound) => false,
            Err(err) => {
                warn!(%user, "failed to check today's completion: {err}");
                false
            }
        }
    }

    /// Loads streak, total and day number together; any failed read yields
    /// [`Stats::zero`].
    pub async fn load_stats(&self, user: &UserHandle, today: NaiveDate) -> Stats {
        let (streak, total, record) = tokio::join!(
            self.gateway.compute_streak(user),
            self.gateway.compute_total(user),
            self.gateway.fetch_user_record(user),
        );

        match (streak, total, record) {
            (Ok(current_streak), Ok(total_completions), Ok(record)) => Stats {
                current_streak,
                total_completions,
                day_number: day_number_at(today, record.first_completion_date),
            },
            (streak, total, record) => {
                let failure = [streak.err(), total.err(), record.err()]
                    .into_iter()
                    .flatten()
                    .next();
                if let Some(err) = failure {
                    warn!(%user, "failed to load stats: {err}");
                }
                Stats::zero()
            }
        }
    }

    /// Performs one completion write for the session's day.
    pub async fn submit_completion(&self, session: &mut Session) -> SubmissionResult {
        if session.control == ControlState::Locked {
            return SubmissionResult::AlreadyCompleted;
        }
        if !session.control.can_submit() || session.user.is_none() {
            return SubmissionResult::Failed(USER_MISSING.to_string());
        }

        let identity = &session.identity;
        let outcome = self
            .gateway
            .submit_completion(&identity.email, &identity.name, session.today)
            .await;

        match outcome {
            Ok(SubmitOutcome::Recorded(stats)) => {
                info!(date = %session.today, "completion recorded");
                session.transition(ControlEvent::Submitted);
                SubmissionResult::Recorded(stats)
            }
            Ok(SubmitOutcome::Duplicate) => {
                info!(date = %session.today, "completion already recorded");
                session.transition(ControlEvent::Submitted);
                SubmissionResult::AlreadyCompleted
            }
            Err(err) => {
                error!("failed to submit completion: {err}");
                session.transition(ControlEvent::SubmitFailed);
                SubmissionResult::Failed(err.to_string())
            }
        }
    }

    pub async fn load_page(&self, params: &EntryParams) -> PageView {
        let viewer = params.email.as_deref().map(str::trim);
        let leaderboard = self
            .leaderboard
            .refresh(self.gateway.as_ref())
            .await
            .render(viewer);

        let identity = match Identity::from_params(params) {
            Ok(identity) => identity,
            Err(err) => {
                warn!("page opened without identity: {err}");
                return PageView {
                    welcome: Welcome::warning(MISSING_EMAIL_WELCOME),
                    state: ControlState::Unknown.apply(ControlEvent::IdentityMissing),
                    stats: Stats::zero(),
                    button: ButtonView::disabled(),
                    feedback: None,
                    leaderboard,
                };
            }
        };

        let mut session = Session::new(identity);
        self.open(&mut session, leaderboard).await
    }

    /// Brings a fresh session to Ready or Locked (or Error) and describes it.
    pub async fn open(&self, session: &mut Session, leaderboard: LeaderboardView) -> PageView {
        let user = match self.resolve(&session.identity).await {
            Ok(user) => user,
            Err(_) => {
                session.transition(ControlEvent::ResolveFailed);
                return PageView {
                    welcome: Welcome::warning(LOAD_FAILED_WELCOME),
                    state: session.control,
                    stats: Stats::zero(),
                    button: ButtonView::disabled(),
                    feedback: None,
                    leaderboard,
                };
            }
        };
        session.attach(user.clone());

        let completed = self.is_completed_today(&user, session.today).await;
        let stats = self.load_stats(&user, session.today).await;

        let (button, feedback) = if completed {
            session.transition(ControlEvent::AlreadyCompleted);
            (
                ButtonView::locked(ALREADY_COMPLETED_LABEL),
                Some(Feedback::info(ALREADY_COMPLETED_ON_LOAD).persistent()),
            )
        } else {
            (ButtonView::ready(), None)
        };

        PageView {
            welcome: Welcome::greeting(&session.identity.name),
            state: session.control,
            stats,
            button,
            feedback,
            leaderboard,
        }
    }

    /// Handles one explicit check-in action from the page.
    pub async fn check_in(&self, params: &EntryParams) -> CheckinView {
        let identity = match Identity::from_params(params) {
            Ok(identity) => identity,
            Err(err) => {
                warn!("check-in without identity: {err}");
                return CheckinView {
                    state: ControlState::Error,
                    stats: None,
                    button: ButtonView::disabled(),
                    feedback: Feedback::error(USER_MISSING),
                    leaderboard: None,
                };
            }
        };

        let mut session = Session::new(identity);
        // The page only offers the action once it was Ready, so a failed
        // re-resolution is a failed submission rather than a dead session.
        match self.resolve(&session.identity).await {
            Ok(user) => session.attach(user),
            Err(err) => {
                return CheckinView {
                    state: ControlState::Ready,
                    stats: None,
                    button: ButtonView::ready(),
                    feedback: Feedback::error(SUBMIT_FAILED).with_detail(err.to_string()),
                    leaderboard: None,
                };
            }
        }

        self.finish_check_in(&mut session).await
    }

    pub async fn finish_check_in(&self, session: &mut Session) -> CheckinView {
        let viewer = session.identity.email.clone();
        match self.submit_completion(session).await {
            SubmissionResult::Recorded(stats) => {
                let leaderboard = self
                    .leaderboard
                    .refresh(self.gateway.as_ref())
                    .await
                    .render(Some(&viewer));
                CheckinView {
                    state: session.control,
                    stats,
                    button: ButtonView::locked(COMPLETED_LABEL),
                    feedback: Feedback::success(SUBMIT_SUCCEEDED),
                    leaderboard: Some(leaderboard),
                }
            }
            SubmissionResult::AlreadyCompleted => CheckinView {
                state: session.control,
                stats: None,
                button: ButtonView::locked(ALREADY_COMPLETED_LABEL),
                feedback: Feedback::info(ALREADY_COMPLETED_ON_SUBMIT),
                leaderboard: None,
            },
            SubmissionResult::Failed(detail) => CheckinView {
                state: session.control,
                stats: None,
                button: if session.control.can_submit() {
                    ButtonView::ready()
                } else {
                    ButtonView::disabled()
                },
                feedback: Feedback::error(SUBMIT_FAILED).with_detail(detail),
                leaderboard: None,
            },
        }
    }
}
