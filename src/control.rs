use serde::Serialize;

/// Lifecycle of the check-in control for one page session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlState {
    #[default]
    Unknown,
    Ready,
    Locked,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    Resolved,
    ResolveFailed,
    IdentityMissing,
    AlreadyCompleted,
    /// A submission the backend stored or reported as a duplicate.
    Submitted,
    SubmitFailed,
}

impl ControlState {
    pub fn apply(self, event: ControlEvent) -> ControlState {
        use ControlEvent::*;
        use ControlState::*;

        match (self, event) {
            (Unknown, Resolved) => Ready,
            (Unknown, ResolveFailed | IdentityMissing) => Error,
            (Ready, AlreadyCompleted | Submitted) => Locked,
            (Ready, SubmitFailed) => Ready,
            (state, _) => state,
        }
    }

    pub fn can_submit(self) -> bool {
        self == ControlState::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_then_submit_locks() {
        let state = ControlState::Unknown
            .apply(ControlEvent::Resolved)
            .apply(ControlEvent::Submitted);
        assert_eq!(state, ControlState::Locked);
        assert!(!state.can_submit());
    }

    #[test]
    fn failed_submit_stays_ready() {
        let state = ControlState::Ready.apply(ControlEvent::SubmitFailed);
        assert_eq!(state, ControlState::Ready);
        assert!(state.can_submit());
    }

    #[test]
    fn terminal_states_absorb_events() {
        for event in [
            ControlEvent::Resolved,
            ControlEvent::Submitted,
            ControlEvent::SubmitFailed,
            ControlEvent::AlreadyCompleted,
        ] {
            assert_eq!(ControlState::Locked.apply(event), ControlState::Locked);
            assert_eq!(ControlState::Error.apply(event), ControlState::Error);
        }
    }

    #[test]
    fn submission_requires_resolution() {
        assert_eq!(
            ControlState::Unknown.apply(ControlEvent::Submitted),
            ControlState::Unknown
        );
        assert_eq!(
            ControlState::Unknown.apply(ControlEvent::IdentityMissing),
            ControlState::Error
        );
    }
}
