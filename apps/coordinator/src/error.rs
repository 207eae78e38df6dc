use thiserror::Error;

use crate::domain::DecisionKind;
use crate::errors::{DomainError, ErrorCode};
use crate::session::state::SessionState;

/// Errors returned by the session coordinator to replicas and operators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    /// The game engine rejected the request. `eligible` lists the decision
    /// kinds the requester could have submitted instead.
    #[error("Validation error: {detail}")]
    Validation {
        code: ErrorCode,
        detail: String,
        eligible: Vec<DecisionKind>,
    },
    /// The request is not valid in the session's current state.
    #[error("Protocol state error ({state}): {detail}")]
    ProtocolState {
        code: ErrorCode,
        state: SessionState,
        detail: String,
    },
    #[error("Ack {ack_id} from {acker} timed out")]
    AckTimeout { ack_id: String, acker: String },
    #[error("Unknown identity: {identity}")]
    UnknownIdentity { identity: String },
    #[error("Link error to {target}: {detail}")]
    Link { target: String, detail: String },
    #[error("Configuration error: {detail}")]
    Config { detail: String },
}

impl CoordinatorError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { code, .. } => *code,
            Self::ProtocolState { code, .. } => *code,
            Self::AckTimeout { .. } => ErrorCode::AckTimeout,
            Self::UnknownIdentity { .. } => ErrorCode::UnknownIdentity,
            Self::Link { .. } => ErrorCode::LinkError,
            Self::Config { .. } => ErrorCode::ConfigError,
        }
    }

    pub fn detail(&self) -> String {
        match self {
            Self::Validation { detail, .. } => detail.clone(),
            Self::ProtocolState { detail, .. } => detail.clone(),
            Self::Link { detail, .. } => detail.clone(),
            Self::Config { detail } => detail.clone(),
            other => other.to_string(),
        }
    }

    /// Decision kinds the rejected requester may submit. Empty unless the
    /// rejection came from decision validation.
    pub fn eligible(&self) -> &[DecisionKind] {
        match self {
            Self::Validation { eligible, .. } => eligible,
            _ => &[],
        }
    }

    /// Engine rejection annotated with what the player may do instead.
    pub fn rejected(err: DomainError, eligible: Vec<DecisionKind>) -> Self {
        Self::Validation {
            code: ErrorCode::from(&err),
            detail: err.detail().to_string(),
            eligible,
        }
    }

    pub fn protocol(state: SessionState, detail: impl Into<String>) -> Self {
        Self::ProtocolState {
            code: ErrorCode::ProtocolState,
            state,
            detail: detail.into(),
        }
    }

    pub fn stale_counter(state: SessionState, expected: u64, got: u64) -> Self {
        Self::ProtocolState {
            code: ErrorCode::StaleDecisionCounter,
            state,
            detail: format!("Decision counter {got} does not match current round {expected}"),
        }
    }

    pub fn stalled(state: SessionState) -> Self {
        Self::ProtocolState {
            code: ErrorCode::SessionStalled,
            state,
            detail: "Session stalled after an ack timeout; restart required".to_string(),
        }
    }

    pub fn closed(state: SessionState) -> Self {
        Self::ProtocolState {
            code: ErrorCode::SessionClosed,
            state,
            detail: "Session has been shut down".to_string(),
        }
    }

    pub fn ack_timeout(ack_id: impl Into<String>, acker: impl Into<String>) -> Self {
        Self::AckTimeout {
            ack_id: ack_id.into(),
            acker: acker.into(),
        }
    }

    pub fn unknown_identity(identity: impl Into<String>) -> Self {
        Self::UnknownIdentity {
            identity: identity.into(),
        }
    }

    pub fn link(target: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Link {
            target: target.into(),
            detail: detail.into(),
        }
    }

    pub fn config(detail: impl Into<String>) -> Self {
        Self::Config {
            detail: detail.into(),
        }
    }

    /// Whether a replica should retry the same request later. Protocol state
    /// rejections mean "not yet", except for stalled or closed sessions.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProtocolState {
                code: ErrorCode::ProtocolState,
                ..
            }
        )
    }
}

impl From<DomainError> for CoordinatorError {
    fn from(err: DomainError) -> Self {
        Self::rejected(err, Vec::new())
    }
}
