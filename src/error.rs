use axum::response::{IntoResponse, Redirect, Response};
use thiserror::Error;

use crate::flow::IssueState;

/// Failures that abort an issuance request. Generation and font failures are
/// recovered inside their components and never reach this type.
#[derive(Error, Debug)]
pub enum IssueError {
    #[error("issuance cap reached for this client")]
    Blocked,

    #[error("participant name is empty")]
    EmptyName,

    #[error("PDF assembly failed: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("issuance store error: {0}")]
    Store(#[from] std::io::Error),
}

impl IssueError {
    /// Where the issue flow settles when this error ends it.
    pub fn flow_state(&self) -> IssueState {
        let submitting = IssueState::Idle.begin();
        match self {
            IssueError::Blocked => submitting.blocked(),
            other => submitting.failed(&other.to_string()),
        }
    }
}

impl IntoResponse for IssueError {
    fn into_response(self) -> Response {
        if matches!(self, IssueError::Pdf(_) | IssueError::Store(_)) {
            tracing::error!("certificate delivery failed: {}", self);
        }
        let banner = self.flow_state().banner();
        Redirect::to(&format!("/?state={}", banner)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_and_delivery_map_to_distinct_banners() {
        assert_eq!(IssueError::Blocked.flow_state().banner(), "blocked");
        assert_eq!(IssueError::EmptyName.flow_state().banner(), "failed");
        let io = IssueError::Store(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert_eq!(io.flow_state().banner(), "failed");
    }
}
