/// Explicit state for one issuance attempt, replacing the scattered
/// loading/error/success flags of the original form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueState {
    Idle,
    Submitting,
    Success { file_name: String },
    Blocked,
    Failed(String),
}

impl IssueState {
    pub fn begin(&self) -> IssueState {
        match self {
            IssueState::Idle | IssueState::Failed(_) | IssueState::Success { .. } => {
                IssueState::Submitting
            }
            other => other.clone(),
        }
    }

    pub fn blocked(&self) -> IssueState {
        IssueState::Blocked
    }

    pub fn failed(&self, reason: &str) -> IssueState {
        // Blocked is terminal for a client; a failure cannot un-block it.
        if matches!(self, IssueState::Blocked) {
            IssueState::Blocked
        } else {
            IssueState::Failed(reason.to_string())
        }
    }

    /// Banner code the index template switches on.
    pub fn banner(&self) -> &'static str {
        match self {
            IssueState::Idle => "",
            IssueState::Submitting => "submitting",
            IssueState::Success { .. } => "success",
            IssueState::Blocked => "blocked",
            IssueState::Failed(_) => "failed",
        }
    }

    pub fn from_query(code: &str) -> IssueState {
        match code {
            "success" => IssueState::Success {
                file_name: String::new(),
            },
            "blocked" => IssueState::Blocked,
            "failed" => IssueState::Failed("delivery".to_string()),
            _ => IssueState::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_begins_submitting() {
        assert_eq!(IssueState::Idle.begin(), IssueState::Submitting);
        let done = IssueState::Success {
            file_name: "Ali_Veli_Katilim_Belgesi.pdf".to_string(),
        };
        // a finished flow can start over
        assert_eq!(done.begin(), IssueState::Submitting);
    }

    #[test]
    fn blocked_is_terminal() {
        let s = IssueState::Idle.blocked();
        assert_eq!(s.begin(), IssueState::Blocked);
        assert_eq!(s.failed("network"), IssueState::Blocked);
    }

    #[test]
    fn failure_allows_retry() {
        let s = IssueState::Failed("delivery".to_string());
        assert_eq!(s.begin(), IssueState::Submitting);
    }

    #[test]
    fn banner_codes_round_trip() {
        for code in ["blocked", "failed", "success"] {
            assert_eq!(IssueState::from_query(code).banner(), code);
        }
        assert_eq!(IssueState::from_query("anything"), IssueState::Idle);
    }
}
