use serde_json::Value;

/// Why a single request spec failed. Never escalated past its own section.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoadFailure {
    #[error("{}", network_text(.status, .message))]
    Network { status: Option<u16>, message: String },
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("dependency failed")]
    Dependency { upstream: String },
    #[error("timeout")]
    Timeout,
}

fn network_text(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) if message.is_empty() => format!("request failed with status {code}"),
        Some(code) => format!("request failed with status {code}: {message}"),
        None => format!("request failed: {message}"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Network,
    Decode,
    Dependency,
    Timeout,
}

impl LoadFailure {
    pub fn network(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Network {
            status,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            LoadFailure::Network { .. } => FailureKind::Network,
            LoadFailure::Decode(_) => FailureKind::Decode,
            LoadFailure::Dependency { .. } => FailureKind::Dependency,
            LoadFailure::Timeout => FailureKind::Timeout,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            LoadFailure::Network { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    Pending,
    Success(Value),
    Failure(LoadFailure),
}

impl RequestOutcome {
    pub fn is_pending(&self) -> bool {
        matches!(self, RequestOutcome::Pending)
    }

    pub fn is_settled(&self) -> bool {
        !self.is_pending()
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, RequestOutcome::Failure(_))
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            RequestOutcome::Success(v) => Some(v),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&LoadFailure> {
        match self {
            RequestOutcome::Failure(f) => Some(f),
            _ => None,
        }
    }
}

impl From<Result<Value, LoadFailure>> for RequestOutcome {
    fn from(res: Result<Value, LoadFailure>) -> Self {
        match res {
            Ok(v) => RequestOutcome::Success(v),
            Err(e) => RequestOutcome::Failure(e),
        }
    }
}
