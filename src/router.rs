use {
    crate::metrics::bam as metrics,
    async_trait::async_trait,
    serde_json::Value,
    thiserror::Error,
    tracing::{info, warn},
};

/// How a failed attempt affects the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Another region may still accept the transaction
    RetryableElsewhere,
    /// The payload itself was rejected, no region will accept it
    FatalPayload,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct SubmissionFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl SubmissionFailure {
    pub fn retryable(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::RetryableElsewhere,
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::FatalPayload,
            message: message.into(),
        }
    }

    pub const fn is_fatal(&self) -> bool {
        matches!(self.kind, FailureKind::FatalPayload)
    }
}

/// One entry of the fallback chain: a region code with its resolved
/// submission endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTarget {
    pub code: String,
    pub endpoint: String,
}

/// Record of a single submission attempt, kept for the duration of one
/// submit call and returned with terminal errors for diagnostics.
#[derive(Debug, Clone)]
pub struct SubmissionAttempt {
    pub code: String,
    pub ordinal: usize,
    pub outcome: Result<Value, SubmissionFailure>,
}

#[derive(Debug, Clone)]
pub struct SubmissionResult {
    /// Region that accepted the transaction
    pub region: String,
    /// Opaque JSON-RPC result value
    pub value: Value,
    pub attempts: Vec<SubmissionAttempt>,
}

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("transaction rejected by {region}: {failure}")]
    FatalPayload {
        region: String,
        failure: SubmissionFailure,
        attempts: Vec<SubmissionAttempt>,
    },

    #[error("all regions exhausted after {} attempts", attempts.len())]
    AllRegionsExhausted { attempts: Vec<SubmissionAttempt> },
}

impl RouterError {
    pub fn attempts(&self) -> &[SubmissionAttempt] {
        match self {
            Self::FatalPayload { attempts, .. } => attempts,
            Self::AllRegionsExhausted { attempts } => attempts,
        }
    }
}

/// Transport seam: one submission attempt against one endpoint. The router
/// never retries inside an attempt, fallback happens only region to region.
#[async_trait]
pub trait SubmitTransaction {
    async fn submit(&self, endpoint: &str, payload: &[u8]) -> Result<Value, SubmissionFailure>;
}

/// Walks the fallback chain sequentially, one attempt in flight at a time:
/// fallback decisions depend on the outcome of the prior attempt.
pub struct SubmissionRouter<S> {
    submitter: S,
}

impl<S: SubmitTransaction + Sync> SubmissionRouter<S> {
    pub const fn new(submitter: S) -> Self {
        Self { submitter }
    }

    pub async fn submit(
        &self,
        payload: &[u8],
        order: &[RouteTarget],
        max_attempts: Option<usize>,
    ) -> Result<SubmissionResult, RouterError> {
        let budget = max_attempts
            .unwrap_or(order.len())
            .min(order.len());
        let mut attempts = Vec::with_capacity(budget);

        for (ordinal, target) in order.iter().take(budget).enumerate() {
            match self.submitter.submit(&target.endpoint, payload).await {
                Ok(value) => {
                    info!(region = target.code, ordinal, "transaction accepted");
                    metrics::incr_submit_attempt(&target.code, "accepted");
                    attempts.push(SubmissionAttempt {
                        code: target.code.clone(),
                        ordinal,
                        outcome: Ok(value.clone()),
                    });
                    return Ok(SubmissionResult {
                        region: target.code.clone(),
                        value,
                        attempts,
                    });
                }
                Err(failure) => {
                    warn!(
                        region = target.code,
                        ordinal,
                        kind = ?failure.kind,
                        "submission attempt failed: {failure}"
                    );
                    metrics::incr_submit_attempt(
                        &target.code,
                        match failure.kind {
                            FailureKind::RetryableElsewhere => "retryable",
                            FailureKind::FatalPayload => "fatal",
                        },
                    );
                    let fatal = failure.is_fatal();
                    attempts.push(SubmissionAttempt {
                        code: target.code.clone(),
                        ordinal,
                        outcome: Err(failure.clone()),
                    });
                    if fatal {
                        // Retrying the same bad payload elsewhere cannot succeed
                        return Err(RouterError::FatalPayload {
                            region: target.code.clone(),
                            failure,
                            attempts,
                        });
                    }
                }
            }
        }

        Err(RouterError::AllRegionsExhausted { attempts })
    }
}
