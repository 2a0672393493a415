use serde::{Deserialize, Serialize};

/// Longest response/error text persisted with a delivery record.
pub const MAX_RESPONSE_LEN: usize = 500;

/// The uniform report of a single send attempt.
///
/// `status_code` is the transport-level status when the attempt reached the
/// network, and 0 when it did not (misconfigured descriptor, serialization
/// or connection error, timeout). `response` carries the raw platform
/// response body or the error description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendOutcome {
    pub success: bool,
    pub status_code: i32,
    pub response: String,
}

impl SendOutcome {
    /// An attempt that never reached the network.
    pub fn failure(response: impl Into<String>) -> Self {
        Self {
            success: false,
            status_code: 0,
            response: response.into(),
        }
    }

    pub fn new(success: bool, status_code: i32, response: impl Into<String>) -> Self {
        Self {
            success,
            status_code,
            response: response.into(),
        }
    }
}

/// Bounds `text` to [`MAX_RESPONSE_LEN`] characters before persistence.
pub fn truncate_response(text: &str) -> String {
    if text.chars().count() <= MAX_RESPONSE_LEN {
        return text.to_string();
    }
    text.chars().take(MAX_RESPONSE_LEN).collect()
}

/// Per-destination entry of a dispatch response payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationOutcome {
    /// The destination's user-chosen name.
    pub platform: String,
    pub success: bool,
    pub status_code: i32,
}

/// Aggregated result of one dispatch call. Partial failure is expressed
/// here, never as an error: the list always holds one entry per attempted
/// destination, in a stable destination order.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    pub batch_id: String,
    pub results: Vec<DestinationOutcome>,
}

impl DispatchReport {
    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_response_is_untouched() {
        assert_eq!(truncate_response("ok"), "ok");
    }

    #[test]
    fn long_response_is_bounded() {
        let long = "x".repeat(2 * MAX_RESPONSE_LEN);
        assert_eq!(truncate_response(&long).len(), MAX_RESPONSE_LEN);
    }

    #[test]
    fn truncation_respects_multibyte_characters() {
        let long = "消".repeat(MAX_RESPONSE_LEN + 10);
        let truncated = truncate_response(&long);
        assert_eq!(truncated.chars().count(), MAX_RESPONSE_LEN);
        assert!(long.starts_with(&truncated));
    }

    #[test]
    fn failure_outcome_never_reached_network() {
        let outcome = SendOutcome::failure("connection refused");
        assert!(!outcome.success);
        assert_eq!(outcome.status_code, 0);
        assert_eq!(outcome.response, "connection refused");
    }
}
