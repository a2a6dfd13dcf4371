//! Classification of provider failures as retryable vs. fatal. Matches on
//! stable substrings rather than provider-specific error types, since the
//! engine is deliberately provider-agnostic.

const RETRYABLE_SUBSTRINGS: [&str; 8] = [
    "503",
    "overloaded",
    "temporarily",
    "unavailable",
    "rate limit",
    "quota",
    "timeout",
    "timed out",
];

/// Whether a provider failure message describes a condition worth retrying
/// (vs. one that will just fail again, like an auth error or a malformed
/// request).
pub fn is_retryable(message: &str) -> bool {
    let lowered = message.to_lowercase();
    RETRYABLE_SUBSTRINGS.iter().any(|needle| lowered.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_retryable_substrings_case_insensitively() {
        assert!(is_retryable("503 Service Unavailable"));
        assert!(is_retryable("Model is OVERLOADED, try again"));
        assert!(is_retryable("request timed out after 30s"));
        assert!(is_retryable("Rate limit exceeded"));
    }

    #[test]
    fn fatal_errors_are_not_retryable() {
        assert!(!is_retryable("invalid api key"));
        assert!(!is_retryable("400 bad request: malformed json"));
    }
}
