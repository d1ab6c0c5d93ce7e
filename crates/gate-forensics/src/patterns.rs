//! Critical-error vocabulary.
//!
//! Matching is a case-insensitive substring test. The list is policy, not
//! contract: it can be replaced through `FORENSICS_CRITICAL_PATTERNS`.

/// Default phrases that mark a failure as worth escalating.
pub const DEFAULT_PATTERNS: &[&str] = &[
    "circuit breaker is open",
    "service unavailable",
    "authentication failed",
    "timed out",
    "timeout",
    "connection refused",
    "connection failed",
    "error sending request",
];

/// Set of lowercase phrases matched against failure text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriticalPatterns {
    patterns: Vec<String>,
}

impl Default for CriticalPatterns {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERNS.iter().copied())
    }
}

impl CriticalPatterns {
    /// Build from arbitrary phrases; blanks are dropped.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Parse a comma-separated list. Empty input yields the defaults.
    pub fn parse(list: &str) -> Self {
        let parsed = Self::new(list.split(','));
        if parsed.patterns.is_empty() {
            Self::default()
        } else {
            parsed
        }
    }

    /// First pattern found in `text`, if any.
    pub fn find_match(&self, text: &str) -> Option<&str> {
        let haystack = text.to_lowercase();
        self.patterns
            .iter()
            .find(|p| haystack.contains(p.as_str()))
            .map(String::as_str)
    }

    pub fn is_critical(&self, text: &str) -> bool {
        self.find_match(text).is_some()
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_vocabulary_matches_gateway_errors() {
        let patterns = CriticalPatterns::default();
        assert!(patterns.is_critical("Circuit breaker is open for trust-guard"));
        assert!(patterns.is_critical("Service unavailable: HTTP 503: down"));
        assert!(patterns.is_critical("Authentication failed: HTTP 401"));
        assert!(patterns.is_critical("Request timed out after 3000 ms"));
        assert!(patterns.is_critical("Connection failed: tcp connect error"));
    }

    #[test]
    fn test_non_critical_text() {
        let patterns = CriticalPatterns::default();
        assert!(!patterns.is_critical("Validation error: missing required field 'content'"));
        assert!(!patterns.is_critical("Backend rejected request: HTTP 422: bad shape"));
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let patterns = CriticalPatterns::new(["Backend Unavailable"]);
        assert_eq!(
            patterns.find_match("BACKEND UNAVAILABLE since 10:00"),
            Some("backend unavailable")
        );
    }

    #[test]
    fn test_parse_list() {
        let patterns = CriticalPatterns::parse(" quota exceeded , ,disk full");
        assert_eq!(patterns.patterns(), ["quota exceeded", "disk full"]);
    }

    #[test]
    fn test_parse_empty_falls_back_to_defaults() {
        assert_eq!(CriticalPatterns::parse(" , "), CriticalPatterns::default());
    }
}
