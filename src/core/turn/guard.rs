//! Blocked-terms guard applied to caller utterances before generation.

/// Matches caller utterances against a list of blocked terms.
///
/// Terms match whole words, case-insensitively. A multi-word term matches a
/// run of consecutive words.
#[derive(Debug, Clone, Default)]
pub struct ContentGuard {
    terms: Vec<Vec<String>>,
    warning: String,
}

pub const DEFAULT_BLOCKED_WARNING: &str =
    "Warning: Your input contains restricted terms. Please refrain from using such commands.";

impl ContentGuard {
    pub fn new<I, S>(terms: I, warning: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms = terms
            .into_iter()
            .map(|term| words(term.as_ref()))
            .filter(|words| !words.is_empty())
            .collect();
        Self {
            terms,
            warning: warning.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn warning(&self) -> &str {
        &self.warning
    }

    /// The warning to answer with, if `utterance` contains a blocked term.
    pub fn check(&self, utterance: &str) -> Option<&str> {
        if self.terms.is_empty() {
            return None;
        }
        let spoken = words(utterance);
        self.terms
            .iter()
            .any(|term| spoken.windows(term.len()).any(|window| window == term.as_slice()))
            .then_some(self.warning.as_str())
    }
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> ContentGuard {
        ContentGuard::new(["shutdown", "rm -rf", "공격"], DEFAULT_BLOCKED_WARNING)
    }

    #[test]
    fn test_matches_whole_words_case_insensitively() {
        let guard = guard();
        assert_eq!(
            guard.check("please SHUTDOWN the server"),
            Some(DEFAULT_BLOCKED_WARNING)
        );
        assert_eq!(guard.check("run rm -rf now"), Some(DEFAULT_BLOCKED_WARNING));
        assert_eq!(guard.check("공격 시작"), Some(DEFAULT_BLOCKED_WARNING));
    }

    #[test]
    fn test_substrings_do_not_match() {
        let guard = ContentGuard::new(["id", "w"], "no");
        assert_eq!(guard.check("I did it with my wallet"), None);
        assert_eq!(guard.check("what is my id"), Some("no"));
    }

    #[test]
    fn test_empty_guard_never_matches() {
        let guard = ContentGuard::new(Vec::<String>::new(), "no");
        assert!(guard.is_empty());
        assert_eq!(guard.check("anything"), None);

        let blank = ContentGuard::new(["", "  "], "no");
        assert!(blank.is_empty());
    }
}
