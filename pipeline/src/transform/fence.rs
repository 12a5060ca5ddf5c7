//! Markdown code-fence extraction from generated text.
//!
//! Only the first fenced block is read. A block that is never closed counts
//! as absent, so the caller gets `None` rather than a partial payload.

use serde::{Deserialize, Serialize};

/// Opening and closing markers of a fenced block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FenceMatcher {
    /// Prefix of the opening line, compared case-insensitively after trimming.
    pub opener: String,
    /// Prefix of the closing line after trimming.
    pub closer: String,
}

impl Default for FenceMatcher {
    fn default() -> Self {
        Self::language("csv")
    }
}

impl FenceMatcher {
    /// Block tagged with `lang` (```` ```csv ````).
    pub fn language(lang: &str) -> Self {
        Self {
            opener: format!("```{}", lang.to_lowercase()),
            closer: "```".to_string(),
        }
    }

    /// Any fenced block, tagged or not.
    pub fn any() -> Self {
        Self::language("")
    }

    fn opens(&self, trimmed: &str) -> bool {
        trimmed.to_lowercase().starts_with(&self.opener)
    }

    fn closes(&self, trimmed: &str) -> bool {
        trimmed.starts_with(&self.closer)
    }

    /// Non-blank lines strictly inside the first block, joined with `\n`.
    pub fn extract(&self, text: &str) -> Option<String> {
        let mut lines = text.lines();

        lines.by_ref().find(|line| self.opens(line.trim()))?;

        let mut kept = Vec::new();
        for line in lines {
            let trimmed = line.trim();
            if self.closes(trimmed) {
                return Some(kept.join("\n"));
            }
            if !trimmed.is_empty() {
                kept.push(line);
            }
        }

        // Opened but never closed
        None
    }
}

/// Extract the first ```` ```csv ```` block.
pub fn extract_csv_block(text: &str) -> Option<String> {
    FenceMatcher::default().extract(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_block_dropping_blank_lines() {
        let text = "Here you go:\n\n```csv\na,1\n\n  \nb,2\n```\nHope this helps";
        assert_eq!(extract_csv_block(text).as_deref(), Some("a,1\nb,2"));
    }

    #[test]
    fn test_opener_is_case_insensitive() {
        let text = "  ```CSV\nx,y\n  ```";
        assert_eq!(extract_csv_block(text).as_deref(), Some("x,y"));
    }

    #[test]
    fn test_lines_kept_verbatim() {
        let text = "```csv\n  padded , cell  \n```";
        assert_eq!(extract_csv_block(text).as_deref(), Some("  padded , cell  "));
    }

    #[test]
    fn test_unclosed_block_is_not_found() {
        assert_eq!(extract_csv_block("```csv\na,1\nb,2"), None);
    }

    #[test]
    fn test_no_fence_is_not_found() {
        assert_eq!(extract_csv_block("a,1\nb,2"), None);
    }

    #[test]
    fn test_only_first_block() {
        let text = "```csv\nfirst\n```\n```csv\nsecond\n```";
        assert_eq!(extract_csv_block(text).as_deref(), Some("first"));
    }

    #[test]
    fn test_not_chainable_on_own_output() {
        let once = extract_csv_block("```csv\na,1\n```").unwrap();
        assert_eq!(extract_csv_block(&once), None);
    }

    #[test]
    fn test_other_language_ignored_by_default() {
        assert_eq!(extract_csv_block("```json\n{}\n```"), None);
        assert_eq!(
            FenceMatcher::any().extract("```json\n{}\n```").as_deref(),
            Some("{}")
        );
    }

    #[test]
    fn test_empty_block() {
        assert_eq!(extract_csv_block("```csv\n\n```").as_deref(), Some(""));
    }
}
