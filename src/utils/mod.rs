pub mod chunking;
pub mod markdown;

use crate::models::Usage;

/// Whitespace-separated word count, used in place of a tokenizer.
pub fn count_words(text: &str) -> u64 {
    text.split_whitespace().count() as u64
}

pub fn estimate_usage(query: &str, answer: &str) -> Usage {
    Usage::new(count_words(query), count_words(answer))
}

/// First `max_chars` characters of `text`, for log lines.
pub fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_words() {
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("  one two\nthree\t four "), 4);
    }

    #[test]
    fn test_estimate_usage_totals() {
        let usage = estimate_usage("What is this notebook about?", "It covers Rust.");
        assert_eq!(usage.prompt_tokens, 5);
        assert_eq!(usage.completion_tokens, 3);
        assert_eq!(usage.total_tokens, usage.prompt_tokens + usage.completion_tokens);
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        assert_eq!(preview("héllo wörld", 4), "héll");
        assert_eq!(preview("hi", 100), "hi");
    }
}
