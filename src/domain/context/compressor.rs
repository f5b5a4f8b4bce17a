//! Sliding-window history compression with a deterministic summary

use tracing::info;

use super::ContextConfig;
use crate::domain::conversation::Turn;

const SUMMARY_QUERY_LIMIT: usize = 3;

/// Rough token estimate: one token per four characters
///
/// This is deliberately coarse and is not a tokenizer.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

fn estimate_history(history: &[Turn]) -> usize {
    history.iter().map(|turn| estimate_tokens(&turn.content)).sum()
}

fn tail(history: &[Turn], count: usize) -> &[Turn] {
    &history[history.len().saturating_sub(count)..]
}

/// Stateless history compressor
#[derive(Debug, Clone, Default)]
pub struct ContextCompressor {
    config: ContextConfig,
}

impl ContextCompressor {
    pub fn new(config: ContextConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// The configured default budget
    pub fn budget(&self) -> usize {
        self.config.max_context_tokens
    }

    /// Trims `history` to fit `budget` in at most two stages
    ///
    /// Within budget the history is returned unchanged. Otherwise the last
    /// `sliding_window_size` turns are kept, and if those still exceed the
    /// budget only the last `min_recent_messages` turns are kept, whatever
    /// their size.
    pub fn compress(&self, history: &[Turn], budget: usize) -> Vec<Turn> {
        let total = estimate_history(history);

        if total <= budget {
            return history.to_vec();
        }

        info!(
            total_tokens = total,
            budget, "Compressing chat history"
        );

        let window = tail(history, self.config.sliding_window_size);

        if estimate_history(window) <= budget {
            return window.to_vec();
        }

        tail(history, self.config.min_recent_messages).to_vec()
    }

    /// Summarizes dropped turns from the first few user queries
    pub fn summarize_older(&self, old_turns: &[Turn]) -> String {
        let user_queries: Vec<&str> = old_turns
            .iter()
            .filter(|turn| turn.is_user())
            .map(|turn| turn.content.as_str())
            .collect();

        match user_queries.len() {
            0 => String::new(),
            1 | 2 => format!("Previous topics discussed: {}", user_queries.join(", ")),
            n => format!(
                "Previous conversation covered {} topics including: {}...",
                n,
                user_queries[..SUMMARY_QUERY_LIMIT].join(", ")
            ),
        }
    }

    /// Compresses the recent window and summarizes everything before it
    pub fn optimize(&self, history: &[Turn], budget: usize) -> (Vec<Turn>, String) {
        if estimate_history(history) <= budget {
            return (history.to_vec(), String::new());
        }

        let split = history.len().saturating_sub(self.config.sliding_window_size);
        let (older, recent) = history.split_at(split);

        let summary = self.summarize_older(older);
        let compressed = self.compress(recent, budget);

        info!(
            before = history.len(),
            after = compressed.len(),
            has_summary = !summary.is_empty(),
            "Context optimized"
        );

        (compressed, summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation(turns: usize, chars_per_turn: usize) -> Vec<Turn> {
        (0..turns)
            .map(|i| {
                let content = format!("{:02}{}", i, "x".repeat(chars_per_turn - 2));
                if i % 2 == 0 {
                    Turn::user(content)
                } else {
                    Turn::assistant(content)
                }
            })
            .collect()
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 0);
        assert_eq!(estimate_tokens("This is a test message"), 22 / 4);
    }

    #[test]
    fn test_estimate_counts_characters_not_bytes() {
        assert_eq!(estimate_tokens("éééé"), 1);
    }

    #[test]
    fn test_compress_empty() {
        let compressor = ContextCompressor::default();
        assert!(compressor.compress(&[], 100).is_empty());
    }

    #[test]
    fn test_compress_under_limit_is_unchanged() {
        let compressor = ContextCompressor::default();
        let history = vec![Turn::user("Hi"), Turn::assistant("Hello")];

        assert_eq!(compressor.compress(&history, 100), history);
    }

    #[test]
    fn test_compress_keeps_sliding_window() {
        let compressor = ContextCompressor::default();
        // 12 turns x 275 tokens = 3300 > 3000, last 10 = 2750
        let history = conversation(12, 1100);

        let compressed = compressor.compress(&history, 3000);

        assert_eq!(compressed.len(), 10);
        assert_eq!(compressed[..], history[2..]);
    }

    #[test]
    fn test_compress_falls_back_to_last_six() {
        let compressor = ContextCompressor::default();
        // 10 turns x 500 tokens = 5000 > 3000 even after windowing
        let history = conversation(12, 2000);

        let compressed = compressor.compress(&history, 3000);

        assert_eq!(compressed.len(), 6);
        assert_eq!(compressed[..], history[6..]);
    }

    #[test]
    fn test_compress_second_stage_does_not_shrink_further() {
        let compressor = ContextCompressor::default();
        let history = conversation(8, 4000);

        // Last 6 turns are still far above budget: no third stage
        let compressed = compressor.compress(&history, 10);

        assert_eq!(compressed.len(), 6);
    }

    #[test]
    fn test_summarize_no_user_turns() {
        let compressor = ContextCompressor::default();

        assert_eq!(compressor.summarize_older(&[]), "");
        assert_eq!(
            compressor.summarize_older(&[Turn::assistant("only the assistant")]),
            ""
        );
    }

    #[test]
    fn test_summarize_few_topics() {
        let compressor = ContextCompressor::default();
        let old = vec![
            Turn::user("What is AI?"),
            Turn::assistant("AI is artificial intelligence"),
            Turn::user("How does ML work?"),
        ];

        let summary = compressor.summarize_older(&old);

        assert_eq!(
            summary,
            "Previous topics discussed: What is AI?, How does ML work?"
        );
    }

    #[test]
    fn test_summarize_many_topics_takes_first_three() {
        let compressor = ContextCompressor::default();
        let old = vec![
            Turn::user("a"),
            Turn::user("b"),
            Turn::assistant("ignored"),
            Turn::user("c"),
            Turn::user("d"),
        ];

        let summary = compressor.summarize_older(&old);

        assert_eq!(
            summary,
            "Previous conversation covered 4 topics including: a, b, c..."
        );
    }

    #[test]
    fn test_optimize_empty() {
        let compressor = ContextCompressor::default();

        let (history, summary) = compressor.optimize(&[], 100);

        assert!(history.is_empty());
        assert_eq!(summary, "");
    }

    #[test]
    fn test_optimize_within_budget() {
        let compressor = ContextCompressor::default();
        let history = conversation(4, 40);

        let (optimized, summary) = compressor.optimize(&history, 3000);

        assert_eq!(optimized, history);
        assert!(summary.is_empty());
    }

    #[test]
    fn test_optimize_twelve_turns_window_fits() {
        let compressor = ContextCompressor::default();
        let history = conversation(12, 1100);

        let (optimized, summary) = compressor.optimize(&history, 3000);

        assert!(optimized.len() <= 10);
        assert_eq!(optimized[..], history[2..]);
        assert!(summary.starts_with("Previous topics discussed: 00"));
    }

    #[test]
    fn test_optimize_twelve_turns_window_too_large() {
        let compressor = ContextCompressor::default();
        let history = conversation(12, 2000);

        let (optimized, summary) = compressor.optimize(&history, 3000);

        assert_eq!(optimized.len(), 6);
        assert_eq!(optimized[..], history[6..]);
        assert!(!summary.is_empty());
    }

    #[test]
    fn test_custom_windows() {
        let compressor = ContextCompressor::new(ContextConfig {
            sliding_window_size: 4,
            min_recent_messages: 2,
            ..ContextConfig::default()
        });
        let history = conversation(6, 400);

        assert_eq!(compressor.compress(&history, 400).len(), 4);
        assert_eq!(compressor.compress(&history, 100).len(), 2);
    }
}
