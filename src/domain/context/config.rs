use serde::{Deserialize, Serialize};

/// Budgets and window sizes for context compression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Default token budget for a prompt's history
    #[serde(default = "default_max_context_tokens")]
    pub max_context_tokens: usize,

    /// Reported in stats; intended size of the summary of dropped turns
    #[serde(default = "default_summary_tokens")]
    pub summary_tokens: usize,

    /// First trim stage: trailing turns kept
    #[serde(default = "default_sliding_window_size")]
    pub sliding_window_size: usize,

    /// Second trim stage: trailing turns kept when the window is still too large
    #[serde(default = "default_min_recent_messages")]
    pub min_recent_messages: usize,
}

fn default_max_context_tokens() -> usize {
    3000
}

fn default_summary_tokens() -> usize {
    500
}

fn default_sliding_window_size() -> usize {
    10
}

fn default_min_recent_messages() -> usize {
    6
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_context_tokens: default_max_context_tokens(),
            summary_tokens: default_summary_tokens(),
            sliding_window_size: default_sliding_window_size(),
            min_recent_messages: default_min_recent_messages(),
        }
    }
}
