use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageIntent {
    /// Reads like a project description or a procurement question
    Procurement,
    Conversation,
}

/// Decides whether a chat message should trigger an analysis
pub trait MessageClassifier: Send + Sync {
    fn classify(&self, text: &str) -> MessageIntent;
}

static KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(build(ing)?|construct\w*|project|procure\w*|materials?|cement|steel|concrete|bricks?|sand|aggregates?|rebar|tmt|vendors?|suppliers?|budget|costs?|estimate\w*|quotations?|data\s*cent(er|re)|warehouse|factory|plant|hospital|sq\.?\s*ft|sqft)\b",
    )
    .expect("keyword pattern is valid")
});

static QUANTITIES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b\d+(\.\d+)?\s*(mw|megawatts?|kw|sq\.?\s*ft|sqft|square\s*f(ee|oo)t|sq\.?\s*m|acres?|cr|crores?|lakhs?|lacs?|tons?|tonnes?|floors?|storeys?)\b",
    )
    .expect("quantity pattern is valid")
});

/// Vocabulary heuristic: a sized quantity (`25 MW`, `200000 sqft`, `50 Cr`) or
/// enough distinct construction terms marks a message as procurement
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    min_keyword_hits: usize,
}

impl KeywordClassifier {
    pub fn new() -> Self {
        Self { min_keyword_hits: 2 }
    }

    pub fn with_min_keyword_hits(mut self, hits: usize) -> Self {
        self.min_keyword_hits = hits.max(1);
        self
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageClassifier for KeywordClassifier {
    fn classify(&self, text: &str) -> MessageIntent {
        if QUANTITIES.is_match(text) {
            return MessageIntent::Procurement;
        }

        let hits: HashSet<String> = KEYWORDS
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .collect();

        if hits.len() >= self.min_keyword_hits {
            MessageIntent::Procurement
        } else {
            MessageIntent::Conversation
        }
    }
}
