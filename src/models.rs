//! Data models for sentiment analysis results.
//!
//! This module contains the core data structures shared by the aggregator,
//! the session controller and the renderers: the sentiment categories, the
//! classified comments returned by the analysis service, and the derived
//! statistics.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Sentiment category assigned by the classifier.
///
/// The discriminants match the integer labels used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Negative = 0,
    Neutral = 1,
    Positive = 2,
}

impl Sentiment {
    /// All categories in probability-vector order.
    pub const ALL: [Sentiment; 3] = [Sentiment::Negative, Sentiment::Neutral, Sentiment::Positive];

    /// Map a wire label onto a category. Returns `None` for anything outside `0..=2`.
    pub fn from_label(label: i64) -> Option<Self> {
        match label {
            0 => Some(Sentiment::Negative),
            1 => Some(Sentiment::Neutral),
            2 => Some(Sentiment::Positive),
            _ => None,
        }
    }

    /// Map a category name as returned by the predict endpoint.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "negative" => Some(Sentiment::Negative),
            "neutral" => Some(Sentiment::Neutral),
            "positive" => Some(Sentiment::Positive),
            _ => None,
        }
    }

    /// Index into a `[p_neg, p_neu, p_pos]` probability vector.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns an emoji representation of the category.
    pub fn emoji(&self) -> &'static str {
        match self {
            Sentiment::Negative => "🔴",
            Sentiment::Neutral => "🔵",
            Sentiment::Positive => "🟢",
        }
    }

    /// Glyph used to draw this category's share of a probability bar.
    pub fn bar_glyph(&self) -> char {
        match self {
            Sentiment::Negative => '-',
            Sentiment::Neutral => '=',
            Sentiment::Positive => '+',
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentiment::Negative => write!(f, "Negative"),
            Sentiment::Neutral => write!(f, "Neutral"),
            Sentiment::Positive => write!(f, "Positive"),
        }
    }
}

/// View restriction over a result set.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum CategoryFilter {
    #[default]
    All,
    Positive,
    Neutral,
    Negative,
}

impl CategoryFilter {
    /// The category this filter selects, or `None` for `All`.
    pub fn sentiment(&self) -> Option<Sentiment> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::Positive => Some(Sentiment::Positive),
            CategoryFilter::Neutral => Some(Sentiment::Neutral),
            CategoryFilter::Negative => Some(Sentiment::Negative),
        }
    }
}

impl std::str::FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(CategoryFilter::All),
            "positive" | "pos" => Ok(CategoryFilter::Positive),
            "neutral" | "neu" => Ok(CategoryFilter::Neutral),
            "negative" | "neg" => Ok(CategoryFilter::Negative),
            other => Err(format!(
                "Unknown filter '{}'. Expected one of: all, positive, neutral, negative",
                other
            )),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => write!(f, "All"),
            CategoryFilter::Positive => write!(f, "Positive"),
            CategoryFilter::Neutral => write!(f, "Neutral"),
            CategoryFilter::Negative => write!(f, "Negative"),
        }
    }
}

/// A single comment as classified by the analysis service.
///
/// Label and probabilities are kept exactly as received; validation happens
/// in the aggregator so that malformed records stay observable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedComment {
    /// Verbatim comment text.
    pub original_comment: String,
    /// Normalized text the classifier actually saw, when provided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleaned_comment: Option<String>,
    /// Raw integer label (0 = negative, 1 = neutral, 2 = positive).
    ///
    /// A missing or non-integer label becomes [`INVALID_LABEL`].
    #[serde(default = "invalid_label", deserialize_with = "lenient_label")]
    pub sentiment_label: i64,
    /// Raw probability vector `[p_neg, p_neu, p_pos]`.
    ///
    /// A missing or non-numeric array becomes empty.
    #[serde(default, deserialize_with = "lenient_probabilities")]
    pub sentiment_probabilities: Vec<f64>,
}

/// Label stored for a record whose label could not be read as an integer.
pub const INVALID_LABEL: i64 = -1;

fn invalid_label() -> i64 {
    INVALID_LABEL
}

fn lenient_label<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawLabel {
        Label(i64),
        Other(IgnoredAny),
    }

    Ok(match RawLabel::deserialize(deserializer)? {
        RawLabel::Label(label) => label,
        RawLabel::Other(_) => INVALID_LABEL,
    })
}

fn lenient_probabilities<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<f64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawProbabilities {
        Values(Vec<f64>),
        Other(IgnoredAny),
    }

    Ok(match RawProbabilities::deserialize(deserializer)? {
        RawProbabilities::Values(values) => values,
        RawProbabilities::Other(_) => Vec::new(),
    })
}

#[cfg(test)]
impl ClassifiedComment {
    /// Creates a comment with a valid label and probability vector.
    pub fn new(text: impl Into<String>, label: Sentiment, probabilities: [f64; 3]) -> Self {
        Self {
            original_comment: text.into(),
            cleaned_comment: None,
            sentiment_label: label as i64,
            sentiment_probabilities: probabilities.to_vec(),
        }
    }
}

/// The ordered set of classified comments returned for one submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisResult {
    comments: Vec<ClassifiedComment>,
}

impl AnalysisResult {
    pub fn new(comments: Vec<ClassifiedComment>) -> Self {
        Self { comments }
    }

    /// Comments in service order.
    pub fn comments(&self) -> &[ClassifiedComment] {
        &self.comments
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }
}

/// Per-category comment counts.
///
/// `total` always equals `positive + neutral + negative`; records that fail
/// the integrity check are counted in `unknown` only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentCounts {
    pub total: usize,
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
    pub unknown: usize,
}

impl SentimentCounts {
    /// Count for a single category.
    pub fn get(&self, sentiment: Sentiment) -> usize {
        match sentiment {
            Sentiment::Negative => self.negative,
            Sentiment::Neutral => self.neutral,
            Sentiment::Positive => self.positive,
        }
    }
}

/// Rounded per-category percentages. Only exists for non-empty result sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Percentages {
    pub positive: u8,
    pub neutral: u8,
    pub negative: u8,
}

impl Percentages {
    pub fn get(&self, sentiment: Sentiment) -> u8 {
        match sentiment {
            Sentiment::Negative => self.negative,
            Sentiment::Neutral => self.neutral,
            Sentiment::Positive => self.positive,
        }
    }
}

/// One slice of a probability bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbabilitySegment {
    pub category: Sentiment,
    /// Fraction of the full bar width, already truncated so the cumulative
    /// width of all segments stays within 1.0.
    pub width_fraction: f64,
}
