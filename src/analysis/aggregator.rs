//! Sentiment aggregation and statistics.
//!
//! Pure functions that turn an [`AnalysisResult`] into display-ready counts,
//! percentages, filtered views and probability-bar segments. Nothing here
//! depends on session state.

use crate::error::DataIntegrityError;
use crate::models::{
    AnalysisResult, CategoryFilter, ClassifiedComment, Percentages, ProbabilitySegment, Sentiment,
    SentimentCounts,
};
use tracing::warn;

/// Decide whether a comment can be placed in a category.
///
/// A record with an out-of-range label or a probability vector that is not
/// exactly three long is rejected rather than coerced.
pub fn check_integrity(comment: &ClassifiedComment) -> Result<Sentiment, DataIntegrityError> {
    let sentiment = Sentiment::from_label(comment.sentiment_label)
        .ok_or(DataIntegrityError::LabelOutOfRange(comment.sentiment_label))?;

    if comment.sentiment_probabilities.len() != 3 {
        return Err(DataIntegrityError::ProbabilityArity(
            comment.sentiment_probabilities.len(),
        ));
    }

    Ok(sentiment)
}

/// Count comments per category in a single pass.
pub fn count_by_category(result: &AnalysisResult) -> SentimentCounts {
    let mut counts = SentimentCounts::default();

    for comment in result.comments() {
        match check_integrity(comment) {
            Ok(Sentiment::Positive) => counts.positive += 1,
            Ok(Sentiment::Neutral) => counts.neutral += 1,
            Ok(Sentiment::Negative) => counts.negative += 1,
            Err(_) => counts.unknown += 1,
        }
    }

    counts.total = counts.positive + counts.neutral + counts.negative;

    if counts.unknown > 0 {
        warn!(
            "{} of {} comments carry invalid sentiment data and were left uncategorized",
            counts.unknown,
            result.len()
        );
    }

    counts
}

/// Rounded share of `count` in `total`, or `None` when `total` is zero.
///
/// Each category is rounded on its own, so three percentages may add up to
/// 99 or 101.
pub fn percentage(count: usize, total: usize) -> Option<u8> {
    if total == 0 {
        return None;
    }

    let share = (count as f64 / total as f64) * 100.0;
    Some(share.round().min(100.0) as u8)
}

/// Percentages for the three categories, or `None` for an empty result set.
pub fn category_percentages(counts: &SentimentCounts) -> Option<Percentages> {
    Some(Percentages {
        positive: percentage(counts.positive, counts.total)?,
        neutral: percentage(counts.neutral, counts.total)?,
        negative: percentage(counts.negative, counts.total)?,
    })
}

/// Comments selected by `filter`, in service order.
///
/// Uses the same rule as [`count_by_category`], so records failing
/// [`check_integrity`] only appear under [`CategoryFilter::All`].
pub fn filter_by_category(
    result: &AnalysisResult,
    filter: CategoryFilter,
) -> Vec<&ClassifiedComment> {
    match filter.sentiment() {
        None => result.comments().iter().collect(),
        Some(wanted) => result
            .comments()
            .iter()
            .filter(|c| check_integrity(c) == Ok(wanted))
            .collect(),
    }
}

/// Lay out a comment's probabilities as bar segments.
///
/// Segments come in `[Negative, Neutral, Positive]` order, each clamped to
/// `[0, 1]`. Once the cumulative width reaches 1.0 the rest is truncated;
/// a sum below 1.0 leaves the remainder unfilled. Returns no segments when
/// the vector is not three long.
pub fn probability_segments(comment: &ClassifiedComment) -> Vec<ProbabilitySegment> {
    if comment.sentiment_probabilities.len() != 3 {
        return Vec::new();
    }

    let mut used = 0.0_f64;

    Sentiment::ALL
        .iter()
        .map(|&category| {
            let p = comment.sentiment_probabilities[category.index()];
            let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
            let width_fraction = if used + p <= 1.0 {
                p
            } else {
                (1.0 - used).max(0.0)
            };
            used += width_fraction;

            ProbabilitySegment {
                category,
                width_fraction,
            }
        })
        .collect()
}

/// Category with the highest probability. Ties resolve to the earlier category.
pub fn predicted_sentiment(comment: &ClassifiedComment) -> Option<Sentiment> {
    if comment.sentiment_probabilities.len() != 3 {
        return None;
    }

    let mut best: Option<(Sentiment, f64)> = None;
    for sentiment in Sentiment::ALL {
        let p = comment.sentiment_probabilities[sentiment.index()];
        if p.is_nan() {
            continue;
        }
        match best {
            Some((_, best_p)) if p <= best_p => {}
            _ => best = Some((sentiment, p)),
        }
    }

    best.map(|(sentiment, _)| sentiment)
}

/// Number of valid comments whose label differs from the most probable category.
pub fn label_disagreements(result: &AnalysisResult) -> usize {
    result
        .comments()
        .iter()
        .filter(|c| match (check_integrity(c), predicted_sentiment(c)) {
            (Ok(label), Some(predicted)) => label != predicted,
            _ => false,
        })
        .count()
}
