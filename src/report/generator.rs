//! Markdown and JSON report generation.
//!
//! Renders a [`SessionView`] for the terminal or a file: summary cards with
//! counts and percentages, the filtered comment list, and a fixed-width
//! probability bar per comment.

use crate::analysis::{check_integrity, predicted_sentiment, probability_segments};
use crate::error::DataIntegrityError;
use crate::models::{ClassifiedComment, Percentages, ProbabilitySegment, Sentiment, SentimentCounts};
use crate::session::{ResultView, SessionView};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Metadata about one rendered analysis.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Video reference exactly as submitted.
    pub video_url: String,
    /// Analysis service that produced the result.
    pub service_url: String,
    pub generated_at: DateTime<Utc>,
}

/// A session view together with its metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub view: SessionView,
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, bar_width: usize) -> String {
    let mut output = String::new();

    output.push_str("# Comment Sentiment Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_view(&report.view, bar_width));
    output.push_str(&generate_footer());

    output
}

/// Render just the view, without metadata or footer.
pub fn generate_view(view: &SessionView, bar_width: usize) -> String {
    match view {
        SessionView::Idle => generate_instructions(),
        SessionView::Loading => "⏳ Fetching and analyzing comments...\n\n".to_string(),
        SessionView::Failed { message } => format!("❌ **Error:** {}\n\n", message),
        SessionView::Succeeded(result) => {
            let mut section = generate_summary_section(&result.counts, result.percentages);
            section.push_str(&generate_notes(result));
            section.push_str(&generate_comments_section(result, bar_width));
            section
        }
    }
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Video:** {}\n", metadata.video_url));
    section.push_str(&format!("- **Service:** {}\n", metadata.service_url));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push('\n');

    section
}

fn generate_instructions() -> String {
    let mut section = String::new();

    section.push_str("## How to use\n\n");
    section.push_str("1. Find a YouTube video you want to analyze\n");
    section.push_str("2. Copy the video URL from your browser\n");
    section.push_str("3. Paste the URL here\n");
    section.push_str("4. Press Enter to see the sentiment results\n\n");

    section
}

/// Generate the summary cards. Percentages are omitted entirely when absent.
fn generate_summary_section(counts: &SentimentCounts, percentages: Option<Percentages>) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str(&format!(
        "| Total Comments | {} Positive | {} Neutral | {} Negative |\n",
        Sentiment::Positive.emoji(),
        Sentiment::Neutral.emoji(),
        Sentiment::Negative.emoji(),
    ));
    section.push_str("|:---:|:---:|:---:|:---:|\n");

    let cell = |sentiment: Sentiment| match percentages {
        Some(pct) => format!("{} ({}%)", counts.get(sentiment), pct.get(sentiment)),
        None => counts.get(sentiment).to_string(),
    };

    section.push_str(&format!(
        "| **{}** | {} | {} | {} |\n\n",
        counts.total,
        cell(Sentiment::Positive),
        cell(Sentiment::Neutral),
        cell(Sentiment::Negative),
    ));

    section
}

fn generate_notes(result: &ResultView) -> String {
    let mut notes = String::new();

    if result.counts.unknown > 0 {
        notes.push_str(&format!(
            "> ⚠️ {} comment(s) carried invalid sentiment data and are not counted in any category.\n\n",
            result.counts.unknown
        ));
    }

    if result.disagreements > 0 {
        notes.push_str(&format!(
            "> ℹ️ {} comment(s) have a label that differs from their most probable category.\n\n",
            result.disagreements
        ));
    }

    notes
}

/// Generate the filtered comment list.
fn generate_comments_section(result: &ResultView, bar_width: usize) -> String {
    let mut section = String::new();

    section.push_str(&format!(
        "## {} Comments ({})\n\n",
        result.filter,
        result.comments.len()
    ));

    if result.comments.is_empty() {
        section.push_str("*No comments found in this category.*\n\n");
        return section;
    }

    for (i, comment) in result.comments.iter().enumerate() {
        section.push_str(&generate_comment_block(i + 1, comment, bar_width));
    }

    section
}

/// Generate a single comment card.
pub fn generate_comment_block(index: usize, comment: &ClassifiedComment, bar_width: usize) -> String {
    let mut block = String::new();

    let badge = match check_integrity(comment) {
        Ok(sentiment) => format!("{} **{}**", sentiment.emoji(), sentiment),
        Err(DataIntegrityError::LabelOutOfRange(label)) => {
            format!("❓ **Unknown** (label {})", label)
        }
        // The label itself may be fine; keep showing it.
        Err(DataIntegrityError::ProbabilityArity(_)) => {
            match Sentiment::from_label(comment.sentiment_label) {
                Some(sentiment) => format!("{} **{}**", sentiment.emoji(), sentiment),
                None => "❓ **Unknown**".to_string(),
            }
        }
    };
    block.push_str(&format!("### {}. {}\n\n", index, badge));

    for line in comment.original_comment.lines() {
        block.push_str(&format!("> {}\n", line));
    }
    block.push('\n');

    let segments = probability_segments(comment);
    if segments.is_empty() {
        block.push_str(&format!(
            "`[invalid probability data: expected 3 values, got {}]`\n\n",
            comment.sentiment_probabilities.len()
        ));
    } else {
        block.push_str(&format!("`[{}]`\n\n", render_bar(&segments, bar_width)));

        let shares: Vec<String> = Sentiment::ALL
            .iter()
            .map(|s| {
                format!(
                    "{}: {}",
                    s,
                    probability_percent(comment.sentiment_probabilities[s.index()])
                )
            })
            .collect();
        block.push_str(&shares.join(" | "));
        block.push('\n');

        if let (Ok(label), Some(predicted)) = (check_integrity(comment), predicted_sentiment(comment)) {
            if label != predicted {
                block.push_str(&format!("\n*Most probable: {}*\n", predicted));
            }
        }
        block.push('\n');
    }

    block
}

/// Draw segments into exactly `width` cells.
///
/// Each segment ends at the cell nearest its cumulative width, so rounding
/// never pushes the bar past `width`. Unfilled cells are spaces.
pub fn render_bar(segments: &[ProbabilitySegment], width: usize) -> String {
    let mut bar = String::with_capacity(width);
    let mut cumulative = 0.0_f64;
    let mut filled = 0usize;

    for segment in segments {
        cumulative += segment.width_fraction;
        let end = ((cumulative * width as f64).round() as usize).min(width);
        while filled < end {
            bar.push(segment.category.bar_glyph());
            filled += 1;
        }
    }

    while filled < width {
        bar.push(' ');
        filled += 1;
    }

    bar
}

/// A stored probability as a rounded percentage.
fn probability_percent(p: f64) -> String {
    if p.is_finite() {
        format!("{}%", (p * 100.0).round() as i64)
    } else {
        "n/a".to_string()
    }
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by sentiscope*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisResult, CategoryFilter};

    fn create_test_view(filter: CategoryFilter) -> ResultView {
        let result = AnalysisResult::new(vec![
            ClassifiedComment::new("Great video!", Sentiment::Positive, [0.05, 0.15, 0.8]),
            ClassifiedComment::new("Interesting take.", Sentiment::Neutral, [0.2, 0.6, 0.2]),
            ClassifiedComment::new("Subscribed!", Sentiment::Positive, [0.03, 0.07, 0.9]),
        ]);
        ResultView::build(&result, filter)
    }

    fn create_test_report(view: SessionView) -> Report {
        Report {
            metadata: ReportMetadata {
                video_url: "https://www.youtube.com/watch?v=abc".to_string(),
                service_url: "http://127.0.0.1:5000".to_string(),
                generated_at: Utc::now(),
            },
            view,
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report(SessionView::Succeeded(create_test_view(
            CategoryFilter::All,
        )));
        let markdown = generate_markdown_report(&report, 20);

        assert!(markdown.contains("# Comment Sentiment Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("watch?v=abc"));
        assert!(markdown.contains("| **3** | 2 (67%) | 1 (33%) | 0 (0%) |"));
        assert!(markdown.contains("## All Comments (3)"));
        assert!(markdown.contains("> Great video!"));
    }

    #[test]
    fn test_filtered_section_title() {
        let view = create_test_view(CategoryFilter::Positive);
        let section = generate_view(&SessionView::Succeeded(view), 20);

        assert!(section.contains("## Positive Comments (2)"));
        assert!(!section.contains("Interesting take."));
    }

    #[test]
    fn test_empty_result_has_no_percentages() {
        let view = ResultView::build(&AnalysisResult::default(), CategoryFilter::Neutral);
        let section = generate_view(&SessionView::Succeeded(view), 20);

        assert!(section.contains("| **0** | 0 | 0 | 0 |"));
        assert!(!section.contains('%'));
        assert!(section.contains("No comments found in this category."));
    }

    #[test]
    fn test_render_bar_full_width() {
        let comment = ClassifiedComment::new("x", Sentiment::Positive, [0.9, 0.9, 0.9]);
        let bar = render_bar(&probability_segments(&comment), 10);

        assert_eq!(bar, "---------=");
        assert_eq!(bar.chars().count(), 10);
    }

    #[test]
    fn test_render_bar_underflow() {
        let comment = ClassifiedComment::new("x", Sentiment::Neutral, [0.1, 0.1, 0.1]);
        let bar = render_bar(&probability_segments(&comment), 10);

        assert_eq!(bar, "-=+       ");
    }

    #[test]
    fn test_render_bar_ordering() {
        let comment = ClassifiedComment::new("x", Sentiment::Positive, [0.2, 0.3, 0.5]);
        assert_eq!(render_bar(&probability_segments(&comment), 10), "--===+++++");
    }

    #[test]
    fn test_comment_block_shows_stored_probabilities() {
        let comment = ClassifiedComment::new("Loud", Sentiment::Positive, [0.9, 0.9, 0.9]);
        let block = generate_comment_block(1, &comment, 10);

        assert!(block.contains("Negative: 90% | Neutral: 90% | Positive: 90%"));
        assert!(block.contains("`[---------=]`"));
    }

    #[test]
    fn test_comment_block_unknown_label() {
        let mut comment = ClassifiedComment::new("Odd", Sentiment::Neutral, [0.2, 0.6, 0.2]);
        comment.sentiment_label = 9;
        let block = generate_comment_block(1, &comment, 10);

        assert!(block.contains("❓ **Unknown** (label 9)"));
        assert!(!block.contains("**Neutral**"));
    }

    #[test]
    fn test_comment_block_malformed_probabilities() {
        let mut comment = ClassifiedComment::new("Odd", Sentiment::Negative, [0.8, 0.1, 0.1]);
        comment.sentiment_probabilities = vec![0.8, 0.2];
        let block = generate_comment_block(1, &comment, 10);

        assert!(block.contains("invalid probability data"));
        assert!(block.contains("**Negative**"));
    }

    #[test]
    fn test_comment_block_label_disagreement() {
        let comment = ClassifiedComment::new("Hmm", Sentiment::Negative, [0.1, 0.2, 0.7]);
        let block = generate_comment_block(1, &comment, 10);

        assert!(block.contains("**Negative**"));
        assert!(block.contains("Most probable: Positive"));
    }

    #[test]
    fn test_failed_and_idle_views() {
        let failed = generate_view(
            &SessionView::Failed {
                message: "quota exceeded".to_string(),
            },
            10,
        );
        assert!(failed.contains("quota exceeded"));

        assert!(generate_view(&SessionView::Idle, 10).contains("How to use"));
        assert!(generate_view(&SessionView::Loading, 10).contains("Fetching"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report(SessionView::Succeeded(create_test_view(
            CategoryFilter::All,
        )));
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"state\": \"succeeded\""));
        assert!(json.contains("\"video_url\""));
        assert!(json.contains("\"percentages\""));
        assert!(json.contains("\"original_comment\": \"Great video!\""));
    }

    #[test]
    fn test_json_report_for_failure() {
        let report = create_test_report(SessionView::Failed {
            message: "quota exceeded".to_string(),
        });
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"state\": \"failed\""));
        assert!(json.contains("\"message\": \"quota exceeded\""));
    }
}
