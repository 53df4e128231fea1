//! Answer Loader
//!
//! Reads the raw answer records (time, page, question, answer, condition),
//! discards stale rows recorded before the session actually started, sorts by
//! time, and computes each answer's validity window end as a shifted-by-one
//! lookahead over the sorted sequence.

use crate::error::PipelineError;
use crate::events::parse_epoch_millis;
use crate::table::Table;
use crate::types::{Condition, RawAnswer};
use std::path::Path;

/// The designated first page of a real session. Rows recorded before the first
/// occurrence of this page are stale test data and are discarded.
pub const BACKGROUND_PAGE: &str = "Background Questions";

/// Parse raw answer text into a time-sorted answer sequence with validity
/// windows computed.
pub fn parse_answers(text: &str) -> Result<Vec<RawAnswer>, PipelineError> {
    let table = Table::parse(text)?;
    let time_col = table.column("time")?;
    let page_col = table.column("pageName")?;
    let question_col = table.column("question")?;
    let answer_col = table.column("answer")?;
    let version_col = table.column("version")?;

    let mut answers = Vec::with_capacity(table.rows().len());
    for (i, row) in table.rows().iter().enumerate() {
        let timestamp = parse_epoch_millis(&row[time_col])?;
        let condition =
            Condition::parse(&row[version_col]).ok_or_else(|| PipelineError::MalformedRow {
                row: i + 2,
                reason: format!("unknown condition version '{}'", row[version_col]),
            })?;
        answers.push(RawAnswer {
            timestamp,
            page_name: row[page_col].clone(),
            question: row[question_col].clone(),
            answer: row[answer_col].clone(),
            condition,
            validity_end: None,
        });
    }

    answers.sort_by_key(|a| a.timestamp);

    // Drop everything before the session's first Background Questions row.
    match answers.iter().position(|a| a.page_name == BACKGROUND_PAGE) {
        Some(first) if first > 0 => {
            log::debug!("discarding {} stale rows before session start", first);
            answers.drain(..first);
        }
        Some(_) => {}
        None => log::warn!("no '{}' page found; keeping all rows", BACKGROUND_PAGE),
    }

    // Shifted-by-one lookahead: each window ends where the next answer begins.
    for i in 0..answers.len() {
        answers[i].validity_end = answers.get(i + 1).map(|next| next.timestamp);
    }

    log::debug!("loaded {} answers", answers.len());
    Ok(answers)
}

/// Load and parse an answer file.
pub fn load_answers(path: &Path) -> Result<Vec<RawAnswer>, PipelineError> {
    let text = std::fs::read_to_string(path).map_err(|source| PipelineError::Load {
        path: path.display().to_string(),
        source,
    })?;
    parse_answers(&text)
}

/// Demographic responses from the Background Questions page, replicated onto
/// every output row instead of keeping the background rows themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BackgroundProfile {
    pub age: Option<String>,
    pub year_taken: Option<String>,
    pub grade: Option<String>,
    /// Academic track; "N/A" when the participant left it blank
    pub track: String,
}

impl BackgroundProfile {
    /// Extract the profile from the participant's answer sequence.
    pub fn extract(answers: &[RawAnswer]) -> Self {
        let background = |question: &str| {
            answers
                .iter()
                .find(|a| a.page_name == BACKGROUND_PAGE && a.question == question)
                .map(|a| a.answer.clone())
        };

        BackgroundProfile {
            age: background("0"),
            year_taken: background("1"),
            grade: background("2"),
            track: background("3").unwrap_or_else(|| "N/A".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_csv() -> &'static str {
        "time,pageName,question,answer,version\n\
         1709290000000,Background Questions,0,16,interactive\n\
         1709290060000,Background Questions,3,Honors,interactive\n\
         1709290120000,P1,qID-0,Yes,interactive\n\
         1709290180000,S1_C1,qID-0,No,interactive\n"
    }

    #[test]
    fn test_validity_windows_are_lookahead() {
        let answers = parse_answers(sample_csv()).unwrap();

        assert_eq!(answers.len(), 4);
        assert_eq!(answers[0].validity_end, Some(answers[1].timestamp));
        assert_eq!(answers[2].validity_end, Some(answers[3].timestamp));
        // Last answer's window is unbounded
        assert_eq!(answers[3].validity_end, None);
    }

    #[test]
    fn test_stale_rows_before_background_discarded() {
        let text = "time,pageName,question,answer,version\n\
                    1709280000000,S1_C1,qID-0,No,static\n\
                    1709280100000,P1,qID-0,Yes,static\n\
                    1709290000000,Background Questions,0,16,static\n\
                    1709290120000,P1,qID-0,Yes,static\n";
        let answers = parse_answers(text).unwrap();

        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0].page_name, BACKGROUND_PAGE);
    }

    #[test]
    fn test_no_background_page_keeps_all_rows() {
        let text = "time,pageName,question,answer,version\n\
                    1709290120000,P1,qID-0,Yes,static\n";
        let answers = parse_answers(text).unwrap();
        assert_eq!(answers.len(), 1);
    }

    #[test]
    fn test_unknown_condition_is_fatal() {
        let text = "time,pageName,question,answer,version\n\
                    1709290000000,Background Questions,0,16,mystery\n";
        assert!(matches!(
            parse_answers(text),
            Err(PipelineError::MalformedRow { row: 2, .. })
        ));
    }

    #[test]
    fn test_background_profile_extraction() {
        let answers = parse_answers(sample_csv()).unwrap();
        let profile = BackgroundProfile::extract(&answers);

        assert_eq!(profile.age.as_deref(), Some("16"));
        assert_eq!(profile.year_taken, None);
        assert_eq!(profile.track, "Honors");
    }

    #[test]
    fn test_track_falls_back_to_na() {
        let text = "time,pageName,question,answer,version\n\
                    1709290000000,Background Questions,0,17,static\n";
        let answers = parse_answers(text).unwrap();
        let profile = BackgroundProfile::extract(&answers);
        assert_eq!(profile.track, "N/A");
    }
}
