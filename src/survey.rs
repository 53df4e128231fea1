//! Usability score aggregation
//!
//! Computes the usability score from the survey pages using the standard
//! alternating-polarity convention: item `i` (0-based, in chronological order)
//! contributes `answer - 1` when `i` is even and `5 - answer` when odd, and
//! the total is the contribution sum scaled by 2.5. A 10-item survey spans
//! [0, 100].

use crate::types::RawAnswer;

/// Survey page shown to the static-condition arm
pub const STATIC_SURVEY_PAGE: &str = "Static SUS";

/// Survey page shown to the interactive-condition arm
pub const INTERACTIVE_SURVEY_PAGE: &str = "Interactive SUS";

/// Usability scores for both survey pages of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SurveyScores {
    pub static_score: f64,
    pub interactive_score: f64,
}

impl SurveyScores {
    /// Compute both survey scores from the participant's answer sequence.
    pub fn compute(answers: &[RawAnswer]) -> Self {
        SurveyScores {
            static_score: usability_score(answers, STATIC_SURVEY_PAGE),
            interactive_score: usability_score(answers, INTERACTIVE_SURVEY_PAGE),
        }
    }
}

/// Usability score for the survey items on one page.
///
/// Items are taken in chronological order. Responses that do not parse as an
/// integer are dropped with a warning; they do not shift the polarity of the
/// items that follow (polarity is positional in the survey instrument).
pub fn usability_score(answers: &[RawAnswer], page: &str) -> f64 {
    let contributions: f64 = answers
        .iter()
        .filter(|a| a.page_name == page)
        .enumerate()
        .filter_map(|(i, a)| match a.answer.trim().parse::<i32>() {
            Ok(value) => Some(item_contribution(i, value)),
            Err(_) => {
                log::warn!(
                    "unparseable survey response '{}' on {} item {}",
                    a.answer,
                    page,
                    i
                );
                None
            }
        })
        .sum();

    2.5 * contributions
}

fn item_contribution(index: usize, value: i32) -> f64 {
    let value = value.clamp(1, 5) as f64;
    if index % 2 == 0 {
        value - 1.0
    } else {
        5.0 - value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Condition;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn survey_answers(page: &str, responses: &[i32]) -> Vec<RawAnswer> {
        responses
            .iter()
            .enumerate()
            .map(|(i, v)| RawAnswer {
                timestamp: Utc
                    .with_ymd_and_hms(2024, 3, 1, 11, i as u32, 0)
                    .unwrap(),
                page_name: page.to_string(),
                question: i.to_string(),
                answer: v.to_string(),
                condition: Condition::Static,
                validity_end: None,
            })
            .collect()
    }

    #[test]
    fn test_floor_is_zero() {
        // Worst possible response pattern: even items (positive polarity) at
        // 1, odd items (negative polarity) at 5.
        let responses = [1, 5, 1, 5, 1, 5, 1, 5, 1, 5];
        let answers = survey_answers(STATIC_SURVEY_PAGE, &responses);
        assert_eq!(usability_score(&answers, STATIC_SURVEY_PAGE), 0.0);
    }

    #[test]
    fn test_ceiling_is_one_hundred() {
        let responses = [5, 1, 5, 1, 5, 1, 5, 1, 5, 1];
        let answers = survey_answers(STATIC_SURVEY_PAGE, &responses);
        assert_eq!(usability_score(&answers, STATIC_SURVEY_PAGE), 100.0);
    }

    #[test]
    fn test_alternating_polarity() {
        // Item 0 (even): 4 - 1 = 3; item 1 (odd): 5 - 2 = 3. Total 6 * 2.5.
        let answers = survey_answers(INTERACTIVE_SURVEY_PAGE, &[4, 2]);
        assert_eq!(usability_score(&answers, INTERACTIVE_SURVEY_PAGE), 15.0);
    }

    #[test]
    fn test_pages_scored_independently() {
        let mut answers = survey_answers(STATIC_SURVEY_PAGE, &[5, 1]);
        answers.extend(survey_answers(INTERACTIVE_SURVEY_PAGE, &[1, 5]));

        let scores = SurveyScores::compute(&answers);
        assert_eq!(scores.static_score, 20.0);
        assert_eq!(scores.interactive_score, 0.0);
    }

    #[test]
    fn test_unparseable_response_dropped() {
        let mut answers = survey_answers(STATIC_SURVEY_PAGE, &[5]);
        answers[0].answer = "strongly agree".to_string();
        assert_eq!(usability_score(&answers, STATIC_SURVEY_PAGE), 0.0);
    }

    #[test]
    fn test_out_of_range_clamped() {
        let answers = survey_answers(STATIC_SURVEY_PAGE, &[9]);
        // Clamped to 5: contribution 4, scaled 10.
        assert_eq!(usability_score(&answers, STATIC_SURVEY_PAGE), 10.0);
    }
}
