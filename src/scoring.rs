//! Scoring Engine
//!
//! Grades each answer against the scoring key in a single chronological fold.
//! The accumulator carries the pages-seen set, the previous answer time, and
//! the running pretest/activity score totals; no module-level state.
//!
//! Per answer, the first matching rule wins:
//! 1. skip (score = None): tutorial page, or page absent from the key;
//! 2. self-correction bonus: a correct-proof page, the mistake-detection
//!    item, and the answer "No" scores a fixed bonus regardless of the key;
//! 3. key lookup miss: score 0 with no expected answer;
//! 4. standard comparison against the key's expected answer: 0 or 1.

use crate::key::{is_pretest_page, is_tutorial_page, AnswerKey};
use crate::types::{EventTally, RawAnswer, ScoredAnswer};
use std::collections::HashSet;

/// Pages whose proof is intentionally fully correct. The mistake-detection
/// item on these pages has no real error to find.
pub const CORRECT_PROOF_PAGES: [&str; 2] = ["S2_C2", "S3_C1"];

/// The "is there a mistake in this proof?" item present on every proof page
pub const MISTAKE_QUESTION: &str = "qID-11";

/// Answer that correctly reports the absence of an error
pub const NO_MISTAKE_ANSWER: &str = "No";

/// Score awarded for correctly detecting that a proof contains no error.
/// Detecting no error implies correct performance on the two follow-up items
/// that are skipped when nothing was flagged, hence 3 instead of 1.
pub const SELF_CORRECTION_BONUS: u32 = 3;

/// Running score totals accumulated during the chronological fold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreTotals {
    /// Points earned on pretest pages
    pub pretest_score: u32,
    /// Pretest items attempted (scored, not skipped)
    pub pretest_attempted: u32,
    /// Points earned on activity pages, bonus included
    pub activity_score: u32,
}

/// Score every answer in chronological order, joining in the per-window event
/// tallies. `answers` and `tallies` must be index-aligned (one tally per
/// answer, as produced by [`crate::tally::tally_windows`]).
pub fn score_answers(
    answers: &[RawAnswer],
    tallies: &[EventTally],
    key: &AnswerKey,
) -> (Vec<ScoredAnswer>, ScoreTotals) {
    debug_assert_eq!(answers.len(), tallies.len());

    let mut scored = Vec::with_capacity(answers.len());
    let mut totals = ScoreTotals::default();
    let mut pages_seen: HashSet<String> = HashSet::new();
    let mut last_time: Option<chrono::DateTime<chrono::Utc>> = None;

    for (answer, tally) in answers.iter().zip(tallies) {
        let elapsed_sec = last_time
            .map(|t| (answer.timestamp - t).num_milliseconds() as f64 / 1000.0)
            .unwrap_or(0.0);
        last_time = Some(answer.timestamp);

        let page = answer.page_name.as_str();
        let (score, expected) = grade(answer, key);

        if let Some(points) = score {
            if is_pretest_page(page) {
                totals.pretest_score += points;
                totals.pretest_attempted += 1;
            } else {
                totals.activity_score += points;
                pages_seen.insert(page.to_string());
            }
        }

        scored.push(ScoredAnswer {
            answer: answer.clone(),
            tally: *tally,
            score,
            expected,
            pages_seen: pages_seen.len() as u32,
            elapsed_sec,
            code: None,
            question_type: None,
        });
    }

    (scored, totals)
}

/// Grade a single answer. Returns `(score, expected)`.
fn grade(answer: &RawAnswer, key: &AnswerKey) -> (Option<u32>, Option<String>) {
    let page = answer.page_name.as_str();

    if is_tutorial_page(page) || !key.contains_page(page) {
        return (None, None);
    }

    if CORRECT_PROOF_PAGES.contains(&page)
        && answer.question == MISTAKE_QUESTION
        && answer.answer == NO_MISTAKE_ANSWER
    {
        return (Some(SELF_CORRECTION_BONUS), Some(NO_MISTAKE_ANSWER.to_string()));
    }

    match key.lookup(page, &answer.question) {
        Some(expected) => {
            let points = if answer.answer == expected { 1 } else { 0 };
            (Some(points), Some(expected.to_string()))
        }
        None => {
            log::warn!("no key entry for ({}, {})", page, answer.question);
            (Some(0), None)
        }
    }
}
