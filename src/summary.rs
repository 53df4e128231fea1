//! Participant summary aggregation and the persisted summary-scores table
//!
//! Rolls the per-answer scores into one record per participant (usability
//! score for their arm, pretest and activity ratios against the maximum
//! attainable scores) and manages the cumulative on-disk table with upsert
//! semantics: read the whole table, amend in memory, rewrite wholesale.

use crate::error::PipelineError;
use crate::key::AnswerKey;
use crate::scoring::{ScoreTotals, CORRECT_PROOF_PAGES, SELF_CORRECTION_BONUS};
use crate::survey::SurveyScores;
use crate::table::Table;
use crate::types::{Condition, ParticipantSummary};
use std::path::Path;

/// Build the summary record for one participant.
///
/// The usability score reported is the one for the participant's own arm.
/// Activity max score accounts for the self-correction bonus: on each known
/// correct-proof page the bonus replaces a 1-point item, adding
/// `SELF_CORRECTION_BONUS - 1` attainable points.
pub fn summarize(
    participant: &str,
    condition: Condition,
    pilot: bool,
    totals: &ScoreTotals,
    survey: &SurveyScores,
    key: &AnswerKey,
) -> ParticipantSummary {
    let usability_score = match condition {
        Condition::Static => survey.static_score,
        Condition::Interactive => survey.interactive_score,
    };

    let pretest_max = key.pretest_max_score();
    let activity_max =
        key.activity_max_score(&CORRECT_PROOF_PAGES, SELF_CORRECTION_BONUS - 1);

    ParticipantSummary {
        participant: participant.to_string(),
        condition,
        usability_score,
        pretest_ratio: ratio(totals.pretest_score, pretest_max),
        activity_ratio: ratio(totals.activity_score, activity_max),
        pilot,
    }
}

fn ratio(score: u32, max: u32) -> f64 {
    if max == 0 {
        0.0
    } else {
        score as f64 / max as f64
    }
}

const SUMMARY_HEADERS: [&str; 6] = [
    "participant",
    "condition",
    "usability",
    "pretest_ratio",
    "activity_ratio",
    "pilot",
];

/// The cumulative summary-scores table. Loaded whole, amended in memory,
/// rewritten in full; single-invoker batch use, no locking.
#[derive(Debug, Clone, Default)]
pub struct SummaryStore {
    records: Vec<ParticipantSummary>,
}

impl SummaryStore {
    pub fn new() -> Self {
        SummaryStore::default()
    }

    /// Parse a previously persisted table. Duplicate rows for a participant
    /// are dropped, keeping the first.
    pub fn parse(text: &str) -> Result<Self, PipelineError> {
        let table = Table::parse(text)?;
        let participant_col = table.column("participant")?;
        let condition_col = table.column("condition")?;
        let usability_col = table.column("usability")?;
        let pretest_col = table.column("pretest_ratio")?;
        let activity_col = table.column("activity_ratio")?;
        let pilot_col = table.column("pilot")?;

        let mut store = SummaryStore::new();
        for (i, row) in table.rows().iter().enumerate() {
            let malformed = |reason: String| PipelineError::MalformedRow {
                row: i + 2,
                reason,
            };
            let condition = Condition::parse(&row[condition_col])
                .ok_or_else(|| malformed(format!("unknown condition '{}'", row[condition_col])))?;
            let parse_f64 = |field: &str| {
                field
                    .parse::<f64>()
                    .map_err(|_| malformed(format!("expected number, found '{}'", field)))
            };

            let record = ParticipantSummary {
                participant: row[participant_col].clone(),
                condition,
                usability_score: parse_f64(&row[usability_col])?,
                pretest_ratio: parse_f64(&row[pretest_col])?,
                activity_ratio: parse_f64(&row[activity_col])?,
                pilot: row[pilot_col] == "true",
            };

            if store.get(&record.participant).is_some() {
                log::warn!("dropping duplicate summary row for '{}'", record.participant);
                continue;
            }
            store.records.push(record);
        }

        Ok(store)
    }

    /// Load the table from disk; a missing file yields an empty store (the
    /// first run creates it).
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SummaryStore::new()),
            Err(source) => Err(PipelineError::Load {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    pub fn get(&self, participant: &str) -> Option<&ParticipantSummary> {
        self.records.iter().find(|r| r.participant == participant)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Insert or replace this participant's record. With `overwrite` the
    /// prior record is removed first; without it, insertion is skipped when a
    /// record already exists. Returns whether the record was inserted.
    pub fn upsert(&mut self, record: ParticipantSummary, overwrite: bool) -> bool {
        if self.get(&record.participant).is_some() {
            if !overwrite {
                log::debug!(
                    "summary for '{}' already present, skipping",
                    record.participant
                );
                return false;
            }
            self.records.retain(|r| r.participant != record.participant);
        }
        self.records.push(record);
        true
    }

    /// Encode the whole table for rewriting.
    pub fn encode(&self) -> String {
        let mut table = Table::new(&SUMMARY_HEADERS);
        for r in &self.records {
            table.push_row(vec![
                r.participant.clone(),
                r.condition.as_str().to_string(),
                format_float(r.usability_score),
                format_float(r.pretest_ratio),
                format_float(r.activity_ratio),
                r.pilot.to_string(),
            ]);
        }
        table.encode()
    }

    /// Rewrite the table on disk wholesale.
    pub fn save(&self, path: &Path) -> Result<(), PipelineError> {
        std::fs::write(path, self.encode())?;
        Ok(())
    }
}

pub(crate) fn format_float(value: f64) -> String {
    // Trim trailing zeros but keep the decimal point for round numbers so
    // the column stays visibly numeric.
    let s = format!("{:.4}", value);
    let trimmed = s.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{}0", trimmed)
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(participant: &str, usability: f64) -> ParticipantSummary {
        ParticipantSummary {
            participant: participant.to_string(),
            condition: Condition::Interactive,
            usability_score: usability,
            pretest_ratio: 0.75,
            activity_ratio: 0.5,
            pilot: false,
        }
    }

    #[test]
    fn test_summarize_ratios() {
        let key = AnswerKey::parse(
            "pageName,question,answer\n\
             P1,qID-0,Yes\n\
             P1,qID-1,No\n\
             S1_C1,qID-0,X\n\
             S2_C2,qID-11,No\n",
        )
        .unwrap();
        let totals = ScoreTotals {
            pretest_score: 1,
            pretest_attempted: 2,
            activity_score: 4,
        };
        let survey = SurveyScores {
            static_score: 40.0,
            interactive_score: 80.0,
        };

        let summary = summarize("pa", Condition::Interactive, false, &totals, &survey, &key);

        assert_eq!(summary.usability_score, 80.0);
        assert_eq!(summary.pretest_ratio, 0.5);
        // Activity max: 2 key entries + bonus increment 2 for S2_C2 = 4
        assert_eq!(summary.activity_ratio, 1.0);
    }

    #[test]
    fn test_upsert_skips_without_overwrite() {
        let mut store = SummaryStore::new();
        assert!(store.upsert(record("pa", 50.0), false));
        assert!(!store.upsert(record("pa", 90.0), false));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("pa").unwrap().usability_score, 50.0);
    }

    #[test]
    fn test_upsert_replaces_with_overwrite() {
        let mut store = SummaryStore::new();
        store.upsert(record("pa", 50.0), true);
        store.upsert(record("pa", 90.0), true);

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("pa").unwrap().usability_score, 90.0);
    }

    #[test]
    fn test_rerun_is_idempotent() {
        // Two full load → upsert → encode cycles with overwrite leave
        // exactly one row for the participant.
        let mut store = SummaryStore::new();
        store.upsert(record("pilotB", 72.5), true);
        let first_pass = store.encode();

        let mut reloaded = SummaryStore::parse(&first_pass).unwrap();
        reloaded.upsert(record("pilotB", 72.5), true);
        let second_pass = reloaded.encode();

        assert_eq!(first_pass, second_pass);
        assert_eq!(SummaryStore::parse(&second_pass).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_round_trip() {
        let mut store = SummaryStore::new();
        store.upsert(record("pa", 82.5), true);
        let mut pilot = record("pilotB", 60.0);
        pilot.pilot = true;
        store.upsert(pilot, true);

        let parsed = SummaryStore::parse(&store.encode()).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.get("pa").unwrap().usability_score, 82.5);
        assert!(parsed.get("pilotB").unwrap().pilot);
    }

    #[test]
    fn test_duplicate_rows_dropped_on_parse() {
        let text = "participant,condition,usability,pretest_ratio,activity_ratio,pilot\n\
                    pa,static,50.0,0.5,0.5,false\n\
                    pa,static,99.0,0.9,0.9,false\n";
        let store = SummaryStore::parse(text).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("pa").unwrap().usability_score, 50.0);
    }

    #[test]
    fn test_missing_file_yields_empty_store() {
        let store = SummaryStore::load(Path::new("out/does-not-exist.csv")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(0.5), "0.5");
        assert_eq!(format_float(82.5), "82.5");
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(0.3333333), "0.3333");
    }
}
