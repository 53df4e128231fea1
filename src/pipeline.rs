//! Pipeline orchestration
//!
//! Processes one participant start-to-finish: load events, load answers,
//! tally events into answer windows, score, compute survey scores, and roll
//! up the participant summary. Also encodes the output tables: the
//! per-answer table (one row per answer, enriched with tallies and scores)
//! and the cumulative per-question timing table.

use crate::answers::{parse_answers, BackgroundProfile, BACKGROUND_PAGE};
use crate::error::PipelineError;
use crate::events::parse_events;
use crate::key::{is_pretest_page, is_tutorial_page, AnswerKey};
use crate::scoring::{score_answers, ScoreTotals};
use crate::summary::{format_float, summarize};
use crate::survey::{SurveyScores, INTERACTIVE_SURVEY_PAGE, STATIC_SURVEY_PAGE};
use crate::table::Table;
use crate::types::{Condition, ParticipantSummary, ScoredAnswer};
use std::path::Path;

/// The full processed record for one participant.
#[derive(Debug, Clone)]
pub struct ParticipantOutput {
    pub participant: String,
    pub condition: Condition,
    /// One scored row per raw answer, in chronological order
    pub rows: Vec<ScoredAnswer>,
    pub totals: ScoreTotals,
    pub survey: SurveyScores,
    pub profile: BackgroundProfile,
    pub summary: ParticipantSummary,
}

/// One-shot batch pipeline over a loaded scoring key.
#[derive(Debug, Clone)]
pub struct Pipeline {
    key: AnswerKey,
}

impl Pipeline {
    pub fn new(key: AnswerKey) -> Self {
        Pipeline { key }
    }

    pub fn key(&self) -> &AnswerKey {
        &self.key
    }

    /// Process one participant's raw answer and event-log text.
    pub fn process(
        &self,
        participant: &str,
        pilot: bool,
        answers_text: &str,
        events_text: &str,
    ) -> Result<ParticipantOutput, PipelineError> {
        let answers = parse_answers(answers_text)?;
        if answers.is_empty() {
            return Err(PipelineError::EmptyInput);
        }
        let events = parse_events(events_text)?;

        let condition = answers[0].condition;
        let tallies = crate::tally::tally_windows(&answers, &events);
        let (rows, totals) = score_answers(&answers, &tallies, &self.key);
        let survey = SurveyScores::compute(&answers);
        let profile = BackgroundProfile::extract(&answers);
        let summary = summarize(participant, condition, pilot, &totals, &survey, &self.key);

        log::debug!(
            "processed participant '{}': {} rows, activity ratio {:.2}",
            participant,
            rows.len(),
            summary.activity_ratio
        );

        Ok(ParticipantOutput {
            participant: participant.to_string(),
            condition,
            rows,
            totals,
            survey,
            profile,
            summary,
        })
    }

    /// Encode the per-answer output table.
    ///
    /// Survey, background, pretest and tutorial rows are dropped after their
    /// information has been folded into the per-row columns (background
    /// profile, pretest ratio, SUS scores).
    pub fn encode_answer_table(&self, output: &ParticipantOutput) -> String {
        let mut table = Table::new(&[
            "participant",
            "time",
            "pageName",
            "question",
            "answer",
            "condition",
            "next",
            "click",
            "hover",
            "mouse",
            "pointer",
            "score",
            "key",
            "pages_seen",
            "delta",
            "age",
            "year_taken",
            "grade",
            "track",
            "pretest_ratio",
            "static_sus",
            "inter_sus",
            "code",
            "question_type",
        ]);

        let opt = |v: &Option<String>| v.clone().unwrap_or_default();

        for row in output.rows.iter().filter(|r| is_procedure_row(r)) {
            table.push_row(vec![
                output.participant.clone(),
                row.answer.timestamp.timestamp_millis().to_string(),
                row.answer.page_name.clone(),
                row.answer.question.clone(),
                row.answer.answer.clone(),
                row.answer.condition.as_code().to_string(),
                row.tally.next.to_string(),
                row.tally.click.to_string(),
                row.tally.hover.to_string(),
                row.tally.mouse.to_string(),
                row.tally.pointer.to_string(),
                row.score.map(|s| s.to_string()).unwrap_or_default(),
                opt(&row.expected),
                row.pages_seen.to_string(),
                format_float(row.elapsed_sec),
                opt(&output.profile.age),
                opt(&output.profile.year_taken),
                opt(&output.profile.grade),
                output.profile.track.clone(),
                format_float(output.summary.pretest_ratio),
                format_float(output.survey.static_score),
                format_float(output.survey.interactive_score),
                opt(&row.code),
                opt(&row.question_type),
            ]);
        }

        table.encode()
    }

    /// Extract this participant's rows for the cumulative timing table.
    pub fn timing_rows(&self, output: &ParticipantOutput) -> Vec<TimingRow> {
        output
            .rows
            .iter()
            .filter(|r| is_procedure_row(r))
            .map(|r| TimingRow {
                participant: output.participant.clone(),
                page_name: r.answer.page_name.clone(),
                question: r.answer.question.clone(),
                elapsed_sec: r.elapsed_sec,
            })
            .collect()
    }
}

/// Whether a scored row belongs to the main study procedure (not a survey,
/// background, pretest, or tutorial row).
fn is_procedure_row(row: &ScoredAnswer) -> bool {
    let page = row.answer.page_name.as_str();
    page != BACKGROUND_PAGE
        && page != STATIC_SURVEY_PAGE
        && page != INTERACTIVE_SURVEY_PAGE
        && !is_pretest_page(page)
        && !is_tutorial_page(page)
}

/// One row of the cumulative per-question timing table
#[derive(Debug, Clone, PartialEq)]
pub struct TimingRow {
    pub participant: String,
    pub page_name: String,
    pub question: String,
    pub elapsed_sec: f64,
}

const TIMING_HEADERS: [&str; 4] = ["participant", "pageName", "question", "delta"];

/// The cumulative per-question timing table. Same read-amend-rewrite
/// discipline as the summary store, keyed per participant.
#[derive(Debug, Clone, Default)]
pub struct TimingStore {
    rows: Vec<TimingRow>,
}

impl TimingStore {
    pub fn new() -> Self {
        TimingStore::default()
    }

    pub fn parse(text: &str) -> Result<Self, PipelineError> {
        let table = Table::parse(text)?;
        let participant_col = table.column("participant")?;
        let page_col = table.column("pageName")?;
        let question_col = table.column("question")?;
        let delta_col = table.column("delta")?;

        let mut rows = Vec::with_capacity(table.rows().len());
        for (i, row) in table.rows().iter().enumerate() {
            let elapsed_sec =
                row[delta_col]
                    .parse::<f64>()
                    .map_err(|_| PipelineError::MalformedRow {
                        row: i + 2,
                        reason: format!("expected number, found '{}'", row[delta_col]),
                    })?;
            rows.push(TimingRow {
                participant: row[participant_col].clone(),
                page_name: row[page_col].clone(),
                question: row[question_col].clone(),
                elapsed_sec,
            });
        }
        Ok(TimingStore { rows })
    }

    /// Load from disk; a missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TimingStore::new()),
            Err(source) => Err(PipelineError::Load {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    pub fn contains_participant(&self, participant: &str) -> bool {
        self.rows.iter().any(|r| r.participant == participant)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Replace or insert all rows for one participant. Same upsert semantics
    /// as the summary store. Returns whether the rows were inserted.
    pub fn upsert_participant(
        &mut self,
        participant: &str,
        rows: Vec<TimingRow>,
        overwrite: bool,
    ) -> bool {
        if self.contains_participant(participant) {
            if !overwrite {
                log::debug!("timing rows for '{}' already present, skipping", participant);
                return false;
            }
            self.rows.retain(|r| r.participant != participant);
        }
        self.rows.extend(rows);
        true
    }

    pub fn encode(&self) -> String {
        let mut table = Table::new(&TIMING_HEADERS);
        for r in &self.rows {
            table.push_row(vec![
                r.participant.clone(),
                r.page_name.clone(),
                r.question.clone(),
                format_float(r.elapsed_sec),
            ]);
        }
        table.encode()
    }

    pub fn save(&self, path: &Path) -> Result<(), PipelineError> {
        std::fs::write(path, self.encode())?;
        Ok(())
    }
}
