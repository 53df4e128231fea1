//! Proofstudy - cleaning and scoring pipeline for proof-comprehension study logs
//!
//! Proofstudy transforms a participant's raw experiment logs (timestamped
//! answers plus UI interaction events) into a cleaned, scored, per-question
//! dataset through a deterministic batch pipeline: load → clean → time-join →
//! tally → score → aggregate.
//!
//! ## Stages
//!
//! - **Loaders**: answer records and interaction events, time-sorted with
//!   validity windows computed ([`answers`], [`events`])
//! - **Interval Tally Engine**: debounced per-window event counts ([`tally`])
//! - **Scoring Engine**: grading against the scoring key ([`scoring`], [`key`])
//! - **Aggregators**: usability score and participant summaries ([`survey`],
//!   [`summary`])

pub mod answers;
pub mod enrich;
pub mod error;
pub mod events;
pub mod key;
pub mod pipeline;
pub mod scoring;
pub mod summary;
pub mod survey;
pub mod table;
pub mod tally;
pub mod types;

pub use answers::{load_answers, parse_answers, BackgroundProfile};
pub use error::PipelineError;
pub use events::{load_events, parse_events};
pub use key::AnswerKey;
pub use pipeline::{ParticipantOutput, Pipeline, TimingStore};
pub use scoring::{score_answers, ScoreTotals};
pub use summary::{summarize, SummaryStore};
pub use survey::{usability_score, SurveyScores};
pub use tally::{debounce, tally_windows};
pub use types::{
    Condition, EventTally, EventType, ParticipantSummary, RawAnswer, RawEvent, ScoredAnswer,
};

/// Pipeline version embedded in CLI reports
pub const PIPELINE_VERSION: &str = env!("CARGO_PKG_VERSION");
