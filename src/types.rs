//! Core types for the proofstudy pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: raw interaction events, raw answers, per-window event tallies,
//! scored answers, and participant summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Interaction event types captured by the study UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// "Next" navigation between proof steps
    Next,
    Click,
    Hover,
    /// Mouse movement sample
    Mouse,
    /// Pointer movement sample (touch/stylus)
    Pointer,
}

impl EventType {
    /// All event types, in the column order used by the output tables.
    pub const ALL: [EventType; 5] = [
        EventType::Next,
        EventType::Click,
        EventType::Hover,
        EventType::Mouse,
        EventType::Pointer,
    ];

    /// Map the one-letter wire code used by the event log to an event type.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "n" => Some(EventType::Next),
            "c" => Some(EventType::Click),
            "h" => Some(EventType::Hover),
            "m" => Some(EventType::Mouse),
            "p" => Some(EventType::Pointer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Next => "next",
            EventType::Click => "click",
            EventType::Hover => "hover",
            EventType::Mouse => "mouse",
            EventType::Pointer => "pointer",
        }
    }
}

/// A single raw UI interaction event. Immutable once loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Event timestamp (UTC, from epoch milliseconds)
    pub timestamp: DateTime<Utc>,
    /// Event type
    pub event_type: EventType,
}

/// Experimental arm the participant was assigned to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Static,
    Interactive,
}

impl Condition {
    /// Parse the `version` column. Accepts both the long form recorded by the
    /// study UI and the single-letter arm labels used in some exports.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "static" | "A" => Some(Condition::Static),
            "interactive" | "B" => Some(Condition::Interactive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Static => "static",
            Condition::Interactive => "interactive",
        }
    }

    /// Numeric recode used in the output tables (static = 0, interactive = 1).
    pub fn as_code(&self) -> u8 {
        match self {
            Condition::Static => 0,
            Condition::Interactive => 1,
        }
    }
}

/// A single raw answer record from the study UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAnswer {
    /// Answer timestamp (UTC, from epoch milliseconds)
    pub timestamp: DateTime<Utc>,
    /// Page (proof or questionnaire) the question appeared on
    pub page_name: String,
    /// Question identifier within the page
    pub question: String,
    /// Participant's answer text
    pub answer: String,
    /// Experimental arm
    pub condition: Condition,
    /// End of this answer's validity window: the timestamp of the next answer,
    /// or `None` (unbounded) for the participant's last answer.
    pub validity_end: Option<DateTime<Utc>>,
}

impl RawAnswer {
    /// Whether `t` falls inside this answer's validity window `[start, end)`.
    pub fn window_contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.timestamp && self.validity_end.map_or(true, |end| t < end)
    }
}

/// Per-window event counts. All five event types are always materialized;
/// absent types count as zero rather than being omitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTally {
    pub next: u32,
    pub click: u32,
    pub hover: u32,
    pub mouse: u32,
    pub pointer: u32,
}

impl EventTally {
    pub fn get(&self, event_type: EventType) -> u32 {
        match event_type {
            EventType::Next => self.next,
            EventType::Click => self.click,
            EventType::Hover => self.hover,
            EventType::Mouse => self.mouse,
            EventType::Pointer => self.pointer,
        }
    }

    pub fn increment(&mut self, event_type: EventType) {
        match event_type {
            EventType::Next => self.next += 1,
            EventType::Click => self.click += 1,
            EventType::Hover => self.hover += 1,
            EventType::Mouse => self.mouse += 1,
            EventType::Pointer => self.pointer += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.next + self.click + self.hover + self.mouse + self.pointer
    }
}

/// A scored answer: the raw answer joined with its event tally, the scoring
/// outcome, and the running coverage/timing state recorded during the
/// chronological scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredAnswer {
    /// Source answer
    pub answer: RawAnswer,
    /// Events attributed to this answer's validity window
    pub tally: EventTally,
    /// Score: `None` = skipped (page not in key, or tutorial), `Some(0)` =
    /// wrong or no key match, `Some(1)` = correct, `Some(3)` = self-correction
    /// bonus on a correct-proof page.
    pub score: Option<u32>,
    /// Expected answer from the scoring key, when a key entry matched
    pub expected: Option<String>,
    /// Cardinality of the distinct non-pretest pages seen so far.
    /// Non-decreasing across a participant's answer sequence.
    pub pages_seen: u32,
    /// Seconds elapsed since the previous answer (0 for the first)
    pub elapsed_sec: f64,
    /// Qualitative code assigned by external collaborators, joined in later
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Question-type label from collaborator metadata, joined in later
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_type: Option<String>,
}

/// One summary record per participant, persisted in the cumulative
/// summary-scores table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantSummary {
    pub participant: String,
    pub condition: Condition,
    /// Usability score for the participant's arm (0-100)
    pub usability_score: f64,
    /// Pretest score normalized against the maximum attainable pretest score
    pub pretest_ratio: f64,
    /// Activity score normalized against the maximum attainable activity score
    pub activity_ratio: f64,
    /// Marks data collected during a preliminary (non-final) run
    pub pilot: bool,
}
