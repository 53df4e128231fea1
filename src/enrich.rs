//! Enrichment with external collaborator datasets
//!
//! Two collaborator tables are joined onto the scored rows after scoring: a
//! qualitative-coding table (participant, page, question label, code) and a
//! question-type metadata table (page, question label, type). The
//! collaborators label questions loosely ("q3", "Q3:", "qID-3"), so rows are
//! matched on participant id + page + the question's numeric index rather
//! than on exact question strings. Missing matches leave the enrichment
//! fields empty; enrichment is never fatal.

use crate::error::PipelineError;
use crate::table::Table;
use crate::types::ScoredAnswer;
use std::path::Path;

/// One qualitative-coding row from the collaborator file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodingEntry {
    pub participant: String,
    pub page_name: String,
    pub question_label: String,
    pub code: String,
}

/// One question-type row from the collaborator file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionTypeEntry {
    pub page_name: String,
    pub question_label: String,
    pub question_type: String,
}

/// Extract the numeric index from a question label: the first run of digits,
/// e.g. "qID-11" → "11", "q3: why?" → "3".
pub fn question_index(label: &str) -> Option<&str> {
    let start = label.find(|c: char| c.is_ascii_digit())?;
    let rest = &label[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

fn question_matches(a: &str, b: &str) -> bool {
    match (question_index(a), question_index(b)) {
        (Some(ia), Some(ib)) => ia == ib,
        _ => a == b,
    }
}

/// Parse the qualitative-coding table.
pub fn parse_coding(text: &str) -> Result<Vec<CodingEntry>, PipelineError> {
    let table = Table::parse(text)?;
    let participant_col = table.column("participant")?;
    let page_col = table.column("pageName")?;
    let question_col = table.column("question")?;
    let code_col = table.column("code")?;

    Ok(table
        .rows()
        .iter()
        .map(|row| CodingEntry {
            participant: row[participant_col].clone(),
            page_name: row[page_col].clone(),
            question_label: row[question_col].clone(),
            code: row[code_col].clone(),
        })
        .collect())
}

/// Parse the question-type metadata table.
pub fn parse_question_types(text: &str) -> Result<Vec<QuestionTypeEntry>, PipelineError> {
    let table = Table::parse(text)?;
    let page_col = table.column("pageName")?;
    let question_col = table.column("question")?;
    let type_col = table.column("type")?;

    Ok(table
        .rows()
        .iter()
        .map(|row| QuestionTypeEntry {
            page_name: row[page_col].clone(),
            question_label: row[question_col].clone(),
            question_type: row[type_col].clone(),
        })
        .collect())
}

pub fn load_coding(path: &Path) -> Result<Vec<CodingEntry>, PipelineError> {
    let text = std::fs::read_to_string(path).map_err(|source| PipelineError::Load {
        path: path.display().to_string(),
        source,
    })?;
    parse_coding(&text)
}

pub fn load_question_types(path: &Path) -> Result<Vec<QuestionTypeEntry>, PipelineError> {
    let text = std::fs::read_to_string(path).map_err(|source| PipelineError::Load {
        path: path.display().to_string(),
        source,
    })?;
    parse_question_types(&text)
}

/// Join qualitative codes onto this participant's scored rows.
pub fn apply_coding(rows: &mut [ScoredAnswer], participant: &str, coding: &[CodingEntry]) {
    for row in rows.iter_mut() {
        let matched = coding.iter().find(|entry| {
            entry.participant == participant
                && entry.page_name == row.answer.page_name
                && question_matches(&entry.question_label, &row.answer.question)
        });
        row.code = matched.map(|entry| entry.code.clone());
    }
}

/// Join question-type metadata onto scored rows.
pub fn apply_question_types(rows: &mut [ScoredAnswer], types: &[QuestionTypeEntry]) {
    for row in rows.iter_mut() {
        let matched = types.iter().find(|entry| {
            entry.page_name == row.answer.page_name
                && question_matches(&entry.question_label, &row.answer.question)
        });
        row.question_type = matched.map(|entry| entry.question_type.clone());
    }
}
