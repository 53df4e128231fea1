//! Event Loader
//!
//! Reads the raw interaction event log (`t` = epoch milliseconds, `e` =
//! one-letter event code), maps the codes to canonical event types, and sorts
//! ascending by timestamp. Sorting is stable, so events with equal timestamps
//! keep their original file order.

use crate::error::PipelineError;
use crate::table::Table;
use crate::types::{EventType, RawEvent};
use chrono::{DateTime, TimeZone, Utc};
use std::path::Path;

/// Parse raw event-log text into a time-sorted event sequence.
///
/// Unknown event codes are skipped with a warning; the study UI only ever
/// emitted the five known codes, so anything else is stray instrumentation.
pub fn parse_events(text: &str) -> Result<Vec<RawEvent>, PipelineError> {
    let table = Table::parse(text)?;
    let time_col = table.column("t")?;
    let event_col = table.column("e")?;

    let mut events = Vec::with_capacity(table.rows().len());
    for row in table.rows() {
        let timestamp = parse_epoch_millis(&row[time_col])?;
        match EventType::from_code(&row[event_col]) {
            Some(event_type) => events.push(RawEvent {
                timestamp,
                event_type,
            }),
            None => {
                log::warn!("skipping unknown event code '{}'", row[event_col]);
            }
        }
    }

    events.sort_by_key(|e| e.timestamp);
    log::debug!("loaded {} events", events.len());
    Ok(events)
}

/// Load and parse an event-log file.
pub fn load_events(path: &Path) -> Result<Vec<RawEvent>, PipelineError> {
    let text = std::fs::read_to_string(path).map_err(|source| PipelineError::Load {
        path: path.display().to_string(),
        source,
    })?;
    parse_events(&text)
}

/// Parse a millisecond epoch timestamp field.
pub(crate) fn parse_epoch_millis(field: &str) -> Result<DateTime<Utc>, PipelineError> {
    let millis: i64 = field
        .trim()
        .parse()
        .map_err(|_| PipelineError::TimestampParse(field.to_string()))?;
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| PipelineError::TimestampParse(field.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_and_sort_events() {
        let text = "t,e\n1709290000300,c\n1709290000100,h\n1709290000200,n\n";
        let events = parse_events(text).unwrap();

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].event_type, EventType::Hover);
        assert_eq!(events[1].event_type, EventType::Next);
        assert_eq!(events[2].event_type, EventType::Click);
        assert!(events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_equal_timestamps_keep_file_order() {
        let text = "t,e\n1709290000100,h\n1709290000100,c\n1709290000100,m\n";
        let events = parse_events(text).unwrap();

        assert_eq!(events[0].event_type, EventType::Hover);
        assert_eq!(events[1].event_type, EventType::Click);
        assert_eq!(events[2].event_type, EventType::Mouse);
    }

    #[test]
    fn test_unknown_codes_skipped() {
        let text = "t,e\n1709290000100,h\n1709290000200,z\n";
        let events = parse_events(text).unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_bad_timestamp_is_fatal() {
        let text = "t,e\nnot-a-time,h\n";
        assert!(matches!(
            parse_events(text),
            Err(PipelineError::TimestampParse(_))
        ));
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let text = "time,e\n1709290000100,h\n";
        assert!(matches!(
            parse_events(text),
            Err(PipelineError::SchemaMismatch(c)) if c == "t"
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = load_events(Path::new("raw_data/eventLogs-missing.csv"));
        assert!(matches!(result, Err(PipelineError::Load { .. })));
    }
}
