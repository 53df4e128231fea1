//! Interval Tally Engine
//!
//! Attributes interaction events to the enclosing answer's validity window,
//! debounces rapid-fire hover events, and counts the survivors per type.
//! Windows are disjoint and exhaustive: summing the per-window counts across a
//! participant reproduces the raw per-type totals minus debounced hovers.

use crate::types::{EventTally, EventType, RawAnswer, RawEvent};

/// Debounce threshold: a hover this close to the preceding event is noise.
pub const DEBOUNCE_WINDOW_MS: i64 = 10;

/// Drop hover events that fire within [`DEBOUNCE_WINDOW_MS`] of the
/// immediately preceding event in the full raw stream.
///
/// The gap is measured against the previous raw event, not the previous
/// surviving event, so the first hover of a burst survives and the rest of
/// the burst is dropped one comparison at a time. `events` must already be
/// time-sorted.
pub fn debounce(events: &[RawEvent]) -> Vec<RawEvent> {
    let mut retained = Vec::with_capacity(events.len());
    for (i, event) in events.iter().enumerate() {
        if event.event_type == EventType::Hover && i > 0 {
            let gap_ms = (event.timestamp - events[i - 1].timestamp).num_milliseconds();
            if gap_ms <= DEBOUNCE_WINDOW_MS {
                continue;
            }
        }
        retained.push(*event);
    }
    retained
}

/// Count debounced events inside each answer's validity window.
///
/// Returns one tally per answer, in answer order, with all five event types
/// zero-filled. Both slices must be time-sorted; a single forward walk over
/// the event stream covers every window because the windows partition the
/// timeline.
pub fn tally_windows(answers: &[RawAnswer], events: &[RawEvent]) -> Vec<EventTally> {
    let events = debounce(events);
    let mut tallies = vec![EventTally::default(); answers.len()];

    let mut cursor = 0;
    for (i, answer) in answers.iter().enumerate() {
        // Events before the first window are not attributable to any answer.
        while cursor < events.len() && events[cursor].timestamp < answer.timestamp {
            cursor += 1;
        }
        while cursor < events.len() && answer.window_contains(events[cursor].timestamp) {
            tallies[i].increment(events[cursor].event_type);
            cursor += 1;
        }
    }

    tallies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Condition;
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn at_millis(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_709_290_000_000 + ms).single().unwrap()
    }

    fn event(ms: i64, event_type: EventType) -> RawEvent {
        RawEvent {
            timestamp: at_millis(ms),
            event_type,
        }
    }

    fn answer(start_ms: i64, end_ms: Option<i64>) -> RawAnswer {
        RawAnswer {
            timestamp: at_millis(start_ms),
            page_name: "S1_C1".to_string(),
            question: "qID-0".to_string(),
            answer: "Yes".to_string(),
            condition: Condition::Static,
            validity_end: end_ms.map(at_millis),
        }
    }

    #[test]
    fn test_hover_debounce_against_previous_raw_event() {
        // Hovers at 0ms, 5ms, 20ms: the 5ms hover is within 10ms of the
        // previous raw event and is dropped; the 20ms hover is 15ms after the
        // previous raw event (5ms) and survives.
        let events = vec![
            event(0, EventType::Hover),
            event(5, EventType::Hover),
            event(20, EventType::Hover),
        ];
        let retained = debounce(&events);

        assert_eq!(retained.len(), 2);
        assert_eq!(retained[0].timestamp, at_millis(0));
        assert_eq!(retained[1].timestamp, at_millis(20));
    }

    #[test]
    fn test_debounce_only_affects_hovers() {
        let events = vec![
            event(0, EventType::Click),
            event(3, EventType::Click),
            event(6, EventType::Hover),
        ];
        let retained = debounce(&events);

        // Rapid clicks survive; only the hover close behind one is dropped.
        assert_eq!(retained.len(), 2);
        assert!(retained.iter().all(|e| e.event_type == EventType::Click));
    }

    #[test]
    fn test_burst_keeps_first_hover() {
        // A burst of sub-threshold hovers after a click: every hover is
        // within 10ms of its raw predecessor, so none survive except ones
        // spaced out past the threshold.
        let events = vec![
            event(0, EventType::Click),
            event(100, EventType::Hover),
            event(105, EventType::Hover),
            event(109, EventType::Hover),
            event(130, EventType::Hover),
        ];
        let retained = debounce(&events);

        let hover_times: Vec<i64> = retained
            .iter()
            .filter(|e| e.event_type == EventType::Hover)
            .map(|e| (e.timestamp - at_millis(0)).num_milliseconds())
            .collect();
        assert_eq!(hover_times, vec![100, 130]);
    }

    #[test]
    fn test_windows_partition_events() {
        let answers = vec![
            answer(0, Some(1000)),
            answer(1000, Some(2000)),
            answer(2000, None),
        ];
        let events = vec![
            event(100, EventType::Click),
            event(999, EventType::Next),
            event(1000, EventType::Mouse), // boundary: belongs to second window
            event(1500, EventType::Pointer),
            event(5000, EventType::Click), // unbounded last window
        ];

        let tallies = tally_windows(&answers, &events);

        assert_eq!(tallies[0].click, 1);
        assert_eq!(tallies[0].next, 1);
        assert_eq!(tallies[1].mouse, 1);
        assert_eq!(tallies[1].pointer, 1);
        assert_eq!(tallies[2].click, 1);
    }

    #[test]
    fn test_count_conservation() {
        let answers = vec![answer(0, Some(1000)), answer(1000, None)];
        let events = vec![
            event(10, EventType::Hover),
            event(15, EventType::Hover), // debounced
            event(500, EventType::Click),
            event(1200, EventType::Hover),
            event(1600, EventType::Mouse),
        ];

        let tallies = tally_windows(&answers, &events);
        let total: u32 = tallies.iter().map(|t| t.total()).sum();

        // 5 raw events minus 1 debounced hover
        assert_eq!(total, 4);
        let hover_total: u32 = tallies.iter().map(|t| t.hover).sum();
        assert_eq!(hover_total, 2);
    }

    #[test]
    fn test_all_types_zero_filled() {
        let answers = vec![answer(0, None)];
        let tallies = tally_windows(&answers, &[]);

        assert_eq!(tallies.len(), 1);
        for event_type in EventType::ALL {
            assert_eq!(tallies[0].get(event_type), 0);
        }
    }

    #[test]
    fn test_events_before_first_window_ignored() {
        let answers = vec![answer(1000, None)];
        let events = vec![event(100, EventType::Click), event(1100, EventType::Click)];

        let tallies = tally_windows(&answers, &events);
        assert_eq!(tallies[0].click, 1);
    }
}
