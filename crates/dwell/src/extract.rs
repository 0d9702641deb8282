//! Turning a raw issue record into an ordered timeline of state transitions.
//!
//! The timeline always starts with a synthetic creation event (`from_state`
//! absent). Changelog entries that touch the state field follow in
//! chronological order. Entries that cannot be placed on the timeline (no
//! timestamp, unparsable timestamp, no target state) are dropped and reported
//! through [`Extraction::skipped`]; they never abort extraction. Only problems
//! with the record's own creation data are fatal.

use tracing::debug;

use crate::domain::{History, IssueRecord, SkipReason, SkippedEvent, StateTransition};
use crate::errors::ExtractError;
use crate::timestamp::{parse_timestamp, Timestamp};

/// Changelog field name that carries workflow state changes.
pub const DEFAULT_STATE_FIELD: &str = "status";

/// Timeline extracted from one record, plus the events left out of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub transitions: Vec<StateTransition>,
    pub skipped: Vec<SkippedEvent>,
}

/// Extract the ordered state transitions of `record`.
///
/// `state_field` selects which changelog items count as state changes
/// (usually [`DEFAULT_STATE_FIELD`]); items for any other field are ignored.
///
/// # Errors
///
/// - [`ExtractError::MissingField`] if the creation timestamp or the current
///   state name is absent.
/// - [`ExtractError::TimestampParse`] if the creation timestamp is unparsable.
pub fn extract_transitions(
    record: &IssueRecord,
    state_field: &str,
) -> Result<Extraction, ExtractError> {
    let fields = record
        .fields
        .as_ref()
        .ok_or(ExtractError::MissingField("fields"))?;

    let created_raw = fields
        .created
        .as_deref()
        .ok_or(ExtractError::MissingField("fields.created"))?;
    let created = parse_timestamp(created_raw).map_err(|_| ExtractError::TimestampParse {
        field: "fields.created",
        raw: created_raw.to_string(),
    })?;

    let current_state = fields
        .status
        .as_ref()
        .and_then(|status| status.name.as_deref())
        .ok_or(ExtractError::MissingField("fields.status.name"))?;

    let histories = record
        .changelog
        .as_ref()
        .and_then(|changelog| changelog.histories.as_deref())
        .unwrap_or_default();

    if histories.is_empty() {
        return Ok(Extraction {
            transitions: vec![StateTransition::creation(created, current_state)],
            skipped: Vec::new(),
        });
    }

    let mut events = Vec::new();
    let mut skipped = Vec::new();

    for (index, history) in histories.iter().enumerate() {
        let mut timestamp: Option<Result<Timestamp, SkipReason>> = None;

        for item in history
            .items
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|item| item.field.as_deref() == Some(state_field))
        {
            let at = match timestamp.get_or_insert_with(|| history_timestamp(history)) {
                Ok(at) => *at,
                Err(reason) => {
                    skipped.push(SkippedEvent {
                        history_index: index,
                        reason: reason.clone(),
                    });
                    continue;
                }
            };

            let Some(to_state) = item.to_name.clone() else {
                skipped.push(SkippedEvent {
                    history_index: index,
                    reason: SkipReason::MissingTargetState,
                });
                continue;
            };

            events.push(StateTransition {
                timestamp: at,
                from_state: item.from_name.clone(),
                to_state,
                author: history
                    .author
                    .as_ref()
                    .and_then(|author| author.display_name.clone()),
            });
        }
    }

    // Stable: events sharing a timestamp keep their changelog order.
    events.sort_by_key(|event| event.timestamp);

    let initial_state = events
        .first()
        .and_then(|first| first.from_state.clone())
        .unwrap_or_else(|| current_state.to_string());

    if !skipped.is_empty() {
        debug!(
            issue = %record.key_or_unknown(),
            skipped = skipped.len(),
            "Dropped unplaceable changelog events"
        );
    }

    let mut transitions = Vec::with_capacity(events.len() + 1);
    transitions.push(StateTransition::creation(created, initial_state));
    transitions.extend(events);

    Ok(Extraction {
        transitions,
        skipped,
    })
}

fn history_timestamp(history: &History) -> Result<Timestamp, SkipReason> {
    let raw = history
        .created
        .as_deref()
        .ok_or(SkipReason::MissingTimestamp)?;
    parse_timestamp(raw).map_err(|_| SkipReason::UnparsableTimestamp {
        raw: raw.to_string(),
    })
}
