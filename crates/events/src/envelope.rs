use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::Event;

/// Envelope for a published event.
///
/// - `event_id` is a time-ordered UUIDv7, unique per publication.
/// - `source` names the component that produced the event (e.g. `"table_catalog"`).
/// - `sequence_number` increases monotonically per source, so consumers can
///   detect gaps or drop duplicates.
/// - `schema_version` is the payload's [`Event::version`] at publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    source: String,
    sequence_number: u64,
    event_type: String,
    schema_version: u32,
    payload: E,
}

impl<E: Event> EventEnvelope<E> {
    /// Wrap `payload` with a fresh event id.
    pub fn wrap(source: impl Into<String>, sequence_number: u64, payload: E) -> Self {
        Self::new(Uuid::now_v7(), source, sequence_number, payload)
    }

    pub fn new(
        event_id: Uuid,
        source: impl Into<String>,
        sequence_number: u64,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            source: source.into(),
            sequence_number,
            event_type: payload.event_type().to_string(),
            schema_version: payload.version(),
            payload,
        }
    }
}

impl<E> EventEnvelope<E> {
    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
