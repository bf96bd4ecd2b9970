use chrono::{DateTime, Utc};

/// Payload published on a bus.
///
/// The envelope copies `event_type` and `version` out of the payload so a
/// consumer can route or skip a message without deserializing its body.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Dotted name such as `"group.created"`.
    fn event_type(&self) -> &'static str;

    /// Payload schema version; bumped on incompatible field changes.
    fn version(&self) -> u32;

    /// Commit time of the change.
    fn occurred_at(&self) -> DateTime<Utc>;
}
