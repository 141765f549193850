/// Errors that can occur on the message bus.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// The bus has been closed; no more publishes or subscriptions.
    #[error("bus closed")]
    Closed,

    /// The topic name is not usable (e.g. empty).
    #[error("invalid topic {0:?}")]
    InvalidTopic(String),

    /// A backend-specific publish failure.
    #[error("publish to {topic} failed: {reason}")]
    PublishFailed { topic: String, reason: String },
}
