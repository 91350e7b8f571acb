/// Result aggregation for push requests
///
/// One inbound request fans out into one send per recipient. Each send
/// reports through its own [`Subordinate`] handle, possibly from another
/// thread, and the [`Aggregate`] hands exactly one consolidated
/// [`ResponsePayload`] to the [`Responder`] once nothing is pending, or as
/// soon as the request fails as a whole.
///
/// # Example
///
/// ```rust,no_run
/// use push_results::{Aggregate, ChannelResponder, ErrorReport};
///
/// #[tokio::main]
/// async fn main() {
///     let (responder, mut replies) = ChannelResponder::channel();
///     let aggregate = Aggregate::with_responder(responder);
///
///     for token in ["a1b2c3d4e5f6", "f6e5d4c3b2a1"] {
///         let recipient = aggregate.add(token);
///         tokio::spawn(async move {
///             // send to the provider here
///             let _ = recipient.fail(ErrorReport::new("Unregistered", "BadDeviceToken"));
///         });
///     }
///
///     let payload = replies.recv().await.unwrap();
///     println!("{}", payload.to_json().unwrap());
/// }
/// ```
pub mod aggregate;
pub mod error;
pub mod payload;
pub mod responder;

// Re-export main types for convenience
pub use aggregate::{Aggregate, Status, Subordinate};
pub use error::{AggregateError, AggregateResult, Classify, ErrorReport};
pub use payload::{Outcome, RecipientResult, ResponsePayload};
pub use responder::{ChannelResponder, Responder};
