use crate::payload::ResponsePayload;
use tokio::sync::mpsc;
use tracing::warn;

/// Receives the single consolidated payload of an [`Aggregate`](crate::Aggregate)
pub trait Responder: Send + Sync {
    fn deliver(&self, payload: ResponsePayload);
}

impl<F> Responder for F
where
    F: Fn(ResponsePayload) + Send + Sync,
{
    fn deliver(&self, payload: ResponsePayload) {
        self(payload)
    }
}

/// Forwards the payload into a tokio channel, for replies sent from async code
#[derive(Debug, Clone)]
pub struct ChannelResponder {
    tx: mpsc::UnboundedSender<ResponsePayload>,
}

impl ChannelResponder {
    pub fn new(tx: mpsc::UnboundedSender<ResponsePayload>) -> Self {
        Self { tx }
    }

    /// Create a responder together with its receiving end
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ResponsePayload>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl Responder for ChannelResponder {
    fn deliver(&self, payload: ResponsePayload) {
        if self.tx.send(payload).is_err() {
            warn!("Response receiver dropped, payload discarded");
        }
    }
}
