use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

#[allow(unused_imports)]
use crate::proxy::RequestProxy;

/// [`ResultCallback`] is the caller side of a [`RequestProxy`], every result the proxy decides
/// to deliver ends up in exactly one of its two methods. Callbacks may be invoked from whatever
/// thread the reporting source runs on, but never while the proxy holds its state lock, so a
/// callback is free to submit a new request to the same proxy
///
/// # Trait Implementation(s)
/// - Any `Fn(Result<R, String>)` closure
/// - [`ChannelCallback`] forwarding every result to a tokio channel
pub trait ResultCallback<R>: Send + Sync + 'static {
    fn on_success(&self, payload: R);

    fn on_failure(&self, message: String);
}

impl<R, F> ResultCallback<R> for F
where
    F: Fn(Result<R, String>) + Send + Sync + 'static,
{
    fn on_success(&self, payload: R) {
        self(Ok(payload))
    }

    fn on_failure(&self, message: String) {
        self(Err(message))
    }
}

/// A [`ResultCallback`] forwarding every delivery to an unbounded tokio channel. Results
/// delivered after the receiver is gone are dropped
#[derive(Debug)]
pub struct ChannelCallback<R>(UnboundedSender<Result<R, String>>);

impl<R> ChannelCallback<R> {
    pub fn new(sender: UnboundedSender<Result<R, String>>) -> Self {
        Self(sender)
    }

    /// Creates / Constructs a [`ChannelCallback`] along with the receiving half of its channel
    pub fn channel() -> (Self, UnboundedReceiver<Result<R, String>>) {
        let (tx, rx) = unbounded_channel();
        (Self(tx), rx)
    }
}

impl<R> Clone for ChannelCallback<R> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<R: Send + 'static> ResultCallback<R> for ChannelCallback<R> {
    fn on_success(&self, payload: R) {
        if self.0.send(Ok(payload)).is_err() {
            tracing::trace!("Result receiver is gone, success dropped");
        }
    }

    fn on_failure(&self, message: String) {
        if self.0.send(Err(message)).is_err() {
            tracing::trace!("Result receiver is gone, failure dropped");
        }
    }
}
