//! Publish/subscribe abstraction for dashboard channel messages.
//!
//! The bus only distributes; nothing published here is stored. Delivery is
//! best-effort fan-out: every live subscriber gets a copy of each message, in
//! publish order per publisher. Consumers must tolerate missing a message
//! (e.g. when they subscribe late) because the next one supersedes it.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// A subscription to a bus.
///
/// Meant for a single consuming thread. Bridges into async code run the
/// receive loop on a blocking task:
///
/// ```ignore
/// let sub = bus.subscribe();
/// tokio::task::spawn_blocking(move || {
///     while let Ok(message) = sub.recv() {
///         let _ = realtime_tx.send(message);
///     }
/// });
/// ```
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available, or the bus is gone.
    pub fn recv(&self) -> Result<M, std::sync::mpsc::RecvError> {
        self.receiver.recv()
    }

    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Transport-agnostic pub/sub bus.
///
/// `Send + Sync` so one bus can be shared by every request handler.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + core::fmt::Display + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
