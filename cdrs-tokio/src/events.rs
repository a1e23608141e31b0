//! Listener/stream plumbing that turns server-pushed `EVENT` frames into something a caller can
//! poll, without forcing every consumer onto tokio (hence a `std::sync::mpsc` leg alongside the
//! `tokio::sync::mpsc` leg that feeds it).

use std::pin::Pin;
use std::sync::mpsc::{Receiver as StdReceiver, Sender as StdSender};
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc::Receiver;

use cassandra_protocol::frame::frame_event::ServerEvent;

/// Handle returned alongside an `EventStream`; dropping it stops the background forwarder.
pub struct Listener {
    _sender: StdSender<ServerEvent>,
}

pub(crate) fn new_listener(
    sender: StdSender<ServerEvent>,
    mut event_receiver: Receiver<ServerEvent>,
) -> Listener {
    tokio::spawn(async move {
        while let Some(event) = event_receiver.recv().await {
            if sender.send(event).is_err() {
                break;
            }
        }
    });

    Listener { _sender: sender }
}

/// Blocking iterator over server events, for callers outside an async context.
pub struct EventStream {
    receiver: StdReceiver<ServerEvent>,
}

impl EventStream {
    pub(crate) fn new(receiver: StdReceiver<ServerEvent>) -> Self {
        EventStream { receiver }
    }
}

impl Iterator for EventStream {
    type Item = ServerEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.receiver.recv().ok()
    }
}

/// Non-blocking `Stream` adapter over the same events, for async consumers.
pub struct EventStreamNonBlocking {
    inner: EventStream,
}

impl From<EventStream> for EventStreamNonBlocking {
    fn from(inner: EventStream) -> Self {
        EventStreamNonBlocking { inner }
    }
}

impl Stream for EventStreamNonBlocking {
    type Item = ServerEvent;

    fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.get_mut().inner.receiver.try_recv() {
            Ok(event) => Poll::Ready(Some(event)),
            Err(std::sync::mpsc::TryRecvError::Empty) => Poll::Pending,
            Err(std::sync::mpsc::TryRecvError::Disconnected) => Poll::Ready(None),
        }
    }
}
