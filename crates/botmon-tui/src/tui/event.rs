use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind};
use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Terminal events
#[derive(Clone, Debug)]
pub enum Event {
    /// Redraw tick (keeps the loading spinner moving)
    Tick,
    /// Key press event
    Key(KeyEvent),
    /// Terminal resize
    Resize(u16, u16),
    /// Reading terminal input failed
    Error(String),
}

/// Reads crossterm events on a background task and forwards them over a channel
pub struct EventHandler {
    receiver: mpsc::UnboundedReceiver<Event>,
    cancel: CancellationToken,
}

impl EventHandler {
    /// Create a new event handler with the given tick rate
    pub fn new(tick_rate: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        tokio::spawn(Self::run(sender, cancel.clone(), tick_rate));

        Self { receiver, cancel }
    }

    async fn run(
        sender: mpsc::UnboundedSender<Event>,
        cancel: CancellationToken,
        tick_rate: Duration,
    ) {
        let mut reader = EventStream::new();
        let mut ticker = tokio::time::interval(tick_rate);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let next_event = reader.next().fuse();

            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => Event::Tick,
                maybe_event = next_event => match maybe_event {
                    // Release/repeat events are dropped (Windows reports both)
                    Some(Ok(CrosstermEvent::Key(key))) if key.kind == KeyEventKind::Press => {
                        Event::Key(key)
                    }
                    Some(Ok(CrosstermEvent::Resize(w, h))) => Event::Resize(w, h),
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => Event::Error(e.to_string()),
                    None => break,
                },
            };

            if sender.send(event).is_err() {
                break;
            }
        }
    }

    /// Receive the next event
    pub async fn next(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Stop reading terminal input
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
