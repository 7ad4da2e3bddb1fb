//! # Broadcast Channel Transport
//!
//! The primary transport. One [`BroadcastHub`] per origin and channel name;
//! every context subscribes its own receiver. Frames carry the sending
//! context so a context never hears itself.

use crate::transport::{Transport, TransportKind};
use crate::DEFAULT_CHANNEL_CAPACITY;
use shared_types::{BusError, ContextId, Envelope, MessageError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

/// One encoded envelope on the channel.
#[derive(Debug)]
struct Frame {
    sender: ContextId,
    body: String,
}

/// A named broadcast channel shared by every context of one origin.
///
/// Cloning yields another handle to the same channel.
#[derive(Clone)]
pub struct BroadcastHub {
    name: Arc<str>,
    sender: broadcast::Sender<Arc<Frame>>,
    frames_published: Arc<AtomicU64>,
}

impl BroadcastHub {
    /// Open a channel with the default capacity.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self::with_capacity(name, DEFAULT_CHANNEL_CAPACITY)
    }

    /// Open a channel that buffers `capacity` frames per receiver.
    #[must_use]
    pub fn with_capacity(name: &str, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            name: Arc::from(name),
            sender,
            frames_published: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Channel name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Live receivers, one per open context.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Frames published since the hub was opened.
    #[must_use]
    pub fn frames_published(&self) -> u64 {
        self.frames_published.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for BroadcastHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastHub")
            .field("name", &self.name)
            .field("receivers", &self.receiver_count())
            .finish()
    }
}

/// One context's end of a [`BroadcastHub`].
pub struct BroadcastTransport {
    context: ContextId,
    channel: Arc<str>,
    sender: broadcast::Sender<Arc<Frame>>,
    receiver: broadcast::Receiver<Arc<Frame>>,
    published: Arc<AtomicU64>,
}

impl BroadcastTransport {
    /// Join the hub as `context`. Only frames sent after joining are seen.
    #[must_use]
    pub fn new(hub: &BroadcastHub, context: ContextId) -> Self {
        debug!(channel = %hub.name, context = %context, "Joined broadcast channel");
        Self {
            context,
            channel: hub.name.clone(),
            sender: hub.sender.clone(),
            receiver: hub.sender.subscribe(),
            published: hub.frames_published.clone(),
        }
    }
}

impl Transport for BroadcastTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Broadcast
    }

    fn publish(&mut self, envelope: &Envelope) -> Result<(), BusError> {
        let body = envelope.encode()?;
        self.published.fetch_add(1, Ordering::Relaxed);

        let frame = Arc::new(Frame {
            sender: self.context,
            body,
        });
        match self.sender.send(frame) {
            Ok(receivers) => {
                trace!(
                    channel = %self.channel,
                    msg_type = envelope.type_name(),
                    receivers,
                    "Frame published"
                );
            }
            // Our own receiver keeps the channel open, so this only happens
            // if the hub is being torn down.
            Err(_) => debug!(channel = %self.channel, "No receivers for frame"),
        }
        Ok(())
    }

    fn drain(&mut self) -> Vec<Result<Envelope, MessageError>> {
        let mut out = Vec::new();
        loop {
            let frame = match self.receiver.try_recv() {
                Ok(frame) => frame,
                Err(broadcast::error::TryRecvError::Empty)
                | Err(broadcast::error::TryRecvError::Closed) => break,
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    warn!(
                        channel = %self.channel,
                        context = %self.context,
                        lagged = count,
                        "Receiver lagged, frames dropped"
                    );
                    continue;
                }
            };

            if frame.sender == self.context {
                continue;
            }
            out.push(Envelope::decode(&frame.body));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{GameMessage, TabId};

    fn completed(tab: u8) -> Envelope {
        Envelope::new(GameMessage::TabCompleted { tab: TabId(tab) }, Some(TabId(tab)))
    }

    #[test]
    fn test_peer_receives_sender_does_not() {
        let hub = BroadcastHub::new("lantern");
        let mut a = BroadcastTransport::new(&hub, ContextId::new());
        let mut b = BroadcastTransport::new(&hub, ContextId::new());

        a.publish(&completed(2)).unwrap();

        assert!(a.drain().is_empty());
        let got = b.drain();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].as_ref().unwrap(), &completed(2));
        assert_eq!(hub.frames_published(), 1);
    }

    #[test]
    fn test_late_joiner_misses_earlier_frames() {
        let hub = BroadcastHub::new("lantern");
        let mut a = BroadcastTransport::new(&hub, ContextId::new());
        a.publish(&completed(1)).unwrap();

        let mut late = BroadcastTransport::new(&hub, ContextId::new());
        assert!(late.drain().is_empty());
    }

    #[test]
    fn test_lagged_receiver_keeps_newest() {
        let hub = BroadcastHub::with_capacity("lantern", 2);
        let mut a = BroadcastTransport::new(&hub, ContextId::new());
        let mut b = BroadcastTransport::new(&hub, ContextId::new());

        for tab in 1..=5 {
            a.publish(&completed(tab)).unwrap();
        }
        let got: Vec<_> = b.drain().into_iter().map(Result::unwrap).collect();
        assert_eq!(got, vec![completed(4), completed(5)]);
    }

    #[test]
    fn test_receiver_count_tracks_contexts() {
        let hub = BroadcastHub::new("lantern");
        let a = BroadcastTransport::new(&hub, ContextId::new());
        let _b = BroadcastTransport::new(&hub, ContextId::new());
        assert_eq!(hub.receiver_count(), 2);
        drop(a);
        assert_eq!(hub.receiver_count(), 1);
    }
}
