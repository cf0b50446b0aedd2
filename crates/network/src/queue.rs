//! # Dispatch Queue
//!
//! Hands decoded frames from the network thread to the thread that owns the
//! game state.
//!
//! The network thread only ever calls [`InboundSender::enqueue`], which never
//! blocks. The owning thread calls [`DispatchQueue::drain_and_dispatch`] once
//! per tick; handlers therefore run strictly on that thread and in arrival
//! order.
//!
//! ```text
//! reader thread ──enqueue──▶ [ unbounded FIFO ] ──drain_and_dispatch──▶ handlers
//! ```

use crate::error::{DispatchError, DisconnectCause};
use crate::handlers::HandlerRegistry;
use crossbeam_channel::{Receiver, Sender};
use shard_protocol::{Frame, Packet, ProtocolError};

/// One item on the dispatch queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A decoded packet
    Packet(Packet),

    /// Framing was lost and buffered bytes were dropped
    Unrecognized { id: u8, discarded: usize },

    /// A frame arrived complete but did not decode
    Malformed { id: u8, error: ProtocolError },

    /// The connection ended
    Closed(DisconnectCause),
}

impl From<Frame> for Inbound {
    fn from(frame: Frame) -> Self {
        match frame {
            Frame::Packet(packet) => Inbound::Packet(packet),
            Frame::Unrecognized { id, discarded } => Inbound::Unrecognized { id, discarded },
            Frame::Malformed { id, error } => Inbound::Malformed { id, error },
        }
    }
}

/// Hooks the queue needs from the state it dispatches into
pub trait DispatchContext {
    /// Called on the draining thread when an [`Inbound::Closed`] item is reached
    fn on_connection_closed(&mut self, cause: DisconnectCause);
}

/// Counts from one drain
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    /// Packets a handler accepted
    pub dispatched: usize,

    /// Packets with no registered handler
    pub unhandled: usize,

    /// Unrecognized or malformed frames
    pub discarded: usize,

    /// Packets whose handler returned an error or panicked
    pub failed: usize,

    /// Close notifications delivered
    pub closed: usize,
}

impl DispatchReport {
    /// Total number of queue items consumed
    pub fn total(&self) -> usize {
        self.dispatched + self.unhandled + self.discarded + self.failed + self.closed
    }
}

/// Producer side of the queue, held by the network thread
#[derive(Debug, Clone)]
pub struct InboundSender {
    sender: Sender<Inbound>,
}

impl InboundSender {
    /// Append an item without blocking
    ///
    /// # Returns
    /// `false` if the consuming side has been dropped.
    pub fn enqueue(&self, item: Inbound) -> bool {
        self.sender.send(item).is_ok()
    }
}

/// Unbounded FIFO of inbound items
#[derive(Debug)]
pub struct DispatchQueue {
    sender: Sender<Inbound>,
    receiver: Receiver<Inbound>,
}

impl DispatchQueue {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self { sender, receiver }
    }

    /// Producer handle for another thread
    pub fn sender(&self) -> InboundSender {
        InboundSender {
            sender: self.sender.clone(),
        }
    }

    /// Append an item from the owning thread
    pub fn enqueue(&self, item: Inbound) {
        // The queue holds its own receiver, so this cannot fail
        let _ = self.sender.send(item);
    }

    /// Number of items waiting
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Drop everything waiting without dispatching it
    ///
    /// # Returns
    /// The number of items dropped.
    pub fn clear(&self) -> usize {
        self.receiver.try_iter().count()
    }

    /// Drop everything waiting, keeping only the close notification
    ///
    /// # Returns
    /// The cause of the last [`Inbound::Closed`] item dropped, if there was one.
    pub fn take_closed(&self) -> Option<DisconnectCause> {
        self.receiver.try_iter().fold(None, |cause, item| match item {
            Inbound::Closed(closed) => Some(closed),
            _ => cause,
        })
    }

    #[cfg(test)]
    pub(crate) fn pop(&self) -> Option<Inbound> {
        self.receiver.try_recv().ok()
    }

    /// Dispatch everything that is queued right now
    ///
    /// # Purpose
    /// Items enqueued while the drain runs, including ones produced by the
    /// handlers themselves, stay queued for the next call. A failing item is
    /// logged and counted; it never stops the items behind it.
    ///
    /// # Arguments
    /// * `registry` - Handlers to route packets through
    /// * `context` - State the handlers mutate
    pub fn drain_and_dispatch<C: DispatchContext>(
        &self,
        registry: &HandlerRegistry<C>,
        context: &mut C,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        let snapshot = self.receiver.len();

        for _ in 0..snapshot {
            let Ok(item) = self.receiver.try_recv() else {
                break;
            };

            match item {
                Inbound::Packet(packet) => match registry.dispatch(context, &packet) {
                    Ok(()) => report.dispatched += 1,
                    Err(DispatchError::NoHandler(id)) => {
                        tracing::warn!("Dropping packet {:?}: no handler registered", id);
                        report.unhandled += 1;
                    }
                    Err(e) => {
                        tracing::warn!("{}", e);
                        report.failed += 1;
                    }
                },
                Inbound::Unrecognized { id, discarded } => {
                    tracing::warn!(
                        "Unrecognized packet 0x{:02X}, discarded {} bytes",
                        id,
                        discarded
                    );
                    report.discarded += 1;
                }
                Inbound::Malformed { id, error } => {
                    tracing::warn!("Malformed packet 0x{:02X}: {}", id, error);
                    report.discarded += 1;
                }
                Inbound::Closed(cause) => {
                    tracing::debug!("Connection closed: {:?}", cause);
                    context.on_connection_closed(cause);
                    report.closed += 1;
                }
            }
        }

        if report.total() > 0 {
            tracing::trace!("Drained {} inbound items: {:?}", report.total(), report);
        }
        report
    }
}

impl Default for DispatchQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shard_core::{ClientError, Point3, Serial};
    use shard_protocol::{FrameDecoder, PacketId};

    #[derive(Default)]
    struct Recorder {
        seen: Vec<Packet>,
        closed: Vec<DisconnectCause>,
    }

    impl DispatchContext for Recorder {
        fn on_connection_closed(&mut self, cause: DisconnectCause) {
            self.closed.push(cause);
        }
    }

    fn recording_registry(ids: &[PacketId]) -> HandlerRegistry<Recorder> {
        let mut registry = HandlerRegistry::new();
        for &id in ids {
            registry.register_function(id, |recorder: &mut Recorder, packet| {
                recorder.seen.push(packet.clone());
                Ok(())
            });
        }
        registry
    }

    #[test]
    fn test_fifo_order() {
        let queue = DispatchQueue::new();
        let registry = recording_registry(&[PacketId::AllowMove]);

        for sequence in 1..=3 {
            queue.enqueue(Inbound::Packet(Packet::AllowMove { sequence }));
        }

        let mut recorder = Recorder::default();
        let report = queue.drain_and_dispatch(&registry, &mut recorder);
        assert_eq!(report.dispatched, 3);
        assert_eq!(
            recorder.seen,
            (1..=3)
                .map(|sequence| Packet::AllowMove { sequence })
                .collect::<Vec<_>>()
        );
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_unknown_frame_then_drag() {
        let queue = DispatchQueue::new();
        let registry = recording_registry(&[PacketId::Drag]);
        let mut decoder = FrameDecoder::new();

        // Unknown identifier flushes the buffer, then a drag arrives in the next read
        decoder.extend(&[0xFF, 0x01, 0x02]);
        decoder.by_ref().for_each(|frame| queue.enqueue(frame.into()));
        decoder.extend(&[0x0E, 0x00, 0x00, 0x00, 0x01, 0x00, 0x05]);
        decoder.by_ref().for_each(|frame| queue.enqueue(frame.into()));

        let mut recorder = Recorder::default();
        let report = queue.drain_and_dispatch(&registry, &mut recorder);
        assert_eq!(report.discarded, 1);
        assert_eq!(report.dispatched, 1);
        assert_eq!(
            recorder.seen,
            vec![Packet::Drag {
                serial: Serial::new(1),
                amount: 5
            }]
        );
    }

    #[test]
    fn test_failing_handler_does_not_block_queue() {
        let queue = DispatchQueue::new();
        let mut registry = recording_registry(&[PacketId::SendObject]);
        registry.register_function(PacketId::RemoveObject, |_, _| {
            Err(ClientError::NotFound("unknown object".into()))
        });

        queue.enqueue(Inbound::Packet(Packet::RemoveObject {
            serial: Serial::new(0x4000_0001),
        }));
        let update = Packet::SendObject {
            serial: Serial::new(0x4000_0002),
            graphic: 0x0EED,
            location: Point3::new(10, 10, 0),
            hue: 0,
            facing: Default::default(),
            amount: 3,
        };
        queue.enqueue(Inbound::Packet(update.clone()));

        let mut recorder = Recorder::default();
        let report = queue.drain_and_dispatch(&registry, &mut recorder);
        assert_eq!(report.failed, 1);
        assert_eq!(report.dispatched, 1);
        assert_eq!(recorder.seen, vec![update]);
    }

    #[test]
    fn test_unhandled_packet_is_counted() {
        let queue = DispatchQueue::new();
        let registry = recording_registry(&[]);
        queue.enqueue(Inbound::Packet(Packet::OpenGump {
            serial: Serial::new(5),
            gump: 2,
        }));

        let report = queue.drain_and_dispatch(&registry, &mut Recorder::default());
        assert_eq!(report.unhandled, 1);
        assert_eq!(report.total(), 1);
    }

    #[test]
    fn test_items_added_during_drain_wait_for_next_tick() {
        struct Echo {
            sender: InboundSender,
            count: usize,
        }
        impl DispatchContext for Echo {
            fn on_connection_closed(&mut self, _: DisconnectCause) {}
        }

        let queue = DispatchQueue::new();
        let mut registry: HandlerRegistry<Echo> = HandlerRegistry::new();
        registry.register_function(PacketId::AllowMove, |echo, packet| {
            echo.count += 1;
            echo.sender.enqueue(Inbound::Packet(packet.clone()));
            Ok(())
        });

        let mut echo = Echo {
            sender: queue.sender(),
            count: 0,
        };
        queue.enqueue(Inbound::Packet(Packet::AllowMove { sequence: 1 }));

        let report = queue.drain_and_dispatch(&registry, &mut echo);
        assert_eq!(report.dispatched, 1);
        assert_eq!(queue.pending(), 1);

        queue.drain_and_dispatch(&registry, &mut echo);
        assert_eq!(echo.count, 2);
    }

    #[test]
    fn test_close_notification_reaches_context() {
        let queue = DispatchQueue::new();
        let sender = queue.sender();
        let registry = recording_registry(&[]);

        let producer = std::thread::spawn(move || {
            assert!(sender.enqueue(Inbound::Closed(DisconnectCause::Remote)));
        });
        producer.join().unwrap();

        let mut recorder = Recorder::default();
        let report = queue.drain_and_dispatch(&registry, &mut recorder);
        assert_eq!(report.closed, 1);
        assert_eq!(recorder.closed, vec![DisconnectCause::Remote]);
    }

    #[test]
    fn test_clear_drops_pending() {
        let queue = DispatchQueue::new();
        queue.enqueue(Inbound::Packet(Packet::AllowMove { sequence: 1 }));
        queue.enqueue(Inbound::Closed(DisconnectCause::Remote));

        assert_eq!(queue.clear(), 2);
        assert_eq!(queue.pending(), 0);
        assert_eq!(queue.clear(), 0);
    }

    #[test]
    fn test_take_closed_keeps_cause() {
        let queue = DispatchQueue::new();
        queue.enqueue(Inbound::Packet(Packet::AllowMove { sequence: 1 }));
        queue.enqueue(Inbound::Closed(DisconnectCause::Error("Connection reset by server".into())));
        queue.enqueue(Inbound::Packet(Packet::AllowMove { sequence: 2 }));

        assert_eq!(
            queue.take_closed(),
            Some(DisconnectCause::Error("Connection reset by server".into()))
        );
        assert_eq!(queue.pending(), 0);

        queue.enqueue(Inbound::Packet(Packet::AllowMove { sequence: 3 }));
        assert_eq!(queue.take_closed(), None);
        assert_eq!(queue.pop(), None);
    }
}
