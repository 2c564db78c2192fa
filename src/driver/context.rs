//! Per-operation record carried from submission to completion.

use super::arbiter::OperationId;
use super::error::Error;
use crate::radio::RxQuality;
use crate::sync::signal::CompletionSignal;

/// Receiver of packets from a continuous receive session.
///
/// Callbacks run in the deferred context, outside any critical section.
/// They must return promptly; the radio is re-armed only afterwards.
///
/// Packets are not delivered once a stop has begun. A stop racing a
/// delivery that already passed that check can still see `on_packet`
/// return after `on_stopped`.
pub trait PacketHandler: Sync {
    /// A packet was received
    fn on_packet(&self, data: &[u8], quality: RxQuality);

    /// The session ended
    ///
    /// `reason` is [`IoError::Canceled`](super::error::IoError::Canceled)
    /// after an explicit stop, or the radio error that prevented re-arming.
    fn on_stopped(&self, reason: Error) {
        let _ = reason;
    }
}

/// What the in-flight operation is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperationKind {
    /// Packet transmission
    Transmit,
    /// Single blocking reception
    ReceiveOnce,
    /// Re-arming reception feeding a [`PacketHandler`]
    ReceiveContinuous,
    /// Continuous-wave test transmission
    ContinuousWave,
    /// Init or configuration pass holding the radio
    Control,
}

impl OperationKind {
    /// Kind is finished by TX done / TX timeout
    pub const fn is_tx(self) -> bool {
        matches!(self, OperationKind::Transmit | OperationKind::ContinuousWave)
    }

    /// Kind is finished by RX events
    pub const fn is_rx(self) -> bool {
        matches!(
            self,
            OperationKind::ReceiveOnce | OperationKind::ReceiveContinuous
        )
    }
}

/// Where the outcome of an operation goes
#[derive(Clone, Copy)]
pub(crate) enum Notifier {
    /// Fire-and-forget
    None,
    /// The modem's own slot, polled by a blocked caller
    Modem,
    /// A caller-owned signal
    External(&'static CompletionSignal),
}

/// Live for exactly one acquisition of the arbiter
#[derive(Clone, Copy)]
pub(crate) struct OperationContext {
    pub(crate) id: OperationId,
    pub(crate) kind: OperationKind,
    pub(crate) notifier: Notifier,
    /// TX: payload length. RX once: caller buffer capacity.
    pub(crate) len: usize,
    pub(crate) handler: Option<&'static dyn PacketHandler>,
}

impl OperationContext {
    pub(crate) const fn new(id: OperationId, kind: OperationKind, notifier: Notifier) -> Self {
        Self {
            id,
            kind,
            notifier,
            len: 0,
            handler: None,
        }
    }

    pub(crate) const fn with_len(mut self, len: usize) -> Self {
        self.len = len;
        self
    }

    pub(crate) const fn with_handler(mut self, handler: &'static dyn PacketHandler) -> Self {
        self.handler = Some(handler);
        self
    }
}
