//! Receive paths: blocking one-shot receive and continuous receive.

use embedded_hal::delay::DelayNs;

use super::context::{Notifier, OperationContext, OperationKind, PacketHandler};
use super::error::{IoError, ModemError, Result};
use super::modem::Modem;
use crate::internal::constants::RX_CONTINUOUS;
use crate::internal::fmt::debug;
use crate::radio::{RadioDriver, RxQuality};
use crate::sync::signal::Completion;

impl<R: RadioDriver> Modem<R> {
    /// Receive one packet into `buf`, blocking for up to `timeout_ms`.
    ///
    /// Returns the number of bytes written (at most `buf.len()`; longer
    /// packets are truncated) and the packet's signal quality. A timeout of
    /// zero checks once and gives up.
    ///
    /// The packet and its quality travel with the completion outcome and are
    /// copied into `buf` before this returns; `buf` is never written after
    /// a timeout.
    ///
    /// # Errors
    ///
    /// - [`ModemError::InvalidState`] without a configuration
    /// - [`ModemError::Busy`] if another operation owns the modem
    /// - [`IoError::Timeout`] if no packet arrived in time
    /// - [`IoError::PeripheralError`] on a header, sync or CRC fault
    pub fn receive<D: DelayNs>(
        &self,
        buf: &mut [u8],
        timeout_ms: u32,
        delay: &mut D,
    ) -> Result<(usize, RxQuality)> {
        self.rx_config()?;

        let id = self.acquire(|id| {
            OperationContext::new(id, OperationKind::ReceiveOnce, Notifier::Modem)
                .with_len(buf.len())
        })?;

        self.start_radio(|radio| radio.enter_receive(RX_CONTINUOUS))
            .map_err(|err| self.abort_start(id, err.into()))?;

        match self.wait_outcome(id, u64::from(timeout_ms) * 1_000, delay)? {
            Completion::Received(packet) => {
                let len = packet.data.len().min(buf.len());
                buf[..len].copy_from_slice(&packet.data[..len]);
                Ok((len, packet.quality))
            }
            Completion::Sent { .. } => Err(ModemError::InvalidState.into()),
        }
    }

    /// Start or stop continuous receive.
    ///
    /// With `Some(handler)`, acquires the modem and keeps the radio in
    /// receive mode, passing every packet to `handler` and re-arming until
    /// stopped. With `None`, stops the running session; the handler's
    /// [`on_stopped`](PacketHandler::on_stopped) sees
    /// [`IoError::Canceled`].
    ///
    /// # Errors
    ///
    /// - [`ModemError::InvalidState`] without a configuration, or when
    ///   stopping while no session is active (or one is already ending)
    /// - [`ModemError::Busy`] when starting while the modem is taken,
    ///   including by another continuous session
    pub fn receive_async(&self, handler: Option<&'static dyn PacketHandler>) -> Result<()> {
        let Some(handler) = handler else {
            return self.stop_receive();
        };

        self.rx_config()?;

        let id = self.acquire(|id| {
            OperationContext::new(id, OperationKind::ReceiveContinuous, Notifier::None)
                .with_handler(handler)
        })?;

        self.start_radio(|radio| radio.enter_receive(RX_CONTINUOUS))
            .map_err(|err| self.abort_start(id, err.into()))?;

        debug!("continuous receive started");
        Ok(())
    }

    /// Returns `true` while a continuous receive session holds the modem
    pub fn is_receiving(&self) -> bool {
        self.current_context().is_some_and(|context| {
            context.kind == OperationKind::ReceiveContinuous && self.arbiter.is_active(context.id)
        })
    }

    fn stop_receive(&self) -> Result<()> {
        let Some(context) = self
            .current_context()
            .filter(|context| context.kind == OperationKind::ReceiveContinuous)
        else {
            return Err(ModemError::InvalidState.into());
        };

        // A completion already finishing the session makes this a no-op
        if !self.arbiter.try_begin_release_of(context.id) {
            return Err(ModemError::InvalidState.into());
        }
        self.finish_release(None);

        debug!("continuous receive stopped");
        if let Some(handler) = context.handler {
            handler.on_stopped(IoError::Canceled.into());
        }
        Ok(())
    }

    fn rx_config(&self) -> Result<()> {
        self.config()
            .map(|_| ())
            .ok_or_else(|| ModemError::InvalidState.into())
    }
}
