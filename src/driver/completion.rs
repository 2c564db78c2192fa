//! Completion handlers, run from the deferred context.
//!
//! Each handler acts only if the in-flight operation is of a kind the event
//! can finish. Anything else is a stray event (a late edge from an earlier
//! operation, a TX event during receive) and is dropped.
//!
//! Handlers must never run in interrupt context: they take locks, call the
//! radio and invoke user callbacks. Pend the IRQ line on an
//! [`IrqDeferral`] from the ISR and call [`Modem::process_deferred`] or
//! [`Modem::service_irq`] from the deferred context.

use super::context::{OperationContext, OperationKind};
use super::error::{Error, IoError, Result};
use super::modem::Modem;
use crate::internal::constants::{MAX_PAYLOAD_LEN, RX_CONTINUOUS};
use crate::internal::fmt::{debug, warning};
use crate::radio::{IrqLine, Packet, RadioDriver, RadioEvent, RxQuality};
use crate::sync::deferred::IrqDeferral;
use crate::sync::signal::{Completion, ReceivedPacket};

impl<R: RadioDriver> Modem<R> {
    // =========================================================================
    // Deferred-context entry points
    // =========================================================================

    /// Drain `deferral`, servicing every pending IRQ line.
    ///
    /// Returns the number of radio events handled.
    pub fn process_deferred<const N: usize>(&self, deferral: &IrqDeferral<N>) -> usize {
        let mut handled = 0;
        while let Some(line) = deferral.take() {
            handled += self.service_irq(line);
        }
        handled
    }

    /// Deferred-context task body: wait for IRQ edges and service them,
    /// forever.
    ///
    /// ```ignore
    /// #[embassy_executor::task]
    /// async fn radio_irq() {
    ///     MODEM.run_deferred(&DEFERRAL).await
    /// }
    /// ```
    #[cfg(feature = "async")]
    pub async fn run_deferred<const N: usize>(&self, deferral: &IrqDeferral<N>) -> ! {
        loop {
            let line = deferral.wait().await;
            self.service_irq(line);
            self.process_deferred(deferral);
        }
    }

    /// Service one IRQ edge: let the radio decode its status and dispatch
    /// every event it reports.
    ///
    /// Returns the number of events handled.
    pub fn service_irq(&self, line: IrqLine) -> usize {
        let mut handled = 0;
        loop {
            let mut packet = Packet::new();
            match self.with_radio(|radio| radio.process_irq(line, &mut packet)) {
                Ok(Some(event)) => {
                    self.handle_event(event, &packet);
                    handled += 1;
                }
                Ok(None) => break,
                Err(err) => {
                    warning!("irq {:?} status read failed: {:?}", line, err);
                    break;
                }
            }
        }
        handled
    }

    /// Feed one decoded radio event into the operation state machine.
    ///
    /// For [`RadioEvent::RxDone`], `payload` holds the received bytes.
    pub fn handle_event(&self, event: RadioEvent, payload: &[u8]) {
        match event {
            RadioEvent::TxDone => self.on_tx_done(),
            RadioEvent::TxTimeout => self.on_tx_timeout(),
            RadioEvent::RxDone(quality) => self.on_rx_done(payload, quality),
            RadioEvent::RxTimeout => self.on_rx_timeout(),
            RadioEvent::RxError => self.on_rx_error(),
        }
    }

    // =========================================================================
    // Completion handlers
    // =========================================================================

    /// Transmission finished
    pub fn on_tx_done(&self) {
        let Some(context) = self.context_for(OperationKind::Transmit, "tx done") else {
            return;
        };
        self.complete(&context, Ok(Completion::Sent { len: context.len }));
    }

    /// The radio's TX watchdog fired, or a CW test ended
    pub fn on_tx_timeout(&self) {
        let Some(context) = self.current_context().filter(|context| context.kind.is_tx()) else {
            debug!("stray tx timeout dropped");
            return;
        };
        self.complete(&context, Err(IoError::PeripheralError.into()));
    }

    /// A packet arrived
    pub fn on_rx_done(&self, data: &[u8], quality: RxQuality) {
        let Some(context) = self.rx_context("rx done") else {
            return;
        };

        if context.kind == OperationKind::ReceiveContinuous {
            if !self.arbiter.is_active(context.id) {
                debug!("rx done after session stop dropped");
                return;
            }
            if let Some(handler) = context.handler {
                handler.on_packet(data, quality);
            }
            self.rearm(&context);
            return;
        }

        let len = data.len().min(context.len).min(MAX_PAYLOAD_LEN);
        let packet = ReceivedPacket {
            data: Packet::from_slice(&data[..len]).unwrap_or_default(),
            quality,
        };
        self.complete(&context, Ok(Completion::Received(packet)));
    }

    /// Header, sync or CRC fault on reception
    pub fn on_rx_error(&self) {
        self.on_rx_failure(IoError::PeripheralError, "rx error");
    }

    /// The radio's receive window closed without a packet
    pub fn on_rx_timeout(&self) {
        self.on_rx_failure(IoError::Timeout, "rx timeout");
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn on_rx_failure(&self, error: IoError, what: &'static str) {
        let Some(context) = self.rx_context(what) else {
            return;
        };

        if context.kind == OperationKind::ReceiveContinuous {
            debug!("{} during continuous receive, re-arming", what);
            self.rearm(&context);
        } else {
            self.complete(&context, Err(error.into()));
        }
    }

    fn context_for(&self, kind: OperationKind, what: &'static str) -> Option<OperationContext> {
        let context = self.current_context().filter(|context| context.kind == kind);
        if context.is_none() {
            debug!("stray {} dropped", what);
        }
        context
    }

    fn rx_context(&self, what: &'static str) -> Option<OperationContext> {
        let context = self.current_context().filter(|context| context.kind.is_rx());
        if context.is_none() {
            debug!("stray {} dropped", what);
        }
        context
    }

    /// Finish `context`'s operation with `outcome` if nobody else has begun to
    fn complete(&self, context: &OperationContext, outcome: Result<Completion>) {
        if self.arbiter.try_begin_release_of(context.id) {
            self.finish_release(Some(outcome));
        } else {
            debug!("completion lost race, operation already finishing");
        }
    }

    /// Put the radio back into receive mode for a continuous session.
    ///
    /// The radio lock covers both the "still ours" check and the command,
    /// so a concurrent stop either sees the re-armed radio and sleeps it, or
    /// has already claimed the session and the re-arm is skipped.
    fn rearm(&self, context: &OperationContext) {
        let result = self.with_radio(|radio| {
            if !self.arbiter.is_active(context.id) {
                return Ok(());
            }
            radio.enter_receive(RX_CONTINUOUS)
        });

        let Err(err) = result else {
            return;
        };

        warning!("continuous receive re-arm failed: {:?}", err);
        if self.arbiter.try_begin_release_of(context.id) {
            self.finish_release(None);
            if let Some(handler) = context.handler {
                handler.on_stopped(Error::from(err));
            }
        }
    }
}
