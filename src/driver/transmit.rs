//! Transmit paths: blocking send, async send, continuous-wave test.

use embedded_hal::delay::DelayNs;

use super::config::ModemConfig;
use super::context::{Notifier, OperationContext, OperationKind};
use super::error::{ModemError, RadioError, Result};
use super::modem::Modem;
use crate::internal::constants::TX_TIMEOUT_MULTIPLIER;
use crate::internal::fmt::debug;
use crate::radio::RadioDriver;
use crate::sync::signal::CompletionSignal;

impl<R: RadioDriver> Modem<R> {
    /// Transmit `data` and block until the radio reports TX done.
    ///
    /// The wait lasts twice the packet's time on air. If it expires and the
    /// completion handler has not started finishing the operation, the
    /// caller releases the modem and reports a timeout. Otherwise it keeps
    /// waiting for the handler's outcome.
    ///
    /// # Errors
    ///
    /// - [`ModemError::InvalidState`] without a transmit configuration
    /// - [`RadioError::PayloadTooLarge`] for payloads over 255 bytes
    /// - [`ModemError::Busy`] if another operation owns the modem
    /// - [`IoError::Timeout`](super::error::IoError::Timeout) if no TX done arrived
    /// - [`IoError::PeripheralError`](super::error::IoError::PeripheralError)
    ///   if the radio's TX watchdog fired
    pub fn send<D: DelayNs>(&self, data: &[u8], delay: &mut D) -> Result<()> {
        let config = self.tx_config()?;
        let len = payload_len(data)?;

        let id = self.acquire(|id| {
            OperationContext::new(id, OperationKind::Transmit, Notifier::Modem)
                .with_len(data.len())
        })?;

        let air_time_ms = self
            .start_radio(|radio| {
                radio.set_max_payload(len)?;
                let air_time_ms = radio.time_on_air(&config, len);
                radio.send(data)?;
                Ok(air_time_ms)
            })
            .map_err(|err| self.abort_start(id, err.into()))?;

        debug!("tx {} bytes, {} ms on air", len, air_time_ms);

        let timeout_us =
            u64::from(air_time_ms) * u64::from(TX_TIMEOUT_MULTIPLIER) * 1_000;
        self.wait_outcome(id, timeout_us, delay).map(|_| ())
    }

    /// Start transmitting `data` and return immediately.
    ///
    /// The outcome is delivered to `notifier` if given. Once the modem is
    /// acquired, any unconsumed outcome in it is discarded; a rejected call
    /// leaves it as it was. Without a notifier the send is
    /// fire-and-forget.
    ///
    /// # Errors
    ///
    /// Same preconditions as [`send`](Self::send); completion errors go to
    /// the notifier.
    pub fn send_async(
        &self,
        data: &[u8],
        notifier: Option<&'static CompletionSignal>,
    ) -> Result<()> {
        self.tx_config()?;
        let len = payload_len(data)?;

        let target = notifier.map_or(Notifier::None, Notifier::External);
        let id = self.acquire(|id| {
            // Only once the modem is ours; a rejected call leaves it untouched
            if let Some(signal) = notifier {
                signal.reset();
            }
            OperationContext::new(id, OperationKind::Transmit, target).with_len(data.len())
        })?;

        self.start_radio(|radio| {
            radio.set_max_payload(len)?;
            radio.send(data)
        })
        .map_err(|err| self.abort_start(id, err.into()))?;

        debug!("tx {} bytes (async)", len);
        Ok(())
    }

    /// Emit an unmodulated carrier for `duration_s` seconds.
    ///
    /// Returns once the carrier is on. The modem stays busy until the radio
    /// reports the end of the run through its TX timeout event.
    ///
    /// # Errors
    ///
    /// - [`ModemError::Busy`] if another operation owns the modem
    /// - the radio's error if the test cannot start
    pub fn test_cw(&self, frequency_hz: u32, power_dbm: i8, duration_s: u16) -> Result<()> {
        let id = self.acquire(|id| {
            OperationContext::new(id, OperationKind::ContinuousWave, Notifier::None)
        })?;

        self.start_radio(|radio| radio.continuous_wave(frequency_hz, power_dbm, duration_s))
            .map_err(|err| self.abort_start(id, err.into()))?;

        debug!("cw test: {} Hz, {} dBm, {} s", frequency_hz, power_dbm, duration_s);
        Ok(())
    }

    /// Stored configuration, if it is a transmit one
    fn tx_config(&self) -> Result<ModemConfig> {
        match self.config() {
            Some(config) if config.is_tx() => Ok(config),
            _ => Err(ModemError::InvalidState.into()),
        }
    }
}

fn payload_len(data: &[u8]) -> Result<u8> {
    u8::try_from(data.len()).map_err(|_| RadioError::PayloadTooLarge.into())
}

#[cfg(test)]
#[allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]
mod tests {
    extern crate std;

    use super::*;
    use crate::driver::arbiter::ModemState;
    use crate::driver::config::Direction;
    use crate::driver::error::{Error, IoError};
    use crate::radio::{IrqLine, RadioEvent};
    use crate::sync::signal::Completion;
    use crate::testing::{MockDelay, MockRadio, RadioCall, ScriptedDelay};

    const TX_CONFIG: ModemConfig = ModemConfig::new().with_direction(Direction::Tx);

    fn tx_modem(air_time_ms: u32) -> Modem<MockRadio> {
        let mut radio = MockRadio::new();
        radio.set_time_on_air(air_time_ms);
        let modem = Modem::new(radio);
        modem.init().unwrap();
        modem.configure(TX_CONFIG).unwrap();
        modem.with_radio(MockRadio::clear_calls);
        modem
    }

    #[test]
    fn send_without_config_is_invalid_state() {
        let modem = Modem::new(MockRadio::new());
        let mut delay = MockDelay::new();

        assert_eq!(
            modem.send(&[1, 2, 3], &mut delay),
            Err(Error::Modem(ModemError::InvalidState))
        );
        assert!(modem.is_free());
    }

    #[test]
    fn send_with_rx_config_is_invalid_state() {
        let modem = Modem::new(MockRadio::new());
        modem.configure(ModemConfig::new()).unwrap();
        let mut delay = MockDelay::new();

        assert_eq!(
            modem.send(&[1], &mut delay),
            Err(Error::Modem(ModemError::InvalidState))
        );
    }

    #[test]
    fn send_rejects_oversized_payload_before_acquiring() {
        let modem = tx_modem(10);
        let mut delay = MockDelay::new();
        let payload = [0u8; 256];

        assert_eq!(
            modem.send(&payload, &mut delay),
            Err(Error::Radio(RadioError::PayloadTooLarge))
        );
        modem.with_radio(|radio| assert!(radio.calls().is_empty()));
    }

    #[test]
    fn send_while_busy_fails_fast() {
        let modem = tx_modem(10);
        assert!(modem.arbiter.try_acquire());
        let mut delay = MockDelay::new();

        assert_eq!(
            modem.send(&[1], &mut delay),
            Err(Error::Modem(ModemError::Busy))
        );
        assert_eq!(delay.total_us(), 0);
    }

    #[test]
    fn send_times_out_at_twice_air_time() {
        // Completion never arrives
        let modem = tx_modem(10);
        let mut delay = MockDelay::new();

        assert_eq!(
            modem.send(&[0xAA; 8], &mut delay),
            Err(Error::Io(IoError::Timeout))
        );
        assert_eq!(delay.total_us(), 20_000);
        assert_eq!(modem.state(), ModemState::Free);
        modem.with_radio(|radio| {
            assert_eq!(radio.calls().last(), Some(&RadioCall::Sleep));
        });
    }

    #[test]
    fn send_completes_before_deadline() {
        let modem = tx_modem(10);
        // TX done at half the air time
        let mut delay = ScriptedDelay::new(|elapsed_us| {
            if elapsed_us == 5_000 {
                modem.with_radio(|radio| radio.push_event(IrqLine::Dio1, RadioEvent::TxDone));
                modem.service_irq(IrqLine::Dio1);
            }
        });

        assert_eq!(modem.send(&[1, 2, 3, 4], &mut delay), Ok(()));
        assert_eq!(delay.elapsed_us(), 5_000);
        assert_eq!(modem.state(), ModemState::Free);
    }

    #[test]
    fn send_timeout_defers_to_completion_in_flight() {
        let modem = tx_modem(10);
        // The handler claims the operation right at the deadline, before the
        // caller's own release attempt, and finishes a little later.
        let mut delay = ScriptedDelay::new(|elapsed_us| {
            if elapsed_us == 20_000 {
                assert!(modem.arbiter.try_begin_release());
            }
            if elapsed_us == 20_300 {
                modem.finish_release(Some(Ok(Completion::Sent { len: 2 })));
            }
        });

        assert_eq!(modem.send(&[9, 9], &mut delay), Ok(()));
        assert!(delay.elapsed_us() >= 20_300);
        assert_eq!(modem.state(), ModemState::Free);
    }

    #[test]
    fn send_reports_radio_watchdog() {
        let modem = tx_modem(10);
        let mut delay = ScriptedDelay::new(|elapsed_us| {
            if elapsed_us == 1_000 {
                modem.with_radio(|radio| radio.push_event(IrqLine::Dio1, RadioEvent::TxTimeout));
                modem.service_irq(IrqLine::Dio1);
            }
        });

        assert_eq!(
            modem.send(&[1], &mut delay),
            Err(Error::Io(IoError::PeripheralError))
        );
        assert!(modem.is_free());
    }

    #[test]
    fn send_issues_radio_calls_in_order() {
        let modem = tx_modem(1);
        let mut delay = MockDelay::new();
        let _ = modem.send(&[1, 2, 3], &mut delay);

        modem.with_radio(|radio| {
            let calls = radio.calls();
            assert_eq!(calls[0], RadioCall::Wakeup);
            assert_eq!(calls[1], RadioCall::SetMaxPayload(3));
            assert_eq!(calls[2], RadioCall::Send(3));
        });
    }

    #[test]
    fn send_start_failure_releases() {
        let modem = tx_modem(10);
        modem.with_radio(|radio| radio.fail_send(RadioError::Bus));
        let mut delay = MockDelay::new();

        assert_eq!(
            modem.send(&[1], &mut delay),
            Err(Error::Radio(RadioError::Bus))
        );
        assert!(modem.is_free());
    }

    #[test]
    fn send_async_delivers_to_notifier() {
        static DONE: CompletionSignal = CompletionSignal::new();

        let modem = tx_modem(10);
        modem.send_async(&[1, 2, 3], Some(&DONE)).unwrap();
        assert_eq!(modem.state(), ModemState::Busy);
        assert!(!DONE.is_pending());

        modem.with_radio(|radio| radio.push_event(IrqLine::Dio1, RadioEvent::TxDone));
        modem.service_irq(IrqLine::Dio1);

        assert_eq!(DONE.try_take(), Some(Ok(Completion::Sent { len: 3 })));
        assert!(modem.is_free());
    }

    #[test]
    fn send_async_without_notifier_releases_on_tx_done() {
        let modem = tx_modem(10);
        modem.send_async(&[7], None).unwrap();

        modem.on_tx_done();

        assert!(modem.is_free());
        assert!(!modem.completion.is_pending());
    }

    #[test]
    fn send_async_busy_while_in_flight() {
        let modem = tx_modem(10);
        modem.send_async(&[1], None).unwrap();

        assert_eq!(
            modem.send_async(&[2], None),
            Err(Error::Modem(ModemError::Busy))
        );
    }

    #[test]
    fn send_async_busy_keeps_unconsumed_outcome() {
        static DONE: CompletionSignal = CompletionSignal::new();

        let modem = tx_modem(10);
        modem.send_async(&[1, 2], Some(&DONE)).unwrap();
        modem.on_tx_done();
        assert!(DONE.is_pending());

        modem.send_async(&[3], None).unwrap();
        assert_eq!(
            modem.send_async(&[4], Some(&DONE)),
            Err(Error::Modem(ModemError::Busy))
        );
        assert_eq!(DONE.try_take(), Some(Ok(Completion::Sent { len: 2 })));
    }

    #[test]
    fn send_async_discards_stale_outcome_once_acquired() {
        static DONE: CompletionSignal = CompletionSignal::new();

        let modem = tx_modem(10);
        DONE.signal(Ok(Completion::Sent { len: 9 }));

        modem.send_async(&[5], Some(&DONE)).unwrap();
        assert!(!DONE.is_pending());

        modem.on_tx_done();
        assert_eq!(DONE.try_take(), Some(Ok(Completion::Sent { len: 1 })));
    }

    #[test]
    fn cw_test_held_until_radio_timeout() {
        let modem = Modem::new(MockRadio::new());
        modem.test_cw(868_000_000, 14, 5).unwrap();

        assert_eq!(modem.state(), ModemState::Busy);
        modem.with_radio(|radio| {
            assert!(radio.calls().contains(&RadioCall::ContinuousWave(868_000_000, 14, 5)));
        });

        modem.on_tx_timeout();
        assert!(modem.is_free());
        assert!(!modem.completion.is_pending());
    }

    #[test]
    fn cw_test_ignores_tx_done() {
        let modem = Modem::new(MockRadio::new());
        modem.test_cw(868_000_000, 14, 5).unwrap();

        modem.on_tx_done();
        assert_eq!(modem.state(), ModemState::Busy);
    }
}
