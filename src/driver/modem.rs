//! The modem core: arbiter, operation context and radio under one roof.
//!
//! `impl Modem` is split across files by concern:
//! - this file: construction, acquisition, release, init and configuration
//! - [`transmit`](super::transmit): blocking and async send, CW test
//! - [`receive`](super::receive): blocking and continuous receive
//! - [`completion`](super::completion): completion handlers and IRQ servicing

#[cfg(feature = "async")]
use core::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use embedded_hal::delay::DelayNs;
use spin::Mutex;

use super::arbiter::{Arbiter, ModemState, OperationId};
use super::config::ModemConfig;
use super::context::{Notifier, OperationContext, OperationKind};
use super::error::{Error, IoError, ModemError, RadioResult, Result};
use crate::internal::constants::WAIT_POLL_INTERVAL_US;
use crate::internal::fmt::{debug, warning};
use crate::radio::RadioDriver;
#[cfg(feature = "async")]
use crate::sync::primitives::AtomicWaker;
use crate::sync::primitives::CriticalSectionCell;
use crate::sync::signal::{Completion, CompletionSignal};

/// Half-duplex LoRa modem core.
///
/// Owns the radio and guarantees that at most one operation uses it at a
/// time. Place it in a `static` (or share a
/// reference) so caller threads and the deferred context can reach it.
///
/// # Example
///
/// ```ignore
/// static MODEM: Modem<Sx1262<Spi>> = Modem::new(Sx1262::new(SPI));
///
/// MODEM.init()?;
/// MODEM.configure(ModemConfig::new().with_direction(Direction::Tx))?;
/// MODEM.send(b"ping", &mut delay)?;
/// ```
pub struct Modem<R: RadioDriver> {
    pub(crate) arbiter: Arbiter,
    /// Bus transactions run under this lock, never inside a critical section
    radio: Mutex<R>,
    pub(crate) context: CriticalSectionCell<Option<OperationContext>>,
    /// Outcome slot for blocking callers
    pub(crate) completion: CompletionSignal,
    pub(crate) config: CriticalSectionCell<Option<ModemConfig>>,
    #[cfg(feature = "async")]
    free_waker: AtomicWaker,
}

impl<R: RadioDriver> Modem<R> {
    /// Wrap a radio driver (const, suitable for static initialization)
    pub const fn new(radio: R) -> Self {
        Self {
            arbiter: Arbiter::new(),
            radio: Mutex::new(radio),
            context: CriticalSectionCell::new(None),
            completion: CompletionSignal::new(),
            config: CriticalSectionCell::new(None),
            #[cfg(feature = "async")]
            free_waker: AtomicWaker::new(),
        }
    }

    // =========================================================================
    // State
    // =========================================================================

    /// Current arbiter state
    pub fn state(&self) -> ModemState {
        self.arbiter.state()
    }

    /// Returns `true` if no operation is in flight
    pub fn is_free(&self) -> bool {
        self.arbiter.state() == ModemState::Free
    }

    /// Last configuration applied with [`configure`](Self::configure)
    pub fn config(&self) -> Option<ModemConfig> {
        self.config.with_ref(|config| *config)
    }

    /// Run `f` with exclusive access to the radio driver.
    ///
    /// Intended for diagnostics and chip-specific extras. Calling transmit
    /// or receive methods here bypasses the arbiter.
    ///
    /// Interrupts stay enabled while `f` runs. The lock spins, so the
    /// deferred context must not preempt a holder on the same core at a
    /// strictly higher priority.
    pub fn with_radio<T>(&self, f: impl FnOnce(&mut R) -> T) -> T {
        f(&mut self.radio.lock())
    }

    /// Wait asynchronously until the arbiter is free
    #[cfg(feature = "async")]
    pub fn wait_free(&self) -> FreeFuture<'_, R> {
        FreeFuture { modem: self }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Initialize the radio and put it to sleep
    ///
    /// # Errors
    ///
    /// - [`ModemError::Busy`] if an operation is in flight
    /// - the radio's error if initialization fails
    pub fn init(&self) -> Result<()> {
        self.run_exclusive(R::init)?;
        debug!("modem initialized");
        Ok(())
    }

    /// Validate and apply a configuration
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the configuration is invalid
    /// - [`ModemError::Busy`] if an operation is in flight
    /// - the radio's error if applying the parameters fails
    pub fn configure(&self, config: ModemConfig) -> Result<()> {
        config.validate()?;

        self.run_exclusive(|radio| {
            radio.configure(&config)?;
            radio.set_public_network(config.public_network)
        })?;
        self.config.with(|stored| *stored = Some(config));

        debug!(
            "modem configured: {} Hz, sf {}",
            config.frequency_hz,
            config.spreading_factor.value()
        );
        Ok(())
    }

    /// Acquire, run `f` on the awake radio, and release.
    fn run_exclusive<T>(&self, f: impl FnOnce(&mut R) -> RadioResult<T>) -> Result<T> {
        let id = self.acquire(|id| {
            OperationContext::new(id, OperationKind::Control, Notifier::None)
        })?;
        let result = self.start_radio(f);
        if self.arbiter.try_begin_release_of(id) {
            self.finish_release(None);
        }
        result.map_err(Error::from)
    }

    // =========================================================================
    // Acquisition and release
    // =========================================================================

    /// Acquire the arbiter and install the context `build` returns for the
    /// new operation.
    ///
    /// The acquisition also fails while the blocking-caller slot still holds
    /// an outcome nobody has taken, so that outcome cannot be mistaken for
    /// the new operation's.
    pub(crate) fn acquire(
        &self,
        build: impl FnOnce(OperationId) -> OperationContext,
    ) -> Result<OperationId> {
        critical_section::with(|_| {
            if self.completion.is_pending() {
                debug!("acquire rejected: previous outcome not yet consumed");
                return Err(ModemError::Busy.into());
            }
            let Some(id) = self.arbiter.try_acquire_operation() else {
                debug!("acquire rejected: modem {:?}", self.arbiter.state());
                return Err(ModemError::Busy.into());
            };
            self.context.with(|slot| *slot = Some(build(id)));
            Ok(id)
        })
    }

    /// Run `f` on the radio, waking it first if it reports low power.
    pub(crate) fn start_radio<T>(&self, f: impl FnOnce(&mut R) -> RadioResult<T>) -> RadioResult<T> {
        self.with_radio(|radio| {
            if radio.is_sleeping() {
                radio.wakeup()?;
            }
            f(radio)
        })
    }

    /// Release `id` after a failed start and report `err`.
    pub(crate) fn abort_start(&self, id: OperationId, err: Error) -> Error {
        warning!("operation start failed: {:?}", err);
        if self.arbiter.try_begin_release_of(id) {
            self.finish_release(None);
        }
        err
    }

    /// Snapshot of the in-flight operation's context
    pub(crate) fn current_context(&self) -> Option<OperationContext> {
        self.context.with_ref(|context| *context)
    }

    /// Final step of every operation. Only the winner of a
    /// `try_begin_release*` call may invoke it.
    ///
    /// The radio goes to sleep, then the context is cleared, the outcome
    /// delivered and the arbiter freed in one critical section. Observers
    /// therefore never see `Free` with a stale context, nor a delivered
    /// outcome whose operation still holds the arbiter.
    pub(crate) fn finish_release(&self, outcome: Option<Result<Completion>>) {
        if let Err(err) = self.with_radio(R::sleep) {
            warning!("radio sleep failed during release: {:?}", err);
        }

        let notifier = critical_section::with(|_| {
            let notifier = self
                .context
                .with(Option::take)
                .map_or(Notifier::None, |context| context.notifier);
            let signal = match (notifier, outcome) {
                (Notifier::Modem, Some(outcome)) => {
                    self.completion.fill(outcome);
                    Some(&self.completion)
                }
                (Notifier::External(signal), Some(outcome)) => {
                    signal.fill(outcome);
                    Some(signal)
                }
                _ => None,
            };
            self.arbiter.finish_release();
            signal
        });

        if let Some(signal) = notifier {
            signal.wake();
        }
        #[cfg(feature = "async")]
        self.free_waker.wake();
    }

    // =========================================================================
    // Blocking wait
    // =========================================================================

    /// Poll the caller slot for the outcome of `id` for up to `timeout_us`.
    ///
    /// On expiry the caller tries to release `id` itself. If the completion
    /// handler got there first, its outcome is on the way and the caller
    /// keeps polling until it lands.
    pub(crate) fn wait_outcome<D: DelayNs>(
        &self,
        id: OperationId,
        timeout_us: u64,
        delay: &mut D,
    ) -> Result<Completion> {
        let mut waited_us: u64 = 0;

        loop {
            if let Some(outcome) = self.completion.try_take() {
                return outcome;
            }
            if waited_us >= timeout_us {
                break;
            }
            delay.delay_us(WAIT_POLL_INTERVAL_US);
            waited_us += u64::from(WAIT_POLL_INTERVAL_US);
        }

        if self.arbiter.try_begin_release_of(id) {
            warning!("no completion after {} us, releasing", waited_us);
            self.finish_release(None);
            return Err(IoError::Timeout.into());
        }

        debug!("timeout lost race to completion handler, waiting");
        loop {
            if let Some(outcome) = self.completion.try_take() {
                return outcome;
            }
            delay.delay_us(WAIT_POLL_INTERVAL_US);
        }
    }
}

/// Future returned by [`Modem::wait_free`].
#[cfg(feature = "async")]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct FreeFuture<'a, R: RadioDriver> {
    modem: &'a Modem<R>,
}

#[cfg(feature = "async")]
impl<R: RadioDriver> Future for FreeFuture<'_, R> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.modem.is_free() {
            return Poll::Ready(());
        }

        self.modem.free_waker.register(cx.waker());

        if self.modem.is_free() {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::config::Direction;
    use crate::driver::error::{ConfigError, RadioError};
    use crate::testing::{MockRadio, RadioCall};

    #[test]
    fn init_sleeps_radio_and_stays_free() {
        let modem = Modem::new(MockRadio::new());
        modem.init().unwrap();

        assert!(modem.is_free());
        modem.with_radio(|radio| {
            assert_eq!(radio.calls(), [RadioCall::Init, RadioCall::Sleep]);
            assert!(radio.is_sleeping());
        });
    }

    #[test]
    fn init_failure_still_releases() {
        let mut radio = MockRadio::new();
        radio.fail_init(RadioError::Bus);
        let modem = Modem::new(radio);

        assert_eq!(modem.init(), Err(Error::Radio(RadioError::Bus)));
        assert_eq!(modem.state(), ModemState::Free);
    }

    #[test]
    fn configure_stores_and_applies() {
        let modem = Modem::new(MockRadio::new());
        modem.init().unwrap();

        let config = ModemConfig::new()
            .with_direction(Direction::Tx)
            .with_public_network(false);
        modem.configure(config).unwrap();

        assert_eq!(modem.config(), Some(config));
        modem.with_radio(|radio| {
            assert!(radio.calls().contains(&RadioCall::Configure(config)));
            assert!(radio.calls().contains(&RadioCall::SetPublicNetwork(false)));
        });
        assert!(modem.is_free());
    }

    #[test]
    fn configure_wakes_sleeping_radio_first() {
        let modem = Modem::new(MockRadio::new());
        modem.init().unwrap();
        modem.with_radio(MockRadio::clear_calls);

        modem.configure(ModemConfig::new()).unwrap();

        modem.with_radio(|radio| {
            assert_eq!(radio.calls()[0], RadioCall::Wakeup);
        });
    }

    #[test]
    fn configure_skips_wakeup_when_awake() {
        let modem = Modem::new(MockRadio::new());
        modem.configure(ModemConfig::new()).unwrap();

        modem.with_radio(|radio| {
            assert!(!radio.calls().contains(&RadioCall::Wakeup));
        });
    }

    #[test]
    fn configure_rejects_invalid() {
        let modem = Modem::new(MockRadio::new());
        let result = modem.configure(ModemConfig::new().with_frequency(0));

        assert_eq!(result, Err(Error::Config(ConfigError::InvalidFrequency)));
        assert_eq!(modem.config(), None);
    }

    #[test]
    fn configure_while_busy_is_rejected() {
        let modem = Modem::new(MockRadio::new());
        assert!(modem.arbiter.try_acquire());

        assert_eq!(
            modem.configure(ModemConfig::new()),
            Err(Error::Modem(ModemError::Busy))
        );
    }

    #[test]
    fn acquire_rejected_while_outcome_unconsumed() {
        let modem = Modem::new(MockRadio::new());
        modem.completion.signal(Ok(Completion::Sent { len: 1 }));

        assert_eq!(modem.init(), Err(Error::Modem(ModemError::Busy)));
        assert!(modem.is_free());
    }

    #[cfg(feature = "async")]
    #[test]
    fn wait_free_wakes_on_release() {
        use crate::testing::WakeCounter;

        let modem = Modem::new(MockRadio::new());
        assert!(modem.arbiter.try_acquire());

        let counter = WakeCounter::new();
        let waker = counter.waker();
        let mut cx = Context::from_waker(&waker);
        let mut future = modem.wait_free();
        assert!(Pin::new(&mut future).poll(&mut cx).is_pending());

        assert!(modem.arbiter.try_begin_release());
        modem.finish_release(None);

        assert_eq!(counter.count(), 1);
        assert!(Pin::new(&mut future).poll(&mut cx).is_ready());
    }
}
