//! Testing utilities and mock implementations
//!
//! Mocks for exercising the modem core on the host without a radio.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Wake, Waker};
use std::time::Duration;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::driver::config::ModemConfig;
use crate::driver::context::PacketHandler;
use crate::driver::error::{Error, RadioError, RadioResult};
use crate::radio::{IrqLine, Packet, RadioDriver, RadioEvent, RxQuality};

// =============================================================================
// Mock Radio
// =============================================================================

/// A call made through [`RadioDriver`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioCall {
    Init,
    Sleep,
    Wakeup,
    Configure(ModemConfig),
    SetPublicNetwork(bool),
    SetMaxPayload(u8),
    /// Payload length
    Send(usize),
    EnterReceive(u32),
    ContinuousWave(u32, i8, u16),
}

/// Radio driver that records calls and replays scripted IRQ events
///
/// # Example
///
/// ```ignore
/// let mut radio = MockRadio::new();
/// radio.set_time_on_air(10);
/// radio.push_event(IrqLine::Dio1, RadioEvent::TxDone);
/// ```
#[derive(Debug)]
pub struct MockRadio {
    calls: Vec<RadioCall>,
    pending: Vec<(IrqLine, RadioEvent, Packet)>,
    sleeping: bool,
    time_on_air_ms: u32,
    init_error: Option<RadioError>,
    send_error: Option<RadioError>,
    receive_error: Option<RadioError>,
    irq_error: Option<RadioError>,
    irq_hook: Option<fn()>,
}

impl MockRadio {
    pub const fn new() -> Self {
        Self {
            calls: Vec::new(),
            pending: Vec::new(),
            sleeping: false,
            time_on_air_ms: 0,
            init_error: None,
            send_error: None,
            receive_error: None,
            irq_error: None,
            irq_hook: None,
        }
    }

    /// All calls since creation or the last [`clear_calls`](Self::clear_calls)
    pub fn calls(&self) -> &[RadioCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn set_time_on_air(&mut self, ms: u32) {
        self.time_on_air_ms = ms;
    }

    /// Queue an event for the next `process_irq` on `line`
    pub fn push_event(&mut self, line: IrqLine, event: RadioEvent) {
        self.pending.push((line, event, Packet::new()));
    }

    /// Queue a received packet for the next `process_irq` on `line`
    pub fn push_rx(&mut self, line: IrqLine, data: &[u8], quality: RxQuality) {
        let packet = Packet::from_slice(data).expect("mock packet too large");
        self.pending
            .push((line, RadioEvent::RxDone(quality), packet));
    }

    pub fn fail_init(&mut self, err: RadioError) {
        self.init_error = Some(err);
    }

    pub fn fail_send(&mut self, err: RadioError) {
        self.send_error = Some(err);
    }

    pub fn fail_enter_receive(&mut self, err: RadioError) {
        self.receive_error = Some(err);
    }

    pub fn fail_process_irq(&mut self, err: RadioError) {
        self.irq_error = Some(err);
    }

    /// Run `hook` inside every `process_irq`, as if mid bus transfer
    pub fn set_irq_hook(&mut self, hook: fn()) {
        self.irq_hook = Some(hook);
    }

    fn check(slot: Option<RadioError>) -> RadioResult<()> {
        slot.map_or(Ok(()), Err)
    }
}

impl RadioDriver for MockRadio {
    fn init(&mut self) -> RadioResult<()> {
        self.calls.push(RadioCall::Init);
        Self::check(self.init_error)?;
        self.sleeping = false;
        Ok(())
    }

    fn sleep(&mut self) -> RadioResult<()> {
        self.calls.push(RadioCall::Sleep);
        self.sleeping = true;
        Ok(())
    }

    fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    fn wakeup(&mut self) -> RadioResult<()> {
        self.calls.push(RadioCall::Wakeup);
        self.sleeping = false;
        Ok(())
    }

    fn configure(&mut self, config: &ModemConfig) -> RadioResult<()> {
        self.calls.push(RadioCall::Configure(*config));
        Ok(())
    }

    fn set_public_network(&mut self, enable: bool) -> RadioResult<()> {
        self.calls.push(RadioCall::SetPublicNetwork(enable));
        Ok(())
    }

    fn set_max_payload(&mut self, len: u8) -> RadioResult<()> {
        self.calls.push(RadioCall::SetMaxPayload(len));
        Ok(())
    }

    fn time_on_air(&self, _config: &ModemConfig, _len: u8) -> u32 {
        self.time_on_air_ms
    }

    fn send(&mut self, data: &[u8]) -> RadioResult<()> {
        Self::check(self.send_error)?;
        self.calls.push(RadioCall::Send(data.len()));
        Ok(())
    }

    fn enter_receive(&mut self, timeout_ms: u32) -> RadioResult<()> {
        Self::check(self.receive_error)?;
        self.calls.push(RadioCall::EnterReceive(timeout_ms));
        Ok(())
    }

    fn continuous_wave(
        &mut self,
        frequency_hz: u32,
        power_dbm: i8,
        duration_s: u16,
    ) -> RadioResult<()> {
        self.calls
            .push(RadioCall::ContinuousWave(frequency_hz, power_dbm, duration_s));
        Ok(())
    }

    fn process_irq(
        &mut self,
        line: IrqLine,
        packet: &mut Packet,
    ) -> RadioResult<Option<RadioEvent>> {
        if let Some(hook) = self.irq_hook {
            hook();
        }
        Self::check(self.irq_error)?;
        let Some(index) = self.pending.iter().position(|(l, _, _)| *l == line) else {
            return Ok(None);
        };
        let (_, event, data) = self.pending.remove(index);
        *packet = data;
        Ok(Some(event))
    }
}

impl Default for MockRadio {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Delays
// =============================================================================

/// Virtual-time delay that only counts
#[derive(Debug, Default)]
pub struct MockDelay {
    total_ns: u64,
}

impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_us(&self) -> u64 {
        self.total_ns / 1_000
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

/// Virtual-time delay that runs a hook after every tick.
///
/// The hook receives the elapsed virtual time in microseconds and can inject
/// completions at a chosen instant, standing in for the deferred context.
pub struct ScriptedDelay<F: FnMut(u64)> {
    elapsed_ns: u64,
    hook: F,
}

impl<F: FnMut(u64)> ScriptedDelay<F> {
    pub fn new(hook: F) -> Self {
        Self {
            elapsed_ns: 0,
            hook,
        }
    }

    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_ns / 1_000
    }
}

impl<F: FnMut(u64)> DelayNs for ScriptedDelay<F> {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns += u64::from(ns);
        (self.hook)(self.elapsed_ns / 1_000);
    }
}

/// Real sleeping delay for multi-threaded tests
#[derive(Debug, Default)]
pub struct StdDelay;

impl StdDelay {
    pub fn new() -> Self {
        Self
    }
}

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}

// =============================================================================
// Async and callback helpers
// =============================================================================

/// Waker that counts how often it was woken
#[derive(Debug, Default)]
pub struct WakeCounter {
    wakes: AtomicUsize,
}

impl WakeCounter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn waker(self: &Arc<Self>) -> Waker {
        Waker::from(Arc::clone(self))
    }

    pub fn count(&self) -> usize {
        self.wakes.load(Ordering::SeqCst)
    }
}

impl Wake for WakeCounter {
    fn wake(self: Arc<Self>) {
        self.wakes.fetch_add(1, Ordering::SeqCst);
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.wakes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Packet handler that records what it was given
///
/// Declare as a `static` per test; handlers must live for `'static`.
pub struct RecordingHandler {
    packets: Mutex<Vec<Vec<u8>>>,
    stopped: Mutex<Option<Error>>,
}

impl RecordingHandler {
    pub const fn new() -> Self {
        Self {
            packets: Mutex::new(Vec::new()),
            stopped: Mutex::new(None),
        }
    }

    pub fn packets(&self) -> Vec<Vec<u8>> {
        self.packets.lock().unwrap().clone()
    }

    pub fn stopped(&self) -> Option<Error> {
        *self.stopped.lock().unwrap()
    }
}

impl PacketHandler for RecordingHandler {
    fn on_packet(&self, data: &[u8], _quality: RxQuality) {
        self.packets.lock().unwrap().push(data.to_vec());
    }

    fn on_stopped(&self, reason: Error) {
        *self.stopped.lock().unwrap() = Some(reason);
    }
}
