//! Completion notifier.
//!
//! A single-slot, interrupt-safe mailbox carrying the outcome of one modem
//! operation from the deferred context to whoever waits for it. Blocking
//! callers poll it with [`try_take`](CompletionSignal::try_take); async
//! callers await [`wait`](CompletionSignal::wait).

#[cfg(feature = "async")]
use core::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

#[cfg(feature = "async")]
use super::primitives::AtomicWaker;
use super::primitives::CriticalSectionCell;
use crate::driver::error::Result;
use crate::radio::{Packet, RxQuality};

/// A packet delivered to a one-shot receiver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedPacket {
    /// Payload, already capped at the receiver's capacity
    pub data: Packet,
    /// Signal quality
    pub quality: RxQuality,
}

/// Successful operation outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Packet transmitted
    Sent {
        /// Payload length
        len: usize,
    },
    /// Packet received
    Received(ReceivedPacket),
}

/// Outcome mailbox for one operation at a time.
///
/// # Example
///
/// ```ignore
/// static TX_DONE: CompletionSignal = CompletionSignal::new();
///
/// MODEM.send_async(&frame, Some(&TX_DONE))?;
/// let outcome = TX_DONE.wait().await;
/// ```
pub struct CompletionSignal {
    slot: CriticalSectionCell<Option<Result<Completion>>>,
    #[cfg(feature = "async")]
    waker: AtomicWaker,
}

impl CompletionSignal {
    /// Create an empty signal (const, suitable for static initialization)
    pub const fn new() -> Self {
        Self {
            slot: CriticalSectionCell::new(None),
            #[cfg(feature = "async")]
            waker: AtomicWaker::new(),
        }
    }

    /// Store an outcome and wake the waiter.
    ///
    /// An unconsumed earlier outcome is replaced.
    pub fn signal(&self, outcome: Result<Completion>) {
        self.fill(outcome);
        self.wake();
    }

    /// Take the outcome, if one has arrived
    pub fn try_take(&self) -> Option<Result<Completion>> {
        self.slot.with(Option::take)
    }

    /// Returns `true` if an outcome is waiting to be taken
    pub fn is_pending(&self) -> bool {
        self.slot.with_ref(Option::is_some)
    }

    /// Discard any unconsumed outcome
    pub fn reset(&self) {
        self.slot.with(|slot| *slot = None);
    }

    /// Wait asynchronously for the outcome
    #[cfg(feature = "async")]
    pub fn wait(&self) -> CompletionFuture<'_> {
        CompletionFuture { signal: self }
    }

    /// Store without waking; the caller wakes once its critical section ends.
    pub(crate) fn fill(&self, outcome: Result<Completion>) {
        self.slot.with(|slot| *slot = Some(outcome));
    }

    #[inline]
    pub(crate) fn wake(&self) {
        #[cfg(feature = "async")]
        self.waker.wake();
    }
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Future returned by [`CompletionSignal::wait`].
#[cfg(feature = "async")]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct CompletionFuture<'a> {
    signal: &'a CompletionSignal,
}

#[cfg(feature = "async")]
impl Future for CompletionFuture<'_> {
    type Output = Result<Completion>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(outcome) = self.signal.try_take() {
            return Poll::Ready(outcome);
        }

        self.signal.waker.register(cx.waker());

        // Re-check: the outcome may have landed before registration
        match self.signal.try_take() {
            Some(outcome) => Poll::Ready(outcome),
            None => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::error::{Error, IoError};

    #[test]
    fn take_consumes_outcome() {
        let signal = CompletionSignal::new();
        assert!(!signal.is_pending());

        signal.signal(Ok(Completion::Sent { len: 4 }));
        assert!(signal.is_pending());
        assert_eq!(signal.try_take(), Some(Ok(Completion::Sent { len: 4 })));
        assert_eq!(signal.try_take(), None);
    }

    #[test]
    fn later_outcome_replaces_earlier() {
        let signal = CompletionSignal::new();
        signal.signal(Ok(Completion::Sent { len: 1 }));
        signal.signal(Err(Error::Io(IoError::Timeout)));

        assert_eq!(signal.try_take(), Some(Err(Error::Io(IoError::Timeout))));
    }

    #[test]
    fn reset_discards() {
        let signal = CompletionSignal::default();
        signal.signal(Err(IoError::PeripheralError.into()));
        signal.reset();
        assert!(!signal.is_pending());
    }

    #[test]
    fn received_packet_carries_quality() {
        let signal = CompletionSignal::new();
        let packet = ReceivedPacket {
            data: Packet::from_slice(&[1, 2, 3]).unwrap(),
            quality: RxQuality::new(-90, 7),
        };
        signal.signal(Ok(Completion::Received(packet.clone())));

        match signal.try_take() {
            Some(Ok(Completion::Received(received))) => assert_eq!(received, packet),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[cfg(feature = "async")]
    #[test]
    fn wait_pending_until_signaled() {
        use crate::testing::WakeCounter;

        let signal = CompletionSignal::new();
        let counter = WakeCounter::new();
        let waker = counter.waker();
        let mut cx = Context::from_waker(&waker);

        let mut future = signal.wait();
        assert!(Pin::new(&mut future).poll(&mut cx).is_pending());

        signal.signal(Ok(Completion::Sent { len: 2 }));
        assert_eq!(counter.count(), 1);

        match Pin::new(&mut future).poll(&mut cx) {
            Poll::Ready(outcome) => assert_eq!(outcome, Ok(Completion::Sent { len: 2 })),
            Poll::Pending => panic!("signal not observed"),
        }
    }

    #[cfg(feature = "async")]
    #[test]
    fn wait_ready_immediately_when_filled() {
        use crate::testing::WakeCounter;

        let signal = CompletionSignal::new();
        signal.signal(Err(IoError::Canceled.into()));

        let counter = WakeCounter::new();
        let waker = counter.waker();
        let mut cx = Context::from_waker(&waker);
        let mut future = signal.wait();

        assert!(Pin::new(&mut future).poll(&mut cx).is_ready());
        assert_eq!(counter.count(), 0);
    }
}
