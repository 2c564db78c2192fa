//! Interrupt deferral queue.
//!
//! The radio's GPIO interrupt handler only records which IRQ line fired and
//! returns. The deferred context (a thread, a work loop or an async task)
//! drains the queue and runs the completion logic with interrupts enabled.
//!
//! ```ignore
//! static DEFERRAL: IrqDeferral<DEFAULT_DEFERRED_DEPTH> = IrqDeferral::new();
//!
//! // GPIO ISR
//! DEFERRAL.pend(IrqLine::Dio1);
//!
//! // Deferred context
//! loop {
//!     let line = DEFERRAL.wait().await;
//!     MODEM.service_irq(line);
//! }
//! ```

#[cfg(feature = "async")]
use core::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use core::sync::atomic::{AtomicU32, Ordering};

use heapless::Deque;

#[cfg(feature = "async")]
use super::primitives::AtomicWaker;
use super::primitives::CriticalSectionCell;
use crate::internal::fmt::warning;
use crate::radio::IrqLine;

/// Bounded queue of pending IRQ lines between an ISR and the deferred context.
///
/// An edge on a line that is already queued is coalesced: the chip driver
/// reads the full IRQ status when it services the line anyway.
pub struct IrqDeferral<const N: usize> {
    queue: CriticalSectionCell<Deque<IrqLine, N>>,
    dropped: AtomicU32,
    #[cfg(feature = "async")]
    waker: AtomicWaker,
}

impl<const N: usize> IrqDeferral<N> {
    /// Create an empty queue (const, suitable for static initialization)
    pub const fn new() -> Self {
        Self {
            queue: CriticalSectionCell::new(Deque::new()),
            dropped: AtomicU32::new(0),
            #[cfg(feature = "async")]
            waker: AtomicWaker::new(),
        }
    }

    /// Record an edge on `line`. Safe to call from interrupt context.
    ///
    /// Never blocks. If the queue is full the edge is counted as dropped.
    pub fn pend(&self, line: IrqLine) {
        let accepted = self.queue.with(|queue| {
            if queue.iter().any(|queued| *queued == line) {
                return true;
            }
            queue.push_back(line).is_ok()
        });

        if !accepted {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            warning!("irq deferral queue full, dropped {:?}", line);
        }

        #[cfg(feature = "async")]
        self.waker.wake();
    }

    /// Take the oldest pending line
    pub fn take(&self) -> Option<IrqLine> {
        self.queue.with(Deque::pop_front)
    }

    /// Returns `true` if any line is waiting
    pub fn is_pending(&self) -> bool {
        self.queue.with_ref(|queue| !queue.is_empty())
    }

    /// Number of edges lost to overflow since creation
    pub fn dropped_count(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Wait asynchronously for the next pending line
    #[cfg(feature = "async")]
    pub fn wait(&self) -> IrqFuture<'_, N> {
        IrqFuture { deferral: self }
    }
}

impl<const N: usize> Default for IrqDeferral<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Future returned by [`IrqDeferral::wait`].
#[cfg(feature = "async")]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct IrqFuture<'a, const N: usize> {
    deferral: &'a IrqDeferral<N>,
}

#[cfg(feature = "async")]
impl<const N: usize> Future for IrqFuture<'_, N> {
    type Output = IrqLine;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(line) = self.deferral.take() {
            return Poll::Ready(line);
        }

        self.deferral.waker.register(cx.waker());

        match self.deferral.take() {
            Some(line) => Poll::Ready(line),
            None => Poll::Pending,
        }
    }
}
