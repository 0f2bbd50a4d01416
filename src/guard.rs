use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

pub type BoxedOperation<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Settlement<T> {
    Delivered(T),
    Discarded,
}

impl<T> Settlement<T> {
    pub fn is_discarded(&self) -> bool {
        matches!(self, Settlement::Discarded)
    }

    pub fn delivered(self) -> Option<T> {
        match self {
            Settlement::Delivered(value) => Some(value),
            Settlement::Discarded => None,
        }
    }
}

#[derive(Clone, Default)]
pub struct AsyncGuard {
    discarded: Arc<AtomicBool>,
}

impl AsyncGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wrap<F>(operation: F) -> (Guarded<F::Output>, AsyncGuard)
    where
        F: Future + Send + 'static,
    {
        let guard = AsyncGuard::new();
        (guard.guard(operation), guard)
    }

    /// Binds `operation` to this guard's flag.
    pub fn guard<F>(&self, operation: F) -> Guarded<F::Output>
    where
        F: Future + Send + 'static,
    {
        Guarded {
            operation: Box::pin(operation),
            discarded: self.discarded.clone(),
            settled: false,
        }
    }

    pub fn cancel(&self) {
        self.discarded.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.discarded.load(Ordering::SeqCst)
    }

    pub fn same_as(&self, other: &AsyncGuard) -> bool {
        Arc::ptr_eq(&self.discarded, &other.discarded)
    }
}

impl Debug for AsyncGuard {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncGuard")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

pub struct Guarded<T> {
    operation: BoxedOperation<T>,
    discarded: Arc<AtomicBool>,
    settled: bool,
}

impl<T> Guarded<T>
where
    T: Send + 'static,
{
    pub async fn then<R, C>(self, continuation: C) -> Option<R>
    where
        C: FnOnce(T) -> R,
    {
        self.await.delivered().map(continuation)
    }
}

impl<T> Future for Guarded<T> {
    type Output = Settlement<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if this.settled {
            return Poll::Pending;
        }
        match this.operation.as_mut().poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(value) => {
                this.settled = true;
                if this.discarded.load(Ordering::SeqCst) {
                    Poll::Ready(Settlement::Discarded)
                } else {
                    Poll::Ready(Settlement::Delivered(value))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::oneshot;
    use futures::FutureExt;
    use futures::executor::block_on;
    use futures::task::noop_waker_ref;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn uncancelled_operation_delivers_its_value() {
        let (guarded, guard) = AsyncGuard::wrap(async { 7 });
        assert_eq!(block_on(guarded), Settlement::Delivered(7));
        assert!(!guard.is_cancelled());
    }

    #[test]
    fn failure_is_delivered_unchanged() {
        let (guarded, _guard) = AsyncGuard::wrap(async { Err::<(), _>("boom") });
        assert_eq!(block_on(guarded), Settlement::Delivered(Err("boom")));
    }

    #[test]
    fn cancel_before_settle_suppresses_continuations() {
        let (sender, receiver) = oneshot::channel::<Result<u8, &'static str>>();
        let ran = Arc::new(AtomicUsize::new(0));
        let (guarded, guard) = AsyncGuard::wrap(async move {
            receiver.await.expect("sender kept alive")
        });

        guard.cancel();
        sender.send(Err("late failure")).expect("receiver alive");

        let counter = ran.clone();
        let outcome = block_on(guarded.then(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(outcome, None);
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn cancelled_operation_still_runs_to_completion() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();
        let (guarded, guard) = AsyncGuard::wrap(async move {
            flag.store(true, Ordering::SeqCst);
        });
        guard.cancel();

        assert!(block_on(guarded).is_discarded());
        assert!(finished.load(Ordering::SeqCst));
    }

    #[test]
    fn cancel_is_idempotent_and_harmless_after_settle() {
        let (guarded, guard) = AsyncGuard::wrap(async { "done" });
        let delivered = block_on(guarded.then(|value| value.len()));
        guard.cancel();
        guard.cancel();
        assert_eq!(delivered, Some(4));
        assert!(guard.is_cancelled());
    }

    #[test]
    fn guard_created_before_operation_still_suppresses() {
        let guard = AsyncGuard::new();
        guard.cancel();
        let guarded = guard.guard(async { 1 });
        assert!(block_on(guarded).is_discarded());
    }

    #[test]
    fn polling_after_settle_stays_pending() {
        let (mut guarded, _guard) = AsyncGuard::wrap(async { 5 });
        let mut cx = Context::from_waker(noop_waker_ref());
        assert_eq!(
            guarded.poll_unpin(&mut cx),
            Poll::Ready(Settlement::Delivered(5))
        );
        assert_eq!(guarded.poll_unpin(&mut cx), Poll::Pending);
    }

    #[test]
    fn clones_share_cancellation() {
        let (_guarded, guard) = AsyncGuard::wrap(async {});
        let clone = guard.clone();
        clone.cancel();
        assert!(guard.is_cancelled());
        assert!(guard.same_as(&clone));

        let (_other, unrelated) = AsyncGuard::wrap(async {});
        assert!(!guard.same_as(&unrelated));
    }
}
