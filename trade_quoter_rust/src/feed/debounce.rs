use std::time::Duration;

use tokio::select;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::trace;

/// Sits between a `watch` input and a `watch` output and forwards the
/// most recent value only once it has been stable for the quiet window.
/// Every input change restarts the timer; values are never coalesced
/// beyond "latest wins".
///
/// The value present on the input at spawn time seeds the output
/// immediately, so the very first emission is not delayed. Only
/// subsequent edits wait out the window.
pub struct Debouncer<T> {
    window: Duration,
    input: watch::Receiver<T>,
    output: watch::Sender<T>,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn spawn(
        window: Duration,
        input: watch::Receiver<T>,
    ) -> (watch::Receiver<T>, JoinHandle<()>) {
        let initial = input.borrow().clone();
        let (output, output_rx) = watch::channel(initial);
        let debouncer = Self {
            window,
            input,
            output,
        };
        let handle = tokio::spawn(debouncer.run());
        (output_rx, handle)
    }

    async fn run(mut self) {
        loop {
            // park until the input moves at all
            if self.input.changed().await.is_err() {
                return;
            }

            // keep restarting the window until the input stays quiet
            loop {
                let pending = self.input.borrow_and_update().clone();
                select! {
                    _ = sleep(self.window) => {
                        let emitted = self.output.send_if_modified(|current| {
                            if *current != pending {
                                *current = pending.clone();
                                true
                            } else {
                                false
                            }
                        });
                        trace!(emitted, "DebounceWindowElapsed");
                        break;
                    }
                    changed = self.input.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        // timer resets with the newer value
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::task::yield_now;
    use tokio::time::{Duration, advance};

    #[tokio::test(start_paused = true)]
    async fn test_initial_value_propagates_immediately() {
        let (_tx, rx) = watch::channel(7u32);
        let (out, _task) = Debouncer::spawn(Duration::from_millis(200), rx);
        assert_eq!(*out.borrow(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_edits_collapse_to_last_value() {
        let (tx, rx) = watch::channel(0u32);
        let (out, _task) = Debouncer::spawn(Duration::from_millis(200), rx);

        // edits at t=0, 50, 120, 260; only the t=260 value may propagate
        tx.send(1).unwrap();
        yield_now().await;
        advance(Duration::from_millis(50)).await;
        tx.send(2).unwrap();
        yield_now().await;
        advance(Duration::from_millis(70)).await;
        tx.send(3).unwrap();
        yield_now().await;
        advance(Duration::from_millis(140)).await;
        tx.send(4).unwrap();
        yield_now().await;

        // 199ms after the last edit: still nothing
        advance(Duration::from_millis(199)).await;
        yield_now().await;
        assert_eq!(*out.borrow(), 0);

        // full quiet window elapsed from the last edit's own arrival
        advance(Duration::from_millis(2)).await;
        yield_now().await;
        assert_eq!(*out.borrow(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stable_value_propagates_after_window() {
        let (tx, rx) = watch::channel(0u32);
        let (out, _task) = Debouncer::spawn(Duration::from_millis(200), rx);

        tx.send(5).unwrap();
        yield_now().await;
        advance(Duration::from_millis(201)).await;
        yield_now().await;
        assert_eq!(*out.borrow(), 5);
    }
}
