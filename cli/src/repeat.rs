//! Repeat-while-held buttons.
//!
//! Pressing fires the action at once and then every interval until the
//! button is released. Pressing again while held restarts the interval.

use std::time::Duration;

use tokio::task::JoinHandle;

/// A held button.
#[derive(Debug)]
pub struct Repeater {
    interval: Duration,
    task: Option<JoinHandle<()>>,
}

impl Repeater {
    /// Create a repeater with the given repeat period.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            task: None,
        }
    }

    /// Whether the button is currently held.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Press: fire now, then every interval until [`Self::release`].
    ///
    /// Must be called inside a tokio runtime.
    pub fn press<F>(&mut self, fire: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.start(fire, None);
    }

    /// Press and let go by itself after `duration`.
    ///
    /// The release belongs to this press: a later press or hold replaces
    /// it, so an earlier hold can never cut a later one short.
    pub fn hold_for<F>(&mut self, duration: Duration, fire: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.start(fire, Some(tokio::time::Instant::now() + duration));
    }

    fn start<F>(&mut self, mut fire: F, until: Option<tokio::time::Instant>)
    where
        F: FnMut() + Send + 'static,
    {
        self.release();
        fire();

        let period = self.interval;
        self.task = Some(tokio::spawn(async move {
            let mut ticks = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                let tick = ticks.tick();
                match until {
                    Some(deadline) => tokio::select! {
                        _ = tick => {}
                        () = tokio::time::sleep_until(deadline) => break,
                    },
                    None => {
                        tick.await;
                    }
                }
                fire();
            }
        }));
    }

    /// Release: stop repeating.
    pub fn release(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Repeater {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter() -> (Arc<AtomicUsize>, impl FnMut() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        (count, move || {
            c.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_press_fires_immediately() {
        let (count, fire) = counter();
        let mut repeater = Repeater::new(Duration::from_millis(300));

        repeater.press(fire);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(repeater.is_held());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeats_while_held() {
        let (count, fire) = counter();
        let mut repeater = Repeater::new(Duration::from_millis(300));

        repeater.press(fire);
        tokio::time::sleep(Duration::from_millis(950)).await;

        assert_eq!(count.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_stops_repeating() {
        let (count, fire) = counter();
        let mut repeater = Repeater::new(Duration::from_millis(300));

        repeater.press(fire);
        tokio::time::sleep(Duration::from_millis(350)).await;
        repeater.release();
        tokio::time::sleep(Duration::from_millis(1000)).await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(!repeater.is_held());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hold_lets_go_after_duration() {
        let (count, fire) = counter();
        let mut repeater = Repeater::new(Duration::from_millis(300));

        repeater.hold_for(Duration::from_millis(650), fire);
        tokio::time::sleep(Duration::from_millis(2000)).await;

        // 0, 300 and 600 ms
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(!repeater.is_held());
    }

    #[tokio::test(start_paused = true)]
    async fn test_earlier_hold_does_not_cut_later_hold_short() {
        let (left, fire_left) = counter();
        let (right, fire_right) = counter();
        let mut repeater = Repeater::new(Duration::from_millis(300));

        repeater.hold_for(Duration::from_millis(1000), fire_left);
        tokio::time::sleep(Duration::from_millis(500)).await;
        repeater.hold_for(Duration::from_millis(2000), fire_right);

        // Past the first hold's deadline, well inside the second one's
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(repeater.is_held());

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(left.load(Ordering::SeqCst), 2);
        // 500 ms, then every 300 ms up to 2300 ms
        assert_eq!(right.load(Ordering::SeqCst), 7);
        assert!(!repeater.is_held());
    }
}
