//! Cancellable recurring tasks.
//!
//! Every periodic loop in the application (video playback, frame rendering,
//! recognition polling) runs on its own named worker thread and is owned through
//! a [`Recurring`] handle. Stopping or dropping the handle cancels the loop and
//! joins the worker.

use anyhow::{Context, Result};
use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// First grid slot after `now`, counting from `deadline` in steps of `interval`.
fn next_deadline(deadline: Instant, interval: Duration, now: Instant) -> Instant {
    let next = deadline + interval;
    if next > now || interval.is_zero() {
        return next;
    }
    let behind = now.duration_since(next).as_nanos() / interval.as_nanos();
    let skipped = u32::try_from(behind + 1).unwrap_or(u32::MAX);
    next + interval.saturating_mul(skipped)
}

/// Handle to a periodic task running on a worker thread.
pub struct Recurring {
    name: String,
    stop_sender: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Recurring {
    /// Spawns `tick` on a worker thread, calling it once per `interval`.
    ///
    /// Ticks are scheduled on a fixed grid: the first fires one interval after
    /// spawning and the n-th at n intervals, however long each tick takes. A
    /// tick that overruns its slot skips the slots it missed; ticks never
    /// overlap.
    pub fn spawn<F>(name: &str, interval: Duration, mut tick: F) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let (stop_sender, stop_receiver) = channel::<()>();

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut deadline = Instant::now() + interval;
                loop {
                    let wait = deadline.saturating_duration_since(Instant::now());
                    match stop_receiver.recv_timeout(wait) {
                        Err(RecvTimeoutError::Timeout) => {
                            tick();
                            deadline = next_deadline(deadline, interval, Instant::now());
                        }
                        // Explicit stop or handle dropped
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .with_context(|| format!("Failed to spawn {} thread", name))?;

        Ok(Self {
            name: name.to_string(),
            stop_sender: Some(stop_sender),
            handle: Some(handle),
        })
    }

    /// Returns true until the task has been stopped.
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Cancels the task and waits for the current tick to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(sender) = self.stop_sender.take() {
            let _ = sender.send(());
        }

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                crate::log(&format!("{} thread panicked", self.name));
            }
        }
    }
}

impl Drop for Recurring {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_ticks_until_stopped() {
        let ticks = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&ticks);

        let task = Recurring::spawn("test-tick", Duration::from_millis(5), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        thread::sleep(Duration::from_millis(100));
        assert!(task.is_running());
        task.stop();

        let after_stop = ticks.load(Ordering::SeqCst);
        assert!(after_stop > 0);

        thread::sleep(Duration::from_millis(30));
        assert_eq!(ticks.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn test_slow_ticks_keep_the_cadence() {
        let ticks = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&ticks);

        let task = Recurring::spawn("test-cadence", Duration::from_millis(50), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(40));
        })
        .unwrap();
        thread::sleep(Duration::from_millis(1000));
        task.stop();

        // A delay-after-tick loop manages about 11 here
        assert!(ticks.load(Ordering::SeqCst) >= 15);
    }

    #[test]
    fn test_overrun_skips_missed_slots() {
        let start = Instant::now();
        let interval = Duration::from_millis(10);

        let on_time = next_deadline(start, interval, start + Duration::from_millis(5));
        assert_eq!(on_time, start + interval);

        let late = next_deadline(start, interval, start + Duration::from_millis(35));
        assert_eq!(late, start + Duration::from_millis(40));
    }

    #[test]
    fn test_drop_cancels_task() {
        let ticks = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&ticks);

        {
            let _task = Recurring::spawn("test-drop", Duration::from_millis(5), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
            thread::sleep(Duration::from_millis(30));
        }

        let after_drop = ticks.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(ticks.load(Ordering::SeqCst), after_drop);
    }

    #[test]
    fn test_stop_is_prompt_with_long_interval() {
        let task = Recurring::spawn("test-slow", Duration::from_secs(60), || {}).unwrap();

        let started = std::time::Instant::now();
        task.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
