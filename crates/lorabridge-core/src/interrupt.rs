//! Interrupt emulation by polling
//!
//! Neither the CH341 bridge nor a polled GPIO line give us a usable interrupt line,
//! so transports sample the line from a background thread and call the
//! registered callback when the configured edge shows up. This is coarse:
//! edges shorter than the poll interval are missed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::Result;
use crate::transport::InterruptCallback;

/// Default interval between two samples of the interrupt line
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Line transition that counts as an interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// High to low (active-low lines)
    Falling,
    /// Low to high (active-high lines)
    Rising,
}

impl Edge {
    /// Line level while no interrupt is pending
    pub fn idle_level(self) -> bool {
        matches!(self, Edge::Falling)
    }
}

/// Turns a stream of line samples into edge events
#[derive(Debug, Clone)]
pub struct EdgeDetector {
    edge: Edge,
    last: bool,
}

impl EdgeDetector {
    /// Create a detector that assumes the line starts idle
    pub fn new(edge: Edge) -> Self {
        Self {
            edge,
            last: edge.idle_level(),
        }
    }

    /// Feed one sample; returns true if it completes the configured edge
    pub fn update(&mut self, level: bool) -> bool {
        let fired = match self.edge {
            Edge::Falling => self.last && !level,
            Edge::Rising => !self.last && level,
        };
        self.last = level;
        fired
    }
}

/// Background thread sampling an interrupt line
///
/// The callback runs on the worker thread. Stopping (explicitly or by drop)
/// clears the run flag and joins the thread, so once `stop()` returns the
/// sampler closure will not touch the device again.
pub struct InterruptWorker {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl InterruptWorker {
    /// Spawn a worker calling `sample` every `interval`
    ///
    /// `sample` returns the current line level. Sampling errors are logged
    /// and skipped; they never stop the worker.
    pub fn spawn<S>(
        mut sample: S,
        edge: Edge,
        interval: Duration,
        callback: InterruptCallback,
    ) -> Result<Self>
    where
        S: FnMut() -> Result<bool> + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name("lorabridge-irq".into())
            .spawn(move || {
                let mut detector = EdgeDetector::new(edge);
                while flag.load(Ordering::Acquire) {
                    match sample() {
                        Ok(level) => {
                            if detector.update(level) {
                                log::trace!("interrupt: {:?} edge detected", edge);
                                callback();
                            }
                        }
                        Err(e) => log::debug!("interrupt: sample failed: {}", e),
                    }
                    thread::sleep(interval);
                }
                log::trace!("interrupt: worker exiting");
            })?;

        log::debug!(
            "interrupt: worker started ({:?} edge, {} ms interval)",
            edge,
            interval.as_millis()
        );

        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    /// True until `stop()` has been called
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Request the worker to stop and wait for it
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("interrupt: worker panicked");
            }
            log::debug!("interrupt: worker stopped");
        }
    }
}

impl Drop for InterruptWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;
    use test_case::test_case;

    #[test_case(Edge::Falling, &[true, false, false, true, false], 2 ; "falling")]
    #[test_case(Edge::Falling, &[false, false, true], 1 ; "falling starts asserted")]
    #[test_case(Edge::Rising, &[false, true, true, false, true], 2 ; "rising")]
    #[test_case(Edge::Rising, &[false, false, false], 0 ; "rising never asserted")]
    fn test_edge_detector(edge: Edge, levels: &[bool], expected: usize) {
        let mut detector = EdgeDetector::new(edge);
        let fired = levels.iter().filter(|&&l| detector.update(l)).count();
        assert_eq!(fired, expected);
    }

    #[test]
    fn test_worker_invokes_callback_and_joins() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let callback: InterruptCallback = Arc::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let mut levels = vec![true, false, true, false].into_iter();
        let mut worker = InterruptWorker::spawn(
            move || Ok(levels.next().unwrap_or(true)),
            Edge::Falling,
            Duration::from_millis(1),
            callback,
        )
        .unwrap();

        let start = Instant::now();
        while count.load(Ordering::SeqCst) < 2 && start.elapsed() < Duration::from_secs(2) {
            thread::sleep(Duration::from_millis(1));
        }
        worker.stop();

        assert!(!worker.is_running());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_worker_survives_sample_errors() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let callback: InterruptCallback = Arc::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let mut calls = 0u32;
        let mut worker = InterruptWorker::spawn(
            move || {
                calls += 1;
                match calls {
                    1 => Err(crate::Error::TransferFailed),
                    2 => Ok(true),
                    _ => Ok(false),
                }
            },
            Edge::Rising,
            Duration::from_millis(1),
            callback,
        )
        .unwrap();

        let start = Instant::now();
        while count.load(Ordering::SeqCst) < 1 && start.elapsed() < Duration::from_secs(2) {
            thread::sleep(Duration::from_millis(1));
        }
        worker.stop();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
