// texbatch/src/processors/monitor.rs
use crate::core::{ConvertError, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::any::Any;
use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

/// Receives progress from the monitor. Display only.
pub trait ProgressReporter: Send + Sync {
    fn start(&self, slot: usize, label: &str);

    fn update(&self, slot: usize, percent: u64);

    fn finish(&self, slot: usize);

    fn begin_phase(&self, _name: &str, _total: usize) {}

    fn advance_phase(&self) {}

    fn end_phase(&self, _message: &str) {}
}

/// Reports nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {
    fn start(&self, _slot: usize, _label: &str) {}

    fn update(&self, _slot: usize, _percent: u64) {}

    fn finish(&self, _slot: usize) {}
}

/// Terminal bars: one per phase plus one per display slot.
pub struct IndicatifReporter {
    multi: MultiProgress,
    slots: Mutex<HashMap<usize, ProgressBar>>,
    phase: Mutex<Option<ProgressBar>>,
}

impl IndicatifReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            slots: Mutex::new(HashMap::new()),
            phase: Mutex::new(None),
        }
    }

    fn slot_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{prefix:<9} {percent:>3}% [{bar:40.cyan/blue}] {elapsed_precise}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-")
    }

    fn phase_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-")
    }
}

impl Default for IndicatifReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for IndicatifReporter {
    fn start(&self, slot: usize, label: &str) {
        let bar = self.multi.add(ProgressBar::new(100));
        bar.set_style(Self::slot_style());
        bar.set_prefix(label.to_string());

        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = slots.insert(slot, bar) {
            previous.finish_and_clear();
        }
    }

    fn update(&self, slot: usize, percent: u64) {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(bar) = slots.get(&slot) {
            bar.set_position(percent.min(100));
        }
    }

    fn finish(&self, slot: usize) {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(bar) = slots.remove(&slot) {
            bar.finish_and_clear();
        }
    }

    fn begin_phase(&self, name: &str, total: usize) {
        let bar = self.multi.add(ProgressBar::new(total as u64));
        bar.set_style(Self::phase_style());
        bar.set_message(name.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));

        let mut phase = self.phase.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = phase.replace(bar) {
            previous.finish_and_clear();
        }
    }

    fn advance_phase(&self) {
        let phase = self.phase.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(bar) = phase.as_ref() {
            bar.inc(1);
        }
    }

    fn end_phase(&self, message: &str) {
        let mut phase = self.phase.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(bar) = phase.take() {
            bar.finish_with_message(message.to_string());
        }
    }
}

/// Runs one unit of work on a worker thread and polls it until done.
pub struct ProgressMonitor<'a> {
    reporter: &'a dyn ProgressReporter,
    interval: Duration,
}

impl<'a> ProgressMonitor<'a> {
    pub fn new(reporter: &'a dyn ProgressReporter, interval: Duration) -> Self {
        Self { reporter, interval }
    }

    pub fn run<T, F>(&self, slot: usize, label: &str, work: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send,
        T: Send,
    {
        self.reporter.start(slot, label);

        let outcome = thread::scope(|scope| {
            let (tx, rx) = mpsc::channel();
            let handle = scope.spawn(move || {
                // The receiver only goes away once the controller stopped waiting.
                let _ = tx.send(work());
            });

            let mut percent = 0;
            let received = loop {
                match rx.recv_timeout(self.interval) {
                    Ok(result) => break Some(result),
                    Err(RecvTimeoutError::Timeout) => {
                        percent = next_percent(percent);
                        self.reporter.update(slot, percent);
                    }
                    Err(RecvTimeoutError::Disconnected) => break None,
                }
            };

            match (received, handle.join()) {
                (Some(result), _) => result,
                (None, Err(panic)) => Err(ConvertError::WorkerPanicked(format!(
                    "{}: {}",
                    label,
                    panic_message(panic.as_ref())
                ))),
                (None, Ok(())) => Err(ConvertError::WorkerPanicked(format!(
                    "{}: worker exited without a result",
                    label
                ))),
            }
        });

        self.reporter.update(slot, 100);
        self.reporter.finish(slot);
        outcome
    }
}

/// Coarse estimate that approaches but never reaches 100 before completion.
fn next_percent(current: u64) -> u64 {
    if current >= 99 {
        return 99;
    }
    (current + ((99 - current) / 10).max(1)).min(99)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<(usize, String)>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<(usize, String)> {
            self.events.lock().unwrap().clone()
        }

        fn updates(&self) -> Vec<u64> {
            self.events()
                .into_iter()
                .filter_map(|(_, e)| e.strip_prefix("update ").map(|p| p.parse().unwrap()))
                .collect()
        }
    }

    impl ProgressReporter for Recorder {
        fn start(&self, slot: usize, label: &str) {
            self.events.lock().unwrap().push((slot, format!("start {}", label)));
        }

        fn update(&self, slot: usize, percent: u64) {
            self.events.lock().unwrap().push((slot, format!("update {}", percent)));
        }

        fn finish(&self, slot: usize) {
            self.events.lock().unwrap().push((slot, "finish".to_string()));
        }
    }

    #[test]
    fn fast_work_completes_before_first_poll() {
        let recorder = Recorder::default();
        let monitor = ProgressMonitor::new(&recorder, Duration::from_secs(5));

        let value = monitor.run(2, "Saving", || Ok(42)).unwrap();
        assert_eq!(value, 42);
        assert_eq!(
            recorder.events(),
            vec![
                (2, "start Saving".to_string()),
                (2, "update 100".to_string()),
                (2, "finish".to_string()),
            ]
        );
    }

    #[test]
    fn progress_is_monotonic_and_ends_at_100() {
        let recorder = Recorder::default();
        let monitor = ProgressMonitor::new(&recorder, Duration::from_millis(2));

        monitor
            .run(0, "Resizing", || {
                thread::sleep(Duration::from_millis(60));
                Ok(())
            })
            .unwrap();

        let updates = recorder.updates();
        assert!(updates.len() >= 2);
        assert!(updates.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(updates.last(), Some(&100));
        assert!(updates[..updates.len() - 1].iter().all(|p| *p < 100));
    }

    #[test]
    fn work_can_borrow_from_the_caller() {
        let data = vec![1, 2, 3];
        let monitor = ProgressMonitor::new(&SilentReporter, Duration::from_millis(10));

        let sum = monitor.run(0, "Summing", || Ok(data.iter().sum::<i32>())).unwrap();
        assert_eq!(sum, 6);
    }

    #[test]
    fn errors_pass_through_unchanged() {
        let monitor = ProgressMonitor::new(&SilentReporter, Duration::from_millis(10));

        let result: Result<()> = monitor.run(0, "Saving", || {
            Err(ConvertError::Backend {
                path: PathBuf::from("sky.exr"),
                message: "resolution too high".to_string(),
            })
        });
        assert!(matches!(result, Err(ConvertError::Backend { .. })));
    }

    #[test]
    fn worker_panic_becomes_an_error() {
        let recorder = Recorder::default();
        let monitor = ProgressMonitor::new(&recorder, Duration::from_millis(10));

        let result: Result<()> = monitor.run(1, "Blurring", || panic!("kernel exploded"));
        match result {
            Err(ConvertError::WorkerPanicked(message)) => assert!(message.contains("kernel exploded")),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(recorder.events().last(), Some(&(1, "finish".to_string())));
    }

    #[test]
    fn estimate_caps_at_99() {
        let mut percent = 0;
        for _ in 0..1000 {
            let next = next_percent(percent);
            assert!(next >= percent);
            percent = next;
        }
        assert_eq!(percent, 99);
    }
}
