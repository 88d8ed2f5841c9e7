//! Alert notification sinks.
//!
//! A sink performs the user-facing side of a fired alert. Sinks are
//! best-effort: `notify` never reports failure to the caller, and anything
//! slow runs off the evaluation loop.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::warn;

/// User-facing alert action.
pub trait NotificationSink: Send + Sync {
    /// Perform the alert. Must return promptly and must not panic.
    fn notify(&self);

    /// Sink name for logging.
    fn name(&self) -> &'static str;
}

/// ASCII BEL, rendered by most terminals as a short beep or a visual bell.
const BELL: &[u8] = b"\x07";

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Rings the terminal bell on a background task.
///
/// Uses tokio's blocking pool when called inside a runtime and a detached
/// thread otherwise. Write errors are logged and dropped.
#[derive(Clone)]
pub struct BeepNotifier {
    writer: SharedWriter,
}

impl BeepNotifier {
    /// Ring the bell on stdout.
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }

    /// Ring the bell on an arbitrary writer.
    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    fn ring(writer: &SharedWriter) -> io::Result<()> {
        let mut writer = writer
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "bell writer lock poisoned"))?;
        writer.write_all(BELL)?;
        writer.flush()
    }
}

impl Default for BeepNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for BeepNotifier {
    fn notify(&self) {
        let writer = Arc::clone(&self.writer);
        let beep = move || {
            if let Err(e) = Self::ring(&writer) {
                warn!("Alert beep failed: {}", e);
            }
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(beep);
            }
            Err(_) => {
                if let Err(e) = std::thread::Builder::new()
                    .name("deskguard-beep".to_string())
                    .spawn(beep)
                {
                    warn!("Failed to spawn beep thread: {}", e);
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "beep"
    }
}

/// Visual alert through the log stream.
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify(&self) {
        warn!(target: "deskguard::alert", "Posture alert: you are too close to the screen");
    }

    fn name(&self) -> &'static str {
        "tracing"
    }
}

/// Counts alerts. Handy for embedding UIs and for tests.
#[derive(Debug, Clone, Default)]
pub struct CountingNotifier {
    count: Arc<AtomicU64>,
}

impl CountingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of alerts delivered so far (shared across clones).
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }
}

impl NotificationSink for CountingNotifier {
    fn notify(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

/// Forwards each alert to several sinks, in order.
#[derive(Default)]
pub struct FanoutNotifier {
    sinks: Vec<Box<dyn NotificationSink>>,
}

impl FanoutNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style method to add a sink.
    pub fn with_sink(mut self, sink: impl NotificationSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl NotificationSink for FanoutNotifier {
    fn notify(&self) {
        for sink in &self.sinks {
            sink.notify();
        }
    }

    fn name(&self) -> &'static str {
        "fanout"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> Vec<u8> {
            self.0.lock().unwrap().clone()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn wait_for_bytes(buffer: &SharedBuffer, expected: usize) -> Vec<u8> {
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            let contents = buffer.contents();
            if contents.len() >= expected || Instant::now() > deadline {
                return contents;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_beep_without_runtime() {
        let buffer = SharedBuffer::default();
        let notifier = BeepNotifier::with_writer(buffer.clone());

        notifier.notify();

        assert_eq!(wait_for_bytes(&buffer, 1), BELL.to_vec());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_beep_inside_runtime() {
        let buffer = SharedBuffer::default();
        let notifier = BeepNotifier::with_writer(buffer.clone());

        notifier.notify();
        notifier.notify();

        let contents = tokio::task::spawn_blocking(move || wait_for_bytes(&buffer, 2))
            .await
            .unwrap();
        assert_eq!(contents, b"\x07\x07".to_vec());
    }

    #[test]
    fn test_beep_failure_is_swallowed() {
        let notifier = BeepNotifier::with_writer(BrokenWriter);
        notifier.notify();
        assert_eq!(notifier.name(), "beep");
    }

    #[test]
    fn test_counting_notifier_shares_count() {
        let notifier = CountingNotifier::new();
        let clone = notifier.clone();

        clone.notify();
        clone.notify();

        assert_eq!(notifier.count(), 2);
    }

    #[test]
    fn test_fanout_reaches_every_sink() {
        let first = CountingNotifier::new();
        let second = CountingNotifier::new();
        let fanout = FanoutNotifier::new()
            .with_sink(first.clone())
            .with_sink(TracingNotifier)
            .with_sink(second.clone());

        fanout.notify();

        assert_eq!(fanout.len(), 3);
        assert_eq!(first.count(), 1);
        assert_eq!(second.count(), 1);
    }
}
