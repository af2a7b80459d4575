//! Change Watcher
//!
//! Polling change detection usable over either backend: fingerprints a
//! directory listing and fires a callback when the fingerprint changes.
//! Stands in for native event subscription, which the sandboxed host lacks.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::fs::types::{DirEntry, FileSystem};

/// Canonical fingerprint of a directory's contents: (name, is_directory)
/// pairs sorted by name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirSnapshot(Vec<(String, bool)>);

impl DirSnapshot {
    pub fn of(entries: &[DirEntry]) -> Self {
        let mut items: Vec<(String, bool)> = entries
            .iter()
            .map(|e| (e.name.clone(), e.is_directory))
            .collect();
        items.sort();
        DirSnapshot(items)
    }
}

/// Invoked with the complete fresh listing whenever the fingerprint changes.
pub type WatchCallback = Box<dyn FnMut(Vec<DirEntry>) + Send>;

pub struct ChangeWatcher;

impl ChangeWatcher {
    /// Start polling `path` on `interval` over any backend.
    ///
    /// The first listing is taken immediately and stored as the baseline
    /// without invoking the callback. Every interval thereafter the
    /// directory is re-listed; only a changed fingerprint fires the callback
    /// and replaces the baseline. No incremental diff is computed.
    pub fn start(
        fs: Arc<dyn FileSystem>,
        path: &str,
        interval: Duration,
        mut callback: WatchCallback,
    ) -> WatchHandle {
        let path = path.to_string();
        let (cancel_tx, mut cancel_rx) = watch::channel(false);

        tokio::spawn(async move {
            let mut baseline = match fs.read_dir(&path).await {
                Ok(entries) => DirSnapshot::of(&entries),
                Err(err) => {
                    warn!(path = %path, error = %err, "baseline listing failed");
                    DirSnapshot::default()
                }
            };

            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick of an interval completes immediately; consume it
            // so every callback check is a full interval after the baseline.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = cancel_rx.changed() => break,
                    _ = ticker.tick() => {
                        match fs.read_dir(&path).await {
                            Ok(entries) => {
                                let snapshot = DirSnapshot::of(&entries);
                                if snapshot != baseline {
                                    debug!(path = %path, entries = entries.len(), "directory changed");
                                    baseline = snapshot;
                                    callback(entries);
                                }
                            }
                            // The directory may be mid-mutation; skip the tick.
                            Err(err) => warn!(path = %path, error = %err, "listing failed during watch"),
                        }
                    }
                }
            }
        });

        WatchHandle { cancel: cancel_tx }
    }
}

/// Cancellation handle returned by [`ChangeWatcher::start`].
///
/// Cancelling (or dropping the handle) stops the timer: no subsequently
/// scheduled check runs, though a check already in flight may complete once.
pub struct WatchHandle {
    cancel: watch::Sender<bool>,
}

impl WatchHandle {
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::handles::MemoryDevice;
    use crate::fs::sandbox_fs::SandboxFs;
    use std::sync::Mutex;

    fn collector() -> (Arc<Mutex<Vec<Vec<DirEntry>>>>, WatchCallback) {
        let seen: Arc<Mutex<Vec<Vec<DirEntry>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: WatchCallback = Box::new(move |entries| {
            sink.lock().unwrap().push(entries);
        });
        (seen, callback)
    }

    async fn private_fs() -> Arc<dyn FileSystem> {
        let fs = SandboxFs::new(Arc::new(MemoryDevice::new()));
        fs.write_file("opfs:/watched/a.txt", b"a").await.unwrap();
        fs.write_file("opfs:/watched/b.txt", b"b").await.unwrap();
        Arc::new(fs)
    }

    #[test]
    fn test_snapshot_equality_ignores_listing_order() {
        let forward = [
            DirEntry { name: "a".to_string(), is_directory: false },
            DirEntry { name: "b".to_string(), is_directory: true },
        ];
        let backward = [forward[1].clone(), forward[0].clone()];
        assert_eq!(DirSnapshot::of(&forward), DirSnapshot::of(&backward));

        let changed = [forward[0].clone()];
        assert_ne!(DirSnapshot::of(&forward), DirSnapshot::of(&changed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_baseline_does_not_fire() {
        let fs = private_fs().await;
        let (seen, callback) = collector();
        let handle =
            ChangeWatcher::start(fs, "opfs:/watched", Duration::from_millis(100), callback);

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert!(seen.lock().unwrap().is_empty());
        handle.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_fires_with_full_sorted_listing() {
        let fs = private_fs().await;
        let (seen, callback) = collector();
        let handle = ChangeWatcher::start(
            fs.clone(),
            "opfs:/watched",
            Duration::from_millis(100),
            callback,
        );

        // Let the baseline settle, then mutate.
        tokio::time::sleep(Duration::from_millis(10)).await;
        fs.write_file("opfs:/watched/c.txt", b"c").await.unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        let calls = seen.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let names: Vec<&str> = calls[0].iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a.txt", "b.txt", "c.txt"]);
        drop(calls);
        handle.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_fingerprint_stays_quiet() {
        let fs = private_fs().await;
        let (seen, callback) = collector();
        let handle = ChangeWatcher::start(
            fs.clone(),
            "opfs:/watched",
            Duration::from_millis(100),
            callback,
        );

        tokio::time::sleep(Duration::from_millis(10)).await;
        fs.write_file("opfs:/watched/c.txt", b"c").await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(seen.lock().unwrap().len(), 1);

        // Same contents re-listed on later ticks: no further callback.
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(seen.lock().unwrap().len(), 1);
        handle.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_subsequent_callbacks() {
        let fs = private_fs().await;
        let (seen, callback) = collector();
        let handle = ChangeWatcher::start(
            fs.clone(),
            "opfs:/watched",
            Duration::from_millis(100),
            callback,
        );

        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.cancel();
        tokio::time::sleep(Duration::from_millis(10)).await;

        fs.write_file("opfs:/watched/d.txt", b"d").await.unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_the_handle_cancels() {
        let fs = private_fs().await;
        let (seen, callback) = collector();
        let handle = ChangeWatcher::start(
            fs.clone(),
            "opfs:/watched",
            Duration::from_millis(100),
            callback,
        );

        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(handle);
        tokio::time::sleep(Duration::from_millis(10)).await;

        fs.write_file("opfs:/watched/d.txt", b"d").await.unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(seen.lock().unwrap().is_empty());
    }
}
