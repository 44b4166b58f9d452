//! Bounded in-memory write buffer drained by a single background thread.
//!
//! Producers hand over complete file payloads with [`BoundedWriteBuffer::enqueue`].
//! The buffer accepts a payload only while the total size of staged and
//! in-flight payloads stays within its capacity; otherwise the producer blocks
//! until the drain worker frees enough room or the caller's timeout elapses.
//!
//! All mutable state lives behind one mutex that is never held across disk
//! I/O. Two condition variables signal drain progress:
//!
//! - `work_ready` wakes the worker when an entry is queued, the buffer is
//!   resumed, or the buffer stops.
//! - `space_freed` wakes producers and drain waiters such as
//!   [`wait_path`](BoundedWriteBuffer::wait_path) whenever a write finishes
//!   or the buffer stops.
//!
//! Entries drain in FIFO order. A write that panics inside the filesystem is
//! recorded as a failure like any I/O error.

use std::collections::HashSet;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Condvar;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::thread::JoinHandle;
use std::time::Duration;
use std::time::Instant;

use crate::ExtractionError;
use crate::Result;
use crate::WriteBufferConfig;
use crate::error::WriteFailure;
use crate::fs::Filesystem;
use crate::fs::LocalFilesystem;

/// Lifecycle of a [`BoundedWriteBuffer`].
///
/// Transitions only move forward: `Created -> Started -> Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferState {
    /// Constructed, no worker running. Submissions fail with `NotStarted`.
    Created,
    /// Worker running, submissions accepted.
    Started,
    /// Worker stopped. Submissions fail with `Stopped`.
    Stopped,
}

/// A staged file write.
#[derive(Debug)]
struct BufferedWrite {
    path: PathBuf,
    payload: Vec<u8>,
}

impl BufferedWrite {
    fn size(&self) -> u64 {
        self.payload.len() as u64
    }
}

#[derive(Debug)]
struct Inner {
    queue: VecDeque<BufferedWrite>,
    keys: HashSet<PathBuf>,
    pending_bytes: u64,
    in_flight: Option<PathBuf>,
    state: BufferState,
    paused: bool,
    failures: Vec<WriteFailure>,
}

impl Inner {
    fn is_draining(&self) -> bool {
        !self.queue.is_empty() || self.in_flight.is_some()
    }

    fn is_writing(&self, path: &Path) -> bool {
        self.in_flight.as_deref() == Some(path)
    }

    /// Whether a write to `path` is queued or in flight.
    fn holds(&self, path: &Path) -> bool {
        self.keys.contains(path) || self.is_writing(path)
    }
}

struct Shared {
    capacity: u64,
    filesystem: Arc<dyn Filesystem>,
    inner: Mutex<Inner>,
    work_ready: Condvar,
    space_freed: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Bounded staging area for file writes with backpressure.
///
/// The buffer is `Send + Sync`; share it between producers with `Arc` or a
/// plain reference. Dropping a started buffer stops it and abandons any
/// writes not yet drained, so call [`wait_complete`](Self::wait_complete)
/// first when every staged file must reach the disk.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use tarstage_core::BoundedWriteBuffer;
///
/// # fn main() -> tarstage_core::Result<()> {
/// let buffer = BoundedWriteBuffer::new(10 * 1024 * 1024);
/// buffer.start()?;
///
/// buffer.enqueue("/tmp/out/a.txt", b"hello".to_vec(), Duration::from_secs(60))?;
///
/// buffer.wait_complete()?;
/// buffer.stop();
/// # Ok(())
/// # }
/// ```
pub struct BoundedWriteBuffer {
    shared: Arc<Shared>,
    thread_name: String,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl BoundedWriteBuffer {
    /// Creates a buffer of `capacity_bytes` writing to the local filesystem.
    #[must_use]
    pub fn new(capacity_bytes: u64) -> Self {
        Self::with_config(WriteBufferConfig::new(capacity_bytes))
    }

    /// Creates a buffer from a configuration, writing to the local filesystem.
    #[must_use]
    pub fn with_config(config: WriteBufferConfig) -> Self {
        Self::with_filesystem(config, Arc::new(LocalFilesystem))
    }

    /// Creates a buffer that persists entries through `filesystem`.
    #[must_use]
    pub fn with_filesystem(config: WriteBufferConfig, filesystem: Arc<dyn Filesystem>) -> Self {
        Self {
            shared: Arc::new(Shared {
                capacity: config.capacity_bytes,
                filesystem,
                inner: Mutex::new(Inner {
                    queue: VecDeque::new(),
                    keys: HashSet::new(),
                    pending_bytes: 0,
                    in_flight: None,
                    state: BufferState::Created,
                    paused: false,
                    failures: Vec::new(),
                }),
                work_ready: Condvar::new(),
                space_freed: Condvar::new(),
            }),
            thread_name: config.thread_name,
            worker: Mutex::new(None),
        }
    }

    /// Spawns the drain worker.
    ///
    /// Starting an already started buffer does nothing.
    ///
    /// # Errors
    ///
    /// - `ExtractionError::Stopped` if the buffer was stopped; buffers do not
    ///   restart.
    /// - `ExtractionError::Io` if the thread cannot be spawned.
    pub fn start(&self) -> Result<()> {
        let mut inner = self.shared.lock();
        match inner.state {
            BufferState::Started => return Ok(()),
            BufferState::Stopped => return Err(ExtractionError::Stopped),
            BufferState::Created => {}
        }

        let shared = Arc::clone(&self.shared);
        let handle = std::thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || drain_loop(&shared))?;

        inner.state = BufferState::Started;
        drop(inner);

        *self.worker.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);

        tracing::debug!(
            capacity = self.shared.capacity,
            thread = %self.thread_name,
            "write buffer started"
        );
        Ok(())
    }

    /// Stages `payload` for writing to `path`, blocking while the buffer is
    /// too full.
    ///
    /// The room check and the insertion happen under one lock acquisition, so
    /// [`pending_bytes`](Self::pending_bytes) never exceeds
    /// [`capacity`](Self::capacity). Failed calls leave the buffer unchanged.
    ///
    /// # Errors
    ///
    /// - `NotStarted` / `Stopped` if the buffer is not accepting work. A
    ///   producer blocked when the buffer stops also gets `Stopped`.
    /// - `CapacityExceeded` immediately if `payload` is larger than the whole
    ///   buffer.
    /// - `Timeout` if room did not free up within `timeout`.
    /// - `DuplicateKey` if a write to `path` is still queued.
    pub fn enqueue(
        &self,
        path: impl Into<PathBuf>,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Result<()> {
        let write = BufferedWrite {
            path: path.into(),
            payload,
        };
        let size = write.size();
        let capacity = self.shared.capacity;

        let inner = self.shared.lock();
        check_accepting(inner.state)?;

        if size > capacity {
            return Err(ExtractionError::CapacityExceeded { size, capacity });
        }

        let (mut inner, wait) = self
            .shared
            .space_freed
            .wait_timeout_while(inner, timeout, |inner| {
                inner.state == BufferState::Started && capacity - inner.pending_bytes < size
            })
            .unwrap_or_else(PoisonError::into_inner);

        check_accepting(inner.state)?;
        if wait.timed_out() {
            tracing::debug!(
                path = %write.path.display(),
                size,
                pending = inner.pending_bytes,
                "timed out waiting for buffer space"
            );
            return Err(ExtractionError::Timeout { size, timeout });
        }

        if inner.keys.contains(&write.path) {
            return Err(ExtractionError::DuplicateKey { path: write.path });
        }

        inner.keys.insert(write.path.clone());
        inner.pending_bytes += size;
        tracing::trace!(
            path = %write.path.display(),
            size,
            pending = inner.pending_bytes,
            "staged write"
        );
        inner.queue.push_back(write);
        drop(inner);

        self.shared.work_ready.notify_one();
        Ok(())
    }

    /// Stops the worker after its in-flight write and joins it.
    ///
    /// Writes still queued are dropped and their bytes released. Blocked
    /// producers and `wait_complete` callers wake up. Calling `stop` again
    /// does nothing.
    pub fn stop(&self) {
        let mut inner = self.shared.lock();
        if inner.state != BufferState::Stopped {
            let abandoned: u64 = inner.queue.iter().map(BufferedWrite::size).sum();
            let abandoned_count = inner.queue.len();

            inner.state = BufferState::Stopped;
            inner.queue.clear();
            inner.keys.clear();
            inner.pending_bytes = inner.pending_bytes.saturating_sub(abandoned);

            if abandoned_count > 0 {
                tracing::warn!(
                    entries = abandoned_count,
                    bytes = abandoned,
                    "write buffer stopped with undrained entries"
                );
            }
        }
        drop(inner);

        self.shared.work_ready.notify_all();
        self.shared.space_freed.notify_all();

        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::warn!(thread = %self.thread_name, "drain worker panicked");
            }
            tracing::debug!(thread = %self.thread_name, "write buffer stopped");
        }
    }

    /// Blocks until nothing is queued and no write is in flight.
    ///
    /// This observes a single moment: producers running concurrently may
    /// stage more work right after it returns. A paused buffer with queued
    /// entries never completes; use
    /// [`wait_complete_timeout`](Self::wait_complete_timeout) there. On a
    /// stopped buffer this returns immediately.
    ///
    /// # Errors
    ///
    /// - `NotStarted` if the buffer was never started.
    /// - `BackgroundWrite` with every write failure recorded since the last
    ///   call to this method or [`take_failures`](Self::take_failures).
    pub fn wait_complete(&self) -> Result<()> {
        let inner = self.shared.lock();
        if inner.state == BufferState::Created {
            return Err(ExtractionError::NotStarted);
        }

        let inner = self
            .shared
            .space_freed
            .wait_while(inner, |inner| {
                inner.state == BufferState::Started && inner.is_draining()
            })
            .unwrap_or_else(PoisonError::into_inner);

        Self::drain_failures(inner)
    }

    /// Like [`wait_complete`](Self::wait_complete) but gives up after
    /// `timeout`.
    ///
    /// # Errors
    ///
    /// Same as `wait_complete`, plus `Timeout` if the drain did not finish
    /// in time. Recorded failures are kept on timeout.
    pub fn wait_complete_timeout(&self, timeout: Duration) -> Result<()> {
        let started = Instant::now();
        let inner = self.shared.lock();
        if inner.state == BufferState::Created {
            return Err(ExtractionError::NotStarted);
        }

        let (inner, wait) = self
            .shared
            .space_freed
            .wait_timeout_while(inner, timeout, |inner| {
                inner.state == BufferState::Started && inner.is_draining()
            })
            .unwrap_or_else(PoisonError::into_inner);

        if wait.timed_out() {
            tracing::debug!(
                pending = inner.pending_bytes,
                waited = ?started.elapsed(),
                "drain did not finish in time"
            );
            return Err(ExtractionError::Timeout {
                size: 0,
                timeout,
            });
        }

        Self::drain_failures(inner)
    }

    /// Blocks until no write to `path` is queued or in flight.
    ///
    /// Callers that write `path` themselves use this to keep an earlier
    /// staged payload from landing on top of their own. On a stopped buffer
    /// only the in-flight write is waited for, since queued ones were
    /// dropped.
    ///
    /// # Errors
    ///
    /// - `NotStarted` if the buffer was never started.
    /// - `Timeout` if the write to `path` did not finish within `timeout`.
    pub fn wait_path(&self, path: &Path, timeout: Duration) -> Result<()> {
        let inner = self.shared.lock();
        if inner.state == BufferState::Created {
            return Err(ExtractionError::NotStarted);
        }

        let (_inner, wait) = self
            .shared
            .space_freed
            .wait_timeout_while(inner, timeout, |inner| {
                (inner.state == BufferState::Started && inner.holds(path))
                    || inner.is_writing(path)
            })
            .unwrap_or_else(PoisonError::into_inner);

        if wait.timed_out() {
            tracing::debug!(path = %path.display(), "staged write to path did not drain in time");
            return Err(ExtractionError::Timeout {
                size: 0,
                timeout,
            });
        }
        Ok(())
    }

    fn drain_failures(mut inner: MutexGuard<'_, Inner>) -> Result<()> {
        if inner.failures.is_empty() {
            return Ok(());
        }
        let failures = std::mem::take(&mut inner.failures);
        Err(ExtractionError::BackgroundWrite { failures })
    }

    /// Holds the worker before its next entry. An in-flight write still
    /// completes.
    pub fn pause(&self) {
        self.shared.lock().paused = true;
    }

    /// Lets a paused worker continue draining.
    pub fn resume(&self) {
        self.shared.lock().paused = false;
        self.shared.work_ready.notify_all();
    }

    /// Removes and returns the background write failures recorded so far.
    pub fn take_failures(&self) -> Vec<WriteFailure> {
        std::mem::take(&mut self.shared.lock().failures)
    }

    /// Maximum bytes staged or in flight.
    #[must_use]
    pub fn capacity(&self) -> u64 {
        self.shared.capacity
    }

    /// Bytes currently staged or in flight.
    #[must_use]
    pub fn pending_bytes(&self) -> u64 {
        self.shared.lock().pending_bytes
    }

    /// Number of queued entries, excluding the one in flight.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.shared.lock().queue.len()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> BufferState {
        self.shared.lock().state
    }

    /// Whether the worker is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.shared.lock().paused
    }

    /// Whether any entry is queued or being written.
    #[must_use]
    pub fn has_work(&self) -> bool {
        self.shared.lock().is_draining()
    }
}

impl std::fmt::Debug for BoundedWriteBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.shared.lock();
        f.debug_struct("BoundedWriteBuffer")
            .field("capacity", &self.shared.capacity)
            .field("pending_bytes", &inner.pending_bytes)
            .field("pending_count", &inner.queue.len())
            .field("state", &inner.state)
            .field("paused", &inner.paused)
            .field("thread_name", &self.thread_name)
            .finish_non_exhaustive()
    }
}

impl Drop for BoundedWriteBuffer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn check_accepting(state: BufferState) -> Result<()> {
    match state {
        BufferState::Created => Err(ExtractionError::NotStarted),
        BufferState::Stopped => Err(ExtractionError::Stopped),
        BufferState::Started => Ok(()),
    }
}

fn drain_loop(shared: &Shared) {
    loop {
        let write = {
            let inner = shared.lock();
            let mut inner = shared
                .work_ready
                .wait_while(inner, |inner| {
                    inner.state == BufferState::Started && (inner.paused || inner.queue.is_empty())
                })
                .unwrap_or_else(PoisonError::into_inner);

            if inner.state != BufferState::Started {
                break;
            }
            let Some(write) = inner.queue.pop_front() else {
                continue;
            };
            inner.keys.remove(&write.path);
            inner.in_flight = Some(write.path.clone());
            write
        };

        // A panicking filesystem must not leave the entry in flight forever
        let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
            shared.filesystem.write_file(&write.path, &write.payload)
        }))
        .unwrap_or_else(|_| Err(std::io::Error::other("filesystem write panicked")));
        let size = write.size();

        let mut inner = shared.lock();
        inner.pending_bytes = inner.pending_bytes.saturating_sub(size);
        inner.in_flight = None;
        match result {
            Ok(()) => {
                tracing::trace!(path = %write.path.display(), size, "drained write");
            }
            Err(source) => {
                tracing::warn!(
                    path = %write.path.display(),
                    error = %source,
                    "background write failed"
                );
                inner.failures.push(WriteFailure {
                    path: write.path,
                    source,
                });
            }
        }
        drop(inner);

        shared.space_freed.notify_all();
    }

    shared.space_freed.notify_all();
}
