//! Background parse scheduling.
//!
//! One [`BackgroundParser`] owns one worker thread and serializes parse
//! runs for one buffer: requests are debounced and coalesced, an in-flight
//! run is cancelled cooperatively when a newer request arrives, and a
//! completed result is published only while its snapshot is still the
//! newest. Consumers read the atomically swapped latest result or subscribe
//! for push notifications; they never observe a half-built or stale result.
//!
//! Per-buffer state machine:
//!
//! ```text
//! Idle → Requested → Running → Publishing → Idle
//!                       ↓
//!                   Cancelled → Idle (re-requested for the newest snapshot)
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::base::Snapshot;
use crate::lexer::TokenCache;
use crate::syntax::{self, ParseResult, RunError};

/// Scheduling knobs, fixed at construction.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerOptions {
    /// How long a non-immediate request waits for further requests before a
    /// run starts. The window restarts on every new request.
    pub debounce: Duration,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
        }
    }
}

/// Counters for observing scheduler behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub runs_started: u64,
    pub results_published: u64,
    pub results_discarded: u64,
}

#[derive(Clone)]
struct Input {
    snapshot: Snapshot,
    cache: Option<TokenCache>,
}

struct Inner {
    input: Option<Input>,
    /// Pending request; `true` means start immediately.
    request: Option<bool>,
    /// Cancellation token of the in-flight run, if one is running.
    current_cancel: Option<CancellationToken>,
    last_published: Option<u64>,
    shutdown: bool,
}

struct Shared {
    inner: Mutex<Inner>,
    wake: Condvar,
    latest: RwLock<Option<Arc<ParseResult>>>,
    subscribers: Mutex<Vec<Sender<Arc<ParseResult>>>>,
    runs_started: AtomicU64,
    results_published: AtomicU64,
    results_discarded: AtomicU64,
}

/// Serialized background parsing for one buffer.
///
/// Dropping the parser shuts the worker down and joins it.
pub struct BackgroundParser {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl BackgroundParser {
    pub fn new(options: SchedulerOptions) -> Self {
        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner {
                input: None,
                request: None,
                current_cancel: None,
                last_published: None,
                shutdown: false,
            }),
            wake: Condvar::new(),
            latest: RwLock::new(None),
            subscribers: Mutex::new(Vec::new()),
            runs_started: AtomicU64::new(0),
            results_published: AtomicU64::new(0),
            results_discarded: AtomicU64::new(0),
        });

        let worker_shared = Arc::clone(&shared);
        let debounce = options.debounce;
        let worker = std::thread::Builder::new()
            .name("strata-parse".into())
            .spawn(move || worker_loop(&worker_shared, debounce))
            .expect("failed to spawn background parse worker");

        Self {
            shared,
            worker: Some(worker),
        }
    }

    /// Replace the newest input. Does not start a run by itself.
    ///
    /// `cache`, when given, must have been lexed from `snapshot`'s text;
    /// without one the run lexes from scratch.
    pub fn set_input(&self, snapshot: Snapshot, cache: Option<TokenCache>) {
        let mut inner = self.shared.inner.lock();
        inner.input = Some(Input { snapshot, cache });
    }

    /// Request a parse of the newest input.
    ///
    /// Non-immediate requests are coalesced inside the debounce window; an
    /// immediate request starts as soon as the worker is free. A request
    /// arriving while a run is in flight cancels that run.
    pub fn request_parse(&self, immediate: bool) {
        {
            let mut inner = self.shared.inner.lock();
            inner.request = Some(match inner.request {
                Some(previous) => previous || immediate,
                None => immediate,
            });
            if let Some(cancel) = &inner.current_cancel {
                cancel.cancel();
            }
        }
        self.shared.wake.notify_all();
        debug!(immediate, "parse requested");
    }

    /// The most recently published result, if any.
    pub fn latest(&self) -> Option<Arc<ParseResult>> {
        self.shared.latest.read().clone()
    }

    /// Register for push notification of every published result.
    pub fn subscribe(&self) -> Receiver<Arc<ParseResult>> {
        let (tx, rx) = mpsc::channel();
        self.shared.subscribers.lock().push(tx);
        rx
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            runs_started: self.shared.runs_started.load(Ordering::Relaxed),
            results_published: self.shared.results_published.load(Ordering::Relaxed),
            results_discarded: self.shared.results_discarded.load(Ordering::Relaxed),
        }
    }
}

impl Drop for BackgroundParser {
    fn drop(&mut self) {
        {
            let mut inner = self.shared.inner.lock();
            inner.shutdown = true;
            if let Some(cancel) = &inner.current_cancel {
                cancel.cancel();
            }
        }
        self.shared.wake.notify_all();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn worker_loop(shared: &Shared, debounce: Duration) {
    loop {
        let mut inner = shared.inner.lock();
        while inner.request.is_none() && !inner.shutdown {
            shared.wake.wait(&mut inner);
        }
        if inner.shutdown {
            return;
        }
        let mut immediate = inner.request.take().unwrap_or(false);

        // Coalesce: every further request restarts the window; an immediate
        // one ends the wait.
        while !immediate {
            let deadline = Instant::now() + debounce;
            while inner.request.is_none() && !inner.shutdown {
                if shared.wake.wait_until(&mut inner, deadline).timed_out() {
                    break;
                }
            }
            if inner.shutdown {
                return;
            }
            match inner.request.take() {
                Some(next) => immediate = next,
                None => break,
            }
        }

        let Some(input) = inner.input.clone() else {
            // Requested with nothing to parse.
            continue;
        };
        let cancel = CancellationToken::new();
        inner.current_cancel = Some(cancel.clone());
        drop(inner);

        shared.runs_started.fetch_add(1, Ordering::Relaxed);
        let version = input.snapshot.version();
        let span = tracing::debug_span!("parse_run", version);
        let outcome = span.in_scope(|| run_parse(input, &cancel));

        let mut inner = shared.inner.lock();
        inner.current_cancel = None;

        let mut to_publish = None;
        match outcome {
            Ok(result) => {
                let newest = inner.input.as_ref().map(|i| i.snapshot.version());
                let superseded =
                    inner.request.is_some() || newest != Some(result.version());
                let regressed = inner
                    .last_published
                    .is_some_and(|published| result.version() <= published);
                if superseded || regressed {
                    shared.results_discarded.fetch_add(1, Ordering::Relaxed);
                    // Never surface a result older than the newest edit; run
                    // again for the newest snapshot instead.
                    if superseded && inner.request.is_none() {
                        inner.request = Some(true);
                    }
                    debug!(version = result.version(), "discarded superseded result");
                } else {
                    let result = Arc::new(result);
                    inner.last_published = Some(result.version());
                    *shared.latest.write() = Some(Arc::clone(&result));
                    to_publish = Some(result);
                }
            }
            Err(RunError::Cancelled) => {
                debug!(version, "parse run cancelled");
            }
            Err(RunError::Panicked(message)) => {
                error!(version, message = %message, "parse run failed");
            }
        }
        drop(inner);

        if let Some(result) = to_publish {
            shared.results_published.fetch_add(1, Ordering::Relaxed);
            debug!(
                version = result.version(),
                elapsed_us = result.elapsed().as_micros() as u64,
                diagnostics = result.diagnostics().len(),
                "parse result published"
            );
            shared
                .subscribers
                .lock()
                .retain(|tx| tx.send(Arc::clone(&result)).is_ok());
        }
    }
}

/// One parse run. Panics are caught at this boundary and converted into
/// [`RunError::Panicked`] so the pipeline survives transient faults; truly
/// fatal conditions (memory exhaustion aborts) are outside this contract.
fn run_parse(input: Input, cancel: &CancellationToken) -> Result<ParseResult, RunError> {
    let Input { snapshot, cache } = input;
    match panic::catch_unwind(AssertUnwindSafe(|| {
        syntax::parse_with(snapshot, cache, cancel)
    })) {
        Ok(outcome) => outcome,
        Err(payload) => Err(RunError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recv_result(rx: &Receiver<Arc<ParseResult>>) -> Arc<ParseResult> {
        match rx.recv_timeout(Duration::from_secs(5)) {
            Ok(result) => result,
            Err(err) => panic!("no result published: {err}"),
        }
    }

    #[test]
    fn test_immediate_request_publishes() {
        let parser = BackgroundParser::new(SchedulerOptions::default());
        let rx = parser.subscribe();

        parser.set_input(Snapshot::new("type T { }"), None);
        parser.request_parse(true);

        let result = recv_result(&rx);
        assert_eq!(result.version(), 0);
        assert_eq!(parser.latest().map(|r| r.version()), Some(0));
    }

    #[test]
    fn test_request_without_input_is_harmless() {
        let parser = BackgroundParser::new(SchedulerOptions {
            debounce: Duration::from_millis(1),
        });
        parser.request_parse(true);
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(parser.latest().map(|r| r.version()), None);
        assert_eq!(parser.stats().runs_started, 0);
    }

    #[test]
    fn test_coalescing_collapses_rapid_requests() {
        let parser = BackgroundParser::new(SchedulerOptions {
            debounce: Duration::from_millis(200),
        });
        let rx = parser.subscribe();

        let mut snapshot = Snapshot::new("fn a() { }");
        parser.set_input(snapshot.clone(), None);
        parser.request_parse(false);
        for _ in 0..4 {
            snapshot = snapshot.apply_edit(crate::base::TextRange::empty(snapshot.len()), " ");
            parser.set_input(snapshot.clone(), None);
            parser.request_parse(false);
        }

        let result = recv_result(&rx);
        // One run, against the final snapshot.
        assert_eq!(result.version(), snapshot.version());
        assert_eq!(parser.stats().runs_started, 1);
        assert_eq!(parser.stats().results_published, 1);
    }

    #[test]
    fn test_published_versions_strictly_increase() {
        let parser = BackgroundParser::new(SchedulerOptions {
            debounce: Duration::from_millis(5),
        });
        let rx = parser.subscribe();

        let mut snapshot = Snapshot::new("type A { }");
        parser.set_input(snapshot.clone(), None);
        parser.request_parse(true);
        for _ in 0..10 {
            snapshot = snapshot.apply_edit(crate::base::TextRange::empty(snapshot.len()), "\nfn f() { }");
            parser.set_input(snapshot.clone(), None);
            parser.request_parse(true);
        }

        // Wait until the final snapshot's result lands.
        let mut versions = Vec::new();
        loop {
            let result = recv_result(&rx);
            versions.push(result.version());
            if result.version() == snapshot.version() {
                break;
            }
        }
        assert!(versions.windows(2).all(|w| w[0] < w[1]), "versions = {versions:?}");
    }

    #[test]
    fn test_drop_joins_worker() {
        let parser = BackgroundParser::new(SchedulerOptions::default());
        parser.set_input(Snapshot::new("type T { }"), None);
        parser.request_parse(true);
        drop(parser);
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("kaboom"));
        assert_eq!(panic_message(payload.as_ref()), "kaboom");
    }
}
