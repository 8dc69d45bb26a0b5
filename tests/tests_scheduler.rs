//! Background parser behavior: coalescing, cancellation, stale-result
//! suppression, and version ordering as observed by consumers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use strata::{
    BackgroundParser, ParseResult, SchedulerOptions, Snapshot, TextRange, TokenCache,
};

fn wait_for_version(parser: &BackgroundParser, version: u64) -> Arc<ParseResult> {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        if let Some(result) = parser.latest() {
            if result.version() >= version {
                return result;
            }
        }
        assert!(Instant::now() < deadline, "no result for version {version}");
        std::thread::sleep(Duration::from_millis(5));
    }
}

fn append(snapshot: &Snapshot, text: &str) -> Snapshot {
    snapshot.apply_edit(TextRange::empty(snapshot.len()), text)
}

#[test]
fn requests_inside_debounce_window_run_once() {
    let parser = BackgroundParser::new(SchedulerOptions {
        debounce: Duration::from_millis(250),
    });

    let mut snapshot = Snapshot::new("fn a() { }");
    parser.set_input(snapshot.clone(), None);
    parser.request_parse(false);
    for _ in 0..7 {
        snapshot = append(&snapshot, "\nfn x() { }");
        parser.set_input(snapshot.clone(), None);
        parser.request_parse(false);
    }

    let result = wait_for_version(&parser, snapshot.version());
    assert_eq!(result.version(), snapshot.version());

    let stats = parser.stats();
    assert_eq!(stats.runs_started, 1, "requests were not coalesced");
    assert_eq!(stats.results_published, 1);
    assert_eq!(stats.results_discarded, 0);
}

#[test]
fn superseded_results_are_never_observed() {
    let parser = BackgroundParser::new(SchedulerOptions {
        debounce: Duration::from_millis(1),
    });
    let rx = parser.subscribe();

    // A buffer large enough that runs take real time, so later requests
    // reliably land while earlier runs are in flight.
    let base = "fn f() { let value = 1 + 2; }\n".repeat(2000);
    let mut snapshot = Snapshot::new(base);
    parser.set_input(snapshot.clone(), None);
    parser.request_parse(true);
    for _ in 0..5 {
        snapshot = append(&snapshot, "fn extra() { }\n");
        parser.set_input(snapshot.clone(), None);
        parser.request_parse(true);
    }

    let final_result = wait_for_version(&parser, snapshot.version());
    assert_eq!(final_result.version(), snapshot.version());

    // Whatever subset of versions was published, the order seen by a
    // subscriber is strictly increasing and ends at the newest.
    let mut versions = Vec::new();
    while let Ok(result) = rx.recv_timeout(Duration::from_millis(100)) {
        versions.push(result.version());
        if result.version() == snapshot.version() {
            break;
        }
    }
    assert!(
        versions.windows(2).all(|w| w[0] < w[1]),
        "stale or reordered versions observed: {versions:?}"
    );
    assert_eq!(versions.last().copied(), Some(snapshot.version()));
}

#[test]
fn immediate_request_bypasses_debounce() {
    let parser = BackgroundParser::new(SchedulerOptions {
        debounce: Duration::from_secs(60),
    });

    let snapshot = Snapshot::new("type T { }");
    parser.set_input(snapshot.clone(), None);
    parser.request_parse(true);

    let result = wait_for_version(&parser, 0);
    assert_eq!(result.version(), 0);
}

#[test]
fn supplied_token_cache_is_reused_verbatim() {
    let parser = BackgroundParser::new(SchedulerOptions::default());
    let snapshot = Snapshot::new("type T { fn f() { } }");
    let cache = TokenCache::new(snapshot.text());
    let expected: Vec<_> = cache.tokens().to_vec();

    parser.set_input(snapshot, Some(cache));
    parser.request_parse(true);

    let result = wait_for_version(&parser, 0);
    assert_eq!(result.tokens(), expected.as_slice());
}

#[test]
fn latest_survives_parser_use_across_threads() {
    let parser = Arc::new(BackgroundParser::new(SchedulerOptions {
        debounce: Duration::from_millis(1),
    }));
    let snapshot = Snapshot::new("type Shared { }");
    parser.set_input(snapshot, None);
    parser.request_parse(true);
    wait_for_version(&parser, 0);

    // Multiple readers observe the same immutable result.
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let parser = Arc::clone(&parser);
            std::thread::spawn(move || {
                let result = parser.latest().expect("result published");
                assert_eq!(result.version(), 0);
                result.tokens().len()
            })
        })
        .collect();
    let counts: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(counts.windows(2).all(|w| w[0] == w[1]));
}
