#![expect(clippy::unwrap_used, clippy::panic, clippy::expect_used)]
use super::*;
use crate::analyser::Record;
use crate::diagnostics::Severity;
use anyhow::Result;
use serde_json::json;
use std::thread;

fn rows() -> Vec<Record> {
    [json!({ "id": 1, "item": "pen" }), json!({ "id": 2, "item": "ink" })]
        .iter()
        .map(|v| v.as_object().cloned().expect("object"))
        .collect()
}

fn fixture(source: MemorySource) -> (Arc<MemorySource>, Arc<ManualClock>, TableFetcher) {
    let source = Arc::new(source);
    let clock = Arc::new(ManualClock::new());
    let fetcher = TableFetcher::new(Arc::clone(&source)).with_clock(clock.clone());
    (source, clock, fetcher)
}

#[test]
fn test_second_fetch_is_served_from_cache() -> Result<()> {
    let (source, _clock, fetcher) = fixture(MemorySource::new().with_table("compras", rows()));

    let first = fetcher.fetch("compras")?;
    let second = fetcher.fetch("compras")?;

    assert_eq!(first.status, FetchStatus::Fetched);
    assert_eq!(second.status, FetchStatus::Cached);
    assert_eq!(first.table, second.table);
    assert_eq!(first.table.height(), 2);
    assert!(first.diagnostics.is_empty());
    assert_eq!(source.calls("compras"), 1);
    Ok(())
}

#[test]
fn test_entry_expires_after_ttl() -> Result<()> {
    let (source, clock, fetcher) = fixture(MemorySource::new().with_table("compras", rows()));

    fetcher.fetch("compras")?;
    clock.advance(Duration::from_secs(599));
    assert_eq!(fetcher.fetch("compras")?.status, FetchStatus::Cached);
    assert_eq!(source.calls("compras"), 1);

    clock.advance(Duration::from_secs(1));
    assert_eq!(fetcher.fetch("compras")?.status, FetchStatus::Fetched);
    assert_eq!(source.calls("compras"), 2);
    Ok(())
}

#[test]
fn test_custom_ttl() -> Result<()> {
    let source = Arc::new(MemorySource::new().with_table("compras", rows()));
    let clock = Arc::new(ManualClock::new());
    let fetcher = TableFetcher::new(Arc::clone(&source))
        .with_clock(clock.clone())
        .with_ttl(Duration::from_secs(5));
    assert_eq!(fetcher.ttl(), Duration::from_secs(5));

    fetcher.fetch("compras")?;
    clock.advance(Duration::from_secs(5));
    fetcher.fetch("compras")?;
    assert_eq!(source.calls("compras"), 2);
    Ok(())
}

#[test]
fn test_empty_table_warns_and_is_cached() -> Result<()> {
    let (source, _clock, fetcher) = fixture(MemorySource::new().with_table("vacia", Vec::new()));

    let first = fetcher.fetch("vacia")?;
    assert_eq!(first.status, FetchStatus::Empty);
    assert!(first.table.is_empty());
    assert!(!first.is_available());
    assert_eq!(first.diagnostics.len(), 1);
    assert_eq!(first.diagnostics[0].severity, Severity::Warning);
    assert_eq!(first.diagnostics[0].message, "No rows found in table 'vacia'");

    let second = fetcher.fetch("vacia")?;
    assert_eq!(second.status, FetchStatus::Cached);
    assert_eq!(second.diagnostics.len(), 1);
    assert_eq!(source.calls("vacia"), 1);
    Ok(())
}

#[test]
fn test_failure_is_reported_and_not_cached() -> Result<()> {
    let (source, _clock, fetcher) =
        fixture(MemorySource::new().with_failure("compras", "connection refused"));

    let outcome = fetcher.fetch("compras")?;
    assert_eq!(
        outcome.status,
        FetchStatus::Failed("connection refused".to_owned())
    );
    assert!(outcome.table.is_empty());
    assert!(!outcome.is_available());
    assert_eq!(outcome.diagnostics[0].severity, Severity::Error);
    assert!(outcome.diagnostics[0].message.contains("compras"));
    assert!(outcome.diagnostics[0].message.contains("connection refused"));

    fetcher.fetch("compras")?;
    assert_eq!(source.calls("compras"), 2);
    assert!(fetcher.cache().is_empty());
    assert_eq!(fetcher.cache().slot_count(), 0);
    Ok(())
}

#[test]
fn test_failed_and_forgotten_names_leave_no_slots() -> Result<()> {
    let (_source, _clock, fetcher) = fixture(MemorySource::new().with_table("compras", rows()));

    for i in 0..50 {
        fetcher.fetch(&format!("missing_{i}"))?;
    }
    assert_eq!(fetcher.cache().slot_count(), 0);

    fetcher.fetch("compras")?;
    assert_eq!(fetcher.cache().slot_count(), 1);
    fetcher.invalidate("compras");
    assert_eq!(fetcher.cache().slot_count(), 0);

    fetcher.fetch("compras")?;
    fetcher.clear();
    assert_eq!(fetcher.cache().slot_count(), 0);
    Ok(())
}

#[test]
fn test_unknown_table_fails_softly() -> Result<()> {
    let (_source, _clock, fetcher) = fixture(MemorySource::new());
    let outcome = fetcher.fetch("missing")?;
    assert!(matches!(outcome.status, FetchStatus::Failed(_)));
    Ok(())
}

#[test]
fn test_blank_name_is_rejected() {
    let (_source, _clock, fetcher) = fixture(MemorySource::new());
    for name in ["", "   "] {
        match fetcher.fetch(name) {
            Err(LensError::InvalidArgument(_)) => {}
            other => panic!("expected InvalidArgument, got {other:?}"),
        }
    }
}

#[test]
fn test_name_is_trimmed() -> Result<()> {
    let (source, _clock, fetcher) = fixture(MemorySource::new().with_table("compras", rows()));
    fetcher.fetch(" compras ")?;
    assert_eq!(fetcher.fetch("compras")?.status, FetchStatus::Cached);
    assert_eq!(source.calls("compras"), 1);
    Ok(())
}

#[test]
fn test_invalidate_forces_refetch() -> Result<()> {
    let (source, _clock, fetcher) = fixture(
        MemorySource::new()
            .with_table("compras", rows())
            .with_table("ventas", rows()),
    );

    fetcher.fetch("compras")?;
    fetcher.fetch("ventas")?;
    fetcher.invalidate("compras");

    assert_eq!(fetcher.fetch("compras")?.status, FetchStatus::Fetched);
    assert_eq!(fetcher.fetch("ventas")?.status, FetchStatus::Cached);

    fetcher.clear();
    fetcher.fetch("ventas")?;
    assert_eq!(source.calls("compras"), 2);
    assert_eq!(source.calls("ventas"), 2);
    Ok(())
}

#[test]
fn test_concurrent_fetches_share_one_call() {
    let source = Arc::new(
        MemorySource::new()
            .with_table("compras", rows())
            .with_delay(Duration::from_millis(50)),
    );
    let fetcher = Arc::new(TableFetcher::new(Arc::clone(&source)));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let fetcher = Arc::clone(&fetcher);
            thread::spawn(move || fetcher.fetch("compras").unwrap())
        })
        .collect();
    let outcomes: Vec<FetchOutcome> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(source.calls("compras"), 1);
    let fetched = outcomes
        .iter()
        .filter(|o| o.status == FetchStatus::Fetched)
        .count();
    assert_eq!(fetched, 1);
    assert!(outcomes.iter().all(|o| o.table.height() == 2));
}

#[test]
fn test_different_tables_fetch_independently() {
    let source = Arc::new(
        MemorySource::new()
            .with_table("compras", rows())
            .with_table("ventas", rows())
            .with_delay(Duration::from_millis(20)),
    );
    let fetcher = Arc::new(TableFetcher::new(Arc::clone(&source)));

    let handles: Vec<_> = ["compras", "ventas", "compras", "ventas"]
        .into_iter()
        .map(|name| {
            let fetcher = Arc::clone(&fetcher);
            thread::spawn(move || fetcher.fetch(name).unwrap())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(source.calls("compras"), 1);
    assert_eq!(source.calls("ventas"), 1);
}
