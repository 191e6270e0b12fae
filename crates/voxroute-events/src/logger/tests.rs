use super::*;
use std::time::Duration;
use tempfile::tempdir;
use voxroute_models::AuditEventType;
use voxroute_persistence::{JsonlAuditStore, MemoryAuditStore};

fn make_event(event_type: AuditEventType, command: &str) -> AuditEvent {
    AuditEvent::builder(event_type).command(command).build()
}

fn memory_logger(capacity: usize) -> (Arc<MemoryAuditStore>, AuditLogger) {
    let store = Arc::new(MemoryAuditStore::new());
    let logger = AuditLogger::new(store.clone(), capacity);
    (store, logger)
}

#[test]
fn test_record_persists() {
    let (store, logger) = memory_logger(8);

    let outcome = logger.record(make_event(AuditEventType::RoutingDecided, "cmd-1"));

    assert_eq!(outcome, RecordOutcome::Persisted);
    assert_eq!(store.len(), 1);
    assert_eq!(logger.buffered_len(), 0);
    assert!(!logger.is_degraded());
}

#[test]
fn test_record_buffers_when_store_down() {
    let (store, logger) = memory_logger(8);
    store.set_available(false);

    let outcome = logger.record(make_event(AuditEventType::Blocked, "cmd-1"));

    assert_eq!(outcome, RecordOutcome::Buffered);
    assert_eq!(logger.buffered_len(), 1);
    assert!(logger.is_degraded());
    assert!(store.is_empty());
}

#[test]
fn test_next_record_flushes_in_order() {
    let (store, logger) = memory_logger(8);
    store.set_available(false);
    logger.record(make_event(AuditEventType::RoutingDecided, "cmd-1"));
    logger.record(make_event(AuditEventType::Blocked, "cmd-1"));

    store.set_available(true);
    let outcome = logger.record(make_event(AuditEventType::RoutingDecided, "cmd-2"));

    assert_eq!(outcome, RecordOutcome::Persisted);
    let stored = store.load().unwrap();
    let order: Vec<_> = stored
        .iter()
        .map(|e| (e.event_type, e.command_id.as_ref().map(|c| c.as_str().to_string())))
        .collect();
    assert_eq!(
        order,
        vec![
            (AuditEventType::RoutingDecided, Some("cmd-1".to_string())),
            (AuditEventType::Blocked, Some("cmd-1".to_string())),
            (AuditEventType::RoutingDecided, Some("cmd-2".to_string())),
        ]
    );
    assert!(!logger.is_degraded());
}

#[test]
fn test_flush_buffered_returns_count() {
    let (store, logger) = memory_logger(8);
    store.set_available(false);
    for i in 0..3 {
        logger.record(make_event(AuditEventType::RoutingDecided, &format!("cmd-{}", i)));
    }
    assert_eq!(logger.flush_buffered(), 0);

    store.set_available(true);
    assert_eq!(logger.flush_buffered(), 3);
    assert_eq!(logger.flush_buffered(), 0);
    assert_eq!(store.len(), 3);
}

#[test]
fn test_overflow_inserts_single_marker_per_episode() {
    let (store, logger) = memory_logger(4);
    store.set_available(false);

    for i in 0..10 {
        logger.record(make_event(AuditEventType::RoutingDecided, &format!("cmd-{}", i)));
    }
    assert_eq!(logger.buffered_len(), 4);

    store.set_available(true);
    logger.flush_buffered();
    let stored = store.load().unwrap();

    let markers: Vec<_> = stored
        .iter()
        .filter(|e| e.event_type == AuditEventType::AuditDegraded)
        .collect();
    assert_eq!(markers.len(), 1);
    // Marker plus the three newest events survive
    assert_eq!(stored[0].event_type, AuditEventType::AuditDegraded);
    assert_eq!(markers[0].payload.get("dropped"), Some(&serde_json::json!(7)));
    let kept: Vec<_> = stored[1..]
        .iter()
        .filter_map(|e| e.command_id.as_ref().map(|c| c.as_str().to_string()))
        .collect();
    assert_eq!(kept, vec!["cmd-7", "cmd-8", "cmd-9"]);
}

#[test]
fn test_overflow_keeps_store_in_timestamp_order() {
    let (store, logger) = memory_logger(3);
    store.set_available(false);

    for i in 0..6 {
        logger.record(make_event(AuditEventType::RoutingDecided, &format!("cmd-{}", i)));
        std::thread::sleep(Duration::from_millis(2));
    }
    store.set_available(true);
    logger.flush_buffered();

    let stored = store.load().unwrap();
    assert_eq!(stored[0].event_type, AuditEventType::AuditDegraded);
    assert!(stored
        .windows(2)
        .all(|pair| pair[0].timestamp <= pair[1].timestamp));
}

#[test]
fn test_new_episode_gets_new_marker() {
    let (store, logger) = memory_logger(2);

    for _ in 0..2 {
        store.set_available(false);
        for i in 0..4 {
            logger.record(make_event(AuditEventType::RoutingDecided, &format!("cmd-{}", i)));
        }
        store.set_available(true);
        logger.flush_buffered();
        assert!(!logger.is_degraded());
    }

    let markers = store
        .load()
        .unwrap()
        .into_iter()
        .filter(|e| e.event_type == AuditEventType::AuditDegraded)
        .count();
    assert_eq!(markers, 2);
}

#[test]
fn test_subscribe_receives_events() {
    let (_store, logger) = memory_logger(8);
    let rx1 = logger.subscribe();
    let rx2 = logger.subscribe();

    logger.record(make_event(AuditEventType::DispatchSucceeded, "cmd-1"));

    let r1 = rx1.recv_timeout(Duration::from_secs(1)).unwrap();
    let r2 = rx2.recv_timeout(Duration::from_secs(1)).unwrap();
    assert_eq!(r1.event_type, AuditEventType::DispatchSucceeded);
    assert_eq!(r2.id, r1.id);
}

#[test]
fn test_subscribers_see_buffered_events() {
    let (store, logger) = memory_logger(8);
    let rx = logger.subscribe();
    store.set_available(false);

    logger.record(make_event(AuditEventType::Blocked, "cmd-1"));

    let received = rx.recv_timeout(Duration::from_secs(1)).unwrap();
    assert_eq!(received.event_type, AuditEventType::Blocked);
}

#[test]
fn test_dropped_subscriber_is_pruned() {
    let (_store, logger) = memory_logger(8);
    drop(logger.subscribe());
    logger.record(make_event(AuditEventType::Blocked, "cmd-1"));
    assert_eq!(logger.subscribers.read().unwrap().len(), 0);
}

#[test]
fn test_replay_with_filter_from_disk() {
    let dir = tempdir().unwrap();
    let logger = AuditLogger::new(Arc::new(JsonlAuditStore::new(dir.path())), 8);

    logger.record(make_event(AuditEventType::RoutingDecided, "cmd-1"));
    logger.record(
        AuditEvent::builder(AuditEventType::Blocked)
            .command("cmd-1")
            .terminal()
            .build(),
    );
    logger.record(make_event(AuditEventType::RoutingDecided, "cmd-2"));

    let reopened = AuditLogger::new(Arc::new(JsonlAuditStore::new(dir.path())), 8);
    let routing = reopened
        .replay(&AuditFilter::new().with_event_type(AuditEventType::RoutingDecided))
        .unwrap();
    assert_eq!(routing.len(), 2);

    let cmd1 = reopened.replay(&AuditFilter::new().with_command_id("cmd-1")).unwrap();
    assert_eq!(cmd1.len(), 2);
    assert_eq!(reopened.terminal_count("cmd-1").unwrap(), 1);
    assert_eq!(reopened.terminal_count("cmd-2").unwrap(), 0);
}
