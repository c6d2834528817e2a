//! Integration tests for the full mirroring session.
//!
//! These tests exercise the application layer of deckmirror end-to-end:
//! `MonitorService` + `RefreshController` + `InputDispatcher` over mock
//! infrastructure (deck, grabber, pointer).

use std::sync::{Arc, Mutex};
use std::time::Duration;

use deckmirror::application::monitor::{MonitorError, MonitorService, MonitorState};
use deckmirror::infrastructure::capture::mock::MockGrabber;
use deckmirror::infrastructure::deck::mock::MockDeck;
use deckmirror::infrastructure::deck::{DeckError, KeyEvent};
use deckmirror::infrastructure::pointer::mock::{MockPointer, PointerCall};
use deckmirror::infrastructure::pointer::PointerController;
use deckmirror::infrastructure::storage::AppConfig;

fn instant_click_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.pointer.move_duration_ms = 0;
    config.pointer.pre_click_delay_ms = 0;
    config
}

fn monitor_for(deck: &MockDeck, pointer: Option<MockPointer>) -> MonitorService {
    MonitorService::new(
        Arc::new(Mutex::new(deck.clone())),
        Arc::new(MockGrabber::new(1920, 1080)),
        pointer.map(|p| Arc::new(p) as Arc<dyn PointerController>),
        instant_click_config(),
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_full_session_mirrors_and_clicks() {
    let deck = MockDeck::new();
    let pointer = MockPointer::new();
    let mut monitor = monitor_for(&deck, Some(pointer.clone()));

    monitor.start().await.expect("start must succeed");

    // Let a few ticks through, then press key 14 (bottom-right region:
    // (1536,720)-(1920,1080), centre (1728,900)).
    tokio::time::sleep(Duration::from_millis(100)).await;
    deck.inject_key_event(KeyEvent { key: 14, pressed: true });
    deck.inject_key_event(KeyEvent { key: 14, pressed: false });
    tokio::time::sleep(Duration::from_millis(100)).await;

    monitor.stop().await;

    // The deck was prepared and released.
    assert_eq!(deck.brightness_calls(), vec![80]);
    assert_eq!(deck.reset_count(), 2);
    assert_eq!(deck.close_count(), 1);

    // Keys were painted repeatedly, in whole-deck batches.
    let images = deck.pushed_images();
    assert!(images.len() >= 15, "expected at least one full repaint");
    assert_eq!(images.len() % 15, 0, "images must arrive in full batches");

    // The press produced exactly one move-then-click, the release nothing.
    assert_eq!(
        pointer.calls(),
        vec![PointerCall::MoveTo { x: 1728, y: 900 }, PointerCall::Click]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rate_cycle_key_changes_pace_without_clicking() {
    let deck = MockDeck::new();
    let pointer = MockPointer::new();
    let mut monitor = monitor_for(&deck, Some(pointer.clone()));

    monitor.start().await.expect("start must succeed");
    deck.inject_key_event(KeyEvent { key: 0, pressed: true });
    tokio::time::sleep(Duration::from_millis(100)).await;
    monitor.stop().await;

    assert!(
        pointer.calls().is_empty(),
        "the rate key must never move or click the pointer"
    );
}

#[tokio::test]
async fn test_non_visual_deck_fails_setup_and_stays_idle() {
    let deck = MockDeck::non_visual();
    let mut monitor = monitor_for(&deck, None);

    let err = monitor.start().await.expect_err("setup must fail");

    assert!(matches!(err, MonitorError::Setup(DeckError::NotVisual(_))));
    assert_eq!(monitor.state(), MonitorState::Idle);
    assert!(deck.pushed_images().is_empty(), "no mirroring may have started");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_repeated_stop_is_harmless_and_reruns_teardown() {
    let deck = MockDeck::new();
    let mut monitor = monitor_for(&deck, None);

    monitor.start().await.expect("start must succeed");
    monitor.stop().await;
    monitor.stop().await;
    monitor.stop().await;

    assert_eq!(monitor.state(), MonitorState::Stopped);
    // Every stop re-runs the reset+close teardown.
    assert_eq!(deck.close_count(), 3);
    assert_eq!(deck.reset_count(), 4, "reset on start plus one per stop");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_oversized_deck_keys_fall_back_to_origin_patch() {
    // An 8×4 deck has 17 keys beyond the 5×3 grid; each of them mirrors
    // and clicks the fixed 100×100 patch at the screen origin.
    let deck = MockDeck::with_layout(8, 4);
    let pointer = MockPointer::new();
    let mut monitor = monitor_for(&deck, Some(pointer.clone()));

    monitor.start().await.expect("start must succeed");
    deck.inject_key_event(KeyEvent { key: 31, pressed: true });
    tokio::time::sleep(Duration::from_millis(100)).await;
    monitor.stop().await;

    assert_eq!(
        pointer.calls(),
        vec![PointerCall::MoveTo { x: 50, y: 50 }, PointerCall::Click]
    );

    let images = deck.pushed_images();
    assert_eq!(images.len() % 32, 0, "batches must cover all 32 keys");
}
