//! Tap-gesture disambiguation for the active feed item.
//!
//! Single tap toggles play/pause, double tap likes. A first tap arms a
//! deferred single-tap action behind a cancellable token; a second tap
//! inside the window cancels it and fires the double-tap action instead.
//! Exactly one of the two actions fires per sequence.

pub mod router;

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub use router::GestureRouter;

/// Default double-tap window.
pub const DOUBLE_TAP_WINDOW: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureEvent {
    /// Play/pause toggle intent.
    SingleTap { item_id: String },
    /// Like intent plus the transient heart overlay.
    DoubleTap { item_id: String },
}

struct PendingTap {
    item_id: String,
    first_at: Instant,
    cancel: CancellationToken,
    timer: JoinHandle<()>,
}

/// Debounces taps into [`GestureEvent`]s on the supplied channel.
///
/// States: idle (no pending tap) and awaiting-second-tap (one pending
/// tap with an armed timer).
pub struct GestureClassifier {
    window: Duration,
    events: mpsc::Sender<GestureEvent>,
    pending: Option<PendingTap>,
}

impl GestureClassifier {
    pub fn new(events: mpsc::Sender<GestureEvent>) -> Self {
        Self::with_window(events, DOUBLE_TAP_WINDOW)
    }

    pub fn with_window(events: mpsc::Sender<GestureEvent>, window: Duration) -> Self {
        Self {
            window,
            events,
            pending: None,
        }
    }

    /// Record a tap on an item.
    pub fn tap(&mut self, item_id: &str) {
        if let Some(pending) = self.pending.take() {
            if pending.item_id == item_id && pending.first_at.elapsed() <= self.window {
                pending.cancel.cancel();
                self.emit(GestureEvent::DoubleTap {
                    item_id: item_id.to_string(),
                });
                return;
            }
            // Stale or different-item tap: the old timer resolves (or
            // already resolved) on its own; start a fresh sequence.
        }

        self.arm(item_id);
    }

    /// Cancel any pending single-tap so a torn-down view never receives
    /// a late action.
    pub fn teardown(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.cancel.cancel();
            pending.timer.abort();
        }
    }

    /// Whether a tap sequence is in flight (awaiting a second tap). A
    /// pending tap whose window already elapsed resolved as a single
    /// tap, even if the timer entry has not been reaped yet.
    pub fn is_awaiting_second_tap(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| pending.first_at.elapsed() <= self.window)
    }

    fn arm(&mut self, item_id: &str) {
        let cancel = CancellationToken::new();
        let events = self.events.clone();
        let window = self.window;
        let id = item_id.to_string();
        let token = cancel.clone();
        let first_at = Instant::now();

        let timer = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep_until(first_at + window) => {
                    let _ = events.send(GestureEvent::SingleTap { item_id: id }).await;
                }
                _ = token.cancelled() => {}
            }
        });

        self.pending = Some(PendingTap {
            item_id: item_id.to_string(),
            first_at,
            cancel,
            timer,
        });
    }

    fn emit(&self, event: GestureEvent) {
        if let Err(e) = self.events.try_send(event) {
            debug!("Dropped gesture event: {}", e);
        }
    }
}

impl Drop for GestureClassifier {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::Receiver;

    fn classifier() -> (GestureClassifier, Receiver<GestureEvent>) {
        let (tx, rx) = mpsc::channel(8);
        (GestureClassifier::new(tx), rx)
    }

    async fn drain(rx: &mut Receiver<GestureEvent>) -> Vec<GestureEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_tap_fires_after_window() {
        let (mut classifier, mut rx) = classifier();
        classifier.tap("v1");
        assert!(classifier.is_awaiting_second_tap());

        tokio::time::advance(Duration::from_millis(301)).await;
        tokio::task::yield_now().await;

        assert_eq!(
            drain(&mut rx).await,
            vec![GestureEvent::SingleTap {
                item_id: "v1".into()
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_tap_fires_exactly_one_like() {
        let (mut classifier, mut rx) = classifier();
        classifier.tap("v1");
        tokio::time::advance(Duration::from_millis(100)).await;
        classifier.tap("v1");

        // Past the window: the cancelled single-tap must stay silent.
        tokio::time::advance(Duration::from_millis(400)).await;
        tokio::task::yield_now().await;

        assert_eq!(
            drain(&mut rx).await,
            vec![GestureEvent::DoubleTap {
                item_id: "v1".into()
            }]
        );
        assert!(!classifier.is_awaiting_second_tap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_second_tap_starts_new_sequence() {
        let (mut classifier, mut rx) = classifier();
        classifier.tap("v1");
        tokio::time::advance(Duration::from_millis(350)).await;
        tokio::task::yield_now().await;

        // First sequence resolved as a single tap; this arms a new one.
        classifier.tap("v1");
        tokio::time::advance(Duration::from_millis(301)).await;
        tokio::task::yield_now().await;

        let events = drain(&mut rx).await;
        assert_eq!(events.len(), 2);
        assert!(events
            .iter()
            .all(|e| matches!(e, GestureEvent::SingleTap { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tap_on_other_item_does_not_double() {
        let (mut classifier, mut rx) = classifier();
        classifier.tap("v1");
        tokio::time::advance(Duration::from_millis(100)).await;
        classifier.tap("v2");

        tokio::time::advance(Duration::from_millis(400)).await;
        tokio::task::yield_now().await;

        let events = drain(&mut rx).await;
        // v1 resolves as its own single tap, v2 as another.
        assert_eq!(
            events,
            vec![
                GestureEvent::SingleTap {
                    item_id: "v1".into()
                },
                GestureEvent::SingleTap {
                    item_id: "v2".into()
                },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_awaiting_flag_clears_once_window_elapses() {
        let (mut classifier, mut rx) = classifier();
        classifier.tap("v1");
        assert!(classifier.is_awaiting_second_tap());

        tokio::time::advance(Duration::from_millis(301)).await;
        tokio::task::yield_now().await;

        assert!(!classifier.is_awaiting_second_tap());
        assert_eq!(drain(&mut rx).await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_cancels_pending_tap() {
        let (mut classifier, mut rx) = classifier();
        classifier.tap("v1");
        classifier.teardown();

        tokio::time::advance(Duration::from_millis(400)).await;
        tokio::task::yield_now().await;

        assert!(drain(&mut rx).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_triple_tap_is_double_then_new_sequence() {
        let (mut classifier, mut rx) = classifier();
        classifier.tap("v1");
        tokio::time::advance(Duration::from_millis(50)).await;
        classifier.tap("v1");
        tokio::time::advance(Duration::from_millis(50)).await;
        classifier.tap("v1");

        tokio::time::advance(Duration::from_millis(301)).await;
        tokio::task::yield_now().await;

        assert_eq!(
            drain(&mut rx).await,
            vec![
                GestureEvent::DoubleTap {
                    item_id: "v1".into()
                },
                GestureEvent::SingleTap {
                    item_id: "v1".into()
                },
            ]
        );
    }
}
