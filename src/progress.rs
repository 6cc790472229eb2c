use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;

use navigator_core::types::NavigatorEvent;

/// One status line for events the user should see while a batch runs.
fn describe(event: &NavigatorEvent) -> Option<String> {
    match event {
        NavigatorEvent::OperationFellBack { index, reason, .. } => {
            Some(format!("[op {}: fallback] {}", index, reason))
        }
        NavigatorEvent::OperationDropped { index, reason, .. } => {
            Some(format!("[op {}: DROPPED] {}", index, reason))
        }
        NavigatorEvent::OperationFailed { index, reason, .. } => {
            Some(format!("[op {}: FAILED] {}", index, reason))
        }
        _ => None,
    }
}

/// Emit status lines until the batch finishes or the bus closes.
/// A lagging receiver reports how many events it missed and keeps going.
pub async fn follow_batch(mut rx: Receiver<NavigatorEvent>, mut emit: impl FnMut(String)) {
    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                emit(format!("[events: {} skipped]", skipped));
                continue;
            }
            Err(RecvError::Closed) => break,
        };
        if let NavigatorEvent::BatchFinished { .. } = event {
            break;
        }
        if let Some(line) = describe(&event) {
            emit(line);
        }
    }
}
