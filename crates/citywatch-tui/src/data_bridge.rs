//! Data bridge: connects the [`CameraStore`] stream to TUI actions.
//!
//! Runs as a background task: subscribes to the camera collection and
//! forwards every snapshot as an [`Action`] through the TUI's action
//! channel.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use citywatch_core::CameraStore;

use crate::action::Action;

/// Forward camera snapshots until cancelled or the app stops listening.
pub async fn spawn_data_bridge(
    store: Arc<CameraStore>,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let mut cameras = store.subscribe();

    // Push the initial snapshot so panels have data immediately
    if action_tx
        .send(Action::CamerasUpdated(cameras.current().clone()))
        .is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            Some(snapshot) = cameras.changed() => {
                debug!(cameras = snapshot.len(), "dispatching CamerasUpdated");
                if action_tx.send(Action::CamerasUpdated(snapshot)).is_err() {
                    break;
                }
            }

            else => break,
        }
    }

    debug!("data bridge shut down");
}
