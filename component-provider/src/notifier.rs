//! Change notification sinks.

use tokio::sync::mpsc;
use tracing::debug;

use crate::event::ComponentChange;

/// Receives "the components of this provider may have changed" signals.
pub trait ChangeNotifier: Send + Sync {
    /// Signal a change for `provider_id`.
    fn provider_change(&self, provider_id: &str);
}

/// Channel-backed [`ChangeNotifier`].
///
/// Every signal becomes one [`ComponentChange`] on an unbounded channel, so a
/// consumer can drain notifications from sync or async code and decide how to
/// batch its own rescans.
#[derive(Debug, Clone)]
pub struct ComponentChangeNotifier {
    change_tx: mpsc::UnboundedSender<ComponentChange>,
}

impl ComponentChangeNotifier {
    /// Create a notifier and the receiver for its notifications.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ComponentChange>) {
        let (change_tx, change_rx) = mpsc::unbounded_channel();
        (Self { change_tx }, change_rx)
    }
}

impl ChangeNotifier for ComponentChangeNotifier {
    fn provider_change(&self, provider_id: &str) {
        if self
            .change_tx
            .send(ComponentChange::new(provider_id))
            .is_err()
        {
            debug!("No subscriber for changes of {provider_id}");
        }
    }
}
