//! Online/offline signal shared by every store adapter.
//!
//! The monitor is constructor-injected rather than ambient global state, so
//! tests can drive transitions with a fake source.

use tokio::sync::watch;

/// Process-wide connectivity state as a subscribable boolean stream.
pub struct ConnectivityMonitor {
  tx: watch::Sender<bool>,
}

impl ConnectivityMonitor {
  /// Create a monitor with the given initial state.
  pub fn new(online: bool) -> Self {
    let (tx, _) = watch::channel(online);
    Self { tx }
  }

  /// Report a connectivity change. Subscribers observe every transition.
  pub fn set_online(&self, online: bool) {
    self.tx.send_replace(online);
  }

  pub fn is_online(&self) -> bool {
    *self.tx.borrow()
  }

  /// Subscribe to connectivity transitions.
  pub fn subscribe(&self) -> watch::Receiver<bool> {
    self.tx.subscribe()
  }
}

impl Default for ConnectivityMonitor {
  fn default() -> Self {
    Self::new(true)
  }
}
