pub mod config;
pub mod feed;

pub use config::{ConfigError, DashboardConfig, FeedConfig};

/// Observable holder for the latest snapshot of a value. Writers replace the value as a whole;
/// readers either take a copy or subscribe to be woken on every replacement. For example the
/// acquisition loop publishing a new display state while the screen re-renders from it.
pub struct ValueStore<T>(std::sync::Arc<tokio::sync::watch::Sender<T>>);

impl<T> Clone for ValueStore<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Default> Default for ValueStore<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> ValueStore<T> {
    /// Creates a store holding `initial`.
    pub fn new(initial: T) -> Self {
        let (sender, _) = tokio::sync::watch::channel(initial);
        Self(std::sync::Arc::new(sender))
    }

    /// Replaces the stored value and notifies every subscriber. Works without subscribers.
    pub fn set(&self, value: T) {
        self.0.send_replace(value);
    }

    /// Returns a receiver that observes every value set from now on.
    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<T> {
        self.0.subscribe()
    }
}

impl<T: Clone> ValueStore<T> {
    /// Gets a copy of the stored value.
    pub fn get(&self) -> T {
        self.0.borrow().clone()
    }
}

#[test]
fn test_value_store_replaces_value() {
    let store = ValueStore::new(1u32);
    let clone = store.clone();

    clone.set(2);

    assert_eq!(store.get(), 2);
}

#[tokio::test]
async fn test_value_store_notifies_subscribers() {
    let store = ValueStore::new(String::from("old"));
    let mut receiver = store.subscribe();

    store.set(String::from("new"));

    receiver.changed().await.unwrap();
    assert_eq!(*receiver.borrow_and_update(), "new");
}
