use std::time::Duration;

use tokio::sync::watch;

/// Collects raw search input and releases it once typing pauses.
pub struct SearchDebouncer {
    tx: watch::Sender<String>,
    delay: Duration,
}

/// Receiving half of a [`SearchDebouncer`].
pub struct SettledSearch {
    rx: watch::Receiver<String>,
    delay: Duration,
}

impl SearchDebouncer {
    pub fn new(delay: Duration) -> Self {
        let (tx, _) = watch::channel(String::new());
        Self { tx, delay }
    }

    /// Records the current contents of the search box.
    pub fn input(&self, text: impl Into<String>) {
        self.tx.send_replace(text.into());
    }

    pub fn subscribe(&self) -> SettledSearch {
        SettledSearch {
            rx: self.tx.subscribe(),
            delay: self.delay,
        }
    }
}

impl SettledSearch {
    /// Waits for new input and returns it once no further input arrived for
    /// the debounce delay. `None` once the debouncer is gone.
    pub async fn settled(&mut self) -> Option<String> {
        self.rx.changed().await.ok()?;
        loop {
            tokio::select! {
                changed = self.rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = tokio::time::sleep(self.delay) => break,
            }
        }
        Some(self.rx.borrow_and_update().clone())
    }
}
