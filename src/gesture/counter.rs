use crate::scheduler::Millis;

/// Counts events that arrive no more than `window` apart
///
/// A gap longer than the window restarts the count, with the late event
/// itself counting as the first of a new run. Swipes, the Escape combo and
/// the triple-tap exit all use this.
#[derive(Debug, Clone)]
pub struct WindowedCounter {
    window_ms: Millis,
    count: u32,
    last_at: Option<Millis>,
}

impl WindowedCounter {
    pub fn new(window_ms: Millis) -> Self {
        Self {
            window_ms,
            count: 0,
            last_at: None,
        }
    }

    /// Register one event at `now` and return the running count
    pub fn register(&mut self, now: Millis) -> u32 {
        if let Some(last) = self.last_at {
            if now.saturating_sub(last) > self.window_ms {
                log::debug!(
                    "Counter reset after {} ms gap (window {} ms)",
                    now.saturating_sub(last),
                    self.window_ms
                );
                self.count = 0;
            }
        }
        self.count += 1;
        self.last_at = Some(now);
        self.count
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn window_ms(&self) -> Millis {
        self.window_ms
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.last_at = None;
    }
}
