//! Countdown clock for timed test sessions.

use std::time::Duration;

use tokio::task::JoinHandle;

/// A one-shot countdown that ticks once per second.
///
/// `on_tick` receives the remaining seconds after each elapsed second, in
/// strictly decreasing order down to 0; `on_expire` fires exactly once when
/// the countdown reaches zero, after which the task halts. `stop` cancels
/// the countdown and is safe to call any number of times; dropping the
/// handle also stops it, so a torn-down session never keeps ticking.
pub struct Countdown {
    handle: Option<JoinHandle<()>>,
}

impl Countdown {
    pub fn start<T, E>(initial_secs: u32, on_tick: T, on_expire: E) -> Self
    where
        T: Fn(u32) + Send + 'static,
        E: FnOnce() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut remaining = initial_secs;
            let mut expire = Some(on_expire);
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // The first interval tick completes immediately; consume it so
            // the first callback lands one second after start.
            interval.tick().await;

            while remaining > 0 {
                interval.tick().await;
                remaining -= 1;
                on_tick(remaining);
                if remaining == 0 {
                    if let Some(expire) = expire.take() {
                        expire();
                    }
                }
            }
        });

        Self { handle: Some(handle) }
    }

    /// Cancel the countdown. Idempotent.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// True while the countdown task is still live.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.stop();
    }
}
