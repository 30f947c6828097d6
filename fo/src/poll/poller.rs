//! Polling engine implementation

use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Status tokens that mean the job is finished, matched case-insensitively
const COMPLETION_TOKENS: [&str; 4] = ["done", "completed", "finished", "success"];

/// Probe results that can self-report completion
///
/// Both accessors are consulted by the standard completion policy; a result
/// type that reports neither only completes via a caller-supplied predicate.
pub trait ProbeStatus {
    /// Percent complete (0-100) when the job reports one
    fn percent_complete(&self) -> Option<u8> {
        None
    }

    /// Free-form status token when the job reports one
    fn status_token(&self) -> Option<&str> {
        None
    }
}

#[derive(Debug, Default)]
struct PollState<T> {
    latest: Option<T>,
    error: Option<String>,
    attempts: u32,
    polling: bool,
    task: Option<JoinHandle<()>>,
}

/// Repeatedly invokes an async probe until completion, exhaustion, or stop
///
/// At most one recurring task exists per instance: a re-entrant `start` is an
/// idempotent no-op. The task handle is owned by the engine and aborted
/// deterministically on `stop` and on drop, so no orphaned timer can outlive
/// its owner.
pub struct Poller<T> {
    interval: Duration,
    max_attempts: Option<u32>,
    stop_when: Option<Arc<dyn Fn(&T) -> bool + Send + Sync>>,
    state: Arc<Mutex<PollState<T>>>,
}

impl<T> Poller<T>
where
    T: ProbeStatus + Clone + Send + 'static,
{
    /// Create a poller with the given probe interval
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
            stop_when: None,
            state: Arc::new(Mutex::new(PollState {
                latest: None,
                error: None,
                attempts: 0,
                polling: false,
                task: None,
            })),
        }
    }

    /// Bound the number of scheduled probes; unbounded by default
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Install a caller-supplied completion predicate
    ///
    /// The predicate takes precedence but the standard checks (percent,
    /// status token) still fire when it returns false.
    pub fn with_stop_when(mut self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.stop_when = Some(Arc::new(predicate));
        self
    }

    /// Begin polling
    ///
    /// Performs one immediate probe before scheduling the recurring task; a
    /// job already complete on first check never schedules anything, and
    /// `on_complete` runs synchronously within this call. An error on the
    /// initial probe is fatal: it is recorded and polling never starts.
    /// Calling `start` while already polling is a no-op.
    pub async fn start<P, Fut, E, C>(&self, probe: P, on_complete: C)
    where
        P: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send,
        E: Display,
        C: FnOnce(T) + Send + 'static,
    {
        {
            let mut state = self.state.lock().unwrap();
            if state.polling {
                debug!("Poller::start: already polling, ignoring");
                return;
            }
            state.polling = true;
            state.error = None;
            state.attempts = 0;
        }

        // Initial probe, outside the recurring schedule
        let initial = match probe().await {
            Ok(data) => data,
            Err(e) => {
                debug!(error = %e, "Poller::start: initial probe failed");
                let mut state = self.state.lock().unwrap();
                state.error = Some(e.to_string());
                state.polling = false;
                return;
            }
        };

        self.state.lock().unwrap().latest = Some(initial.clone());

        if is_complete(&initial, self.stop_when.as_deref()) {
            debug!("Poller::start: complete on initial probe");
            self.state.lock().unwrap().polling = false;
            on_complete(initial);
            return;
        }

        let state = Arc::clone(&self.state);
        let stop_when = self.stop_when.clone();
        let interval = self.interval;
        let max_attempts = self.max_attempts;

        let handle = tokio::spawn(async move {
            let mut on_complete = Some(on_complete);
            loop {
                tokio::time::sleep(interval).await;

                {
                    let mut s = state.lock().unwrap();
                    if !s.polling {
                        break;
                    }
                    s.attempts += 1;
                }

                match probe().await {
                    Ok(data) => {
                        let done = is_complete(&data, stop_when.as_deref());
                        {
                            let mut s = state.lock().unwrap();
                            // Stopped while the probe was in flight: drop the result
                            if !s.polling {
                                break;
                            }
                            s.latest = Some(data.clone());
                            if done {
                                s.polling = false;
                                s.task = None;
                            }
                        }
                        if done {
                            debug!("Poller: completion condition met");
                            if let Some(callback) = on_complete.take() {
                                callback(data);
                            }
                            break;
                        }
                    }
                    Err(e) => {
                        // Transient failure: record it and keep polling
                        let mut s = state.lock().unwrap();
                        if !s.polling {
                            break;
                        }
                        debug!(error = %e, attempts = s.attempts, "Poller: probe error, continuing");
                        s.error = Some(e.to_string());
                    }
                }

                let exhausted = {
                    let s = state.lock().unwrap();
                    max_attempts.is_some_and(|max| s.attempts >= max)
                };
                if exhausted {
                    // Give-up is terminal but not an error: no callback, no error recorded
                    warn!(?max_attempts, "Poller: reached max attempts, giving up");
                    let mut s = state.lock().unwrap();
                    s.polling = false;
                    s.task = None;
                    break;
                }
            }
        });

        self.state.lock().unwrap().task = Some(handle);
    }

    /// Stop polling
    ///
    /// Always safe to call, including when not polling. The recurring task is
    /// aborted synchronously; an already-dispatched probe may still resolve
    /// but its result is not acted upon.
    pub fn stop(&self) {
        let mut state = self.state.lock().unwrap();
        state.polling = false;
        if let Some(task) = state.task.take() {
            task.abort();
            debug!("Poller::stop: recurring task aborted");
        }
    }

    /// Latest probe result
    pub fn latest(&self) -> Option<T> {
        self.state.lock().unwrap().latest.clone()
    }

    /// Latest probe error message, cleared at the start of each session
    pub fn last_error(&self) -> Option<String> {
        self.state.lock().unwrap().error.clone()
    }

    /// Number of scheduled (non-initial) probes this session
    pub fn attempts(&self) -> u32 {
        self.state.lock().unwrap().attempts
    }

    /// Whether a polling session is active
    pub fn is_polling(&self) -> bool {
        self.state.lock().unwrap().polling
    }
}

impl<T> Drop for Poller<T> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.polling = false;
        if let Some(task) = state.task.take() {
            task.abort();
        }
    }
}

/// Standard completion policy
///
/// The caller predicate wins when it returns true; otherwise the percent and
/// status-token checks still apply.
fn is_complete<T: ProbeStatus>(data: &T, stop_when: Option<&(dyn Fn(&T) -> bool + Send + Sync)>) -> bool {
    if let Some(predicate) = stop_when
        && predicate(data)
    {
        return true;
    }

    if data.percent_complete().is_some_and(|percent| percent >= 100) {
        return true;
    }

    data.status_token()
        .is_some_and(|token| COMPLETION_TOKENS.contains(&token.to_ascii_lowercase().as_str()))
}
