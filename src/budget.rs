//! Time-bounded execution of slow sub-steps

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crate::error::SignalIssue;

/// Run `work` with an optional time limit
///
/// With no limit the work runs inline. With a limit it runs on a detached
/// worker thread; if no result arrives in time the caller gets
/// [`SignalIssue::TimedOut`] and the worker's eventual result is dropped.
pub fn bounded<T, F>(signal: &str, limit: Option<Duration>, work: F) -> Result<T, SignalIssue>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let Some(limit) = limit else {
        return Ok(work());
    };

    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("preflight-worker".to_string())
        .spawn(move || {
            // Receiver may be gone after a timeout
            let _ = tx.send(work());
        })
        .map_err(|e| SignalIssue::unavailable(signal, e))?;

    match rx.recv_timeout(limit) {
        Ok(value) => Ok(value),
        Err(RecvTimeoutError::Timeout) => {
            log::warn!("{signal} exceeded its {} ms budget", limit.as_millis());
            Err(SignalIssue::TimedOut {
                signal: signal.to_string(),
                limit,
            })
        }
        Err(RecvTimeoutError::Disconnected) => {
            Err(SignalIssue::unavailable(signal, "worker stopped without a result"))
        }
    }
}
