//! Bounded async polling over a probe function
//!
//! The poller repeatedly invokes an async probe until a completion condition
//! holds, a configured attempt bound is reached, or it is stopped. The latest
//! result, latest error, and attempt count are observable at every point.

mod poller;

pub use poller::{Poller, ProbeStatus};

use crate::api::JobProgress;

impl ProbeStatus for JobProgress {
    fn percent_complete(&self) -> Option<u8> {
        Some(self.percent)
    }

    fn status_token(&self) -> Option<&str> {
        Some(&self.status)
    }
}
