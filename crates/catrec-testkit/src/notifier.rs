use catrec_report::{Notifier, NotifyError, Report};
use std::sync::{Arc, Mutex};

/// Captures every report handed to it. Clones share the same log.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Report>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the attempt, then reports a transport failure.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Report> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    fn channel_name(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, report: &Report) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(report.clone());
        if self.fail {
            return Err(NotifyError::Transport("relay refused connection".to_string()));
        }
        Ok(())
    }
}
