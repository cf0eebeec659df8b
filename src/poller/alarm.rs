//! Sustained parse failure alarm
//!
//! A single parse failure is usually a transient block or error page. A run
//! of them means the listing layout changed and someone has to look.

/// Counts consecutive parse failures against a threshold
#[derive(Debug, Clone)]
pub struct ParseAlarm {
    threshold: u32,
    consecutive: u32,
    raised: u32,
}

impl ParseAlarm {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            consecutive: 0,
            raised: 0,
        }
    }

    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Alerts raised since start
    pub fn raised(&self) -> u32 {
        self.raised
    }

    /// Records a failure; returns true exactly when the threshold is reached
    pub fn record_failure(&mut self) -> bool {
        self.consecutive = self.consecutive.saturating_add(1);
        let fire = self.consecutive == self.threshold;
        if fire {
            self.raised = self.raised.saturating_add(1);
        }
        fire
    }

    /// Clears the streak after a page parses
    pub fn reset(&mut self) {
        self.consecutive = 0;
    }
}
