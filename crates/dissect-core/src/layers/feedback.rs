//! Sinks for non-fatal decode diagnostics.
//!
//! Decoders report anomalies (e.g. an address length that does not match the
//! declared address family) without aborting. Reporting is infallible and
//! never blocks.

use tracing::warn;

/// Write-only sink for non-fatal anomalies found while decoding.
pub trait DecodeFeedback {
    fn report_anomaly(&mut self, message: &str);
}

impl<F: DecodeFeedback + ?Sized> DecodeFeedback for &mut F {
    fn report_anomaly(&mut self, message: &str) {
        (**self).report_anomaly(message);
    }
}

/// Discards every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopFeedback;

impl DecodeFeedback for NoopFeedback {
    fn report_anomaly(&mut self, _message: &str) {}
}

/// Forwards reports to `tracing` at `WARN` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingFeedback;

impl DecodeFeedback for TracingFeedback {
    fn report_anomaly(&mut self, message: &str) {
        warn!(anomaly = message, "decode anomaly");
    }
}

/// Keeps reports in arrival order.
///
/// # Examples
/// ```
/// use dissect_core::{CollectingFeedback, DecodeFeedback};
///
/// let mut feedback = CollectingFeedback::new();
/// feedback.report_anomaly("odd length");
/// assert_eq!(feedback.anomalies(), ["odd length"]);
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollectingFeedback {
    anomalies: Vec<String>,
}

impl CollectingFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn anomalies(&self) -> &[String] {
        &self.anomalies
    }

    pub fn is_empty(&self) -> bool {
        self.anomalies.is_empty()
    }

    pub fn into_anomalies(self) -> Vec<String> {
        self.anomalies
    }
}

impl DecodeFeedback for CollectingFeedback {
    fn report_anomaly(&mut self, message: &str) {
        self.anomalies.push(message.to_string());
    }
}
