use std::time::Duration;

use url::Url;

use crate::ReconnectPolicy;

/// Connection settings for the receipt processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub base_url: Url,
    pub connect_timeout: Duration,
    /// Applies to submission and download; the event stream has no total timeout.
    pub request_timeout: Duration,
    /// Wait between submission and the first stream connect, so the processor
    /// can register the job.
    pub connect_grace: Duration,
    pub reconnect: ReconnectPolicy,
}

impl ClientSettings {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(120),
            connect_grace: Duration::from_millis(300),
            reconnect: ReconnectPolicy::default(),
        }
    }

    pub fn submit_url(&self) -> Url {
        self.endpoint(&["process-receipts"])
    }

    pub fn events_url(&self, job_id: &str) -> Url {
        self.endpoint(&["events", job_id])
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}
