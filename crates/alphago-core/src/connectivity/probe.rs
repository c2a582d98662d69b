//! HTTP reachability probe

use std::time::Duration;

use super::{ConnectivityMonitor, Subscription};
use crate::remote::{RemoteError, RemoteResult};
use crate::util::{is_http_url, normalize_text_option};

const PROBE_TIMEOUT_SECS: u64 = 4;

/// Decides connectivity by requesting a health URL on the order service.
///
/// Any response below 500 counts as online: the service answered. Transport
/// errors, timeouts, and 5xx responses count as offline.
#[derive(Clone, Debug)]
pub struct HttpProbe {
    url: String,
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>) -> RemoteResult<Self> {
        let url = normalize_text_option(Some(url.into())).ok_or_else(|| {
            RemoteError::InvalidConfiguration("health URL must not be empty".to_string())
        })?;
        if !is_http_url(&url) {
            return Err(RemoteError::InvalidConfiguration(
                "health URL must include http:// or https://".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
            .build()?;
        Ok(Self { url, client })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Probe once
    pub async fn check(&self) -> bool {
        match self.client.get(&self.url).send().await {
            Ok(response) => {
                let online = !response.status().is_server_error();
                tracing::debug!(
                    "Health probe {} answered {} (online={})",
                    self.url,
                    response.status(),
                    online
                );
                online
            }
            Err(error) => {
                tracing::debug!("Health probe {} failed: {}", self.url, error);
                false
            }
        }
    }

    /// Probe once and record the answer on `monitor`
    pub async fn refresh(&self, monitor: &ConnectivityMonitor) -> bool {
        let online = self.check().await;
        monitor.set_online(online);
        online
    }

    /// Keep `monitor` up to date by probing every `interval` until unsubscribed
    pub fn spawn(self, monitor: ConnectivityMonitor, interval: Duration) -> Subscription {
        let task = tokio::spawn(async move {
            loop {
                self.refresh(&monitor).await;
                tokio::time::sleep(interval).await;
            }
        });
        Subscription::from_task(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::Connectivity;

    #[test]
    fn new_rejects_invalid_urls() {
        assert!(HttpProbe::new("").is_err());
        assert!(HttpProbe::new("api.example.com/health").is_err());
        assert!(HttpProbe::new(" https://api.example.com/health ").is_ok());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unreachable_host_reports_offline() {
        // Port 9 on localhost is the discard service and is closed on test hosts.
        let probe = HttpProbe::new("http://127.0.0.1:9/health").unwrap();
        let monitor = ConnectivityMonitor::new(true);

        assert!(!probe.refresh(&monitor).await);
        assert!(!monitor.is_online());
    }
}
