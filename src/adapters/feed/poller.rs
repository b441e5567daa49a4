use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::mpsc;

use crate::ports::price_feed::{FeedError, NavUpdate, PriceFeedPort};

/// Subscriber channel capacity
const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct NavPollerConfig {
    /// NAV endpoint, queried as `{nav_url}?spv_id=<id>`
    pub nav_url: String,
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl NavPollerConfig {
    pub fn new(nav_url: impl Into<String>, poll_interval: Duration) -> Self {
        Self {
            nav_url: nav_url.into(),
            poll_interval,
            timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP polling NAV feed
#[derive(Debug, Clone)]
pub struct NavPoller {
    config: NavPollerConfig,
    http: Client,
}

impl NavPoller {
    pub fn new(config: NavPollerConfig) -> Result<Self, FeedError> {
        if config.poll_interval.is_zero() {
            return Err(FeedError::Subscription("poll interval must be > 0".into()));
        }
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FeedError::Http(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { config, http })
    }

    async fn fetch(http: &Client, nav_url: &str, spv_id: &str) -> Result<NavUpdate, FeedError> {
        let response = http
            .get(nav_url)
            .query(&[("spv_id", spv_id)])
            .send()
            .await
            .map_err(|e| FeedError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FeedError::Http(format!("NAV endpoint returned {}", response.status())));
        }

        response
            .json()
            .await
            .map_err(|e| FeedError::Parse(e.to_string()))
    }
}

#[async_trait]
impl PriceFeedPort for NavPoller {
    async fn subscribe(&self, spv_ids: Vec<String>) -> Result<mpsc::Receiver<NavUpdate>, FeedError> {
        if spv_ids.is_empty() {
            return Err(FeedError::Subscription("no SPVs requested".into()));
        }

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let http = self.http.clone();
        let nav_url = self.config.nav_url.clone();
        let mut ticker = tokio::time::interval(self.config.poll_interval);

        tokio::spawn(async move {
            tracing::info!("NAV feed started for {} SPVs", spv_ids.len());
            'poll: loop {
                ticker.tick().await;
                for spv_id in &spv_ids {
                    if tx.is_closed() {
                        break 'poll;
                    }
                    match Self::fetch(&http, &nav_url, spv_id).await {
                        Ok(update) => {
                            if tx.send(update).await.is_err() {
                                break 'poll;
                            }
                        }
                        Err(e) => tracing::warn!("NAV fetch for {} failed: {}", spv_id, e),
                    }
                }
            }
            tracing::info!("NAV feed stopped");
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_interval_rejected() {
        let config = NavPollerConfig::new("http://localhost/nav", Duration::ZERO);
        assert!(matches!(NavPoller::new(config), Err(FeedError::Subscription(_))));
    }

    #[test]
    fn test_nav_update_parsing() {
        let json = r#"{"spv_id": "spv-alpha", "nav_per_token": "1.0425", "timestamp": "2024-06-01T12:00:00Z"}"#;
        let update: NavUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(update.spv_id, "spv-alpha");
        assert_eq!(update.nav_per_token.to_string(), "1.0425");
    }

    #[tokio::test]
    async fn test_subscribe_requires_spvs() {
        let poller = NavPoller::new(NavPollerConfig::new("http://localhost/nav", Duration::from_secs(5))).unwrap();
        assert!(poller.subscribe(vec![]).await.is_err());
    }
}
