//! Remote session mirror
//!
//! Uploads each persisted snapshot to a configured endpoint on a detached
//! task. Nothing waits for the upload and failures are only logged.

use std::time::Duration;

use url::Url;

use crate::error::SessionError;
use crate::snapshot::SessionSnapshot;
use crate::Result;

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct SessionMirror {
    client: reqwest::Client,
    endpoint: Url,
}

impl SessionMirror {
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint.trim()).map_err(|e| SessionError::InvalidMirrorUrl {
            url: endpoint.to_string(),
            reason: e.to_string(),
        })?;

        if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
            return Err(SessionError::InvalidMirrorUrl {
                url: endpoint.to_string(),
                reason: "only http and https are supported".to_string(),
            });
        }

        let client = reqwest::Client::builder().timeout(UPLOAD_TIMEOUT).build()?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Spawn the upload. Returns false when there is no Tokio runtime to
    /// run it on, in which case the upload is skipped.
    pub fn upload(&self, snapshot: &SessionSnapshot) -> bool {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::debug!(endpoint = %self.endpoint, "No runtime, skipping session mirror");
            return false;
        };

        let body = match serde_json::to_value(snapshot) {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(error = %e, "Failed to encode session for mirror");
                return false;
            }
        };

        let client = self.client.clone();
        let endpoint = self.endpoint.clone();

        handle.spawn(async move {
            match client.post(endpoint.clone()).json(&body).send().await {
                Ok(resp) => {
                    tracing::debug!(endpoint = %endpoint, status = resp.status().as_u16(), "Mirrored session");
                }
                Err(e) => {
                    tracing::debug!(endpoint = %endpoint, error = %e, "Session mirror failed");
                }
            }
        });

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nyx_policy::PolicyState;
    use nyx_tabs::TabRegistry;

    fn snapshot() -> SessionSnapshot {
        let mut registry = TabRegistry::new();
        registry.create(None);
        SessionSnapshot::capture(&registry, PolicyState { study_mode_active: false }, 0)
    }

    #[test]
    fn test_rejects_bad_endpoints() {
        assert!(matches!(
            SessionMirror::new("not a url"),
            Err(SessionError::InvalidMirrorUrl { .. })
        ));
        assert!(matches!(
            SessionMirror::new("ftp://example.com/session.json"),
            Err(SessionError::InvalidMirrorUrl { .. })
        ));
    }

    #[test]
    fn test_upload_without_runtime_is_skipped() {
        let mirror = SessionMirror::new("http://127.0.0.1:9/session.json").unwrap();
        assert!(!mirror.upload(&snapshot()));
    }

    #[tokio::test]
    async fn test_upload_is_detached() {
        let mirror = SessionMirror::new("http://127.0.0.1:9/session.json").unwrap();
        assert_eq!(mirror.endpoint().path(), "/session.json");
        assert!(mirror.upload(&snapshot()));
    }
}
