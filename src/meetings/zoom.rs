//! Zoom meeting client
//!
//! Server-to-server OAuth client for the Zoom meetings API. A single bearer
//! token is cached process-wide and refreshed ahead of expiry; the cache
//! slot is guarded by an async mutex held across the refresh call, so
//! concurrent callers coalesce onto at most one in-flight token exchange.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Duration, Utc};
use metrics::{counter, histogram};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::config::ZoomConfig;

use super::{MeetingProvider, MeetingProviderError, MeetingRecord, MeetingRequest};

/// Cached bearer credential with its effective expiry (actual expiry minus
/// the configured refresh margin).
#[derive(Debug, Clone)]
struct CachedToken {
    bearer: String,
    stale_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct MeetingResponse {
    id: serde_json::Value,
    join_url: String,
    start_url: String,
    #[serde(default)]
    password: Option<String>,
}

/// Zoom server-to-server OAuth meeting client
#[derive(Clone)]
pub struct ZoomMeetingClient {
    config: ZoomConfig,
    http: reqwest::Client,
    token_cache: Arc<Mutex<Option<CachedToken>>>,
}

impl ZoomMeetingClient {
    /// Creates a client from vendor configuration.
    pub fn new(config: ZoomConfig) -> Result<Self, MeetingProviderError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| MeetingProviderError::Transport(e.to_string()))?;

        Ok(Self {
            config,
            http,
            token_cache: Arc::new(Mutex::new(None)),
        })
    }

    /// Returns a valid bearer token, performing the client-credentials
    /// exchange when the cached one is missing or stale.
    ///
    /// The mutex is held for the whole exchange: later callers block until
    /// the refresh lands and then reuse its result instead of issuing their
    /// own.
    async fn access_token(&self) -> Result<String, MeetingProviderError> {
        let mut cache = self.token_cache.lock().await;

        if let Some(cached) = cache.as_ref() {
            if Utc::now() < cached.stale_at {
                return Ok(cached.bearer.clone());
            }
        }

        let (account_id, client_id, client_secret) = match (
            self.config.account_id.as_deref(),
            self.config.client_id.as_deref(),
            self.config.client_secret.as_deref(),
        ) {
            (Some(account), Some(id), Some(secret)) => (account, id, secret),
            _ => return Err(MeetingProviderError::MissingCredentials),
        };

        debug!("Refreshing Zoom access token");
        let credentials = general_purpose::STANDARD.encode(format!("{client_id}:{client_secret}"));
        let url = format!("{}/oauth/token", self.config.auth_base_url);

        let response = self
            .http
            .post(&url)
            .query(&[
                ("grant_type", "account_credentials"),
                ("account_id", account_id),
            ])
            .header("Authorization", format!("Basic {credentials}"))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.ok();
            counter!("zoom_token_refresh_failures_total").increment(1);
            error!(status = status.as_u16(), "Zoom token exchange failed");
            return Err(MeetingProviderError::Vendor {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| MeetingProviderError::MalformedResponse(e.to_string()))?;

        let margin = Duration::seconds(self.config.token_refresh_margin_seconds as i64);
        let stale_at = Utc::now() + Duration::seconds(token.expires_in.max(0)) - margin;

        info!("Obtained Zoom access token");
        *cache = Some(CachedToken {
            bearer: token.access_token.clone(),
            stale_at,
        });

        Ok(token.access_token)
    }
}

fn transport_error(err: reqwest::Error) -> MeetingProviderError {
    if err.is_timeout() {
        MeetingProviderError::Transport("request timed out".to_string())
    } else {
        // reqwest errors can embed the full URL incl. query; keep it terse
        MeetingProviderError::Transport(format!("{}", err))
    }
}

#[async_trait]
impl MeetingProvider for ZoomMeetingClient {
    async fn provision(
        &self,
        request: MeetingRequest,
    ) -> Result<MeetingRecord, MeetingProviderError> {
        let started = std::time::Instant::now();
        let bearer = self.access_token().await?;

        // Educational-session defaults: host controls entry, attendees
        // arrive muted and wait for the host.
        let body = json!({
            "topic": format!("{} - {}", request.topic, request.category),
            "type": 2,
            "start_time": request.start_time.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            "duration": request.duration_minutes,
            "timezone": "UTC",
            "agenda": format!("Educational session: {}", request.topic),
            "settings": {
                "host_video": true,
                "participant_video": true,
                "join_before_host": false,
                "mute_upon_entry": true,
                "waiting_room": true,
                "allow_multiple_devices": true,
                "auto_recording": "none",
                "approval_type": 0
            }
        });

        let url = format!("{}/users/me/meetings", self.config.api_base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&bearer)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.ok();
            counter!("zoom_meeting_create_failures_total").increment(1);
            error!(status = status.as_u16(), "Zoom meeting creation failed");
            return Err(MeetingProviderError::Vendor {
                status: status.as_u16(),
                body,
            });
        }

        let meeting: MeetingResponse = response
            .json()
            .await
            .map_err(|e| MeetingProviderError::MalformedResponse(e.to_string()))?;

        let external_id = match &meeting.id {
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::String(s) => s.clone(),
            other => {
                return Err(MeetingProviderError::MalformedResponse(format!(
                    "unexpected meeting id: {other}"
                )));
            }
        };

        histogram!("zoom_meeting_create_duration_ms")
            .record(started.elapsed().as_secs_f64() * 1_000.0);
        info!(meeting_id = %external_id, "Zoom meeting created");

        Ok(MeetingRecord {
            external_id,
            join_url: meeting.join_url,
            host_url: meeting.start_url,
            access_code: meeting.password,
        })
    }
}
