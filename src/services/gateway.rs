//! HTTP client for the delivery gateway.
//!
//! This module provides the [`GatewayTransport`] struct, a [`Transport`] that
//! hands every notification over to an external gateway owning the actual
//! sound, desktop, push and email deliveries.

use log::{debug, info, warn};
use parking_lot::Mutex;
use reqwest::{Client, header::CONTENT_TYPE};
use serde::Serialize;
use tokio::{
    runtime::Handle,
    task::{JoinError, JoinSet},
};

use crate::{
    model::{Message, Room, Sender},
    services::{AttentionKind, DeliveryError, EmailNotification, PushNotification, Transport},
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioRequest<'a> {
    user_id: &'a str,
    message: &'a Message,
    room: &'a Room,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DesktopRequest<'a> {
    user_id: &'a str,
    sender: &'a Sender,
    message: &'a Message,
    room: &'a Room,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AttentionRequest<'a> {
    message: &'a Message,
    user_ids: &'a [String],
    summary: &'a str,
    kind: AttentionKind,
}

/// Posts notifications to a delivery gateway.
///
/// Every channel maps to one endpoint under the gateway url:
///
/// | Call                          | Endpoint            |
/// |-------------------------------|---------------------|
/// | `send_audio_cue`              | `POST {url}/audio`     |
/// | `send_desktop_notification`   | `POST {url}/desktop`   |
/// | `send_mobile_push`            | `POST {url}/push`      |
/// | `send_email`                  | `POST {url}/email`     |
/// | `notify_system_attention`     | `POST {url}/attention` |
///
/// Requests run on a spawned task of the current Tokio runtime, so the
/// [`Transport`] calls return as soon as the payload is encoded. Gateway
/// failures are logged, never reported back. [`GatewayTransport::flush`] waits
/// for the requests still in flight.
///
/// # Examples
///
/// ```no_run
/// use chime::services::{DeliveryError, GatewayTransport, PushNotification, Transport};
///
/// # fn example(push: PushNotification) -> Result<(), DeliveryError> {
/// let transport = GatewayTransport::new("http://localhost:8080");
/// transport.send_mobile_push(&push)?;
/// # Ok(())
/// # }
/// ```
pub struct GatewayTransport {
    /// Gateway base url, without trailing slash
    url: String,
    /// HTTP client
    client: Client,
    /// Requests dispatched and not reaped yet
    in_flight: Mutex<JoinSet<()>>,
}

impl GatewayTransport {
    /// Create a new [GatewayTransport].
    ///
    /// # Arguments
    ///
    /// * `url` - The base URL of the gateway. A trailing slash is ignored.
    pub fn new(url: &str) -> Self {
        GatewayTransport {
            url: url.trim_end_matches('/').to_string(),
            client: Client::new(),
            in_flight: Mutex::new(JoinSet::new()),
        }
    }

    /// Waits for every dispatched request to complete.
    ///
    /// Requests dispatched while flushing are awaited too.
    pub async fn flush(&self) {
        loop {
            let mut pending = std::mem::take(&mut *self.in_flight.lock());
            if pending.is_empty() {
                return;
            }

            info!("waiting for {} gateway requests", pending.len());
            while let Some(result) = pending.join_next().await {
                log_task_failure(result);
            }
        }
    }

    /// Posts an already encoded JSON body to `{url}/{endpoint}`.
    ///
    /// Non-2xx responses are returned as [`DeliveryError::Gateway`].
    pub async fn post(&self, endpoint: &str, body: Vec<u8>) -> Result<(), DeliveryError> {
        post(&self.client, &self.endpoint_url(endpoint), body).await
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", &self.url, endpoint)
    }

    /// Encodes `request` and posts it on a background task.
    fn dispatch<T: Serialize>(
        &self,
        endpoint: &'static str,
        request: &T,
    ) -> Result<(), DeliveryError> {
        let body = serde_json::to_vec(request)
            .map_err(|source| DeliveryError::Encode { endpoint, source })?;
        let handle = Handle::try_current().map_err(|_| DeliveryError::NoRuntime(endpoint))?;

        let client = self.client.clone();
        let url = self.endpoint_url(endpoint);
        debug!("dispatch {} bytes to {}", body.len(), &url);

        let mut in_flight = self.in_flight.lock();
        while let Some(result) = in_flight.try_join_next() {
            log_task_failure(result);
        }
        in_flight.spawn_on(
            async move {
                if let Err(e) = post(&client, &url, body).await {
                    warn!("gateway delivery to {} failed: {}", &url, e);
                }
            },
            &handle,
        );

        Ok(())
    }
}

fn log_task_failure(result: Result<(), JoinError>) {
    if let Err(e) = result {
        warn!("gateway request task failed: {}", e);
    }
}

async fn post(client: &Client, url: &str, body: Vec<u8>) -> Result<(), DeliveryError> {
    client
        .post(url)
        .header(CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await?
        .error_for_status()?;

    debug!("gateway accepted {}", url);
    Ok(())
}

impl Transport for GatewayTransport {
    fn send_audio_cue(
        &self,
        user_id: &str,
        message: &Message,
        room: &Room,
    ) -> Result<(), DeliveryError> {
        self.dispatch(
            "audio",
            &AudioRequest {
                user_id,
                message,
                room,
            },
        )
    }

    fn send_desktop_notification(
        &self,
        user_id: &str,
        sender: &Sender,
        message: &Message,
        room: &Room,
        duration: Option<u32>,
    ) -> Result<(), DeliveryError> {
        self.dispatch(
            "desktop",
            &DesktopRequest {
                user_id,
                sender,
                message,
                room,
                duration,
            },
        )
    }

    fn send_mobile_push(&self, push: &PushNotification) -> Result<(), DeliveryError> {
        self.dispatch("push", push)
    }

    fn send_email(&self, email: &EmailNotification) -> Result<(), DeliveryError> {
        self.dispatch("email", email)
    }

    fn notify_system_attention(
        &self,
        message: &Message,
        user_ids: &[String],
        summary: &str,
        kind: AttentionKind,
    ) -> Result<(), DeliveryError> {
        self.dispatch(
            "attention",
            &AttentionRequest {
                message,
                user_ids,
                summary,
                kind,
            },
        )
    }
}
