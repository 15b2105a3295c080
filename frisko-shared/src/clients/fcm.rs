use reqwest::Client;
use serde::Serialize;

/// FCM HTTP v1 client. Constructed once at startup and injected through
/// `AppState`; holds the service-account bearer token resolved out of band.
#[derive(Clone)]
pub struct FcmClient {
    client: Client,
    project_id: String,
    access_token: String,
}

#[derive(Debug, Serialize)]
struct FcmRequest {
    message: FcmMessage,
}

#[derive(Debug, Serialize)]
struct FcmMessage {
    token: String,
    notification: FcmNotification,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
    android: FcmAndroid,
}

#[derive(Debug, Serialize)]
struct FcmNotification {
    title: String,
    body: String,
}

#[derive(Debug, Serialize)]
struct FcmAndroid {
    priority: &'static str,
    notification: FcmAndroidNotification,
}

#[derive(Debug, Serialize)]
struct FcmAndroidNotification {
    sound: &'static str,
    channel_id: &'static str,
}

impl FcmClient {
    pub fn new(project_id: &str, access_token: &str) -> Self {
        Self {
            client: Client::new(),
            project_id: project_id.to_string(),
            access_token: access_token.to_string(),
        }
    }

    /// Send one push message to one device token.
    pub async fn send(
        &self,
        token: &str,
        title: &str,
        body: &str,
        data: Option<serde_json::Value>,
    ) -> Result<(), String> {
        let request = FcmRequest {
            message: FcmMessage {
                token: token.to_string(),
                notification: FcmNotification {
                    title: title.to_string(),
                    body: body.to_string(),
                },
                data,
                android: FcmAndroid {
                    priority: "high",
                    notification: FcmAndroidNotification {
                        sound: "default",
                        channel_id: "default",
                    },
                },
            },
        };

        let url = format!(
            "https://fcm.googleapis.com/v1/projects/{}/messages:send",
            self.project_id
        );

        let response = self.client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("push send failed: {e}"))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("FCM request failed: {body}"));
        }

        tracing::debug!(token_prefix = %token_prefix(token), title = %title, "push sent");
        Ok(())
    }
}

/// First 20 chars of a device token, for logs and per-recipient reports.
pub fn token_prefix(token: &str) -> String {
    let prefix: String = token.chars().take(20).collect();
    if token.chars().count() > 20 {
        format!("{prefix}...")
    } else {
        prefix
    }
}
