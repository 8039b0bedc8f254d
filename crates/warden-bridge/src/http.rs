//! reqwest-backed [`Bridge`] implementation.
//!
//! Every request carries a bounded timeout so one stalled call cannot hang a
//! batch. Nothing is retried: a failed call is reported and the caller moves on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};
use warden_core::{
    config::BridgeConfig,
    contact::GroupMember,
    error::WardenError,
    outcome::BridgeOutcome,
    traits::Bridge,
};

/// Message used when the bridge acknowledges a removal without saying more.
const REMOVED_MESSAGE: &str = "Successfully removed from group";
/// Message used when the bridge acknowledges a send without saying more.
const SENT_MESSAGE: &str = "Message sent";

/// Bridge client over HTTP.
pub struct HttpBridge {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpBridge {
    /// Create a client for `base_url` with a per-request `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, WardenError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WardenError::Config(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Create from config values.
    pub fn from_config(cfg: &BridgeConfig) -> Result<Self, WardenError> {
        Self::new(&cfg.base_url, cfg.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// POST a JSON body and fold the response into a [`BridgeOutcome`].
    async fn post_envelope<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        default_message: &str,
    ) -> BridgeOutcome {
        debug!("bridge: POST {url}");
        let resp = match self.client.post(url).json(body).send().await {
            Ok(r) => r,
            Err(e) => {
                return BridgeOutcome::Unreachable {
                    message: format!("Request failed: {e}"),
                }
            }
        };

        let status = resp.status().as_u16();
        let text = resp.text().await.unwrap_or_default();
        interpret_envelope(status, &text, default_message)
    }
}

// --- Serde types ---

#[derive(Serialize)]
struct RemoveParticipantsRequest<'a> {
    participants: Vec<&'a str>,
    action: &'a str,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    recipient: &'a str,
    message: &'a str,
}

/// `{"success": bool, "message": str}` envelope shared by the mutating endpoints.
#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct MembersResponse {
    #[serde(default)]
    members: Vec<MemberEntry>,
}

/// Members are plain JIDs or, on newer bridges, objects with admin flags.
#[derive(Deserialize)]
#[serde(untagged)]
enum MemberEntry {
    Jid(String),
    Detailed(GroupMember),
}

impl From<MemberEntry> for GroupMember {
    fn from(entry: MemberEntry) -> Self {
        match entry {
            MemberEntry::Jid(jid) => GroupMember::new(jid),
            MemberEntry::Detailed(member) => member,
        }
    }
}

/// Map a bridge response onto an outcome.
///
/// Non-200 keeps the body verbatim. A 200 is a success unless the payload
/// explicitly says `"success": false`.
fn interpret_envelope(status: u16, body: &str, default_message: &str) -> BridgeOutcome {
    if status != 200 {
        return BridgeOutcome::Rejected {
            status: Some(status),
            message: format!("HTTP {status}: {body}"),
        };
    }

    match serde_json::from_str::<Envelope>(body) {
        Ok(Envelope {
            success: Some(false),
            message,
        }) => BridgeOutcome::Rejected {
            status: Some(status),
            message: message.unwrap_or_else(|| "Bridge reported failure".to_string()),
        },
        Ok(Envelope { message, .. }) => BridgeOutcome::Success {
            message: message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| default_message.to_string()),
        },
        Err(_) => BridgeOutcome::Success {
            message: default_message.to_string(),
        },
    }
}

fn parse_members(body: &str) -> Result<Vec<GroupMember>, WardenError> {
    let parsed: MembersResponse = serde_json::from_str(body)?;
    Ok(parsed.members.into_iter().map(GroupMember::from).collect())
}

#[async_trait]
impl Bridge for HttpBridge {
    async fn remove_participant(&self, group_jid: &str, participant_jid: &str) -> BridgeOutcome {
        let url = self.url(&format!("/api/group/{group_jid}/participants/remove"));
        let body = RemoveParticipantsRequest {
            participants: vec![participant_jid],
            action: "remove",
        };

        let outcome = self.post_envelope(&url, &body, REMOVED_MESSAGE).await;
        match &outcome {
            BridgeOutcome::Success { .. } => {
                info!("bridge: removed {participant_jid} from {group_jid}")
            }
            other => error!(
                "bridge: failed to remove {participant_jid} from {group_jid}: {}",
                other.message()
            ),
        }
        outcome
    }

    async fn group_members(&self, group_jid: &str) -> Result<Vec<GroupMember>, WardenError> {
        let url = self.url(&format!("/api/group/{group_jid}/members"));
        debug!("bridge: GET {url}");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| WardenError::Bridge(format!("members request failed: {e}")))?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(WardenError::Bridge(format!(
                "members of {group_jid}: HTTP {}: {text}",
                status.as_u16()
            )));
        }

        let members = parse_members(&text)?;
        info!("bridge: {group_jid} has {} members", members.len());
        Ok(members)
    }

    async fn send_message(&self, recipient: &str, text: &str) -> BridgeOutcome {
        let url = self.url("/api/send");
        let body = SendMessageRequest {
            recipient,
            message: text,
        };
        self.post_envelope(&url, &body, SENT_MESSAGE).await
    }
}
