//! Inbound webhook integrations. Each integration owns a shared secret used
//! to sign request bodies (HMAC-SHA256, hex encoded).

use crate::error::{AppError, AppResult};
use crate::models::{Integration, NewIntegration, TriggerType};
use crate::repository::Repositories;
use crate::services::access::{require_manager, require_member};
use crate::services::events::{DomainEvent, EventDispatcher};
use crate::services::projects::required_name;
use actix_web::http::header::HeaderMap;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sha2::Sha256;
use std::sync::Arc;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_HEADERS: [&str; 2] = ["x-hub-signature-256", "x-signature"];
const EVENT_HEADERS: [&str; 2] = ["x-github-event", "x-event-type"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntegrationInput {
    pub provider: String,
    pub name: String,
    /// Generated when absent.
    #[serde(default)]
    pub secret: Option<String>,
}

/// Returned once on creation; listings never expose the secret.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedIntegration {
    #[serde(flatten)]
    pub integration: Integration,
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebhookReceipt {
    pub integration_id: i32,
    pub event: Option<String>,
    pub automations_triggered: usize,
}

/// Check `signature` (`sha256=<hex>` or bare hex) against the HMAC of `body`.
/// The digest comparison is constant time.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let signature = signature.trim();
    let hex_digest = signature.strip_prefix("sha256=").unwrap_or(signature);
    let Ok(expected) = hex::decode(hex_digest) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

fn first_header<'a>(headers: &'a HeaderMap, names: &[&str]) -> Option<&'a str> {
    names
        .iter()
        .filter_map(|name| headers.get(*name))
        .find_map(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Event name from the provider header, else the body's `event` or `action`.
fn event_name(headers: &HeaderMap, data: &JsonValue) -> Option<String> {
    first_header(headers, &EVENT_HEADERS)
        .map(str::to_string)
        .or_else(|| {
            ["event", "action"]
                .iter()
                .find_map(|key| data.get(*key).and_then(JsonValue::as_str))
                .map(str::to_string)
        })
}

pub struct IntegrationService {
    repos: Repositories,
    events: Arc<EventDispatcher>,
}

impl IntegrationService {
    pub fn new(repos: Repositories, events: Arc<EventDispatcher>) -> Self {
        Self { repos, events }
    }

    fn find(&self, integration_id: i32) -> AppResult<Integration> {
        self.repos
            .integrations
            .find_integration(integration_id)?
            .ok_or_else(|| AppError::not_found("Integration"))
    }

    pub fn create(
        &self,
        user_id: i32,
        project_id: i32,
        input: CreateIntegrationInput,
    ) -> AppResult<CreatedIntegration> {
        require_manager(&self.repos, project_id, user_id)?;
        let provider = required_name(&input.provider, "Provider")?.to_lowercase();
        let name = required_name(&input.name, "Integration name")?;
        let secret = match input.secret.map(|s| s.trim().to_string()) {
            Some(secret) if secret.len() < 16 => {
                return Err(AppError::validation(
                    "Webhook secret must be at least 16 characters",
                ));
            }
            Some(secret) => secret,
            None => Uuid::new_v4().simple().to_string(),
        };

        let integration = self.repos.integrations.insert_integration(NewIntegration {
            project_id,
            provider,
            name,
            secret: secret.clone(),
            created_by: user_id,
        })?;
        log::info!(
            "Integration {} ({}) added to project {}",
            integration.id,
            integration.provider,
            project_id
        );
        Ok(CreatedIntegration {
            integration,
            secret,
        })
    }

    pub fn list(&self, user_id: i32, project_id: i32) -> AppResult<Vec<Integration>> {
        require_member(&self.repos, project_id, user_id)?;
        Ok(self.repos.integrations.list_integrations(project_id)?)
    }

    pub fn delete(&self, user_id: i32, integration_id: i32) -> AppResult<()> {
        let integration = self.find(integration_id)?;
        require_manager(&self.repos, integration.project_id, user_id)?;
        Ok(self.repos.integrations.delete_integration(integration_id)?)
    }

    /// Authenticate an inbound delivery and raise WEBHOOK_RECEIVED for it.
    pub fn handle_webhook(
        &self,
        integration_id: i32,
        headers: &HeaderMap,
        body: &[u8],
    ) -> AppResult<WebhookReceipt> {
        let integration = match self.find(integration_id)? {
            integration if integration.is_active => integration,
            _ => return Err(AppError::not_found("Integration")),
        };

        let verified = first_header(headers, &SIGNATURE_HEADERS)
            .is_some_and(|sig| verify_signature(&integration.secret, body, sig));
        if !verified {
            log::warn!("Rejected webhook for integration {}: bad signature", integration.id);
            return Err(AppError::Unauthorized(
                "Missing or invalid webhook signature".to_string(),
            ));
        }

        let data = if body.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_slice(body)
                .unwrap_or_else(|_| JsonValue::String(String::from_utf8_lossy(body).into_owned()))
        };
        let event = event_name(headers, &data);

        let mut domain_event =
            DomainEvent::new(TriggerType::WebhookReceived, Some(integration.project_id), None);
        domain_event.payload.provider = Some(integration.provider.clone());
        domain_event.payload.event = event.clone();
        domain_event.payload.data = Some(data);
        let results = self.events.publish(domain_event);

        log::info!(
            "Webhook {} for integration {} triggered {} automation(s)",
            event.as_deref().unwrap_or("(unnamed)"),
            integration.id,
            results.len()
        );
        Ok(WebhookReceipt {
            integration_id: integration.id,
            event,
            automations_triggered: results.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::models::{ActionType, LogStatus, NewAutomation, NewUser};
    use crate::services::projects::CreateProjectInput;
    use crate::state::AppState;
    use actix_web::http::header::{HeaderName, HeaderValue};
    use serde_json::json;

    const SECRET: &str = "0123456789abcdef-secret";

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    fn headers(pairs: &[(&'static str, String)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                HeaderName::from_static(name),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    struct Fixture {
        state: AppState,
        user_id: i32,
        project_id: i32,
        integration: Integration,
    }

    fn setup() -> Fixture {
        let (state, _) = AppState::in_memory(AppConfig::default());
        let user_id = state
            .repos
            .users
            .insert_user(NewUser {
                email: "hooks@example.com".to_string(),
                name: "Hooks".to_string(),
                password_hash: "x".to_string(),
            })
            .unwrap()
            .id;
        let project_id = state
            .projects
            .create(
                user_id,
                CreateProjectInput {
                    name: "CI".to_string(),
                    description: None,
                    color: None,
                },
            )
            .unwrap()
            .id;
        let created = state
            .integrations
            .create(
                user_id,
                project_id,
                CreateIntegrationInput {
                    provider: " GitHub ".to_string(),
                    name: "Repo hooks".to_string(),
                    secret: Some(SECRET.to_string()),
                },
            )
            .unwrap();
        Fixture {
            state,
            user_id,
            project_id,
            integration: created.integration,
        }
    }

    #[test]
    fn test_verify_signature_accepts_both_formats() {
        let body = br#"{"action":"opened"}"#;
        let digest = sign(SECRET, body);

        assert!(verify_signature(SECRET, body, &digest));
        assert!(verify_signature(SECRET, body, &format!("sha256={}", digest)));
        assert!(!verify_signature("another-secret-value", body, &digest));
        assert!(!verify_signature(SECRET, b"tampered", &digest));
        assert!(!verify_signature(SECRET, body, "sha256=not-hex"));
    }

    #[test]
    fn test_generated_secret_is_returned_once() {
        let fixture = setup();
        let created = fixture
            .state
            .integrations
            .create(
                fixture.user_id,
                fixture.project_id,
                CreateIntegrationInput {
                    provider: "jira".to_string(),
                    name: "Tickets".to_string(),
                    secret: None,
                },
            )
            .unwrap();

        assert_eq!(created.secret.len(), 32);
        let json = serde_json::to_value(&created.integration).unwrap();
        assert!(json.get("secret").is_none());
        assert_eq!(
            fixture
                .state
                .integrations
                .list(fixture.user_id, fixture.project_id)
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn test_short_secret_rejected() {
        let fixture = setup();
        let result = fixture.state.integrations.create(
            fixture.user_id,
            fixture.project_id,
            CreateIntegrationInput {
                provider: "jira".to_string(),
                name: "Tickets".to_string(),
                secret: Some("short".to_string()),
            },
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_unsigned_webhook_is_unauthorized() {
        let fixture = setup();
        let result = fixture.state.integrations.handle_webhook(
            fixture.integration.id,
            &HeaderMap::new(),
            b"{}",
        );
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_unknown_integration_is_not_found() {
        let fixture = setup();
        let result = fixture
            .state
            .integrations
            .handle_webhook(9_999, &HeaderMap::new(), b"{}");
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_signed_webhook_triggers_matching_automation() {
        let fixture = setup();
        let automation = fixture
            .state
            .repos
            .automations
            .insert_automation(NewAutomation {
                name: "Ping on push".to_string(),
                description: None,
                trigger_type: TriggerType::WebhookReceived,
                trigger_conditions: Some(json!({"provider": "github", "event": "push"})),
                action_type: ActionType::SendNotification,
                action_parameters: json!({"title": "Push", "message": "New push", "userId": fixture.user_id}),
                is_active: true,
                project_id: Some(fixture.project_id),
                created_by: fixture.user_id,
            })
            .unwrap();
        let body = br#"{"ref":"refs/heads/main"}"#;

        let receipt = fixture
            .state
            .integrations
            .handle_webhook(
                fixture.integration.id,
                &headers(&[
                    ("x-hub-signature-256", format!("sha256={}", sign(SECRET, body))),
                    ("x-github-event", "push".to_string()),
                ]),
                body,
            )
            .unwrap();

        assert_eq!(receipt.event.as_deref(), Some("push"));
        assert_eq!(receipt.automations_triggered, 1);
        let logs = fixture
            .state
            .repos
            .automations
            .list_automation_logs(automation.id, 0, 10)
            .unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, LogStatus::Success);
        assert_eq!(fixture.state.notifications.unread_count(fixture.user_id).unwrap(), 1);
    }

    #[test]
    fn test_event_name_falls_back_to_body() {
        let fixture = setup();
        let body = br#"{"action":"closed"}"#;

        let receipt = fixture
            .state
            .integrations
            .handle_webhook(
                fixture.integration.id,
                &headers(&[("x-signature", sign(SECRET, body))]),
                body,
            )
            .unwrap();

        assert_eq!(receipt.event.as_deref(), Some("closed"));
        assert_eq!(receipt.automations_triggered, 0);
    }
}
