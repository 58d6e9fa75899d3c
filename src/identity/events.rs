//! Typed identity-provider webhook payloads.
//!
//! The wire shape is `{"type": "...", "data": {...}}` where the `data` shape
//! depends on the event type — modeled as an adjacently tagged enum with one
//! variant per consumed type. Anything else decodes to [`WebhookEvent::Ignored`]
//! and is accepted as a no-op.

use serde::Deserialize;

const STRATEGY_OAUTH_GOOGLE: &str = "from_oauth_google";
const STRATEGY_EMAIL_LINK: &str = "email_link";

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WebhookEvent {
    #[serde(rename = "user.created")]
    UserCreated(UserEventData),
    #[serde(rename = "user.updated")]
    UserUpdated(UserEventData),
    #[serde(rename = "session.created")]
    SessionCreated(SessionEventData),
    #[serde(rename = "user.deleted")]
    UserDeleted(DeletedEventData),
    /// Event types this service does not consume.
    #[serde(other)]
    Ignored,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserEventData {
    /// The external identity id — correlation key into `user_profiles`.
    pub id: String,
    #[serde(default)]
    pub email_addresses: Vec<EmailAddress>,
    pub primary_email_address_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// The account's own image; used when the sign-up strategy is a magic link.
    pub image_url: Option<String>,
    #[serde(default)]
    pub external_accounts: Vec<ExternalAccount>,
    /// Epoch milliseconds.
    pub created_at: Option<i64>,
    /// Epoch milliseconds; absent on profile edits that are not sign-ins.
    pub last_sign_in_at: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailAddress {
    pub id: String,
    pub email_address: String,
    pub verification: Option<Verification>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Verification {
    pub strategy: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExternalAccount {
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionEventData {
    pub user_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeletedEventData {
    pub id: String,
}

impl UserEventData {
    /// The email entry the account designates as primary.
    pub fn primary_email(&self) -> Option<&EmailAddress> {
        let primary_id = self.primary_email_address_id.as_deref()?;
        self.email_addresses.iter().find(|e| e.id == primary_id)
    }

    fn primary_strategy(&self) -> Option<&str> {
        self.primary_email()?
            .verification
            .as_ref()?
            .strategy
            .as_deref()
    }

    /// "google" | "email" | None, derived from the primary email's
    /// verification strategy.
    pub fn provider_type(&self) -> Option<&'static str> {
        match self.primary_strategy() {
            Some(STRATEGY_OAUTH_GOOGLE) => Some("google"),
            Some(STRATEGY_EMAIL_LINK) => Some("email"),
            _ => None,
        }
    }

    /// Google accounts carry the avatar on the OAuth external account;
    /// magic-link accounts carry it on the event itself.
    pub fn avatar_url(&self) -> Option<String> {
        match self.primary_strategy() {
            Some(STRATEGY_OAUTH_GOOGLE) => self
                .external_accounts
                .first()
                .and_then(|a| a.avatar_url.clone()),
            Some(STRATEGY_EMAIL_LINK) => self.image_url.clone(),
            _ => None,
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
