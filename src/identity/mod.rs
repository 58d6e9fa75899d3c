//! Identity-provider sync.
//!
//! Verified webhook events mutate the local `user_profiles` table: profile
//! events upsert, sign-ins touch `last_sign_in_at`, deletions remove the row.
//! Exactly one store mutation per event, no retries — idempotency rests on
//! the `clerk_user_id` uniqueness.

pub mod events;
pub mod verify;

use anyhow::Result;
use tracing::{debug, info};

use crate::storage::{ProfileUpsert, Storage};
use events::{UserEventData, WebhookEvent};

/// Apply one verified event to the store.
pub async fn apply_event(storage: &Storage, event: WebhookEvent) -> Result<()> {
    match event {
        WebhookEvent::UserCreated(data) => {
            let upsert = profile_upsert(&data, true);
            storage.upsert_profile(&upsert).await?;
            info!(clerk_user_id = %data.id, "user profile created");
        }
        WebhookEvent::UserUpdated(data) => {
            let upsert = profile_upsert(&data, false);
            storage.upsert_profile(&upsert).await?;
            info!(clerk_user_id = %data.id, "user profile updated");
        }
        WebhookEvent::SessionCreated(data) => {
            let matched = storage.touch_last_sign_in(&data.user_id).await?;
            if matched {
                info!(clerk_user_id = %data.user_id, "last sign-in recorded");
            } else {
                // The provider can deliver session.created before the
                // profile has synced; not an error.
                debug!(clerk_user_id = %data.user_id, "sign-in for unknown profile ignored");
            }
        }
        WebhookEvent::UserDeleted(data) => {
            storage.delete_profile(&data.id).await?;
            info!(clerk_user_id = %data.id, "user profile deleted");
        }
        WebhookEvent::Ignored => {
            debug!("unhandled event type accepted as no-op");
        }
    }
    Ok(())
}

/// Map an identity event onto the profile field set.
///
/// `is_creation` controls whether the event's `created_at` seeds the row;
/// update events never rewrite it.
fn profile_upsert(data: &UserEventData, is_creation: bool) -> ProfileUpsert {
    ProfileUpsert {
        clerk_user_id: data.id.clone(),
        email: data
            .primary_email()
            .map(|e| e.email_address.clone())
            .unwrap_or_default(),
        first_name: data.first_name.clone().filter(|s| !s.is_empty()),
        last_name: data.last_name.clone().filter(|s| !s.is_empty()),
        avatar_url: data.avatar_url(),
        provider_type: data.provider_type().map(str::to_string),
        created_at: if is_creation {
            data.created_at.and_then(millis_to_rfc3339)
        } else {
            None
        },
        last_sign_in_at: data.last_sign_in_at.and_then(millis_to_rfc3339),
    }
}

fn millis_to_rfc3339(ms: i64) -> Option<String> {
    chrono::DateTime::from_timestamp_millis(ms).map(|dt| dt.to_rfc3339())
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use super::events::{EmailAddress, Verification};

    fn sample_data() -> UserEventData {
        UserEventData {
            id: "user_abc".to_string(),
            email_addresses: vec![EmailAddress {
                id: "em_1".to_string(),
                email_address: "ada@example.com".to_string(),
                verification: Some(Verification {
                    strategy: Some("email_link".to_string()),
                }),
            }],
            primary_email_address_id: Some("em_1".to_string()),
            first_name: Some("Ada".to_string()),
            last_name: Some(String::new()),
            image_url: Some("https://img.example.com/a.png".to_string()),
            external_accounts: vec![],
            created_at: Some(1_700_000_000_000),
            last_sign_in_at: None,
        }
    }

    #[test]
    fn creation_event_seeds_created_at() {
        let upsert = profile_upsert(&sample_data(), true);
        assert_eq!(
            upsert.created_at.as_deref(),
            Some("2023-11-14T22:13:20+00:00")
        );
        assert_eq!(upsert.provider_type.as_deref(), Some("email"));
        // Empty last_name collapses to NULL.
        assert_eq!(upsert.last_name, None);
        assert_eq!(upsert.first_name.as_deref(), Some("Ada"));
    }

    #[test]
    fn update_event_never_carries_created_at() {
        let upsert = profile_upsert(&sample_data(), false);
        assert_eq!(upsert.created_at, None);
    }

    #[test]
    fn missing_primary_email_becomes_empty_string() {
        let mut data = sample_data();
        data.primary_email_address_id = Some("em_other".to_string());
        let upsert = profile_upsert(&data, true);
        assert_eq!(upsert.email, "");
        assert_eq!(upsert.provider_type, None);
    }
}
