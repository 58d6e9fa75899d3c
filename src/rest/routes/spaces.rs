// rest/routes/spaces.rs — Sidebar spaces listing.
//
// One policy: `userId` (the external identity id) is required; an identity
// with no synced profile answers an empty list; store failures surface as
// 500 and fan out one error report.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;

use crate::error::ApiError;
use crate::reporter::ErrorReport;
use crate::AppContext;

const ENDPOINT: &str = "/api/v1/spaces";

#[derive(Deserialize)]
pub struct SpacesQuery {
    /// External identity id of the signed-in user.
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

pub async fn list_spaces(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<SpacesQuery>,
) -> Result<Json<Value>, ApiError> {
    let clerk_user_id = query
        .user_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation("missing userId query parameter"))?;

    let profile_id = ctx
        .storage
        .profile_id_for_identity(&clerk_user_id)
        .await
        .map_err(|e| store_failure(&ctx, &clerk_user_id, e))?;

    // Identity not yet synced locally — nothing to list.
    let Some(profile_id) = profile_id else {
        return Ok(Json(json!({ "spaces": [] })));
    };

    let spaces = ctx
        .storage
        .list_spaces(&profile_id)
        .await
        .map_err(|e| store_failure(&ctx, &clerk_user_id, e))?;

    Ok(Json(json!({ "spaces": spaces })))
}

/// Log, report, and convert a store failure.
fn store_failure(ctx: &AppContext, clerk_user_id: &str, err: anyhow::Error) -> ApiError {
    error!(clerk_user_id, "spaces query failed: {err:#}");
    ctx.reporter.report(
        ErrorReport::new("SpacesQueryFailed", ENDPOINT, format!("{err:#}"))
            .with_input_body(json!({ "userId": clerk_user_id }).to_string()),
    );
    ApiError::store(err)
}
