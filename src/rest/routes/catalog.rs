// rest/routes/catalog.rs — Studio form options.

use axum::Json;
use serde_json::{json, Value};

use crate::catalog;

pub async fn get_catalog() -> Json<Value> {
    Json(json!({
        "room_types": catalog::ROOM_TYPES,
        "themes": catalog::ROOM_THEMES,
        "colors": catalog::COLOR_PREFERENCES,
    }))
}
