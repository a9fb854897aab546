use axum::extract::State;
use axum::Json;
use std::collections::BTreeMap;

use crate::state::AppState;

/// GET /api/status: `{ <actuator id>: <status label> }`.
pub async fn get_status(State(app): State<AppState>) -> Json<BTreeMap<String, String>> {
    let labels = app
        .monitor
        .snapshot()
        .into_iter()
        .map(|s| (s.id, s.status.label))
        .collect();
    Json(labels)
}
