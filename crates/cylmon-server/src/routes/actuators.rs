use axum::extract::{Path, State};
use axum::Json;
use cylmon_core::ActuatorSnapshot;

use crate::chart;
use crate::error::AppError;
use crate::state::AppState;

fn actuator_json(s: &ActuatorSnapshot) -> serde_json::Value {
    serde_json::json!({
        "id": s.id,
        "name": s.name,
        "status": s.status.label,
        "position": s.position,
        "history": chart::series(&s.window),
    })
}

/// GET /api/actuators: every actuator with its status and chart series.
pub async fn list_actuators(State(app): State<AppState>) -> Json<serde_json::Value> {
    let list: Vec<serde_json::Value> = app.monitor.snapshot().iter().map(actuator_json).collect();
    Json(serde_json::json!(list))
}

/// GET /api/actuators/{id}
pub async fn get_actuator(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let snapshot = app.monitor.actuator(&id)?;
    Ok(Json(actuator_json(&snapshot)))
}

/// GET /api/actuators/{id}/history: chart series only.
pub async fn get_history(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<chart::ChartPoint>>, AppError> {
    let window = app.monitor.window(&id)?;
    Ok(Json(chart::series(&window)))
}
