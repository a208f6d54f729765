use crate::{
    auth::auth,
    models::{ErrorResponse, TableId, TableSnapshotResponse},
    services::auth_service::AuthUser,
    AppState,
};
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::debug;

/// Current contents of a loaded table. Tables nobody has opened are not loaded.
pub async fn table_snapshot(
    State(app_state): State<Arc<AppState>>,
    user: Option<Extension<AuthUser>>,
    Path(table_id): Path<TableId>,
) -> Result<(StatusCode, Json<TableSnapshotResponse>), (StatusCode, Json<ErrorResponse>)> {
    auth::ensure_table_access(user.as_ref().map(|Extension(u)| u), table_id).await?;

    let Some(room) = app_state.registry.get(table_id).await else {
        debug!("Snapshot requested for table {} which is not loaded", table_id);
        return Err(auth::error_response(
            StatusCode::NOT_FOUND,
            format!("Table {} is not loaded", table_id),
        ));
    };

    Ok((StatusCode::OK, Json(room.snapshot().await)))
}
