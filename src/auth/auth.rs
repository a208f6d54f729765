use axum::{http::StatusCode, Json};
use tracing::{error, warn};

use crate::db::dbtables;
use crate::models::{ErrorResponse, TableId};
use crate::services::auth_service::AuthUser;

/// Ensure the caller may open a table.
///
/// Access is only enforced when both an authenticated user id and the table
/// service's database are available.
pub async fn ensure_table_access(
    user: Option<&AuthUser>,
    table_id: TableId,
) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    let (Some(user), Some(db)) = (user, dbtables::get_db()) else {
        return Ok(());
    };
    let Some(uid) = user.uid else {
        return Ok(());
    };

    match db.user_has_access(table_id, uid).await {
        Ok(true) => Ok(()),
        Ok(false) => {
            warn!("User {} has no access to table {}", user.username, table_id);
            Err(error_response(StatusCode::FORBIDDEN, format!("Access to table {} denied", table_id)))
        }
        Err(e) => {
            error!("Failed to check access to table {}: {}", table_id, e);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to check access to table {}", table_id),
            ))
        }
    }
}

pub fn error_response(status: StatusCode, error: String) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            code: status.as_u16(),
            status: status.to_string(),
            error,
        }),
    )
}
