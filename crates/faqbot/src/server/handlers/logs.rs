//! Logs endpoint handler

use axum::{
  extract::{Extension, Query, State},
  http::StatusCode,
  response::Json,
};

use crate::server::handlers::{error_response, ErrorResponse};
use crate::server::{
  middleware::RequestContext,
  state::AppState,
  types::{BaseResponse, LogsQuery, LogsResponse},
};

const DEFAULT_LIMIT: usize = 100;

/// GET /logs - Recent service log entries, oldest first
pub async fn get_logs(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
  Query(query): Query<LogsQuery>,
) -> Result<Json<BaseResponse<LogsResponse>>, ErrorResponse> {
  let limit = query.limit.unwrap_or(DEFAULT_LIMIT);

  match state.logs.recent(Some(limit), query.level.as_deref()).await {
    Ok(logs) => Ok(Json(BaseResponse::success(LogsResponse { logs }, context.request_id))),
    Err(e) => {
      context.log_error(&format!("Failed to read logs: {e}"), "logs-api").await;
      Err(error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "logs_read_failed",
        &format!("Failed to read logs: {e}"),
        context.request_id,
      ))
    }
  }
}
