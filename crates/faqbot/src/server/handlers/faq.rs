//! FAQ chat endpoint handler

use axum::{
  extract::{rejection::JsonRejection, Extension, Json, State},
  response::Json as ResponseJson,
};

use crate::server::handlers::{pipeline_failure, rejected_body, ErrorResponse};
use crate::server::{
  middleware::RequestContext,
  state::AppState,
  types::{BaseResponse, FaqRequest, FaqResponse},
};

const COMPONENT: &str = "faq-api";

/// POST /api/faq/chat - Answer a question from the indexed FAQ
///
/// A failing chat model still answers 200 with the apology; embedding and
/// search failures are 500.
pub async fn chat(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
  payload: Result<Json<FaqRequest>, JsonRejection>,
) -> Result<ResponseJson<BaseResponse<FaqResponse>>, ErrorResponse> {
  let Json(request) = match payload {
    Ok(payload) => payload,
    Err(rejection) => return Err(rejected_body(&context, rejection, COMPONENT).await),
  };

  match state.qa.answer(&request.user_message).await {
    Ok(answer) => {
      context
        .log_success(
          &format!("Answered question ({:?}, {} sources)", answer.outcome, answer.source_ids.len()),
          COMPONENT,
        )
        .await;
      Ok(ResponseJson(BaseResponse::success(FaqResponse { response: answer.response }, context.request_id)))
    }
    Err(e) => {
      context.log_error(&format!("Failed to answer question: {e}"), COMPONENT).await;
      Err(pipeline_failure(&e, "faq_chat_failed", context.request_id))
    }
  }
}
