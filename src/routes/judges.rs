use axum::{Json, Router, extract::State, routing::get};

use crate::{
    services::judge_service,
    state::{SharedState, judges::Judge},
};

/// List the full judge catalog for client-side rendering.
#[utoipa::path(
    get,
    path = "/judges",
    tag = "judges",
    responses((status = 200, description = "Judge catalog", body = [Judge]))
)]
pub async fn list_judges(State(state): State<SharedState>) -> Json<Vec<Judge>> {
    Json(judge_service::list_judges(&state))
}

/// Configure the judge routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/judges", get(list_judges))
}
