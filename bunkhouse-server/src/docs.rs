use axum::{response::IntoResponse, Json};
use utoipa::OpenApi;
use utoipauto::utoipauto;

#[utoipauto(paths = "./bunkhouse-server/src")]
#[derive(OpenApi)]
#[openapi(info(
    description = "bunkhouse-server exposes endpoints to administer hostel bookings"
))]
pub struct ApiDoc;

pub async fn docs() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
