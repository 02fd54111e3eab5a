use axum::{
    extract::{Query, State},
    routing::get,
    Json,
};
use chrono::Utc;

use bunkhouse_core::{StatsFilter, StayRange};

use crate::{
    context::ServerContext,
    errors::{ServerError, ServerResult},
    schemas::{AvailabilityQuery, StatsQuery},
    serialized::{AvailabilityReport, Statistics, ToSerialized},
    Router,
};

#[utoipa::path(
    get,
    path = "/v1/availability",
    tag = "availability",
    responses(
        (status = 200, body = AvailabilityReport),
        (status = 400, description = "Missing or malformed date range")
    )
)]
async fn search_availability(
    State(context): State<ServerContext>,
    Query(query): Query<AvailabilityQuery>,
) -> ServerResult<Json<AvailabilityReport>> {
    let stay = StayRange::new(query.check_in, query.check_out)
        .map_err(|e| ServerError::Validation(e.to_string()))?;

    let rooms = context
        .bunkhouse
        .reservations
        .availability(stay, query.kind.map(Into::into))
        .await?;

    Ok(Json(AvailabilityReport::from_rooms(stay, rooms)))
}

#[utoipa::path(
    get,
    path = "/v1/stats",
    tag = "availability",
    responses(
        (status = 200, body = Statistics)
    )
)]
async fn statistics(
    State(context): State<ServerContext>,
    Query(query): Query<StatsQuery>,
) -> ServerResult<Json<Statistics>> {
    let today = Utc::now().date_naive();
    let filter = StatsFilter {
        kind: query.kind.map(Into::into),
        room_id: query.room_id,
    };

    let stats = context.bunkhouse.inventory.statistics(today, filter).await?;

    Ok(Json(stats.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/availability", get(search_availability))
        .route("/stats", get(statistics))
}
