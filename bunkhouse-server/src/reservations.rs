use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, patch, post},
    Json,
};

use bunkhouse_core::{AdmissionRequest, GuestProfile, PrimaryKey, StayRange, UpdateReservation};

use crate::{
    context::ServerContext,
    errors::{ServerError, ServerResult},
    schemas::{
        NewReservationSchema, ReservationListQuery, UpdateReservationSchema, ValidatedJson,
    },
    serialized::{Acknowledgement, Reservation, ReservationOutcome, ToSerialized},
    Router,
};

#[utoipa::path(
    post,
    path = "/v1/reservations",
    tag = "reservations",
    request_body = NewReservationSchema,
    responses(
        (status = 200, body = ReservationOutcome),
        (status = 400, description = "Missing or malformed reservation data"),
        (status = 409, description = "No bed is available for the requested dates")
    )
)]
async fn create_reservation(
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewReservationSchema>,
) -> ServerResult<Json<ReservationOutcome>> {
    let stay = StayRange::new(body.check_in, body.check_out)
        .map_err(|e| ServerError::Validation(e.to_string()))?;

    let request = AdmissionRequest {
        stay,
        guest: GuestProfile {
            name: body.name,
            last_name: body.last_name,
            id_number: body.id_number,
            phone: body.phone,
            email: body.email,
            age: body.age,
            country: body.country,
        },
        notes: body.notes,
    };

    let view = context.bunkhouse.reservations.admit(request).await?;

    Ok(Json(ReservationOutcome {
        success: true,
        message: "Reservation created successfully".to_string(),
        reservation: Some(view.to_serialized()),
    }))
}

#[utoipa::path(
    get,
    path = "/v1/reservations",
    tag = "reservations",
    responses(
        (status = 200, body = Vec<Reservation>)
    )
)]
async fn list_reservations(
    State(context): State<ServerContext>,
    Query(query): Query<ReservationListQuery>,
) -> ServerResult<Json<Vec<Reservation>>> {
    let views = match (query.check_in, query.check_out) {
        (Some(check_in), Some(check_out)) => {
            let stay = StayRange::new(check_in, check_out)
                .map_err(|e| ServerError::Validation(e.to_string()))?;

            context.bunkhouse.reservations.list_overlapping(stay).await?
        }
        (None, None) => context.bunkhouse.reservations.list().await?,
        _ => {
            return Err(ServerError::Validation(
                "checkIn and checkOut must be provided together".to_string(),
            ))
        }
    };

    Ok(Json(views.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/reservations/{id}",
    tag = "reservations",
    responses(
        (status = 200, body = Reservation),
        (status = 404, description = "No reservation with this id")
    )
)]
async fn reservation(
    State(context): State<ServerContext>,
    Path(id): Path<PrimaryKey>,
) -> ServerResult<Json<Reservation>> {
    let view = context.bunkhouse.reservations.reservation_by_id(id).await?;

    Ok(Json(view.to_serialized()))
}

#[utoipa::path(
    patch,
    path = "/v1/reservations/{id}",
    tag = "reservations",
    request_body = UpdateReservationSchema,
    responses(
        (status = 200, body = Reservation),
        (status = 404, description = "No reservation with this id"),
        (status = 409, description = "The move collides with a confirmed stay")
    )
)]
async fn update_reservation(
    State(context): State<ServerContext>,
    Path(id): Path<PrimaryKey>,
    ValidatedJson(body): ValidatedJson<UpdateReservationSchema>,
) -> ServerResult<Json<Reservation>> {
    let stay = match (body.check_in, body.check_out) {
        (Some(check_in), Some(check_out)) => Some(
            StayRange::new(check_in, check_out)
                .map_err(|e| ServerError::Validation(e.to_string()))?,
        ),
        _ => None,
    };

    let update = UpdateReservation {
        bed_id: body.bed_id,
        stay,
        status: body.status.map(Into::into),
        notes: body.notes.clone(),
        guest: Some(body.guest_contact()),
    };

    let view = context.bunkhouse.reservations.update(id, update).await?;

    Ok(Json(view.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/v1/reservations/{id}",
    tag = "reservations",
    responses(
        (status = 200, body = Acknowledgement),
        (status = 404, description = "No reservation with this id")
    )
)]
async fn delete_reservation(
    State(context): State<ServerContext>,
    Path(id): Path<PrimaryKey>,
) -> ServerResult<Json<Acknowledgement>> {
    context.bunkhouse.reservations.remove(id).await?;

    Ok(Json(Acknowledgement {
        success: true,
        message: "Reservation deleted successfully".to_string(),
    }))
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_reservations))
        .route("/", post(create_reservation))
        .route("/:id", get(reservation))
        .route("/:id", patch(update_reservation))
        .route("/:id", delete(delete_reservation))
}
