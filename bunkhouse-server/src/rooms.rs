use axum::{
    extract::{Path, State},
    routing::{delete, get, patch, post},
    Json,
};

use bunkhouse_core::{NewRoom, PrimaryKey, UpdatedRoom};

use crate::{
    context::ServerContext,
    errors::ServerResult,
    schemas::{NewRoomSchema, UpdateRoomSchema, ValidatedJson},
    serialized::{Acknowledgement, Room, ToSerialized},
    Router,
};

#[utoipa::path(
    get,
    path = "/v1/rooms",
    tag = "rooms",
    responses(
        (status = 200, body = Vec<Room>)
    )
)]
async fn list_rooms(State(context): State<ServerContext>) -> ServerResult<Json<Vec<Room>>> {
    let rooms = context.bunkhouse.inventory.rooms_with_beds().await?;

    Ok(Json(rooms.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/rooms/{id}",
    tag = "rooms",
    responses(
        (status = 200, body = Room),
        (status = 404, description = "No room with this id")
    )
)]
async fn room(
    State(context): State<ServerContext>,
    Path(id): Path<PrimaryKey>,
) -> ServerResult<Json<Room>> {
    let room = context.bunkhouse.inventory.room_by_id(id).await?;

    Ok(Json(room.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/rooms",
    tag = "rooms",
    request_body = NewRoomSchema,
    responses(
        (status = 200, body = Room)
    )
)]
async fn create_room(
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewRoomSchema>,
) -> ServerResult<Json<Room>> {
    let room = context
        .bunkhouse
        .inventory
        .create_room(NewRoom {
            name: body.name,
            kind: body.kind.into(),
            capacity: body.capacity,
        })
        .await?;

    Ok(Json(room.to_serialized()))
}

#[utoipa::path(
    patch,
    path = "/v1/rooms/{id}",
    tag = "rooms",
    request_body = UpdateRoomSchema,
    responses(
        (status = 200, body = Room),
        (status = 404, description = "No room with this id")
    )
)]
async fn update_room(
    State(context): State<ServerContext>,
    Path(id): Path<PrimaryKey>,
    ValidatedJson(body): ValidatedJson<UpdateRoomSchema>,
) -> ServerResult<Json<Room>> {
    let room = context
        .bunkhouse
        .inventory
        .update_room(UpdatedRoom {
            id,
            name: body.name,
            kind: body.kind.map(Into::into),
            capacity: body.capacity,
        })
        .await?;

    Ok(Json(room.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/v1/rooms/{id}",
    tag = "rooms",
    responses(
        (status = 200, body = Acknowledgement),
        (status = 404, description = "No room with this id")
    )
)]
async fn delete_room(
    State(context): State<ServerContext>,
    Path(id): Path<PrimaryKey>,
) -> ServerResult<Json<Acknowledgement>> {
    context.bunkhouse.inventory.delete_room(id).await?;

    Ok(Json(Acknowledgement {
        success: true,
        message: "Room deleted successfully".to_string(),
    }))
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_rooms))
        .route("/", post(create_room))
        .route("/:id", get(room))
        .route("/:id", patch(update_room))
        .route("/:id", delete(delete_room))
}
