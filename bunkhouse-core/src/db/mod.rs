use async_trait::async_trait;
use thiserror::Error;

use crate::StayRange;

mod data;
pub use data::*;

mod pg;
pub use pg::*;

#[cfg(test)]
pub(crate) mod memory;

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    /// An unknown or internal error happened with the database
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
    /// A resource already exists, or a write collided with a concurrent one
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        /// The resource in question
        resource: &'static str,
        /// The field that is conflicting
        field: &'static str,
        /// The conflicting value
        value: String,
    },
    /// A resource in the database doesn't exist
    #[error("{resource}:{identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
}

/// Helper trait to reduce boilerplate
pub trait IntoDatabaseError {
    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError;
    fn any(self) -> DatabaseError;
}

/// Represents a type that can fetch and store bunkhouse data
#[async_trait]
pub trait Database: Send + Sync {
    async fn list_rooms(&self) -> Result<Vec<RoomData>>;
    async fn room_by_id(&self, room_id: PrimaryKey) -> Result<RoomData>;
    async fn create_room(&self, new_room: NewRoom) -> Result<RoomData>;
    async fn update_room(&self, updated_room: UpdatedRoom) -> Result<RoomData>;
    async fn delete_room(&self, room_id: PrimaryKey) -> Result<()>;

    /// Every bed in the house, in stable listing order (room, then number).
    /// First-fit assignment depends on this order never changing.
    async fn list_beds(&self) -> Result<Vec<BedData>>;

    /// Finds the guest by identity number and rewrites their contact fields,
    /// or inserts a new guest. Atomic with respect to concurrent upserts of
    /// the same identity number.
    async fn upsert_guest(&self, profile: GuestProfile) -> Result<GuestData>;
    async fn update_guest(&self, updated_guest: UpdatedGuest) -> Result<GuestData>;

    async fn reservation_by_id(&self, reservation_id: PrimaryKey) -> Result<ReservationViewData>;
    /// Denormalized reservation views, newest first. With a range, only
    /// confirmed reservations overlapping it, ordered by check-in.
    async fn list_reservations(
        &self,
        overlapping: Option<StayRange>,
    ) -> Result<Vec<ReservationViewData>>;
    /// Confirmed reservation rows overlapping the given stay
    async fn confirmed_reservations(&self, overlapping: StayRange) -> Result<Vec<ReservationData>>;
    /// Inserts a confirmed reservation, guaranteeing no other confirmed
    /// reservation overlaps it on the same bed. A lost race surfaces as
    /// [DatabaseError::Conflict], never as a second overlapping row.
    async fn create_reservation_if_free(
        &self,
        new_reservation: NewReservation,
    ) -> Result<ReservationViewData>;
    /// Applies the given fields. The overlap guarantee of
    /// [Database::create_reservation_if_free] also holds for any update that
    /// leaves the reservation confirmed.
    async fn update_reservation(
        &self,
        updated_reservation: UpdatedReservation,
    ) -> Result<ReservationViewData>;
    async fn delete_reservation(&self, reservation_id: PrimaryKey) -> Result<()>;
}

#[derive(Debug)]
pub struct NewRoom {
    pub name: String,
    pub kind: RoomKind,
    pub capacity: i32,
}

#[derive(Debug)]
pub struct UpdatedRoom {
    pub id: PrimaryKey,
    pub name: Option<String>,
    pub kind: Option<RoomKind>,
    pub capacity: Option<i32>,
}

/// The full set of guest attributes used by the upsert
#[derive(Debug, Clone)]
pub struct GuestProfile {
    pub name: String,
    pub last_name: String,
    pub id_number: String,
    pub phone: String,
    pub email: String,
    pub age: Option<i32>,
    pub country: String,
}

/// A partial rewrite of a guest's contact fields
#[derive(Debug, Clone, Default)]
pub struct GuestContact {
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub id_number: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub age: Option<i32>,
    pub country: Option<String>,
}

impl GuestContact {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.last_name.is_none()
            && self.id_number.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.age.is_none()
            && self.country.is_none()
    }
}

#[derive(Debug)]
pub struct UpdatedGuest {
    pub id: PrimaryKey,
    pub contact: GuestContact,
}

#[derive(Debug, Clone)]
pub struct NewReservation {
    pub bed_id: PrimaryKey,
    pub guest_id: PrimaryKey,
    pub stay: StayRange,
    pub notes: Option<String>,
}

#[derive(Debug)]
pub struct UpdatedReservation {
    pub id: PrimaryKey,
    pub bed_id: Option<PrimaryKey>,
    pub stay: Option<StayRange>,
    pub status: Option<ReservationStatus>,
    pub notes: Option<String>,
}
