use std::collections::HashSet;

use log::warn;
use thiserror::Error;

use crate::{
    classify_rooms, first_free_bed, BunkhouseContext, Database, DatabaseError, GuestContact,
    GuestProfile, NewReservation, PrimaryKey, ReservationStatus, ReservationViewData,
    RoomAvailability, RoomKind, StayRange, UpdatedGuest, UpdatedReservation,
};

/// Admission and lifecycle of reservations
pub struct ReservationManager<Db> {
    context: BunkhouseContext<Db>,
}

#[derive(Debug, Error)]
pub enum AdmissionError {
    /// Every bed is taken for the requested stay
    #[error("No beds are available for the requested dates")]
    NoBedAvailable,
    /// Concurrent admissions kept taking the resolved bed first
    #[error("The bed is no longer available, please retry")]
    Contention,
    /// Something else went wrong with the database
    #[error(transparent)]
    Db(DatabaseError),
}

/// Everything needed to admit a new reservation
#[derive(Debug, Clone)]
pub struct AdmissionRequest {
    pub stay: StayRange,
    pub guest: GuestProfile,
    pub notes: Option<String>,
}

/// Fields that can change on an existing reservation in one logical operation
#[derive(Debug, Default)]
pub struct UpdateReservation {
    pub bed_id: Option<PrimaryKey>,
    pub stay: Option<StayRange>,
    pub status: Option<ReservationStatus>,
    pub notes: Option<String>,
    /// Contact fields written through to the referenced guest row
    pub guest: Option<GuestContact>,
}

impl<Db> ReservationManager<Db>
where
    Db: Database,
{
    /// How many times admission re-resolves after losing a bed to a
    /// concurrent write before giving up
    const ADMISSION_ATTEMPTS: usize = 3;

    pub fn new(context: &BunkhouseContext<Db>) -> Self {
        Self {
            context: context.clone(),
        }
    }

    /// Admits a new reservation: resolves the first free bed for the stay,
    /// upserts the guest by identity number, and writes the confirmed
    /// reservation. The database rejects the write if another admission took
    /// the bed in the meantime, in which case resolution starts over.
    pub async fn admit(
        &self,
        request: AdmissionRequest,
    ) -> Result<ReservationViewData, AdmissionError> {
        let db = &self.context.database;

        for attempt in 1..=Self::ADMISSION_ATTEMPTS {
            let beds = db.list_beds().await.map_err(AdmissionError::Db)?;
            let occupied: HashSet<_> = db
                .confirmed_reservations(request.stay)
                .await
                .map_err(AdmissionError::Db)?
                .into_iter()
                .map(|reservation| reservation.bed_id)
                .collect();

            let Some(bed) = first_free_bed(&beds, &occupied) else {
                return Err(AdmissionError::NoBedAvailable);
            };

            let guest = db
                .upsert_guest(request.guest.clone())
                .await
                .map_err(AdmissionError::Db)?;

            let new_reservation = NewReservation {
                bed_id: bed.id,
                guest_id: guest.id,
                stay: request.stay,
                notes: request.notes.clone(),
            };

            match db.create_reservation_if_free(new_reservation).await {
                Ok(view) => return Ok(view),
                Err(DatabaseError::Conflict { .. }) => {
                    warn!(
                        "bed {} was taken mid-admission, resolving again (attempt {attempt})",
                        bed.id
                    );
                }
                Err(e) => return Err(AdmissionError::Db(e)),
            }
        }

        Err(AdmissionError::Contention)
    }

    /// Classifies every bed as available or occupied for the stay, optionally
    /// restricted to one accommodation kind
    pub async fn availability(
        &self,
        stay: StayRange,
        kind: Option<RoomKind>,
    ) -> Result<Vec<RoomAvailability>, DatabaseError> {
        let mut rooms = self.context.database.list_rooms().await?;

        if let Some(kind) = kind {
            rooms.retain(|room| room.kind == kind);
        }

        let confirmed = self.context.database.list_reservations(Some(stay)).await?;

        Ok(classify_rooms(rooms, &confirmed, stay))
    }

    pub async fn list(&self) -> Result<Vec<ReservationViewData>, DatabaseError> {
        self.context.database.list_reservations(None).await
    }

    /// Confirmed reservations overlapping the stay
    pub async fn list_overlapping(
        &self,
        stay: StayRange,
    ) -> Result<Vec<ReservationViewData>, DatabaseError> {
        self.context.database.list_reservations(Some(stay)).await
    }

    pub async fn reservation_by_id(
        &self,
        reservation_id: PrimaryKey,
    ) -> Result<ReservationViewData, DatabaseError> {
        self.context.database.reservation_by_id(reservation_id).await
    }

    /// Applies an update, writing guest contact changes through to the guest
    /// row the reservation references
    pub async fn update(
        &self,
        reservation_id: PrimaryKey,
        update: UpdateReservation,
    ) -> Result<ReservationViewData, DatabaseError> {
        let current = self
            .context
            .database
            .reservation_by_id(reservation_id)
            .await?;

        if let Some(contact) = update.guest {
            if !contact.is_empty() {
                self.context
                    .database
                    .update_guest(UpdatedGuest {
                        id: current.guest.id,
                        contact,
                    })
                    .await?;
            }
        }

        self.context
            .database
            .update_reservation(UpdatedReservation {
                id: reservation_id,
                bed_id: update.bed_id,
                stay: update.stay,
                status: update.status,
                notes: update.notes,
            })
            .await
    }

    /// Hard-deletes a reservation
    pub async fn remove(&self, reservation_id: PrimaryKey) -> Result<(), DatabaseError> {
        self.context
            .database
            .delete_reservation(reservation_id)
            .await
    }
}
