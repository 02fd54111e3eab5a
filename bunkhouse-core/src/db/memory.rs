//! In-memory [Database] used by the manager tests. A single lock serializes
//! every operation, which makes the guarded reservation writes atomic.

use std::cmp::Reverse;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;

use super::{
    BedData, BedKind, Database, DatabaseError, GuestData, GuestProfile, NewReservation, NewRoom,
    PrimaryKey, ReservationData, ReservationStatus, ReservationViewData, Result, RoomData,
    RoomKind, UpdatedGuest, UpdatedReservation, UpdatedRoom,
};
use crate::StayRange;

#[derive(Default)]
pub struct MemoryDatabase {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    rooms: Vec<RoomData>,
    beds: Vec<BedData>,
    guests: Vec<GuestData>,
    reservations: Vec<ReservationData>,
    next_id: PrimaryKey,
}

impl State {
    fn next_id(&mut self) -> PrimaryKey {
        self.next_id += 1;
        self.next_id
    }

    fn room_with_beds(&self, room: &RoomData) -> RoomData {
        let mut room = room.clone();
        room.beds = self
            .beds
            .iter()
            .filter(|bed| bed.room_id == room.id)
            .cloned()
            .collect();
        room
    }

    fn compose_view(&self, reservation: &ReservationData) -> Result<ReservationViewData> {
        let guest = self
            .guests
            .iter()
            .find(|guest| guest.id == reservation.guest_id)
            .ok_or(DatabaseError::NotFound {
                resource: "guest",
                identifier: "id",
            })?
            .clone();

        let bed = self
            .beds
            .iter()
            .find(|bed| bed.id == reservation.bed_id)
            .ok_or(DatabaseError::NotFound {
                resource: "bed",
                identifier: "id",
            })?
            .clone();

        let room_name = self
            .rooms
            .iter()
            .find(|room| room.id == bed.room_id)
            .map(|room| room.name.clone())
            .ok_or(DatabaseError::NotFound {
                resource: "room",
                identifier: "id",
            })?;

        Ok(ReservationViewData {
            reservation: reservation.clone(),
            guest,
            bed,
            room_name,
        })
    }

    fn has_confirmed_overlap(
        &self,
        bed_id: PrimaryKey,
        check_in: NaiveDate,
        check_out: NaiveDate,
        excluding: Option<PrimaryKey>,
    ) -> bool {
        self.reservations.iter().any(|reservation| {
            reservation.bed_id == bed_id
                && reservation.status == ReservationStatus::Confirmed
                && excluding.map_or(true, |id| reservation.id != id)
                && reservation.check_in < check_out
                && check_in < reservation.check_out
        })
    }
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a room with one bed per given kind, numbered from 1
    pub fn with_room(self, name: &str, kind: RoomKind, beds: &[BedKind]) -> Self {
        {
            let mut state = self.state.lock();
            let room_id = state.next_id();

            state.rooms.push(RoomData {
                id: room_id,
                name: name.to_string(),
                kind,
                capacity: beds.len() as i32,
                beds: vec![],
            });

            for (index, bed_kind) in beds.iter().enumerate() {
                let bed_id = state.next_id();
                state.beds.push(BedData {
                    id: bed_id,
                    room_id,
                    number: index as i32 + 1,
                    kind: *bed_kind,
                });
            }
        }

        self
    }

    pub fn guest_count(&self) -> usize {
        self.state.lock().guests.len()
    }

    pub fn reservation_count(&self) -> usize {
        self.state.lock().reservations.len()
    }

    pub fn guest_by_number(&self, id_number: &str) -> Option<GuestData> {
        self.state
            .lock()
            .guests
            .iter()
            .find(|guest| guest.id_number == id_number)
            .cloned()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn list_rooms(&self) -> Result<Vec<RoomData>> {
        let state = self.state.lock();
        Ok(state
            .rooms
            .iter()
            .map(|room| state.room_with_beds(room))
            .collect())
    }

    async fn room_by_id(&self, room_id: PrimaryKey) -> Result<RoomData> {
        let state = self.state.lock();
        state
            .rooms
            .iter()
            .find(|room| room.id == room_id)
            .map(|room| state.room_with_beds(room))
            .ok_or(DatabaseError::NotFound {
                resource: "room",
                identifier: "id",
            })
    }

    async fn create_room(&self, new_room: NewRoom) -> Result<RoomData> {
        let mut state = self.state.lock();
        let id = state.next_id();

        let room = RoomData {
            id,
            name: new_room.name,
            kind: new_room.kind,
            capacity: new_room.capacity,
            beds: vec![],
        };

        state.rooms.push(room.clone());
        Ok(room)
    }

    async fn update_room(&self, updated_room: UpdatedRoom) -> Result<RoomData> {
        let mut state = self.state.lock();
        let position = state
            .rooms
            .iter()
            .position(|room| room.id == updated_room.id)
            .ok_or(DatabaseError::NotFound {
                resource: "room",
                identifier: "id",
            })?;

        let room = &mut state.rooms[position];

        if let Some(name) = updated_room.name {
            room.name = name;
        }
        if let Some(kind) = updated_room.kind {
            room.kind = kind;
        }
        if let Some(capacity) = updated_room.capacity {
            room.capacity = capacity;
        }

        let room = room.clone();
        Ok(state.room_with_beds(&room))
    }

    async fn delete_room(&self, room_id: PrimaryKey) -> Result<()> {
        let mut state = self.state.lock();
        let position = state
            .rooms
            .iter()
            .position(|room| room.id == room_id)
            .ok_or(DatabaseError::NotFound {
                resource: "room",
                identifier: "id",
            })?;

        state.rooms.remove(position);

        let removed_beds: Vec<_> = state
            .beds
            .iter()
            .filter(|bed| bed.room_id == room_id)
            .map(|bed| bed.id)
            .collect();

        state.beds.retain(|bed| bed.room_id != room_id);
        state
            .reservations
            .retain(|reservation| !removed_beds.contains(&reservation.bed_id));

        Ok(())
    }

    async fn list_beds(&self) -> Result<Vec<BedData>> {
        let mut beds = self.state.lock().beds.clone();
        beds.sort_by_key(|bed| (bed.room_id, bed.number));
        Ok(beds)
    }

    async fn upsert_guest(&self, profile: GuestProfile) -> Result<GuestData> {
        let mut state = self.state.lock();

        if let Some(position) = state
            .guests
            .iter()
            .position(|guest| guest.id_number == profile.id_number)
        {
            let guest = &mut state.guests[position];
            guest.name = profile.name;
            guest.last_name = profile.last_name;
            guest.phone = profile.phone;
            guest.email = profile.email;
            guest.age = profile.age;
            guest.country = profile.country;

            return Ok(guest.clone());
        }

        let id = state.next_id();
        let guest = GuestData {
            id,
            name: profile.name,
            last_name: profile.last_name,
            id_number: profile.id_number,
            phone: profile.phone,
            email: profile.email,
            age: profile.age,
            country: profile.country,
        };

        state.guests.push(guest.clone());
        Ok(guest)
    }

    async fn update_guest(&self, updated_guest: UpdatedGuest) -> Result<GuestData> {
        let mut state = self.state.lock();

        let contact = updated_guest.contact;

        if let Some(id_number) = &contact.id_number {
            let taken = state
                .guests
                .iter()
                .any(|guest| guest.id != updated_guest.id && &guest.id_number == id_number);

            if taken {
                return Err(DatabaseError::Conflict {
                    resource: "guest",
                    field: "id_number",
                    value: id_number.clone(),
                });
            }
        }

        let position = state
            .guests
            .iter()
            .position(|guest| guest.id == updated_guest.id)
            .ok_or(DatabaseError::NotFound {
                resource: "guest",
                identifier: "id",
            })?;

        let guest = &mut state.guests[position];

        if let Some(name) = contact.name {
            guest.name = name;
        }
        if let Some(last_name) = contact.last_name {
            guest.last_name = last_name;
        }
        if let Some(id_number) = contact.id_number {
            guest.id_number = id_number;
        }
        if let Some(phone) = contact.phone {
            guest.phone = phone;
        }
        if let Some(email) = contact.email {
            guest.email = email;
        }
        if let Some(age) = contact.age {
            guest.age = Some(age);
        }
        if let Some(country) = contact.country {
            guest.country = country;
        }

        Ok(guest.clone())
    }

    async fn reservation_by_id(&self, reservation_id: PrimaryKey) -> Result<ReservationViewData> {
        let state = self.state.lock();
        let reservation = state
            .reservations
            .iter()
            .find(|reservation| reservation.id == reservation_id)
            .ok_or(DatabaseError::NotFound {
                resource: "reservation",
                identifier: "id",
            })?;

        state.compose_view(reservation)
    }

    async fn list_reservations(
        &self,
        overlapping: Option<StayRange>,
    ) -> Result<Vec<ReservationViewData>> {
        let state = self.state.lock();

        let mut items: Vec<&ReservationData> = match overlapping {
            None => state.reservations.iter().collect(),
            Some(stay) => state
                .reservations
                .iter()
                .filter(|reservation| {
                    reservation.status == ReservationStatus::Confirmed
                        && stay.overlaps(reservation.check_in, reservation.check_out)
                })
                .collect(),
        };

        match overlapping {
            None => items.sort_by_key(|reservation| Reverse((reservation.created_at, reservation.id))),
            Some(_) => items.sort_by_key(|reservation| reservation.check_in),
        }

        items
            .into_iter()
            .map(|reservation| state.compose_view(reservation))
            .collect()
    }

    async fn confirmed_reservations(&self, overlapping: StayRange) -> Result<Vec<ReservationData>> {
        let state = self.state.lock();

        Ok(state
            .reservations
            .iter()
            .filter(|reservation| {
                reservation.status == ReservationStatus::Confirmed
                    && overlapping.overlaps(reservation.check_in, reservation.check_out)
            })
            .cloned()
            .collect())
    }

    async fn create_reservation_if_free(
        &self,
        new_reservation: NewReservation,
    ) -> Result<ReservationViewData> {
        let mut state = self.state.lock();

        if state.has_confirmed_overlap(
            new_reservation.bed_id,
            new_reservation.stay.check_in(),
            new_reservation.stay.check_out(),
            None,
        ) {
            return Err(DatabaseError::Conflict {
                resource: "reservation",
                field: "bed",
                value: format!("{} for {}", new_reservation.bed_id, new_reservation.stay),
            });
        }

        let id = state.next_id();
        let reservation = ReservationData {
            id,
            bed_id: new_reservation.bed_id,
            guest_id: new_reservation.guest_id,
            check_in: new_reservation.stay.check_in(),
            check_out: new_reservation.stay.check_out(),
            status: ReservationStatus::Confirmed,
            notes: new_reservation.notes,
            created_at: Utc::now(),
        };

        state.reservations.push(reservation.clone());
        state.compose_view(&reservation)
    }

    async fn update_reservation(
        &self,
        updated_reservation: UpdatedReservation,
    ) -> Result<ReservationViewData> {
        let mut state = self.state.lock();

        let position = state
            .reservations
            .iter()
            .position(|reservation| reservation.id == updated_reservation.id)
            .ok_or(DatabaseError::NotFound {
                resource: "reservation",
                identifier: "id",
            })?;

        let current = &state.reservations[position];

        let bed_id = updated_reservation.bed_id.unwrap_or(current.bed_id);
        let (check_in, check_out) = match updated_reservation.stay {
            Some(stay) => (stay.check_in(), stay.check_out()),
            None => (current.check_in, current.check_out),
        };
        let status = updated_reservation.status.unwrap_or(current.status);
        let notes = updated_reservation.notes.or_else(|| current.notes.clone());

        if status == ReservationStatus::Confirmed
            && state.has_confirmed_overlap(bed_id, check_in, check_out, Some(updated_reservation.id))
        {
            return Err(DatabaseError::Conflict {
                resource: "reservation",
                field: "bed",
                value: format!("{bed_id} for {check_in}..{check_out}"),
            });
        }

        let reservation = &mut state.reservations[position];
        reservation.bed_id = bed_id;
        reservation.check_in = check_in;
        reservation.check_out = check_out;
        reservation.status = status;
        reservation.notes = notes;

        let reservation = reservation.clone();
        state.compose_view(&reservation)
    }

    async fn delete_reservation(&self, reservation_id: PrimaryKey) -> Result<()> {
        let mut state = self.state.lock();

        let position = state
            .reservations
            .iter()
            .position(|reservation| reservation.id == reservation_id)
            .ok_or(DatabaseError::NotFound {
                resource: "reservation",
                identifier: "id",
            })?;

        state.reservations.remove(position);
        Ok(())
    }
}
