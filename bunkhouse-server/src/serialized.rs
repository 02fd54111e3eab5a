//! All shapes that are exposed from endpoints are defined here
//! along with the conversions from core data

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use bunkhouse_core::{
    BedData, BedStatus as CoreBedStatus, GuestData, ReservationViewData,
    RoomAvailability as CoreRoomAvailability, RoomData, Statistics as CoreStatistics, StayRange,
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Guest {
    name: String,
    last_name: String,
    id_number: String,
    phone: String,
    email: String,
    age: Option<i32>,
    country: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BedInfo {
    bed_id: i32,
    bed_number: i32,
    room_id: i32,
    room_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    id: i32,
    bed_id: i32,
    check_in: NaiveDate,
    check_out: NaiveDate,
    status: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    guest: Guest,
    bed_info: BedInfo,
}

/// The admission response body: a success flag, a human-readable message,
/// and the created reservation when there is one
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReservationOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation: Option<Reservation>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Acknowledgement {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    id: i32,
    name: String,
    kind: String,
    capacity: i32,
    beds: Vec<Bed>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Bed {
    id: i32,
    room_id: i32,
    number: i32,
    kind: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityReport {
    check_in: NaiveDate,
    check_out: NaiveDate,
    nights: i64,
    total_beds: usize,
    total_available: usize,
    rooms: Vec<RoomAvailability>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomAvailability {
    room_id: i32,
    name: String,
    kind: String,
    capacity: i32,
    beds: Vec<BedStatus>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BedStatus {
    bed: Bed,
    available: bool,
    conflicts: Vec<Reservation>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    total_rooms: usize,
    total_beds: i64,
    current_guests: usize,
    occupancy_rate: u32,
}

/// Helper trait to convert any type into a serialized version
pub trait ToSerialized<T>
where
    T: Serialize,
{
    fn to_serialized(&self) -> T;
}

impl<I, O> ToSerialized<Vec<O>> for Vec<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Vec<O> {
        self.iter().map(|x| x.to_serialized()).collect()
    }
}

impl ToSerialized<Guest> for GuestData {
    fn to_serialized(&self) -> Guest {
        Guest {
            name: self.name.clone(),
            last_name: self.last_name.clone(),
            id_number: self.id_number.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            age: self.age,
            country: self.country.clone(),
        }
    }
}

impl ToSerialized<Bed> for BedData {
    fn to_serialized(&self) -> Bed {
        Bed {
            id: self.id,
            room_id: self.room_id,
            number: self.number,
            kind: self.kind.as_str().to_string(),
        }
    }
}

impl ToSerialized<Reservation> for ReservationViewData {
    fn to_serialized(&self) -> Reservation {
        Reservation {
            id: self.reservation.id,
            bed_id: self.reservation.bed_id,
            check_in: self.reservation.check_in,
            check_out: self.reservation.check_out,
            status: self.reservation.status.as_str().to_string(),
            notes: self.reservation.notes.clone(),
            created_at: self.reservation.created_at,
            guest: self.guest.to_serialized(),
            bed_info: BedInfo {
                bed_id: self.bed.id,
                bed_number: self.bed.number,
                room_id: self.bed.room_id,
                room_name: self.room_name.clone(),
            },
        }
    }
}

impl ToSerialized<Room> for RoomData {
    fn to_serialized(&self) -> Room {
        Room {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind.as_str().to_string(),
            capacity: self.capacity,
            beds: self.beds.to_serialized(),
        }
    }
}

impl ToSerialized<RoomAvailability> for CoreRoomAvailability {
    fn to_serialized(&self) -> RoomAvailability {
        RoomAvailability {
            room_id: self.room_id,
            name: self.name.clone(),
            kind: self.kind.as_str().to_string(),
            capacity: self.capacity,
            beds: self.beds.to_serialized(),
        }
    }
}

impl ToSerialized<BedStatus> for CoreBedStatus {
    fn to_serialized(&self) -> BedStatus {
        BedStatus {
            bed: self.bed.to_serialized(),
            available: self.is_available(),
            conflicts: self.conflicts.to_serialized(),
        }
    }
}

impl ToSerialized<Statistics> for CoreStatistics {
    fn to_serialized(&self) -> Statistics {
        Statistics {
            total_rooms: self.total_rooms,
            total_beds: self.total_beds,
            current_guests: self.current_guests,
            occupancy_rate: self.occupancy_rate,
        }
    }
}

impl AvailabilityReport {
    /// Builds the summary the availability search returns
    pub fn from_rooms(stay: StayRange, rooms: Vec<CoreRoomAvailability>) -> Self {
        let total_beds = rooms.iter().map(|room| room.beds.len()).sum();
        let total_available = rooms
            .iter()
            .flat_map(|room| room.beds.iter())
            .filter(|bed| bed.is_available())
            .count();

        Self {
            check_in: stay.check_in(),
            check_out: stay.check_out(),
            nights: stay.nights(),
            total_beds,
            total_available,
            rooms: rooms.to_serialized(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;
    use bunkhouse_core::{BedKind, ReservationData, ReservationStatus};

    fn view() -> ReservationViewData {
        ReservationViewData {
            reservation: ReservationData {
                id: 7,
                bed_id: 3,
                guest_id: 4,
                check_in: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                check_out: NaiveDate::from_ymd_opt(2025, 6, 5).unwrap(),
                status: ReservationStatus::Confirmed,
                notes: None,
                created_at: Utc::now(),
            },
            guest: GuestData {
                id: 4,
                name: "Maria".to_string(),
                last_name: "Souto".to_string(),
                id_number: "X1234567".to_string(),
                phone: "600 000 001".to_string(),
                email: "maria@example.com".to_string(),
                age: Some(34),
                country: "Spain".to_string(),
            },
            bed: BedData {
                id: 3,
                room_id: 2,
                number: 1,
                kind: BedKind::Single,
            },
            room_name: "Pension - Room 2".to_string(),
        }
    }

    #[test]
    fn reservations_serialize_with_the_wire_field_names() {
        let serialized = serde_json::to_value(view().to_serialized()).unwrap();

        assert_eq!(serialized["bedId"], 3);
        assert_eq!(serialized["checkIn"], "2025-06-01");
        assert_eq!(serialized["status"], "confirmed");
        assert_eq!(serialized["guest"]["idNumber"], "X1234567");
        assert_eq!(serialized["bedInfo"]["bedNumber"], 1);
        assert_eq!(serialized["bedInfo"]["roomName"], "Pension - Room 2");
    }

    #[test]
    fn successful_outcomes_keep_the_reservation_in_the_body() {
        let outcome = ReservationOutcome {
            success: true,
            message: "Reservation created successfully".to_string(),
            reservation: Some(view().to_serialized()),
        };

        let serialized = serde_json::to_value(outcome).unwrap();

        assert_eq!(serialized["success"], true);
        assert_eq!(serialized["reservation"]["id"], 7);
    }
}
