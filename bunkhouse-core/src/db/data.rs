use chrono::{DateTime, NaiveDate, Utc};
use std::str::FromStr;
use thiserror::Error;

/// The type used for primary keys in the database.
pub type PrimaryKey = i32;

/// Returned when a stored enum column holds a value this version doesn't know about
#[derive(Debug, Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// The two accommodation categories on offer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomKind {
    Pension,
    Dorm,
}

impl RoomKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pension => "pension",
            Self::Dorm => "dorm",
        }
    }
}

impl FromStr for RoomKind {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pension" => Ok(Self::Pension),
            "dorm" => Ok(Self::Dorm),
            other => Err(UnknownVariant {
                kind: "room kind",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BedKind {
    Single,
    Double,
    BunkTop,
    BunkBottom,
}

impl BedKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Double => "double",
            Self::BunkTop => "bunk_top",
            Self::BunkBottom => "bunk_bottom",
        }
    }
}

impl FromStr for BedKind {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "single" => Ok(Self::Single),
            "double" => Ok(Self::Double),
            "bunk_top" => Ok(Self::BunkTop),
            "bunk_bottom" => Ok(Self::BunkBottom),
            other => Err(UnknownVariant {
                kind: "bed kind",
                value: other.to_string(),
            }),
        }
    }
}

/// Reservation lifecycle state. Admission only ever writes `Confirmed`;
/// the other states are reachable through updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationStatus {
    Confirmed,
    Pending,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Pending => "pending",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for ReservationStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "confirmed" => Ok(Self::Confirmed),
            "pending" => Ok(Self::Pending),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownVariant {
                kind: "reservation status",
                value: other.to_string(),
            }),
        }
    }
}

/// A room and the beds it owns, in listing order
#[derive(Debug, Clone)]
pub struct RoomData {
    pub id: PrimaryKey,
    pub name: String,
    pub kind: RoomKind,
    /// How many people the room sleeps. A double bed counts for two.
    pub capacity: i32,
    pub beds: Vec<BedData>,
}

/// A single piece of bookable inventory
#[derive(Debug, Clone)]
pub struct BedData {
    pub id: PrimaryKey,
    pub room_id: PrimaryKey,
    /// Position within the owning room, unique per room
    pub number: i32,
    pub kind: BedKind,
}

/// A guest record, keyed by their identity document number
#[derive(Debug, Clone)]
pub struct GuestData {
    pub id: PrimaryKey,
    pub name: String,
    pub last_name: String,
    /// Natural key, unique across guests
    pub id_number: String,
    pub phone: String,
    pub email: String,
    pub age: Option<i32>,
    pub country: String,
}

/// A reservation row as stored
#[derive(Debug, Clone)]
pub struct ReservationData {
    pub id: PrimaryKey,
    pub bed_id: PrimaryKey,
    pub guest_id: PrimaryKey,
    pub check_in: NaiveDate,
    /// Exclusive end of the stay
    pub check_out: NaiveDate,
    pub status: ReservationStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A reservation joined with its guest, bed, and room for display
#[derive(Debug, Clone)]
pub struct ReservationViewData {
    pub reservation: ReservationData,
    pub guest: GuestData,
    pub bed: BedData,
    pub room_name: String,
}
