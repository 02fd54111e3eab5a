//! Date-range availability primitives: the stay interval type, the overlap
//! predicate, first-fit bed selection, and per-room classification.

use std::collections::HashSet;
use std::fmt::Display;

use chrono::{Days, NaiveDate};
use thiserror::Error;

use crate::{BedData, PrimaryKey, ReservationViewData, RoomData, RoomKind};

/// A half-open `[check_in, check_out)` stay. Cannot be constructed with a
/// check-out on or before the check-in, so downstream code never has to
/// re-validate the ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayRange {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Check-out must be after check-in")]
pub struct InvalidStay;

impl StayRange {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, InvalidStay> {
        if check_out <= check_in {
            return Err(InvalidStay);
        }

        Ok(Self {
            check_in,
            check_out,
        })
    }

    /// The night starting on `date`. Used for "who is in the house right now"
    /// queries, where a guest is present iff their stay covers tonight.
    pub fn single_night(date: NaiveDate) -> Self {
        Self {
            check_in: date,
            check_out: date + Days::new(1),
        }
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    /// Half-open interval intersection. Touching boundaries do not overlap:
    /// a bed vacated on the morning of day D is free for a check-in on day D.
    pub fn overlaps(&self, check_in: NaiveDate, check_out: NaiveDate) -> bool {
        self.check_in < check_out && check_in < self.check_out
    }
}

impl Display for StayRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.check_in, self.check_out)
    }
}

/// First-fit selection: the first bed in listing order whose id is not in the
/// occupied set. `None` means the house is full for the range, which callers
/// surface as a no-availability condition rather than an error.
pub fn first_free_bed<'b>(
    beds: &'b [BedData],
    occupied: &HashSet<PrimaryKey>,
) -> Option<&'b BedData> {
    beds.iter().find(|bed| !occupied.contains(&bed.id))
}

/// Availability of every bed in one room for a given stay
#[derive(Debug, Clone)]
pub struct RoomAvailability {
    pub room_id: PrimaryKey,
    pub name: String,
    pub kind: RoomKind,
    pub capacity: i32,
    pub beds: Vec<BedStatus>,
}

/// One bed's availability, with the conflicting confirmed reservations kept
/// around so an operator can see who is in the way
#[derive(Debug, Clone)]
pub struct BedStatus {
    pub bed: BedData,
    pub conflicts: Vec<ReservationViewData>,
}

impl BedStatus {
    pub fn is_available(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// Classifies every bed of every room as available or occupied for `stay`.
/// `confirmed` must already be restricted to confirmed reservations; the
/// per-bed overlap check happens here.
pub fn classify_rooms(
    rooms: Vec<RoomData>,
    confirmed: &[ReservationViewData],
    stay: StayRange,
) -> Vec<RoomAvailability> {
    rooms
        .into_iter()
        .map(|room| {
            let beds = room
                .beds
                .into_iter()
                .map(|bed| {
                    let conflicts = confirmed
                        .iter()
                        .filter(|view| {
                            view.reservation.bed_id == bed.id
                                && stay.overlaps(
                                    view.reservation.check_in,
                                    view.reservation.check_out,
                                )
                        })
                        .cloned()
                        .collect();

                    BedStatus { bed, conflicts }
                })
                .collect();

            RoomAvailability {
                room_id: room.id,
                name: room.name,
                kind: room.kind,
                capacity: room.capacity,
                beds,
            }
        })
        .collect()
}
