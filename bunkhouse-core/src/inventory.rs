use chrono::NaiveDate;

use crate::{
    BunkhouseContext, Database, DatabaseError, NewRoom, PrimaryKey, ReservationData, RoomData,
    RoomKind, StayRange, UpdatedRoom,
};

/// Rooms, beds, and occupancy reporting
pub struct InventoryManager<Db> {
    context: BunkhouseContext<Db>,
}

/// Restricts statistics to one accommodation kind and/or one room
#[derive(Debug, Default, Clone)]
pub struct StatsFilter {
    pub kind: Option<RoomKind>,
    pub room_id: Option<PrimaryKey>,
}

impl StatsFilter {
    fn matches(&self, room: &RoomData) -> bool {
        self.kind.map_or(true, |kind| room.kind == kind)
            && self.room_id.map_or(true, |id| room.id == id)
    }
}

/// Occupancy numbers for a single day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statistics {
    pub total_rooms: usize,
    /// Sleeping capacity over the selected rooms
    pub total_beds: i64,
    /// Confirmed guests whose stay covers the day
    pub current_guests: usize,
    /// Rounded percentage of capacity in use
    pub occupancy_rate: u32,
}

impl<Db> InventoryManager<Db>
where
    Db: Database,
{
    pub fn new(context: &BunkhouseContext<Db>) -> Self {
        Self {
            context: context.clone(),
        }
    }

    pub async fn rooms_with_beds(&self) -> Result<Vec<RoomData>, DatabaseError> {
        self.context.database.list_rooms().await
    }

    pub async fn room_by_id(&self, room_id: PrimaryKey) -> Result<RoomData, DatabaseError> {
        self.context.database.room_by_id(room_id).await
    }

    pub async fn create_room(&self, new_room: NewRoom) -> Result<RoomData, DatabaseError> {
        self.context.database.create_room(new_room).await
    }

    pub async fn update_room(&self, updated_room: UpdatedRoom) -> Result<RoomData, DatabaseError> {
        self.context.database.update_room(updated_room).await
    }

    pub async fn delete_room(&self, room_id: PrimaryKey) -> Result<(), DatabaseError> {
        self.context.database.delete_room(room_id).await
    }

    /// Occupancy for the night starting on `day`
    pub async fn statistics(
        &self,
        day: NaiveDate,
        filter: StatsFilter,
    ) -> Result<Statistics, DatabaseError> {
        let rooms = self.context.database.list_rooms().await?;
        let tonight = self
            .context
            .database
            .confirmed_reservations(StayRange::single_night(day))
            .await?;

        Ok(compute_statistics(&rooms, &tonight, &filter))
    }
}

/// Pure statistics computation over the full inventory and the confirmed
/// reservations active on the day in question
pub fn compute_statistics(
    rooms: &[RoomData],
    active: &[ReservationData],
    filter: &StatsFilter,
) -> Statistics {
    let total_rooms = rooms.iter().filter(|room| filter.matches(room)).count();
    let total_beds: i64 = rooms
        .iter()
        .filter(|room| filter.matches(room))
        .map(|room| i64::from(room.capacity))
        .sum();

    // A reservation counts when the bed it references belongs to a selected
    // room, looked up over the full inventory
    let current_guests = active
        .iter()
        .filter(|reservation| {
            rooms
                .iter()
                .find(|room| room.beds.iter().any(|bed| bed.id == reservation.bed_id))
                .map(|room| filter.matches(room))
                .unwrap_or(false)
        })
        .count();

    let occupancy_rate = if total_beds > 0 {
        ((current_guests as f64 / total_beds as f64) * 100.0).round() as u32
    } else {
        0
    };

    Statistics {
        total_rooms,
        total_beds,
        current_guests,
        occupancy_rate,
    }
}
