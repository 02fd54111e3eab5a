use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{postgres::PgPoolOptions, Error as SqlxError, FromRow, PgPool, Postgres, Transaction};
use std::str::FromStr;

use crate::{
    BedData, Database, DatabaseError, GuestData, GuestProfile, IntoDatabaseError, NewReservation,
    NewRoom, PrimaryKey, ReservationData, ReservationViewData, Result, RoomData, StayRange,
    UnknownVariant, UpdatedGuest, UpdatedReservation, UpdatedRoom,
};
use async_trait::async_trait;

/// A postgres database implementation for bunkhouse
pub struct PgDatabase {
    pool: PgPool,
}

/// sqlstates signalling a write that lost to a concurrent one: unique
/// violation, exclusion violation, serialization failure
const CONFLICT_SQLSTATES: [&str; 3] = ["23505", "23P01", "40001"];

const RESERVATION_VIEW: &str = "
    SELECT
        r.id, r.bed_id, r.guest_id, r.check_in, r.check_out, r.status, r.notes, r.created_at,
        g.name AS g_name, g.last_name AS g_last_name, g.id_number AS g_id_number,
        g.phone AS g_phone, g.email AS g_email, g.age AS g_age, g.country AS g_country,
        b.room_id AS b_room_id, b.number AS b_number, b.type AS b_kind,
        rm.name AS room_name
    FROM reservations AS r
        INNER JOIN guests AS g ON r.guest_id = g.id
        INNER JOIN beds AS b ON r.bed_id = b.id
        INNER JOIN rooms AS rm ON b.room_id = rm.id";

impl PgDatabase {
    pub async fn new(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| DatabaseError::Internal(Box::new(e)))?;

        Ok(Self { pool })
    }

    /// Applies the embedded schema and seed migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::Internal(Box::new(e)))
    }

    async fn beds_of_room(&self, room_id: PrimaryKey) -> Result<Vec<BedData>> {
        let rows = sqlx::query_as::<_, BedRow>(
            "SELECT id, room_id, number, type AS kind FROM beds WHERE room_id = $1 ORDER BY number",
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?;

        rows.into_iter().map(BedData::try_from).collect()
    }

    /// The overlap invariant is enforced inside SERIALIZABLE transactions so
    /// that concurrent admissions cannot both observe a bed as free.
    async fn set_transaction_serializable(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<()> {
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut **tx)
            .await
            .map_err(|e| e.any())?;

        Ok(())
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn list_rooms(&self) -> Result<Vec<RoomData>> {
        let rows = sqlx::query_as::<_, RoomRow>(
            "SELECT id, name, type AS kind, capacity FROM rooms ORDER BY type, name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?;

        let mut rooms = Vec::with_capacity(rows.len());

        for row in rows {
            let mut room = RoomData::try_from(row)?;
            room.beds = self.beds_of_room(room.id).await?;
            rooms.push(room);
        }

        Ok(rooms)
    }

    async fn room_by_id(&self, room_id: PrimaryKey) -> Result<RoomData> {
        let row = sqlx::query_as::<_, RoomRow>(
            "SELECT id, name, type AS kind, capacity FROM rooms WHERE id = $1",
        )
        .bind(room_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("room", "id"))?;

        let mut room = RoomData::try_from(row)?;
        room.beds = self.beds_of_room(room.id).await?;

        Ok(room)
    }

    async fn create_room(&self, new_room: NewRoom) -> Result<RoomData> {
        let id = sqlx::query_scalar::<_, PrimaryKey>(
            "INSERT INTO rooms (name, type, capacity) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&new_room.name)
        .bind(new_room.kind.as_str())
        .bind(new_room.capacity)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())?;

        self.room_by_id(id).await
    }

    async fn update_room(&self, updated_room: UpdatedRoom) -> Result<RoomData> {
        let room = self.room_by_id(updated_room.id).await?;

        sqlx::query(
            "UPDATE rooms SET
                name = $1,
                type = $2,
                capacity = $3
            WHERE id = $4",
        )
        .bind(updated_room.name.unwrap_or(room.name))
        .bind(updated_room.kind.unwrap_or(room.kind).as_str())
        .bind(updated_room.capacity.unwrap_or(room.capacity))
        .bind(updated_room.id)
        .execute(&self.pool)
        .await
        .map_err(|e| e.any())?;

        self.room_by_id(updated_room.id).await
    }

    async fn delete_room(&self, room_id: PrimaryKey) -> Result<()> {
        // Ensure room exists
        let _ = self.room_by_id(room_id).await?;

        sqlx::query("DELETE FROM rooms WHERE id = $1")
            .bind(room_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn list_beds(&self) -> Result<Vec<BedData>> {
        let rows = sqlx::query_as::<_, BedRow>(
            "SELECT id, room_id, number, type AS kind FROM beds ORDER BY room_id, number",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?;

        rows.into_iter().map(BedData::try_from).collect()
    }

    async fn upsert_guest(&self, profile: GuestProfile) -> Result<GuestData> {
        sqlx::query_as::<_, GuestRow>(
            "INSERT INTO guests (name, last_name, id_number, phone, email, age, country)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (id_number) DO UPDATE SET
                name = EXCLUDED.name,
                last_name = EXCLUDED.last_name,
                phone = EXCLUDED.phone,
                email = EXCLUDED.email,
                age = EXCLUDED.age,
                country = EXCLUDED.country
             RETURNING id, name, last_name, id_number, phone, email, age, country",
        )
        .bind(&profile.name)
        .bind(&profile.last_name)
        .bind(&profile.id_number)
        .bind(&profile.phone)
        .bind(&profile.email)
        .bind(profile.age)
        .bind(&profile.country)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())
        .map(GuestData::from)
    }

    async fn update_guest(&self, updated_guest: UpdatedGuest) -> Result<GuestData> {
        let current = sqlx::query_as::<_, GuestRow>(
            "SELECT id, name, last_name, id_number, phone, email, age, country
             FROM guests WHERE id = $1",
        )
        .bind(updated_guest.id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("guest", "id"))?;

        let contact = updated_guest.contact;
        let id_number = contact.id_number.unwrap_or(current.id_number);

        let row = sqlx::query_as::<_, GuestRow>(
            "UPDATE guests SET
                name = $1,
                last_name = $2,
                id_number = $3,
                phone = $4,
                email = $5,
                age = $6,
                country = $7
             WHERE id = $8
             RETURNING id, name, last_name, id_number, phone, email, age, country",
        )
        .bind(contact.name.unwrap_or(current.name))
        .bind(contact.last_name.unwrap_or(current.last_name))
        .bind(&id_number)
        .bind(contact.phone.unwrap_or(current.phone))
        .bind(contact.email.unwrap_or(current.email))
        .bind(contact.age.or(current.age))
        .bind(contact.country.unwrap_or(current.country))
        .bind(updated_guest.id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_conflict(&e) {
                DatabaseError::Conflict {
                    resource: "guest",
                    field: "id_number",
                    value: id_number.clone(),
                }
            } else {
                e.any()
            }
        })?;

        Ok(row.into())
    }

    async fn reservation_by_id(&self, reservation_id: PrimaryKey) -> Result<ReservationViewData> {
        let row =
            sqlx::query_as::<_, ReservationViewRow>(&format!("{RESERVATION_VIEW} WHERE r.id = $1"))
                .bind(reservation_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| e.not_found_or("reservation", "id"))?;

        row.try_into()
    }

    async fn list_reservations(
        &self,
        overlapping: Option<StayRange>,
    ) -> Result<Vec<ReservationViewData>> {
        let rows = match overlapping {
            None => {
                sqlx::query_as::<_, ReservationViewRow>(&format!(
                    "{RESERVATION_VIEW} ORDER BY r.created_at DESC"
                ))
                .fetch_all(&self.pool)
                .await
            }
            Some(stay) => {
                sqlx::query_as::<_, ReservationViewRow>(&format!(
                    "{RESERVATION_VIEW}
                     WHERE r.status = 'confirmed' AND r.check_in < $2 AND r.check_out > $1
                     ORDER BY r.check_in"
                ))
                .bind(stay.check_in())
                .bind(stay.check_out())
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| e.any())?;

        rows.into_iter().map(ReservationViewData::try_from).collect()
    }

    async fn confirmed_reservations(&self, overlapping: StayRange) -> Result<Vec<ReservationData>> {
        let rows = sqlx::query_as::<_, ReservationRow>(
            "SELECT id, bed_id, guest_id, check_in, check_out, status, notes, created_at
             FROM reservations
             WHERE status = 'confirmed' AND check_in < $2 AND check_out > $1",
        )
        .bind(overlapping.check_in())
        .bind(overlapping.check_out())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?;

        rows.into_iter().map(ReservationData::try_from).collect()
    }

    async fn create_reservation_if_free(
        &self,
        new_reservation: NewReservation,
    ) -> Result<ReservationViewData> {
        let mut tx = self.pool.begin().await.map_err(|e| e.any())?;
        self.set_transaction_serializable(&mut tx).await?;

        let clash = sqlx::query_scalar::<_, PrimaryKey>(
            "SELECT id FROM reservations
             WHERE bed_id = $1 AND status = 'confirmed'
               AND check_in < $3 AND check_out > $2
             LIMIT 1",
        )
        .bind(new_reservation.bed_id)
        .bind(new_reservation.stay.check_in())
        .bind(new_reservation.stay.check_out())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| e.any())?;

        if clash.is_some() {
            return Err(bed_conflict(
                new_reservation.bed_id,
                new_reservation.stay.check_in(),
                new_reservation.stay.check_out(),
            ));
        }

        let id = sqlx::query_scalar::<_, PrimaryKey>(
            "INSERT INTO reservations (bed_id, guest_id, check_in, check_out, status, notes)
             VALUES ($1, $2, $3, $4, 'confirmed', $5)
             RETURNING id",
        )
        .bind(new_reservation.bed_id)
        .bind(new_reservation.guest_id)
        .bind(new_reservation.stay.check_in())
        .bind(new_reservation.stay.check_out())
        .bind(new_reservation.notes.as_deref())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            conflict_or_any(
                e,
                new_reservation.bed_id,
                new_reservation.stay.check_in(),
                new_reservation.stay.check_out(),
            )
        })?;

        tx.commit().await.map_err(|e| {
            conflict_or_any(
                e,
                new_reservation.bed_id,
                new_reservation.stay.check_in(),
                new_reservation.stay.check_out(),
            )
        })?;

        self.reservation_by_id(id).await
    }

    async fn update_reservation(
        &self,
        updated_reservation: UpdatedReservation,
    ) -> Result<ReservationViewData> {
        let mut tx = self.pool.begin().await.map_err(|e| e.any())?;
        self.set_transaction_serializable(&mut tx).await?;

        let current = sqlx::query_as::<_, ReservationRow>(
            "SELECT id, bed_id, guest_id, check_in, check_out, status, notes, created_at
             FROM reservations WHERE id = $1",
        )
        .bind(updated_reservation.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| e.not_found_or("reservation", "id"))?;

        let bed_id = updated_reservation.bed_id.unwrap_or(current.bed_id);
        let (check_in, check_out) = match updated_reservation.stay {
            Some(stay) => (stay.check_in(), stay.check_out()),
            None => (current.check_in, current.check_out),
        };
        let status = updated_reservation
            .status
            .map(|s| s.as_str().to_string())
            .unwrap_or(current.status);
        let notes = updated_reservation.notes.or(current.notes);

        if status == "confirmed" {
            let clash = sqlx::query_scalar::<_, PrimaryKey>(
                "SELECT id FROM reservations
                 WHERE bed_id = $1 AND status = 'confirmed' AND id <> $2
                   AND check_in < $4 AND check_out > $3
                 LIMIT 1",
            )
            .bind(bed_id)
            .bind(updated_reservation.id)
            .bind(check_in)
            .bind(check_out)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| e.any())?;

            if clash.is_some() {
                return Err(bed_conflict(bed_id, check_in, check_out));
            }
        }

        sqlx::query(
            "UPDATE reservations SET
                bed_id = $1,
                check_in = $2,
                check_out = $3,
                status = $4,
                notes = $5
             WHERE id = $6",
        )
        .bind(bed_id)
        .bind(check_in)
        .bind(check_out)
        .bind(&status)
        .bind(notes.as_deref())
        .bind(updated_reservation.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_or_any(e, bed_id, check_in, check_out))?;

        tx.commit()
            .await
            .map_err(|e| conflict_or_any(e, bed_id, check_in, check_out))?;

        self.reservation_by_id(updated_reservation.id).await
    }

    async fn delete_reservation(&self, reservation_id: PrimaryKey) -> Result<()> {
        // Ensure reservation exists
        let _ = self.reservation_by_id(reservation_id).await?;

        sqlx::query("DELETE FROM reservations WHERE id = $1")
            .bind(reservation_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }
}

fn is_conflict(error: &SqlxError) -> bool {
    error
        .as_database_error()
        .and_then(|db| db.code())
        .map(|code| CONFLICT_SQLSTATES.contains(&code.as_ref()))
        .unwrap_or(false)
}

fn bed_conflict(bed_id: PrimaryKey, check_in: NaiveDate, check_out: NaiveDate) -> DatabaseError {
    DatabaseError::Conflict {
        resource: "reservation",
        field: "bed",
        value: format!("{bed_id} for {check_in}..{check_out}"),
    }
}

fn conflict_or_any(
    error: SqlxError,
    bed_id: PrimaryKey,
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> DatabaseError {
    if is_conflict(&error) {
        bed_conflict(bed_id, check_in, check_out)
    } else {
        error.any()
    }
}

fn parse_kind<T>(value: &str) -> Result<T>
where
    T: FromStr<Err = UnknownVariant>,
{
    value
        .parse()
        .map_err(|e: UnknownVariant| DatabaseError::Internal(Box::new(e)))
}

impl IntoDatabaseError for SqlxError {
    fn any(self) -> DatabaseError {
        DatabaseError::Internal(Box::new(self))
    }

    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError {
        match self {
            SqlxError::RowNotFound => DatabaseError::NotFound {
                resource,
                identifier,
            },
            e => e.any(),
        }
    }
}

#[derive(FromRow)]
struct RoomRow {
    id: PrimaryKey,
    name: String,
    kind: String,
    capacity: i32,
}

impl TryFrom<RoomRow> for RoomData {
    type Error = DatabaseError;

    fn try_from(row: RoomRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            name: row.name,
            kind: parse_kind(&row.kind)?,
            capacity: row.capacity,
            beds: vec![],
        })
    }
}

#[derive(FromRow)]
struct BedRow {
    id: PrimaryKey,
    room_id: PrimaryKey,
    number: i32,
    kind: String,
}

impl TryFrom<BedRow> for BedData {
    type Error = DatabaseError;

    fn try_from(row: BedRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            room_id: row.room_id,
            number: row.number,
            kind: parse_kind(&row.kind)?,
        })
    }
}

#[derive(FromRow)]
struct GuestRow {
    id: PrimaryKey,
    name: String,
    last_name: String,
    id_number: String,
    phone: String,
    email: String,
    age: Option<i32>,
    country: String,
}

impl From<GuestRow> for GuestData {
    fn from(row: GuestRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            last_name: row.last_name,
            id_number: row.id_number,
            phone: row.phone,
            email: row.email,
            age: row.age,
            country: row.country,
        }
    }
}

#[derive(FromRow)]
struct ReservationRow {
    id: PrimaryKey,
    bed_id: PrimaryKey,
    guest_id: PrimaryKey,
    check_in: NaiveDate,
    check_out: NaiveDate,
    status: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReservationRow> for ReservationData {
    type Error = DatabaseError;

    fn try_from(row: ReservationRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            bed_id: row.bed_id,
            guest_id: row.guest_id,
            check_in: row.check_in,
            check_out: row.check_out,
            status: parse_kind(&row.status)?,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct ReservationViewRow {
    id: PrimaryKey,
    bed_id: PrimaryKey,
    guest_id: PrimaryKey,
    check_in: NaiveDate,
    check_out: NaiveDate,
    status: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    g_name: String,
    g_last_name: String,
    g_id_number: String,
    g_phone: String,
    g_email: String,
    g_age: Option<i32>,
    g_country: String,
    b_room_id: PrimaryKey,
    b_number: i32,
    b_kind: String,
    room_name: String,
}

impl TryFrom<ReservationViewRow> for ReservationViewData {
    type Error = DatabaseError;

    fn try_from(row: ReservationViewRow) -> Result<Self> {
        Ok(Self {
            reservation: ReservationData {
                id: row.id,
                bed_id: row.bed_id,
                guest_id: row.guest_id,
                check_in: row.check_in,
                check_out: row.check_out,
                status: parse_kind(&row.status)?,
                notes: row.notes,
                created_at: row.created_at,
            },
            guest: GuestData {
                id: row.guest_id,
                name: row.g_name,
                last_name: row.g_last_name,
                id_number: row.g_id_number,
                phone: row.g_phone,
                email: row.g_email,
                age: row.g_age,
                country: row.g_country,
            },
            bed: BedData {
                id: row.bed_id,
                room_id: row.b_room_id,
                number: row.b_number,
                kind: parse_kind(&row.b_kind)?,
            },
            room_name: row.room_name,
        })
    }
}
