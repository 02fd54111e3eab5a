use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use bunkhouse_core::{GuestContact, ReservationStatus, RoomKind};

use crate::errors::ServerError;

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[validate(schema(function = new_reservation_dates))]
pub struct NewReservationSchema {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(length(min = 1, max = 128))]
    pub last_name: String,
    #[validate(length(min = 1, max = 64))]
    pub id_number: String,
    #[validate(length(min = 1, max = 32))]
    pub phone: String,
    #[validate(email)]
    pub email: String,
    #[validate(range(min = 1, max = 120))]
    pub age: Option<i32>,
    #[validate(length(min = 1, max = 64))]
    pub country: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[validate(length(max = 512))]
    pub notes: Option<String>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[validate(schema(function = update_reservation_dates))]
pub struct UpdateReservationSchema {
    pub bed_id: Option<i32>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub status: Option<StatusSchema>,
    #[validate(length(max = 512))]
    pub notes: Option<String>,
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 128))]
    pub last_name: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub id_number: Option<String>,
    #[validate(length(min = 1, max = 32))]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(range(min = 1, max = 120))]
    pub age: Option<i32>,
    #[validate(length(min = 1, max = 64))]
    pub country: Option<String>,
}

impl UpdateReservationSchema {
    /// The contact fields of this update, for the guest write-through
    pub fn guest_contact(&self) -> GuestContact {
        GuestContact {
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

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewRoomSchema {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    pub kind: RoomKindSchema,
    #[validate(range(min = 1))]
    pub capacity: i32,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateRoomSchema {
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    pub kind: Option<RoomKindSchema>,
    #[validate(range(min = 1))]
    pub capacity: Option<i32>,
}

/// Reservation status as it appears on the wire
#[derive(Debug, Clone, Copy, ToSchema, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusSchema {
    Confirmed,
    Pending,
    Cancelled,
}

impl From<StatusSchema> for ReservationStatus {
    fn from(value: StatusSchema) -> Self {
        match value {
            StatusSchema::Confirmed => Self::Confirmed,
            StatusSchema::Pending => Self::Pending,
            StatusSchema::Cancelled => Self::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Copy, ToSchema, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomKindSchema {
    Pension,
    Dorm,
}

impl From<RoomKindSchema> for RoomKind {
    fn from(value: RoomKindSchema) -> Self {
        match value {
            RoomKindSchema::Pension => Self::Pension,
            RoomKindSchema::Dorm => Self::Dorm,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AvailabilityQuery {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub kind: Option<RoomKindSchema>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReservationListQuery {
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StatsQuery {
    pub kind: Option<RoomKindSchema>,
    pub room_id: Option<i32>,
}

fn ordered_dates(check_in: NaiveDate, check_out: NaiveDate) -> Result<(), ValidationError> {
    if check_out <= check_in {
        let mut error = ValidationError::new("stay");
        error.message = Some("Check-out must be after check-in".into());
        return Err(error);
    }

    Ok(())
}

fn new_reservation_dates(schema: &NewReservationSchema) -> Result<(), ValidationError> {
    ordered_dates(schema.check_in, schema.check_out)
}

fn update_reservation_dates(schema: &UpdateReservationSchema) -> Result<(), ValidationError> {
    match (schema.check_in, schema.check_out) {
        (Some(check_in), Some(check_out)) => ordered_dates(check_in, check_out),
        (None, None) => Ok(()),
        _ => {
            let mut error = ValidationError::new("stay");
            error.message = Some("checkIn and checkOut must be provided together".into());
            Err(error)
        }
    }
}

pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let extracted_json: Json<T> = Json::from_request(req, state)
            .await
            .map_err(|rejection| ServerError::Validation(rejection.body_text()))?;

        extracted_json
            .0
            .validate()
            .map_err(|errors| ServerError::Validation(errors.to_string()))?;

        Ok(Self(extracted_json.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_payload() -> serde_json::Value {
        json!({
            "name": "Maria",
            "lastName": "Souto",
            "idNumber": "X1234567",
            "phone": "600 000 001",
            "email": "maria@example.com",
            "age": 34,
            "country": "Spain",
            "checkIn": "2025-06-01",
            "checkOut": "2025-06-05"
        })
    }

    #[test]
    fn a_complete_reservation_payload_validates() {
        let schema: NewReservationSchema = serde_json::from_value(valid_payload()).unwrap();

        assert!(schema.validate().is_ok());
    }

    #[test]
    fn age_is_optional_but_bounded() {
        let mut payload = valid_payload();
        payload["age"] = serde_json::Value::Null;
        let schema: NewReservationSchema = serde_json::from_value(payload).unwrap();
        assert!(schema.validate().is_ok());

        let mut payload = valid_payload();
        payload["age"] = json!(0);
        let schema: NewReservationSchema = serde_json::from_value(payload).unwrap();
        assert!(schema.validate().is_err());

        let mut payload = valid_payload();
        payload["age"] = json!(121);
        let schema: NewReservationSchema = serde_json::from_value(payload).unwrap();
        assert!(schema.validate().is_err());
    }

    #[test]
    fn equal_check_in_and_check_out_fail_validation() {
        let mut payload = valid_payload();
        payload["checkOut"] = json!("2025-06-01");

        let schema: NewReservationSchema = serde_json::from_value(payload).unwrap();

        assert!(schema.validate().is_err());
    }

    #[test]
    fn malformed_dates_fail_deserialization() {
        let mut payload = valid_payload();
        payload["checkIn"] = json!("01/06/2025");

        assert!(serde_json::from_value::<NewReservationSchema>(payload).is_err());
    }

    #[test]
    fn missing_required_fields_fail_deserialization() {
        let mut payload = valid_payload();
        payload.as_object_mut().unwrap().remove("idNumber");

        assert!(serde_json::from_value::<NewReservationSchema>(payload).is_err());
    }

    #[test]
    fn updates_require_both_dates_together() {
        let payload = json!({ "checkIn": "2025-06-01" });
        let schema: UpdateReservationSchema = serde_json::from_value(payload).unwrap();
        assert!(schema.validate().is_err());

        let payload = json!({ "checkIn": "2025-06-01", "checkOut": "2025-06-03" });
        let schema: UpdateReservationSchema = serde_json::from_value(payload).unwrap();
        assert!(schema.validate().is_ok());
    }
}
