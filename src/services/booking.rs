use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{ffi, Connection};

use crate::db::{self, queries};
use crate::models::{Appointment, AppointmentStatus, NewAppointment};

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Esse horário acabou de ser reservado por outra pessoa")]
    SlotTaken,

    #[error("Erro ao criar agendamento")]
    Storage(#[source] anyhow::Error),
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn find_appointment(
        &self,
        date: NaiveDate,
        time: &str,
        statuses: &[AppointmentStatus],
    ) -> anyhow::Result<Option<Appointment>>;

    async fn create_appointment(&self, new: &NewAppointment) -> Result<Appointment, BookingError>;
}

pub struct SqliteBookingStore {
    db: Arc<Mutex<Connection>>,
}

impl SqliteBookingStore {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookingStore for SqliteBookingStore {
    async fn find_appointment(
        &self,
        date: NaiveDate,
        time: &str,
        statuses: &[AppointmentStatus],
    ) -> anyhow::Result<Option<Appointment>> {
        let db = db::lock(&self.db)?;
        queries::find_appointment(&db, date, time, statuses)
    }

    async fn create_appointment(&self, new: &NewAppointment) -> Result<Appointment, BookingError> {
        let db = db::lock(&self.db).map_err(BookingError::Storage)?;
        queries::insert_appointment(&db, new).map_err(insert_error)
    }
}

// Only the active-slot unique index means someone else got the slot first.
fn insert_error(e: rusqlite::Error) -> BookingError {
    match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            BookingError::SlotTaken
        }
        other => BookingError::Storage(other.into()),
    }
}

#[derive(Clone)]
pub struct BookingGateway {
    store: Arc<dyn BookingStore>,
}

impl BookingGateway {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    // Fails closed: a storage error reports the slot as taken.
    pub async fn check_availability(&self, date: NaiveDate, time: &str) -> bool {
        match self
            .store
            .find_appointment(date, time, &AppointmentStatus::ACTIVE)
            .await
        {
            Ok(existing) => existing.is_none(),
            Err(e) => {
                tracing::error!(error = %e, %date, time, "availability check failed");
                false
            }
        }
    }

    pub async fn create_appointment(
        &self,
        new: &NewAppointment,
    ) -> Result<Appointment, BookingError> {
        match self.store.create_appointment(new).await {
            Ok(appointment) => {
                tracing::info!(
                    id = %appointment.id,
                    date = %appointment.scheduled_date,
                    time = %appointment.scheduled_time,
                    class_type = %appointment.class_type,
                    "appointment created"
                );
                Ok(appointment)
            }
            Err(e) => {
                tracing::error!(error = ?e, "failed to create appointment");
                Err(e)
            }
        }
    }
}
