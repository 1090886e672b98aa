use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use crate::db;
use crate::error::{StoreError, StoreResult};
use crate::models::{NewTreatment, Patient, Treatment, TreatmentStatus};
use crate::schedule;

pub const PATIENTS_KEY: &str = "patients";
pub const TREATMENTS_KEY: &str = "treatments";

pub struct Store {
    pool: SqlitePool,
    patients: Vec<Patient>,
    treatments: Vec<Treatment>,
}

impl Store {
    pub async fn load(pool: SqlitePool) -> StoreResult<Self> {
        let patients: Vec<Patient> = db::read_collection(&pool, PATIENTS_KEY).await?;
        let treatments: Vec<Treatment> = db::read_collection(&pool, TREATMENTS_KEY).await?;
        tracing::debug!(
            patients = patients.len(),
            treatments = treatments.len(),
            "store loaded"
        );

        Ok(Self {
            pool,
            patients,
            treatments,
        })
    }

    pub async fn reload(&mut self) -> StoreResult<()> {
        self.patients = db::read_collection(&self.pool, PATIENTS_KEY).await?;
        self.treatments = db::read_collection(&self.pool, TREATMENTS_KEY).await?;
        Ok(())
    }

    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    pub fn treatments(&self) -> &[Treatment] {
        &self.treatments
    }

    pub fn patient(&self, id: &str) -> Option<&Patient> {
        self.patients.iter().find(|patient| patient.id == id)
    }

    pub async fn add_patient(&mut self, name: &str, room: &str) -> StoreResult<Patient> {
        let name = required("name", name)?;
        let room = required("room", room)?;

        let patient = Patient {
            id: new_id(),
            name,
            room,
        };

        let mut patients = self.patients.clone();
        patients.push(patient.clone());
        db::write_collection(&self.pool, PATIENTS_KEY, &patients).await?;
        self.patients = patients;

        tracing::info!(patient_id = %patient.id, room = %patient.room, "patient added");
        Ok(patient)
    }

    pub async fn add_treatment(&mut self, new: NewTreatment) -> StoreResult<Treatment> {
        validate_treatment(&new)?;
        let medication = new.medication.trim().to_string();
        let dosage = new.dosage.trim().to_string();
        let time = new.time.trim();

        if self.patient(&new.patient_id).is_none() {
            tracing::warn!(patient_id = %new.patient_id, "treatment references an unknown patient");
        }

        let treatment = Treatment {
            id: new_id(),
            patient_id: new.patient_id,
            medication,
            dosage,
            time: time.to_string(),
            notes: new
                .notes
                .map(|notes| notes.trim().to_string())
                .filter(|notes| !notes.is_empty()),
            status: TreatmentStatus::Upcoming,
        };

        let mut treatments = self.treatments.clone();
        treatments.push(treatment.clone());
        db::write_collection(&self.pool, TREATMENTS_KEY, &treatments).await?;
        self.treatments = treatments;

        tracing::info!(
            treatment_id = %treatment.id,
            patient_id = %treatment.patient_id,
            time = %treatment.time,
            "treatment added"
        );
        Ok(treatment)
    }

    pub async fn set_treatment_status(
        &mut self,
        treatment_id: &str,
        status: TreatmentStatus,
    ) -> StoreResult<()> {
        if status == TreatmentStatus::Overdue {
            return Err(StoreError::Validation(
                "overdue is derived from the schedule and cannot be set".to_string(),
            ));
        }

        let mut treatments = self.treatments.clone();
        let treatment = treatments
            .iter_mut()
            .find(|treatment| treatment.id == treatment_id)
            .ok_or_else(|| StoreError::NotFound(format!("treatment {treatment_id}")))?;
        treatment.status = status;

        db::write_collection(&self.pool, TREATMENTS_KEY, &treatments).await?;
        self.treatments = treatments;

        tracing::info!(treatment_id, %status, "treatment status updated");
        Ok(())
    }

    pub async fn toggle_treatment(&mut self, treatment_id: &str) -> StoreResult<TreatmentStatus> {
        let current = self
            .treatments
            .iter()
            .find(|treatment| treatment.id == treatment_id)
            .map(|treatment| treatment.status)
            .ok_or_else(|| StoreError::NotFound(format!("treatment {treatment_id}")))?;

        let next = match current {
            TreatmentStatus::Completed => TreatmentStatus::Upcoming,
            _ => TreatmentStatus::Completed,
        };
        self.set_treatment_status(treatment_id, next).await?;
        Ok(next)
    }
}

pub fn validate_treatment(new: &NewTreatment) -> StoreResult<()> {
    required("medication", &new.medication)?;
    required("dosage", &new.dosage)?;
    let time = new.time.trim();
    if time.is_empty() {
        return Err(StoreError::Validation("time is required".to_string()));
    }
    if schedule::parse_clock_time(time).is_none() {
        return Err(StoreError::Validation(format!(
            "time '{time}' must be a 24-hour HH:MM value"
        )));
    }
    Ok(())
}

fn required(field: &str, value: &str) -> StoreResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(StoreError::Validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn new_id() -> String {
    Uuid::now_v7().to_string()
}
