use std::collections::HashMap;

use chrono::NaiveTime;

use crate::models::{Patient, PatientSummary, Schedule, ScheduledTreatment, Treatment, TreatmentStatus};

pub const UNKNOWN_PATIENT_NAME: &str = "Unknown Patient";
pub const UNKNOWN_PATIENT_ROOM: &str = "N/A";

/// Parses a strict zero-padded "HH:MM" 24-hour time.
pub fn parse_clock_time(value: &str) -> Option<NaiveTime> {
    let bytes = value.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return None;
    }
    if !bytes[..2].iter().chain(&bytes[3..]).all(u8::is_ascii_digit) {
        return None;
    }

    let hours: u32 = value[..2].parse().ok()?;
    let minutes: u32 = value[3..].parse().ok()?;
    NaiveTime::from_hms_opt(hours, minutes, 0)
}

pub fn is_overdue(treatment: &Treatment, now: NaiveTime) -> bool {
    if treatment.status != TreatmentStatus::Upcoming {
        return false;
    }

    match parse_clock_time(&treatment.time) {
        Some(due) => now > due,
        None => false,
    }
}

pub fn effective_status(treatment: &Treatment, now: NaiveTime) -> TreatmentStatus {
    if is_overdue(treatment, now) {
        TreatmentStatus::Overdue
    } else {
        treatment.status
    }
}

pub fn build_schedule(patients: &[Patient], treatments: &[Treatment], now: NaiveTime) -> Schedule {
    let by_id: HashMap<&str, &Patient> = patients
        .iter()
        .map(|patient| (patient.id.as_str(), patient))
        .collect();

    let mut entries: Vec<ScheduledTreatment> = treatments
        .iter()
        .map(|treatment| {
            let patient = by_id.get(treatment.patient_id.as_str());
            ScheduledTreatment {
                treatment: treatment.clone(),
                patient_name: patient
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| UNKNOWN_PATIENT_NAME.to_string()),
                patient_room: patient
                    .map(|p| p.room.clone())
                    .unwrap_or_else(|| UNKNOWN_PATIENT_ROOM.to_string()),
                effective_status: effective_status(treatment, now),
            }
        })
        .collect();

    // String order, stable for equal times.
    entries.sort_by(|a, b| a.treatment.time.cmp(&b.treatment.time));

    let (completed, upcoming): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .partition(|entry| entry.treatment.status == TreatmentStatus::Completed);

    Schedule { upcoming, completed }
}

pub fn patient_roster(patients: &[Patient], treatments: &[Treatment]) -> Vec<PatientSummary> {
    patients
        .iter()
        .map(|patient| PatientSummary {
            patient: patient.clone(),
            treatments: treatments
                .iter()
                .filter(|treatment| treatment.patient_id == patient.id)
                .cloned()
                .collect(),
        })
        .collect()
}
