use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TreatmentStatus {
    Upcoming,
    Completed,
    Overdue,
}

impl TreatmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TreatmentStatus::Upcoming => "UPCOMING",
            TreatmentStatus::Completed => "COMPLETED",
            TreatmentStatus::Overdue => "OVERDUE",
        }
    }
}

impl fmt::Display for TreatmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TreatmentStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "UPCOMING" => Ok(TreatmentStatus::Upcoming),
            "COMPLETED" => Ok(TreatmentStatus::Completed),
            "OVERDUE" => Ok(TreatmentStatus::Overdue),
            _ => Err(format!(
                "invalid status '{value}', expected one of: upcoming, completed, overdue"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub room: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Treatment {
    pub id: String,
    pub patient_id: String,
    pub medication: String,
    pub dosage: String,
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: TreatmentStatus,
}

impl Treatment {
    pub fn display_notes(&self) -> Option<&str> {
        self.notes
            .as_deref()
            .map(str::trim)
            .filter(|notes| !notes.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTreatment {
    pub patient_id: String,
    pub medication: String,
    pub dosage: String,
    pub time: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledTreatment {
    #[serde(flatten)]
    pub treatment: Treatment,
    pub patient_name: String,
    pub patient_room: String,
    pub effective_status: TreatmentStatus,
}

impl ScheduledTreatment {
    pub fn is_overdue(&self) -> bool {
        self.effective_status == TreatmentStatus::Overdue
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Schedule {
    pub upcoming: Vec<ScheduledTreatment>,
    pub completed: Vec<ScheduledTreatment>,
}

impl Schedule {
    pub fn is_empty(&self) -> bool {
        self.upcoming.is_empty() && self.completed.is_empty()
    }

    pub fn overdue_count(&self) -> usize {
        self.upcoming.iter().filter(|entry| entry.is_overdue()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientSummary {
    pub patient: Patient,
    pub treatments: Vec<Treatment>,
}
