use std::fmt::Write;

use chrono::NaiveTime;

use crate::models::{PatientSummary, Schedule, ScheduledTreatment};

fn write_entry(output: &mut String, entry: &ScheduledTreatment) {
    let treatment = &entry.treatment;
    let marker = if entry.is_overdue() { " OVERDUE" } else { "" };

    let _ = writeln!(
        output,
        "- {}{} {} {} for {} (Room {}) [{}]",
        treatment.time,
        marker,
        treatment.medication,
        treatment.dosage,
        entry.patient_name,
        entry.patient_room,
        treatment.id
    );

    if let Some(notes) = treatment.display_notes() {
        let _ = writeln!(output, "  Notes: {notes}");
    }
}

pub fn render_schedule(schedule: &Schedule, now: NaiveTime) -> String {
    let mut output = String::new();

    if schedule.is_empty() {
        let _ = writeln!(output, "No treatments scheduled.");
        let _ = writeln!(
            output,
            "Use the patients view to find a patient and add a treatment."
        );
        return output;
    }

    let _ = writeln!(output, "# Treatment Schedule");
    let _ = writeln!(
        output,
        "As of {} ({} overdue)",
        now.format("%H:%M"),
        schedule.overdue_count()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Upcoming Treatments");

    if schedule.upcoming.is_empty() {
        let _ = writeln!(output, "All treatments for today are complete!");
    } else {
        for entry in schedule.upcoming.iter() {
            write_entry(&mut output, entry);
        }
    }

    if !schedule.completed.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Completed Treatments");
        for entry in schedule.completed.iter() {
            write_entry(&mut output, entry);
        }
    }

    output
}

pub fn render_roster(roster: &[PatientSummary]) -> String {
    let mut output = String::new();

    if roster.is_empty() {
        let _ = writeln!(output, "No patients added yet.");
        let _ = writeln!(output, "Run add-patient to get started.");
        return output;
    }

    let _ = writeln!(output, "# Patient List");

    for summary in roster {
        let patient = &summary.patient;
        let _ = writeln!(output);
        let _ = writeln!(output, "## {} (Room {})", patient.name, patient.room);
        let _ = writeln!(output, "Patient id: {}", patient.id);
        let _ = writeln!(output, "Treatments ({})", summary.treatments.len());

        if summary.treatments.is_empty() {
            let _ = writeln!(output, "No treatments scheduled.");
        }
        for treatment in summary.treatments.iter() {
            let _ = writeln!(
                output,
                "- {} - {} [{}]",
                treatment.medication, treatment.time, treatment.status
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Patient, Treatment, TreatmentStatus};
    use crate::schedule::{build_schedule, patient_roster};

    fn at(hours: u32, minutes: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hours, minutes, 0).unwrap()
    }

    fn ward() -> (Vec<Patient>, Vec<Treatment>) {
        let patients = vec![Patient {
            id: "1".to_string(),
            name: "Jane Doe".to_string(),
            room: "302B".to_string(),
        }];
        let treatments = vec![
            Treatment {
                id: "t1".to_string(),
                patient_id: "1".to_string(),
                medication: "Paracetamol".to_string(),
                dosage: "500mg".to_string(),
                time: "08:00".to_string(),
                notes: Some("Give with food".to_string()),
                status: TreatmentStatus::Upcoming,
            },
            Treatment {
                id: "t2".to_string(),
                patient_id: "1".to_string(),
                medication: "Heparin".to_string(),
                dosage: "5000 units".to_string(),
                time: "06:00".to_string(),
                notes: None,
                status: TreatmentStatus::Completed,
            },
        ];
        (patients, treatments)
    }

    #[test]
    fn empty_schedule_has_guidance() {
        let output = render_schedule(&Schedule::default(), at(9, 0));
        assert!(output.starts_with("No treatments scheduled."));
    }

    #[test]
    fn overdue_entries_carry_a_marker() {
        let (patients, treatments) = ward();
        let schedule = build_schedule(&patients, &treatments, at(9, 0));
        let output = render_schedule(&schedule, at(9, 0));

        assert!(output.contains("As of 09:00 (1 overdue)"));
        assert!(output.contains("- 08:00 OVERDUE Paracetamol 500mg for Jane Doe (Room 302B) [t1]"));
        assert!(output.contains("  Notes: Give with food"));
        assert!(output.contains("## Completed Treatments\n- 06:00 Heparin"));
    }

    #[test]
    fn all_done_message_when_nothing_is_open() {
        let (patients, mut treatments) = ward();
        treatments.retain(|t| t.status == TreatmentStatus::Completed);
        let schedule = build_schedule(&patients, &treatments, at(7, 0));
        let output = render_schedule(&schedule, at(7, 0));

        assert!(output.contains("## Upcoming Treatments\nAll treatments for today are complete!"));
    }

    #[test]
    fn roster_lists_persisted_status() {
        let (patients, treatments) = ward();
        let output = render_roster(&patient_roster(&patients, &treatments));

        assert!(output.contains("## Jane Doe (Room 302B)"));
        assert!(output.contains("Treatments (2)"));
        assert!(output.contains("- Paracetamol - 08:00 [UPCOMING]"));
        assert!(output.contains("- Heparin - 06:00 [COMPLETED]"));
    }

    #[test]
    fn empty_roster_prompts_to_add_patients() {
        assert!(render_roster(&[]).starts_with("No patients added yet."));
    }
}
