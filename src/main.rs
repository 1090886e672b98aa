use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::NaiveTime;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod config;
mod db;
mod error;
mod medinfo;
mod models;
mod report;
mod schedule;
mod store;
mod ticker;

use crate::config::Config;
use crate::models::{NewTreatment, TreatmentStatus};
use crate::store::Store;
use crate::ticker::OverdueTicker;

#[derive(Parser)]
#[command(name = "treatment-board")]
#[command(about = "Medication treatment schedule board for nursing staff", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the local database schema
    InitDb,
    /// Load a demo ward when the board is empty
    Seed,
    /// Import treatments from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Add a patient
    AddPatient {
        #[arg(long)]
        name: String,
        #[arg(long)]
        room: String,
    },
    /// Schedule a treatment for a patient
    AddTreatment {
        #[arg(long)]
        patient_id: String,
        #[arg(long)]
        medication: String,
        #[arg(long)]
        dosage: String,
        /// 24-hour HH:MM
        #[arg(long)]
        time: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Mark a treatment as completed
    Complete { id: String },
    /// Reopen a completed treatment
    Undo { id: String },
    /// Complete an open treatment or reopen a completed one
    Toggle { id: String },
    /// Set a treatment's status to upcoming or completed
    SetStatus { id: String, status: TreatmentStatus },
    /// Show the treatment schedule
    Schedule {
        /// Evaluate overdue flags as of this HH:MM instead of now
        #[arg(long, value_parser = parse_at)]
        at: Option<NaiveTime>,
        #[arg(long)]
        json: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show patients and their treatments
    Patients,
    /// Redraw the schedule every interval until interrupted
    Watch {
        #[arg(long, default_value_t = ticker::OVERDUE_CHECK_PERIOD.as_secs(), value_parser = clap::value_parser!(u64).range(1..))]
        interval_secs: u64,
    },
    /// Look up a short medication summary
    Info { medication: String },
}

fn parse_at(value: &str) -> Result<NaiveTime, String> {
    schedule::parse_clock_time(value).ok_or_else(|| format!("'{value}' is not a 24-hour HH:MM time"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    let pool = db::connect(&config.database_url)
        .await
        .with_context(|| format!("failed to open {}", config.database_url))?;
    db::init_db(&pool).await.context("failed to migrate schema")?;
    let mut store = Store::load(pool).await.context("failed to load board")?;

    match cli.command {
        Commands::InitDb => {
            println!("Schema ready.");
        }
        Commands::Seed => {
            if db::seed(&mut store).await? {
                println!("Seed data inserted.");
            } else {
                println!("Board already has patients; nothing seeded.");
            }
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&mut store, &csv).await?;
            println!("Inserted {inserted} treatments from {}.", csv.display());
        }
        Commands::AddPatient { name, room } => {
            let patient = store.add_patient(&name, &room).await?;
            println!("Added {} in room {} ({}).", patient.name, patient.room, patient.id);
        }
        Commands::AddTreatment {
            patient_id,
            medication,
            dosage,
            time,
            notes,
        } => {
            let treatment = store
                .add_treatment(NewTreatment {
                    patient_id,
                    medication,
                    dosage,
                    time,
                    notes,
                })
                .await?;
            println!(
                "Scheduled {} {} at {} ({}).",
                treatment.medication, treatment.dosage, treatment.time, treatment.id
            );
        }
        Commands::Complete { id } => {
            store.set_treatment_status(&id, TreatmentStatus::Completed).await?;
            println!("Treatment {id} completed.");
        }
        Commands::Undo { id } => {
            store.set_treatment_status(&id, TreatmentStatus::Upcoming).await?;
            println!("Treatment {id} reopened.");
        }
        Commands::SetStatus { id, status } => {
            store.set_treatment_status(&id, status).await?;
            println!("Treatment {id} is now {status}.");
        }
        Commands::Toggle { id } => {
            let status = store.toggle_treatment(&id).await?;
            println!("Treatment {id} is now {status}.");
        }
        Commands::Schedule { at, json, out } => {
            let now = at.unwrap_or_else(ticker::local_time_of_day);
            let schedule = schedule::build_schedule(store.patients(), store.treatments(), now);
            let rendered = if json {
                serde_json::to_string_pretty(&schedule)?
            } else {
                report::render_schedule(&schedule, now)
            };

            match out {
                Some(path) => {
                    std::fs::write(&path, rendered)?;
                    println!("Schedule written to {}.", path.display());
                }
                None => print!("{rendered}"),
            }
        }
        Commands::Patients => {
            let roster = schedule::patient_roster(store.patients(), store.treatments());
            print!("{}", report::render_roster(&roster));
        }
        Commands::Watch { interval_secs } => {
            let shutdown = async {
                if let Err(err) = tokio::signal::ctrl_c().await {
                    tracing::warn!(error = %err, "could not listen for Ctrl-C, stopping watch");
                }
            };
            let mut ticker = OverdueTicker::new(Duration::from_secs(interval_secs), shutdown);

            while let Some(now) = ticker.tick().await {
                store.reload().await?;
                let schedule = schedule::build_schedule(store.patients(), store.treatments(), now);
                tracing::debug!(overdue = schedule.overdue_count(), "schedule refreshed");
                print!("\x1b[2J\x1b[H{}", report::render_schedule(&schedule, now));
            }
        }
        Commands::Info { medication } => {
            let client = medinfo::MedicationInfoClient::from_config(&config)
                .context("failed to build HTTP client")?;
            println!("{}", client.get_medication_info(&medication).await);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_status_parses_status_names() {
        let cli = Cli::try_parse_from(["treatment-board", "set-status", "t1", "completed"]).unwrap();
        match cli.command {
            Commands::SetStatus { id, status } => {
                assert_eq!(id, "t1");
                assert_eq!(status, TreatmentStatus::Completed);
            }
            _ => panic!("expected set-status"),
        }

        assert!(Cli::try_parse_from(["treatment-board", "set-status", "t1", "done"]).is_err());
    }

    #[test]
    fn watch_defaults_to_the_overdue_check_period() {
        let cli = Cli::try_parse_from(["treatment-board", "watch"]).unwrap();
        match cli.command {
            Commands::Watch { interval_secs } => assert_eq!(interval_secs, 60),
            _ => panic!("expected watch"),
        }

        assert!(Cli::try_parse_from(["treatment-board", "watch", "--interval-secs", "0"]).is_err());
    }
}
