use std::path::Path;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use crate::error::{StoreError, StoreResult};
use crate::models::NewTreatment;
use crate::store::{self, Store};

pub async fn connect(database_url: &str) -> StoreResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    Ok(pool)
}

pub async fn init_db(pool: &SqlitePool) -> StoreResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Reads the collection stored under `key`; a missing key is an empty collection.
pub async fn read_collection<T: DeserializeOwned>(
    pool: &SqlitePool,
    key: &str,
) -> StoreResult<Vec<T>> {
    let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?1")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let value: String = row.get("value");
            Ok(serde_json::from_str(&value)?)
        }
        None => Ok(Vec::new()),
    }
}

pub async fn write_collection<T: Serialize>(
    pool: &SqlitePool,
    key: &str,
    items: &[T],
) -> StoreResult<()> {
    let value = serde_json::to_string(items)?;
    sqlx::query(
        r#"
        INSERT INTO kv_store (key, value)
        VALUES (?1, ?2)
        ON CONFLICT (key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

/// Loads a small demo ward. Does nothing when the board already has patients.
pub async fn seed(store: &mut Store) -> StoreResult<bool> {
    if !store.patients().is_empty() {
        tracing::info!(patients = store.patients().len(), "board already has data, skipping seed");
        return Ok(false);
    }

    let patients = vec![
        ("Jane Doe", "302B"),
        ("Samuel Okafor", "118"),
        ("Mei Tanaka", "204A"),
    ];

    let mut ids = Vec::new();
    for (name, room) in patients {
        ids.push(store.add_patient(name, room).await?.id);
    }

    let treatments = vec![
        (0, "Paracetamol", "500mg", "08:00", Some("Give with food")),
        (0, "Enoxaparin", "40mg SC", "18:00", None),
        (1, "Amoxicillin", "875mg", "07:30", None),
        (1, "Metformin", "1000mg", "12:00", Some("Check glucose first")),
        (2, "Furosemide", "20mg IV", "10:00", Some("Monitor urine output")),
    ];

    for (patient, medication, dosage, time, notes) in treatments {
        store
            .add_treatment(NewTreatment {
                patient_id: ids[patient].clone(),
                medication: medication.to_string(),
                dosage: dosage.to_string(),
                time: time.to_string(),
                notes: notes.map(str::to_string),
            })
            .await?;
    }

    Ok(true)
}

pub async fn import_csv(store: &mut Store, csv_path: &Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        patient_name: String,
        room: String,
        medication: String,
        dosage: String,
        time: String,
        notes: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result?;
        let line = index + 2;

        let treatment = NewTreatment {
            patient_id: String::new(),
            medication: row.medication,
            dosage: row.dosage,
            time: row.time,
            notes: row.notes,
        };
        if let Err(err) = store::validate_treatment(&treatment) {
            match err {
                StoreError::Validation(reason) => {
                    tracing::warn!(line, %reason, "skipping CSV row");
                    continue;
                }
                err => return Err(err.into()),
            }
        }

        let existing = store
            .patients()
            .iter()
            .find(|p| p.name == row.patient_name.trim() && p.room == row.room.trim())
            .map(|p| p.id.clone());

        let patient_id = match existing {
            Some(id) => id,
            None => match store.add_patient(&row.patient_name, &row.room).await {
                Ok(patient) => patient.id,
                Err(StoreError::Validation(reason)) => {
                    tracing::warn!(line, %reason, "skipping CSV row");
                    continue;
                }
                Err(err) => return Err(err.into()),
            },
        };

        let added = store
            .add_treatment(NewTreatment {
                patient_id,
                ..treatment
            })
            .await;

        match added {
            Ok(_) => inserted += 1,
            Err(StoreError::Validation(reason)) => {
                tracing::warn!(line, %reason, "skipping CSV row");
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(inserted)
}

#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    init_db(&pool).await.unwrap();
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Patient;

    #[tokio::test]
    async fn missing_key_reads_as_empty() {
        let pool = memory_pool().await;
        let patients: Vec<Patient> = read_collection(&pool, "patients").await.unwrap();
        assert!(patients.is_empty());
    }

    #[tokio::test]
    async fn writes_replace_the_whole_collection() {
        let pool = memory_pool().await;
        let first = vec![Patient {
            id: "1".to_string(),
            name: "Jane Doe".to_string(),
            room: "302B".to_string(),
        }];
        write_collection(&pool, "patients", &first).await.unwrap();
        write_collection::<Patient>(&pool, "patients", &[]).await.unwrap();

        let stored: Vec<Patient> = read_collection(&pool, "patients").await.unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn seed_only_runs_on_an_empty_board() {
        let pool = memory_pool().await;
        let mut store = Store::load(pool).await.unwrap();

        assert!(seed(&mut store).await.unwrap());
        assert_eq!(store.patients().len(), 3);
        assert_eq!(store.treatments().len(), 5);

        assert!(!seed(&mut store).await.unwrap());
        assert_eq!(store.treatments().len(), 5);
    }

    #[tokio::test]
    async fn import_reuses_patients_and_skips_invalid_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("treatments.csv");
        std::fs::write(
            &path,
            "patient_name,room,medication,dosage,time,notes\n\
             Jane Doe,302B,Paracetamol,500mg,08:00,\n\
             Jane Doe,302B,Ibuprofen,200mg,14:00,After lunch\n\
             Jane Doe,302B,Ibuprofen,200mg,2pm,\n\
             ,110,Aspirin,75mg,09:00,\n\
             John Roe,110,Aspirin,75mg,09:00,\n",
        )
        .unwrap();

        let pool = memory_pool().await;
        let mut store = Store::load(pool).await.unwrap();
        let inserted = import_csv(&mut store, &path).await.unwrap();

        assert_eq!(inserted, 3);
        assert_eq!(store.patients().len(), 2);
        assert_eq!(store.treatments()[1].notes.as_deref(), Some("After lunch"));
        assert_eq!(store.treatments()[0].notes, None);
    }

    #[tokio::test]
    async fn rejected_row_does_not_create_its_patient() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("treatments.csv");
        std::fs::write(
            &path,
            "patient_name,room,medication,dosage,time,notes\n\
             Alice Smith,5,Aspirin,75mg,2pm,\n\
             Bob Stone,7,,75mg,09:00,\n",
        )
        .unwrap();

        let pool = memory_pool().await;
        let mut store = Store::load(pool.clone()).await.unwrap();
        let inserted = import_csv(&mut store, &path).await.unwrap();

        assert_eq!(inserted, 0);
        assert!(store.patients().is_empty());
        let stored: Vec<Patient> = read_collection(&pool, "patients").await.unwrap();
        assert!(stored.is_empty());
    }
}
