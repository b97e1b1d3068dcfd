//! Consultation record repository.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use intake_core::{
    ConditionType, ConsultationDraft, ConsultationMode, ConsultationRecord, ConsultationStatus,
    Gender, RecordPatch,
};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::StoreError;

const SELECT_COLUMNS: &str = "id, number, patient_name, age, gender, contact, national_id,
     condition_name, condition_type, body_system, fee, mode, symptoms, onset_date,
     medical_history, submitted_at, paid, notification_sent, status";

/// Persist a submitted draft: assigns the identifier, the sequential
/// display number and the submission timestamp inside one transaction.
pub fn add_consultation(
    conn: &mut Connection,
    draft: ConsultationDraft,
) -> Result<ConsultationRecord, StoreError> {
    let tx = conn.transaction()?;

    let number: u32 = tx.query_row(
        "SELECT value + 1 FROM counters WHERE name = 'patient_number'",
        [],
        |row| row.get(0),
    )?;
    tx.execute(
        "UPDATE counters SET value = ?1 WHERE name = 'patient_number'",
        params![number],
    )?;

    let record = ConsultationRecord::from_draft(
        draft,
        Uuid::new_v4().to_string(),
        Some(number),
        Utc::now(),
    );

    tx.execute(
        "INSERT INTO consultations (id, number, patient_name, age, gender, contact, national_id,
         condition_name, condition_type, body_system, fee, mode, symptoms, onset_date,
         medical_history, submitted_at, paid, notification_sent, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
        params![
            record.id,
            record.number,
            record.patient_name,
            record.age,
            record.gender.as_str(),
            record.contact,
            record.national_id,
            record.condition_name,
            record.condition_type.as_str(),
            record.body_system,
            record.fee,
            record.mode.as_str(),
            record.symptoms,
            record.onset_date.map(|d| d.to_string()),
            record.medical_history,
            record.submitted_at.to_rfc3339(),
            record.paid as i32,
            record.notification_sent as i32,
            record.status.as_str(),
        ],
    )?;
    tx.commit()?;

    tracing::info!(id = %record.id, number, "consultation stored");
    Ok(record)
}

pub fn get_consultation(
    conn: &Connection,
    id: &str,
) -> Result<Option<ConsultationRecord>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SELECT_COLUMNS} FROM consultations WHERE id = ?1"
    ))?;

    let result = stmt.query_row(params![id], map_row);
    match result {
        Ok(row) => Ok(Some(record_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All records, oldest submission first.
pub fn list_consultations(conn: &Connection) -> Result<Vec<ConsultationRecord>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SELECT_COLUMNS} FROM consultations ORDER BY submitted_at ASC, number ASC"
    ))?;

    let rows = stmt.query_map([], map_row)?;
    let mut records = Vec::new();
    for row in rows {
        records.push(record_from_row(row?)?);
    }
    Ok(records)
}

/// Apply one field-level patch. Patching an unknown id changes nothing
/// and is not an error.
pub fn update_consultation(
    conn: &Connection,
    id: &str,
    patch: &RecordPatch,
) -> Result<(), StoreError> {
    let affected = match patch {
        RecordPatch::SetStatus(status) => conn.execute(
            "UPDATE consultations SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?,
        RecordPatch::SetPaid(paid) => conn.execute(
            "UPDATE consultations SET paid = ?1 WHERE id = ?2",
            params![*paid as i32, id],
        )?,
        RecordPatch::SetNotificationSent(sent) => conn.execute(
            "UPDATE consultations SET notification_sent = ?1 WHERE id = ?2",
            params![*sent as i32, id],
        )?,
        RecordPatch::SetContact(contact) => conn.execute(
            "UPDATE consultations SET contact = ?1 WHERE id = ?2",
            params![contact, id],
        )?,
        RecordPatch::SetSymptoms(symptoms) => conn.execute(
            "UPDATE consultations SET symptoms = ?1 WHERE id = ?2",
            params![symptoms, id],
        )?,
        RecordPatch::SetMedicalHistory(history) => conn.execute(
            "UPDATE consultations SET medical_history = ?1 WHERE id = ?2",
            params![history, id],
        )?,
    };

    if affected == 0 {
        tracing::debug!(id, "patch matched no consultation");
    }
    Ok(())
}

/// Remove a record. Unknown ids are a no-op.
pub fn delete_consultation(conn: &Connection, id: &str) -> Result<(), StoreError> {
    let affected = conn.execute("DELETE FROM consultations WHERE id = ?1", params![id])?;
    if affected > 0 {
        tracing::info!(id, "consultation deleted");
    }
    Ok(())
}

// Internal row type before enum/date parsing.
struct ConsultationRow {
    id: String,
    number: Option<u32>,
    patient_name: String,
    age: u32,
    gender: String,
    contact: String,
    national_id: Option<String>,
    condition_name: String,
    condition_type: String,
    body_system: String,
    fee: u32,
    mode: String,
    symptoms: String,
    onset_date: Option<String>,
    medical_history: Option<String>,
    submitted_at: String,
    paid: i32,
    notification_sent: i32,
    status: String,
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ConsultationRow> {
    Ok(ConsultationRow {
        id: row.get(0)?,
        number: row.get(1)?,
        patient_name: row.get(2)?,
        age: row.get(3)?,
        gender: row.get(4)?,
        contact: row.get(5)?,
        national_id: row.get(6)?,
        condition_name: row.get(7)?,
        condition_type: row.get(8)?,
        body_system: row.get(9)?,
        fee: row.get(10)?,
        mode: row.get(11)?,
        symptoms: row.get(12)?,
        onset_date: row.get(13)?,
        medical_history: row.get(14)?,
        submitted_at: row.get(15)?,
        paid: row.get(16)?,
        notification_sent: row.get(17)?,
        status: row.get(18)?,
    })
}

fn record_from_row(row: ConsultationRow) -> Result<ConsultationRecord, StoreError> {
    let submitted_at = DateTime::parse_from_rfc3339(&row.submitted_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("submitted_at: {e}")))?;

    Ok(ConsultationRecord {
        id: row.id,
        number: row.number,
        patient_name: row.patient_name,
        age: row.age,
        gender: Gender::from_str(&row.gender)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?,
        contact: row.contact,
        national_id: row.national_id,
        condition_name: row.condition_name,
        condition_type: ConditionType::from_str(&row.condition_type)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?,
        body_system: row.body_system,
        fee: row.fee,
        mode: ConsultationMode::from_str(&row.mode)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?,
        symptoms: row.symptoms,
        onset_date: row
            .onset_date
            .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        medical_history: row.medical_history,
        submitted_at,
        paid: row.paid != 0,
        notification_sent: row.notification_sent != 0,
        status: ConsultationStatus::from_str(&row.status)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?,
    })
}
