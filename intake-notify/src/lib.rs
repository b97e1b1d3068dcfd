//! Outbound messaging: notification payloads, email bodies and the
//! `mailto:` fallback.
//!
//! The transactional email service is an opaque collaborator behind the
//! [`Mailer`] trait; this crate only composes what gets sent. When no
//! mailer is available, or sending fails, the caller receives a
//! ready-to-open `mailto:` URI instead of an error.

use serde::{Deserialize, Serialize};

use intake_core::ConsultationRecord;

/// Body of the consultation notification function, field names fixed by
/// the receiving endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsultationNotification {
    #[serde(rename = "patientName")]
    pub patient_name: String,
    #[serde(rename = "nationalId")]
    pub national_id: Option<String>,
    pub age: u32,
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
    pub symptoms: String,
    #[serde(rename = "medicalHistory")]
    pub medical_history: Option<String>,
    pub disease: String,
    #[serde(rename = "consultationMode")]
    pub consultation_mode: String,
    #[serde(rename = "conditionType")]
    pub condition_type: String,
    pub fee: u32,
}

impl From<&ConsultationRecord> for ConsultationNotification {
    fn from(record: &ConsultationRecord) -> Self {
        Self {
            patient_name: record.patient_name.clone(),
            national_id: record.national_id.clone(),
            age: record.age,
            phone_number: record.contact.clone(),
            symptoms: record.symptoms.clone(),
            medical_history: record.medical_history.clone(),
            disease: record.condition_name.clone(),
            consultation_mode: record.mode.as_str().to_string(),
            condition_type: record.condition_type.as_str().to_string(),
            fee: record.fee,
        }
    }
}

/// Body of the contact-form function.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContactMessage {
    pub to: String,
    pub subject: String,
    pub content: String,
    pub from_email: String,
    pub from_name: String,
}

/// Newsletter variant of the same function, selected by its `type` tag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsletterSignup {
    #[serde(rename = "type")]
    pub kind: String,
    pub email: String,
}

impl NewsletterSignup {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            kind: "newsletter".to_string(),
            email: email.into(),
        }
    }
}

/// Errors from the injected mail collaborator.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("mailer error: {0}")]
    Mailer(String),
}

/// The transactional email service, injected by the caller.
pub trait Mailer {
    fn send(&self, notification: &ConsultationNotification) -> Result<(), NotifyError>;
}

/// Mailer configuration; the bearer secret comes from the environment,
/// as the serverless function read it.
#[derive(Debug, Clone, Default)]
pub struct MailerConfig {
    pub api_key: Option<String>,
}

impl MailerConfig {
    pub const API_KEY_VAR: &'static str = "MAIL_API_KEY";

    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var(Self::API_KEY_VAR).ok(),
        }
    }
}

/// How a notification ultimately left the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The mailer accepted the notification.
    Sent,
    /// No mailer, or the mailer failed: here is the `mailto:` URI to
    /// open instead. Not reported as an error.
    MailtoFallback(String),
}

/// Send through the mailer when one is available, otherwise fall back
/// to a pre-filled `mailto:` URI addressed to the clinic inbox.
pub fn dispatch_or_mailto(
    mailer: Option<&dyn Mailer>,
    record: &ConsultationRecord,
    fallback_to: &str,
) -> DispatchOutcome {
    if let Some(mailer) = mailer {
        let notification = ConsultationNotification::from(record);
        match mailer.send(&notification) {
            Ok(()) => return DispatchOutcome::Sent,
            Err(e) => {
                tracing::warn!(error = %e, "mailer failed, falling back to mailto");
            }
        }
    }

    let subject = format!("New consultation request - {}", record.patient_name);
    let body = compose_summary_text(record);
    DispatchOutcome::MailtoFallback(mailto_uri(fallback_to, &subject, &body))
}

/// Plaintext summary used for the `mailto:` body.
pub fn compose_summary_text(record: &ConsultationRecord) -> String {
    let mut lines = vec![
        "New consultation request".to_string(),
        format!("Patient: {}", record.patient_name),
        format!("Age: {}", record.age),
        format!("Gender: {}", record.gender.as_str()),
        format!("Contact: {}", record.contact),
    ];
    if let Some(national_id) = &record.national_id {
        lines.push(format!("National ID: {national_id}"));
    }
    lines.push(format!("Condition type: {}", record.condition_type.as_str()));
    lines.push(format!("Body system: {}", record.body_system));
    lines.push(format!("Condition: {}", record.condition_name));
    lines.push(format!("Consultation mode: {}", record.mode.as_str()));
    lines.push(format!("Fee: {}", record.fee));
    lines.push(format!("Symptoms: {}", record.symptoms));
    if let Some(history) = &record.medical_history {
        lines.push(format!("Medical history: {history}"));
    }
    if let Some(onset) = &record.onset_date {
        lines.push(format!("Symptom onset: {onset}"));
    }
    lines.push(format!("Submitted at: {}", record.submitted_at.to_rfc3339()));
    lines.join("\n")
}

/// HTML body for the notification email.
pub fn compose_notification_html(record: &ConsultationRecord) -> String {
    let mut rows = vec![
        ("Patient", escape_html(&record.patient_name)),
        ("Age", record.age.to_string()),
        ("Gender", record.gender.as_str().to_string()),
        ("Contact", escape_html(&record.contact)),
    ];
    if let Some(national_id) = &record.national_id {
        rows.push(("National ID", escape_html(national_id)));
    }
    rows.push(("Condition type", record.condition_type.as_str().to_string()));
    rows.push(("Body system", escape_html(&record.body_system)));
    rows.push(("Condition", escape_html(&record.condition_name)));
    rows.push(("Consultation mode", record.mode.as_str().to_string()));
    rows.push(("Fee", record.fee.to_string()));
    if let Some(onset) = &record.onset_date {
        rows.push(("Symptom onset", onset.to_string()));
    }
    rows.push(("Submitted at", record.submitted_at.to_rfc3339()));

    let mut html = String::from("<html><body>\n<h2>New consultation request</h2>\n<table>\n");
    for (label, value) in rows {
        html.push_str(&format!(
            "  <tr><td><strong>{label}</strong></td><td>{value}</td></tr>\n"
        ));
    }
    html.push_str("</table>\n");
    html.push_str(&format!(
        "<h3>Symptoms</h3>\n<p>{}</p>\n",
        escape_html(&record.symptoms)
    ));
    if let Some(history) = &record.medical_history {
        html.push_str(&format!(
            "<h3>Medical history</h3>\n<p>{}</p>\n",
            escape_html(history)
        ));
    }
    html.push_str("</body></html>\n");
    html
}

/// `mailto:` URI with URL-encoded subject and body.
pub fn mailto_uri(to: &str, subject: &str, body: &str) -> String {
    format!(
        "mailto:{to}?subject={}&body={}",
        percent_encode(subject),
        percent_encode(body)
    )
}

fn percent_encode(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char);
            }
            other => {
                encoded.push_str(&format!("%{other:02X}"));
            }
        }
    }
    encoded
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
