//! Logic lõi cho luồng tiếp nhận tư vấn khám bệnh.

pub mod catalog;
pub mod wizard;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub use catalog::SystemGroup;
pub use wizard::{ConsultationWizard, WizardStep};

/// Cấu hình điều chỉnh thời hạn phiên đăng nhập và chính sách tải ảnh.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntakeConfig {
    /// Thời hạn (giờ) một phiên đăng nhập còn hiệu lực.
    pub session_ttl_hours: u32,
    /// Chính sách kiểm tra file ảnh trước khi lưu trữ.
    pub upload: UploadPolicy,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            session_ttl_hours: 24,
            upload: UploadPolicy::default(),
        }
    }
}

/// Nhóm phân loại bệnh ở bước đầu của wizard, quyết định phí tư vấn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    Acute,
    Chronic,
    Obstetrics,
    Paediatrics,
    Surgical,
}

impl ConditionType {
    pub const ALL: [ConditionType; 5] = [
        ConditionType::Acute,
        ConditionType::Chronic,
        ConditionType::Obstetrics,
        ConditionType::Paediatrics,
        ConditionType::Surgical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionType::Acute => "acute",
            ConditionType::Chronic => "chronic",
            ConditionType::Obstetrics => "obstetrics",
            ConditionType::Paediatrics => "paediatrics",
            ConditionType::Surgical => "surgical",
        }
    }

    /// Phí tư vấn cố định theo nhóm bệnh (đơn vị tiền tệ nguyên).
    pub fn fee(&self) -> u32 {
        match self {
            ConditionType::Chronic => 10_000,
            _ => 5_000,
        }
    }
}

impl std::str::FromStr for ConditionType {
    type Err = IntakeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "acute" => Ok(ConditionType::Acute),
            "chronic" => Ok(ConditionType::Chronic),
            "obstetrics" => Ok(ConditionType::Obstetrics),
            "paediatrics" => Ok(ConditionType::Paediatrics),
            "surgical" => Ok(ConditionType::Surgical),
            other => Err(IntakeError::UnknownConditionType(other.to_string())),
        }
    }
}

/// Phí tư vấn cho một nhóm bệnh.
pub fn consultation_fee(condition_type: ConditionType) -> u32 {
    condition_type.fee()
}

/// Giới tính khai trên phiếu tiếp nhận.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = IntakeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(IntakeError::Parse(format!("Giới tính không hợp lệ: {other}"))),
        }
    }
}

/// Hình thức tư vấn bệnh nhân chọn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConsultationMode {
    Chat,
    Video,
    Phone,
    InPerson,
}

impl ConsultationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultationMode::Chat => "chat",
            ConsultationMode::Video => "video",
            ConsultationMode::Phone => "phone",
            ConsultationMode::InPerson => "in_person",
        }
    }
}

impl std::str::FromStr for ConsultationMode {
    type Err = IntakeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "chat" => Ok(ConsultationMode::Chat),
            "video" => Ok(ConsultationMode::Video),
            "phone" => Ok(ConsultationMode::Phone),
            "in_person" => Ok(ConsultationMode::InPerson),
            other => Err(IntakeError::Parse(format!(
                "Hình thức tư vấn không hợp lệ: {other}"
            ))),
        }
    }
}

/// Trạng thái xử lý của một ca tư vấn. Không ràng buộc thứ tự chuyển trạng thái.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConsultationStatus {
    Pending,
    InProgress,
    AwaitingPayment,
    Completed,
}

impl ConsultationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultationStatus::Pending => "pending",
            ConsultationStatus::InProgress => "in_progress",
            ConsultationStatus::AwaitingPayment => "awaiting_payment",
            ConsultationStatus::Completed => "completed",
        }
    }
}

impl std::str::FromStr for ConsultationStatus {
    type Err = IntakeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "pending" => Ok(ConsultationStatus::Pending),
            "in_progress" => Ok(ConsultationStatus::InProgress),
            "awaiting_payment" => Ok(ConsultationStatus::AwaitingPayment),
            "completed" => Ok(ConsultationStatus::Completed),
            other => Err(IntakeError::Parse(format!(
                "Trạng thái không hợp lệ: {other}"
            ))),
        }
    }
}

/// Phiếu thông tin bệnh nhân điền ở bước cuối của wizard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntakeForm {
    pub patient_name: String,
    pub age: u32,
    pub gender: Gender,
    pub contact: String,
    #[serde(default)]
    pub national_id: Option<String>,
    pub mode: ConsultationMode,
    pub symptoms: String,
    #[serde(default)]
    pub onset_date: Option<NaiveDate>,
    #[serde(default)]
    pub medical_history: Option<String>,
}

impl IntakeForm {
    /// Kiểm tra các trường bắt buộc không rỗng. Không kiểm tra định dạng.
    pub fn validate(&self) -> Result<(), IntakeError> {
        if self.patient_name.trim().is_empty() {
            return Err(IntakeError::MissingField("patient_name"));
        }
        if self.contact.trim().is_empty() {
            return Err(IntakeError::MissingField("contact"));
        }
        if self.symptoms.trim().is_empty() {
            return Err(IntakeError::MissingField("symptoms"));
        }
        Ok(())
    }
}

/// Bản nháp ca tư vấn do wizard dựng, chưa có định danh và số thứ tự.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsultationDraft {
    pub patient_name: String,
    pub age: u32,
    pub gender: Gender,
    pub contact: String,
    pub national_id: Option<String>,
    pub condition_name: String,
    pub condition_type: ConditionType,
    pub body_system: String,
    pub fee: u32,
    pub mode: ConsultationMode,
    pub symptoms: String,
    pub onset_date: Option<NaiveDate>,
    pub medical_history: Option<String>,
}

/// Hồ sơ ca tư vấn hoàn chỉnh, dùng chung cho cả trang quản trị và bác sĩ.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsultationRecord {
    pub id: String,
    /// Số thứ tự hiển thị, cấp tuần tự khi lưu.
    pub number: Option<u32>,
    pub patient_name: String,
    pub age: u32,
    pub gender: Gender,
    pub contact: String,
    #[serde(default)]
    pub national_id: Option<String>,
    pub condition_name: String,
    pub condition_type: ConditionType,
    pub body_system: String,
    pub fee: u32,
    pub mode: ConsultationMode,
    pub symptoms: String,
    #[serde(default)]
    pub onset_date: Option<NaiveDate>,
    #[serde(default)]
    pub medical_history: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub paid: bool,
    pub notification_sent: bool,
    pub status: ConsultationStatus,
}

impl ConsultationRecord {
    /// Hoàn thiện bản nháp thành hồ sơ: trạng thái ban đầu luôn là `pending`.
    pub fn from_draft(
        draft: ConsultationDraft,
        id: String,
        number: Option<u32>,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            number,
            patient_name: draft.patient_name,
            age: draft.age,
            gender: draft.gender,
            contact: draft.contact,
            national_id: draft.national_id,
            condition_name: draft.condition_name,
            condition_type: draft.condition_type,
            body_system: draft.body_system,
            fee: draft.fee,
            mode: draft.mode,
            symptoms: draft.symptoms,
            onset_date: draft.onset_date,
            medical_history: draft.medical_history,
            submitted_at,
            paid: false,
            notification_sent: false,
            status: ConsultationStatus::Pending,
        }
    }

    /// Áp một thay đổi đơn lẻ lên hồ sơ, các trường khác giữ nguyên.
    pub fn apply(&mut self, patch: &RecordPatch) {
        match patch {
            RecordPatch::SetStatus(status) => self.status = *status,
            RecordPatch::SetPaid(paid) => self.paid = *paid,
            RecordPatch::SetNotificationSent(sent) => self.notification_sent = *sent,
            RecordPatch::SetContact(contact) => self.contact = contact.clone(),
            RecordPatch::SetSymptoms(symptoms) => self.symptoms = symptoms.clone(),
            RecordPatch::SetMedicalHistory(history) => {
                self.medical_history = history.clone();
            }
        }
    }
}

/// Thay đổi từng trường một thay cho kiểu patch gộp tự do.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RecordPatch {
    SetStatus(ConsultationStatus),
    SetPaid(bool),
    SetNotificationSent(bool),
    SetContact(String),
    SetSymptoms(String),
    SetMedicalHistory(Option<String>),
}

/// Số liệu tổng hợp cho bảng điều khiển.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub awaiting_payment: usize,
    pub completed: usize,
    pub paid: usize,
}

impl DashboardStats {
    pub fn collect(records: &[ConsultationRecord]) -> Self {
        let mut stats = Self {
            total: records.len(),
            ..Self::default()
        };
        for record in records {
            match record.status {
                ConsultationStatus::Pending => stats.pending += 1,
                ConsultationStatus::InProgress => stats.in_progress += 1,
                ConsultationStatus::AwaitingPayment => stats.awaiting_payment += 1,
                ConsultationStatus::Completed => stats.completed += 1,
            }
            if record.paid {
                stats.paid += 1;
            }
        }
        stats
    }
}

/// Ảnh minh họa bệnh học đã tải lên kho lưu trữ.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiseaseImage {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub image_url: String,
    /// Thứ tự hiển thị, sắp tăng dần khi liệt kê.
    pub display_order: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Vai trò của phiên đăng nhập.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionRole {
    Admin,
    Doctor,
}

impl SessionRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionRole::Admin => "admin",
            SessionRole::Doctor => "doctor",
        }
    }
}

impl std::str::FromStr for SessionRole {
    type Err = IntakeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "admin" => Ok(SessionRole::Admin),
            "doctor" => Ok(SessionRole::Doctor),
            other => Err(IntakeError::Parse(format!("Vai trò không hợp lệ: {other}"))),
        }
    }
}

/// Phiên đăng nhập đã cấp, chỉ hợp lệ khi còn trong thời hạn cấu hình.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub token: String,
    pub identity: String,
    pub role: SessionRole,
    pub issued_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>, ttl_hours: u32) -> bool {
        now.signed_duration_since(self.issued_at) > Duration::hours(ttl_hours as i64)
    }
}

/// Chính sách kiểm tra ảnh trước khi đụng tới tầng lưu trữ.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadPolicy {
    /// Dung lượng tối đa (byte).
    pub max_bytes: u64,
    /// Danh sách kiểu MIME được phép.
    pub allowed_types: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: 5 * 1024 * 1024,
            allowed_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/webp".to_string(),
                "image/gif".to_string(),
            ],
        }
    }
}

impl UploadPolicy {
    pub fn check(&self, mime: &str, size: u64) -> Result<(), IntakeError> {
        if !self.allowed_types.iter().any(|allowed| allowed == mime) {
            return Err(IntakeError::UnsupportedFileType(mime.to_string()));
        }
        if size > self.max_bytes {
            return Err(IntakeError::FileTooLarge {
                size,
                max: self.max_bytes,
            });
        }
        Ok(())
    }
}

/// Lỗi chung của luồng tiếp nhận.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("Thiếu trường bắt buộc: {0}")]
    MissingField(&'static str),
    #[error("Nhóm bệnh không tồn tại: {0}")]
    UnknownConditionType(String),
    #[error("Lựa chọn không có trong danh mục: {0}")]
    UnknownSelection(String),
    #[error("Thao tác không hợp lệ ở bước {0}")]
    InvalidTransition(&'static str),
    #[error("File quá lớn: {size} byte, tối đa {max} byte")]
    FileTooLarge { size: u64, max: u64 },
    #[error("Kiểu file không được phép: {0}")]
    UnsupportedFileType(String),
    #[error("Không đọc được dữ liệu: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> ConsultationRecord {
        let draft = ConsultationDraft {
            patient_name: "Tran Thi B".to_string(),
            age: 52,
            gender: Gender::Female,
            contact: "0905123456".to_string(),
            national_id: None,
            condition_name: "Hypertension".to_string(),
            condition_type: ConditionType::Chronic,
            body_system: "Cardiovascular System".to_string(),
            fee: ConditionType::Chronic.fee(),
            mode: ConsultationMode::Video,
            symptoms: "Đau đầu kéo dài, chóng mặt".to_string(),
            onset_date: None,
            medical_history: Some("Tiểu đường type 2".to_string()),
        };
        ConsultationRecord::from_draft(draft, "c-1".to_string(), Some(1), Utc::now())
    }

    #[test]
    fn fee_follows_condition_type() {
        assert_eq!(consultation_fee(ConditionType::Chronic), 10_000);
        assert_eq!(consultation_fee(ConditionType::Acute), 5_000);
        assert_eq!(consultation_fee(ConditionType::Obstetrics), 5_000);
        assert_eq!(consultation_fee(ConditionType::Paediatrics), 5_000);
        assert_eq!(consultation_fee(ConditionType::Surgical), 5_000);
    }

    #[test]
    fn draft_becomes_pending_unpaid_record() {
        let record = sample_record();
        assert_eq!(record.status, ConsultationStatus::Pending);
        assert!(!record.paid);
        assert!(!record.notification_sent);
        assert_eq!(record.fee, 10_000);
    }

    #[test]
    fn patch_touches_only_its_field() {
        let mut record = sample_record();
        let before = record.clone();

        record.apply(&RecordPatch::SetPaid(true));

        assert!(record.paid);
        assert_eq!(record.status, before.status);
        assert_eq!(record.contact, before.contact);
        assert_eq!(record.symptoms, before.symptoms);
        assert_eq!(record.medical_history, before.medical_history);

        record.apply(&RecordPatch::SetStatus(ConsultationStatus::Completed));
        assert_eq!(record.status, ConsultationStatus::Completed);
        assert!(record.paid);
    }

    #[test]
    fn validation_rejects_blank_required_fields() {
        let form = IntakeForm {
            patient_name: "  ".to_string(),
            age: 30,
            gender: Gender::Male,
            contact: "0911222333".to_string(),
            national_id: None,
            mode: ConsultationMode::Chat,
            symptoms: "Ho khan".to_string(),
            onset_date: None,
            medical_history: None,
        };
        match form.validate() {
            Err(IntakeError::MissingField(field)) => assert_eq!(field, "patient_name"),
            other => panic!("Kết quả không mong đợi: {other:?}"),
        }
    }

    #[test]
    fn session_expires_after_ttl() {
        let session = Session {
            token: "t".to_string(),
            identity: "admin@clinic.test".to_string(),
            role: SessionRole::Admin,
            issued_at: Utc::now() - Duration::hours(25),
        };
        assert!(session.is_expired(Utc::now(), 24));

        let fresh = Session {
            issued_at: Utc::now() - Duration::hours(1),
            ..session
        };
        assert!(!fresh.is_expired(Utc::now(), 24));
    }

    #[test]
    fn upload_policy_rejects_before_limits() {
        let policy = UploadPolicy::default();
        assert!(policy.check("image/png", 1024).is_ok());
        assert!(matches!(
            policy.check("application/pdf", 1024),
            Err(IntakeError::UnsupportedFileType(_))
        ));
        assert!(matches!(
            policy.check("image/png", 6 * 1024 * 1024),
            Err(IntakeError::FileTooLarge { .. })
        ));
    }

    #[test]
    fn stats_roll_up_by_status_and_payment() {
        let mut first = sample_record();
        first.apply(&RecordPatch::SetPaid(true));
        let mut second = sample_record();
        second.id = "c-2".to_string();
        second.apply(&RecordPatch::SetStatus(ConsultationStatus::Completed));

        let stats = DashboardStats::collect(&[first, second]);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.paid, 1);
    }
}
