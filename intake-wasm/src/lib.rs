//! Bridge WASM <-> JavaScript trung lập framework cho luồng tiếp nhận.

use std::str::FromStr;

use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

use intake_core::{
    catalog, ConditionType, ConsultationRecord, ConsultationWizard, IntakeConfig, IntakeForm,
    Session,
};

#[derive(Deserialize)]
struct JsIntakeConfig {
    #[serde(default)]
    session_ttl_hours: Option<u32>,
    #[serde(default)]
    max_upload_bytes: Option<u64>,
}

impl From<JsIntakeConfig> for IntakeConfig {
    fn from(cfg: JsIntakeConfig) -> Self {
        let mut base = IntakeConfig::default();
        if let Some(hours) = cfg.session_ttl_hours {
            base.session_ttl_hours = hours;
        }
        if let Some(bytes) = cfg.max_upload_bytes {
            base.upload.max_bytes = bytes;
        }
        base
    }
}

#[derive(Deserialize)]
struct JsSelection {
    condition_type: String,
    system: String,
    disease: String,
}

/// Danh sách nhóm bệnh cho bước đầu của wizard.
#[wasm_bindgen]
pub fn condition_types() -> Result<JsValue, JsValue> {
    let names: Vec<&str> = ConditionType::ALL.iter().map(|ct| ct.as_str()).collect();
    to_value(&names).map_err(|err| JsValue::from_str(&format!("Không serialize danh sách: {err}")))
}

/// Các hệ cơ quan (kèm danh sách bệnh) của một nhóm bệnh.
#[wasm_bindgen]
pub fn systems_for(condition_type: String) -> Result<JsValue, JsValue> {
    let condition_type = parse_condition_type(&condition_type)?;
    to_value(&catalog::systems_for(condition_type))
        .map_err(|err| JsValue::from_str(&format!("Không serialize danh mục: {err}")))
}

/// Phí tư vấn của một nhóm bệnh.
#[wasm_bindgen]
pub fn fee_for(condition_type: String) -> Result<u32, JsValue> {
    Ok(parse_condition_type(&condition_type)?.fee())
}

/// Kiểm tra trường bắt buộc của phiếu trước khi nộp.
#[wasm_bindgen]
pub fn validate_form(form: JsValue) -> Result<(), JsValue> {
    let form: IntakeForm = from_value(form)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được phiếu: {err}")))?;
    form.validate()
        .map_err(|err| JsValue::from_str(&err.to_string()))
}

/// Chạy wizard trọn vẹn từ lựa chọn đã có và trả về bản nháp hồ sơ.
#[wasm_bindgen]
pub fn prepare_submission(selection: JsValue, form: JsValue) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let selection: JsSelection = from_value(selection)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được lựa chọn: {err}")))?;
    let form: IntakeForm = from_value(form)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được phiếu: {err}")))?;

    let condition_type = parse_condition_type(&selection.condition_type)?;

    let mut wizard = ConsultationWizard::new();
    wizard
        .select_condition_type(condition_type)
        .map_err(intake_error_to_js)?;
    wizard
        .select_system(&selection.system)
        .map_err(intake_error_to_js)?;
    wizard
        .select_disease(&selection.disease)
        .map_err(intake_error_to_js)?;
    wizard.accept_fee().map_err(intake_error_to_js)?;

    let draft = wizard.submit(form).map_err(intake_error_to_js)?;

    to_value(&draft).map_err(|err| JsValue::from_str(&format!("Không serialize bản nháp: {err}")))
}

/// URI `mailto:` dự phòng cho một hồ sơ đã lưu.
#[wasm_bindgen]
pub fn compose_mailto(record: JsValue, to: String) -> Result<String, JsValue> {
    let record: ConsultationRecord = from_value(record)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được hồ sơ: {err}")))?;
    let subject = format!("New consultation request - {}", record.patient_name);
    let body = intake_notify::compose_summary_text(&record);
    Ok(intake_notify::mailto_uri(&to, &subject, &body))
}

/// Payload JSON gửi cho hàm thông báo tư vấn.
#[wasm_bindgen]
pub fn notification_payload(record: JsValue) -> Result<JsValue, JsValue> {
    let record: ConsultationRecord = from_value(record)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được hồ sơ: {err}")))?;
    let payload = intake_notify::ConsultationNotification::from(&record);
    to_value(&payload).map_err(|err| JsValue::from_str(&format!("Không serialize payload: {err}")))
}

/// Phiên đăng nhập còn hạn hay không, so với mốc thời gian truyền vào.
#[wasm_bindgen]
pub fn session_is_fresh(
    session: JsValue,
    now_iso: String,
    config: Option<JsValue>,
) -> Result<bool, JsValue> {
    let session: Session = from_value(session)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được phiên: {err}")))?;
    let now = chrono::DateTime::parse_from_rfc3339(&now_iso)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|err| JsValue::from_str(&format!("Mốc thời gian không hợp lệ: {err}")))?;

    let cfg = match config {
        Some(js_cfg) => {
            let cfg: JsIntakeConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Không đọc được config: {err}")))?;
            IntakeConfig::from(cfg)
        }
        None => IntakeConfig::default(),
    };

    Ok(!session.is_expired(now, cfg.session_ttl_hours))
}

fn parse_condition_type(value: &str) -> Result<ConditionType, JsValue> {
    ConditionType::from_str(value).map_err(intake_error_to_js)
}

fn intake_error_to_js(err: intake_core::IntakeError) -> JsValue {
    JsValue::from_str(&err.to_string())
}
