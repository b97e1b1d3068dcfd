use std::fs;

use intake_core::ConsultationRecord;
use intake_notify::{compose_notification_html, ConsultationNotification};
use serde_json::Value;

fn fixture_path(name: &str) -> String {
    format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn notification_payload_matches_golden() {
    let record_json = fs::read_to_string(fixture_path("consultation_record.json"))
        .expect("Không đọc được hồ sơ mẫu");
    let record: ConsultationRecord =
        serde_json::from_str(&record_json).expect("Hồ sơ mẫu không hợp lệ");

    let payload = ConsultationNotification::from(&record);
    let actual = serde_json::to_value(payload).expect("Không serialize payload");

    let expected = fs::read_to_string(fixture_path("notification_payload.json"))
        .expect("Không đọc được golden payload");
    let expected_value: Value =
        serde_json::from_str(&expected).expect("Golden payload không hợp lệ");

    assert_eq!(actual, expected_value);
}

#[test]
fn notification_email_matches_golden() {
    let record_json = fs::read_to_string(fixture_path("consultation_record.json"))
        .expect("Không đọc được hồ sơ mẫu");
    let record: ConsultationRecord =
        serde_json::from_str(&record_json).expect("Hồ sơ mẫu không hợp lệ");

    let actual = compose_notification_html(&record);

    let expected = fs::read_to_string(fixture_path("notification_email.html"))
        .expect("Không đọc được golden email");

    assert_eq!(actual.trim_end(), expected.trim_end());
}
