use chrono::Utc;
use intake_core::{
    ConditionType, ConsultationMode, ConsultationRecord, ConsultationStatus, ConsultationWizard,
    Gender, IntakeError, IntakeForm, WizardStep,
};

fn filled_form() -> IntakeForm {
    IntakeForm {
        patient_name: "Nguyen Van A".to_string(),
        age: 58,
        gender: Gender::Male,
        contact: "0903555111".to_string(),
        national_id: Some("079058000123".to_string()),
        mode: ConsultationMode::Video,
        symptoms: "Đau đầu, huyết áp đo tại nhà 170/100".to_string(),
        onset_date: None,
        medical_history: Some("Hút thuốc 20 năm".to_string()),
    }
}

#[test]
fn chronic_hypertension_walkthrough() {
    let mut wizard = ConsultationWizard::new();
    assert_eq!(wizard.step(), WizardStep::SelectingConditionType);

    wizard
        .select_condition_type(ConditionType::Chronic)
        .expect("Không chọn được nhóm bệnh");
    wizard
        .select_system("Cardiovascular System")
        .expect("Không chọn được hệ cơ quan");
    wizard
        .select_disease("Hypertension")
        .expect("Không chọn được bệnh");
    assert_eq!(wizard.step(), WizardStep::ReviewingFee);
    assert_eq!(wizard.fee(), Some(10_000));

    wizard.accept_fee().expect("Không xác nhận được phí");
    assert_eq!(wizard.step(), WizardStep::FillingForm);

    let draft = wizard.submit(filled_form()).expect("Không nộp được phiếu");
    assert_eq!(wizard.step(), WizardStep::Submitted);

    let record =
        ConsultationRecord::from_draft(draft, "c-0001".to_string(), Some(1), Utc::now());
    assert_eq!(record.fee, 10_000);
    assert_eq!(record.status, ConsultationStatus::Pending);
    assert!(!record.paid);
    assert_eq!(record.condition_name, "Hypertension");
    assert_eq!(record.body_system, "Cardiovascular System");
}

#[test]
fn back_clears_the_most_specific_selection() {
    let mut wizard = ConsultationWizard::new();
    wizard
        .select_condition_type(ConditionType::Acute)
        .expect("Không chọn được nhóm bệnh");
    wizard
        .select_system("Febrile Illness")
        .expect("Không chọn được hệ cơ quan");
    wizard.select_disease("Malaria").expect("Không chọn được bệnh");

    wizard.back().expect("Không quay lại được");
    assert_eq!(wizard.step(), WizardStep::SelectingDisease);
    assert_eq!(wizard.disease(), None);
    assert_eq!(wizard.system(), Some("Febrile Illness"));

    wizard.back().expect("Không quay lại được");
    assert_eq!(wizard.step(), WizardStep::SelectingSystem);
    assert_eq!(wizard.system(), None);

    wizard.back().expect("Không quay lại được");
    assert_eq!(wizard.step(), WizardStep::SelectingConditionType);
    assert!(wizard.back().is_err());
}

#[test]
fn selections_outside_the_catalog_are_rejected() {
    let mut wizard = ConsultationWizard::new();
    wizard
        .select_condition_type(ConditionType::Paediatrics)
        .expect("Không chọn được nhóm bệnh");

    assert!(matches!(
        wizard.select_system("Cardiovascular System"),
        Err(IntakeError::UnknownSelection(_))
    ));

    wizard
        .select_system("Childhood Infections")
        .expect("Không chọn được hệ cơ quan");
    assert!(matches!(
        wizard.select_disease("Hypertension"),
        Err(IntakeError::UnknownSelection(_))
    ));
}

#[test]
fn missing_required_field_keeps_wizard_in_form_step() {
    let mut wizard = ConsultationWizard::new();
    wizard
        .select_condition_type(ConditionType::Surgical)
        .expect("Không chọn được nhóm bệnh");
    wizard
        .select_system("General Surgery")
        .expect("Không chọn được hệ cơ quan");
    wizard.select_disease("Hernia").expect("Không chọn được bệnh");
    wizard.accept_fee().expect("Không xác nhận được phí");

    let mut form = filled_form();
    form.symptoms = String::new();

    assert!(matches!(
        wizard.submit(form),
        Err(IntakeError::MissingField("symptoms"))
    ));
    assert_eq!(wizard.step(), WizardStep::FillingForm);
}

#[test]
fn submitted_wizard_only_resets() {
    let mut wizard = ConsultationWizard::new();
    wizard
        .select_condition_type(ConditionType::Obstetrics)
        .expect("Không chọn được nhóm bệnh");
    wizard
        .select_system("Pregnancy Care")
        .expect("Không chọn được hệ cơ quan");
    wizard
        .select_disease("Antenatal Checkup")
        .expect("Không chọn được bệnh");
    wizard.accept_fee().expect("Không xác nhận được phí");
    wizard.submit(filled_form()).expect("Không nộp được phiếu");

    assert!(wizard.back().is_err());
    assert!(wizard.select_condition_type(ConditionType::Acute).is_err());

    wizard.reset();
    assert_eq!(wizard.step(), WizardStep::SelectingConditionType);
}
