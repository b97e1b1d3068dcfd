//! Máy trạng thái cho wizard tiếp nhận tư vấn.
//!
//! Các bước chỉ tiến theo lựa chọn của người dùng; `back` xóa lựa chọn
//! chi tiết nhất để quay về bước trước. Bước `Submitted` chỉ cho phép
//! `reset` về đầu.

use serde::{Deserialize, Serialize};

use crate::{catalog, ConditionType, ConsultationDraft, IntakeError, IntakeForm};

/// Bước hiện tại của wizard, suy ra từ các lựa chọn đã có.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    SelectingConditionType,
    SelectingSystem,
    SelectingDisease,
    ReviewingFee,
    FillingForm,
    Submitted,
}

impl WizardStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            WizardStep::SelectingConditionType => "selecting_condition_type",
            WizardStep::SelectingSystem => "selecting_system",
            WizardStep::SelectingDisease => "selecting_disease",
            WizardStep::ReviewingFee => "reviewing_fee",
            WizardStep::FillingForm => "filling_form",
            WizardStep::Submitted => "submitted",
        }
    }
}

/// Trạng thái wizard: các lựa chọn tích lũy dần theo từng bước.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConsultationWizard {
    condition_type: Option<ConditionType>,
    system: Option<String>,
    disease: Option<String>,
    fee_accepted: bool,
    submitted: bool,
}

impl ConsultationWizard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bước hiện tại, suy từ lựa chọn nào đã có mặt.
    pub fn step(&self) -> WizardStep {
        if self.submitted {
            WizardStep::Submitted
        } else if self.fee_accepted {
            WizardStep::FillingForm
        } else if self.disease.is_some() {
            WizardStep::ReviewingFee
        } else if self.system.is_some() {
            WizardStep::SelectingDisease
        } else if self.condition_type.is_some() {
            WizardStep::SelectingSystem
        } else {
            WizardStep::SelectingConditionType
        }
    }

    pub fn condition_type(&self) -> Option<ConditionType> {
        self.condition_type
    }

    pub fn system(&self) -> Option<&str> {
        self.system.as_deref()
    }

    pub fn disease(&self) -> Option<&str> {
        self.disease.as_deref()
    }

    /// Phí tư vấn của nhóm bệnh đã chọn.
    pub fn fee(&self) -> Option<u32> {
        self.condition_type.map(|ct| ct.fee())
    }

    pub fn select_condition_type(
        &mut self,
        condition_type: ConditionType,
    ) -> Result<(), IntakeError> {
        if self.step() != WizardStep::SelectingConditionType {
            return Err(IntakeError::InvalidTransition(self.step().as_str()));
        }
        self.condition_type = Some(condition_type);
        Ok(())
    }

    pub fn select_system(&mut self, system: &str) -> Result<(), IntakeError> {
        if self.step() != WizardStep::SelectingSystem {
            return Err(IntakeError::InvalidTransition(self.step().as_str()));
        }
        let condition_type = self
            .condition_type
            .ok_or(IntakeError::InvalidTransition("selecting_system"))?;
        if catalog::diseases_for(condition_type, system).is_none() {
            return Err(IntakeError::UnknownSelection(system.to_string()));
        }
        self.system = Some(system.to_string());
        Ok(())
    }

    pub fn select_disease(&mut self, disease: &str) -> Result<(), IntakeError> {
        if self.step() != WizardStep::SelectingDisease {
            return Err(IntakeError::InvalidTransition(self.step().as_str()));
        }
        let condition_type = self
            .condition_type
            .ok_or(IntakeError::InvalidTransition("selecting_disease"))?;
        let system = self
            .system
            .as_deref()
            .ok_or(IntakeError::InvalidTransition("selecting_disease"))?;
        if !catalog::contains(condition_type, system, disease) {
            return Err(IntakeError::UnknownSelection(disease.to_string()));
        }
        self.disease = Some(disease.to_string());
        Ok(())
    }

    /// Xác nhận mức phí để chuyển sang bước điền phiếu.
    pub fn accept_fee(&mut self) -> Result<(), IntakeError> {
        if self.step() != WizardStep::ReviewingFee {
            return Err(IntakeError::InvalidTransition(self.step().as_str()));
        }
        self.fee_accepted = true;
        Ok(())
    }

    /// Quay lại bước trước bằng cách xóa lựa chọn chi tiết nhất.
    pub fn back(&mut self) -> Result<(), IntakeError> {
        match self.step() {
            WizardStep::Submitted | WizardStep::SelectingConditionType => {
                Err(IntakeError::InvalidTransition(self.step().as_str()))
            }
            WizardStep::FillingForm => {
                self.fee_accepted = false;
                Ok(())
            }
            WizardStep::ReviewingFee => {
                self.disease = None;
                Ok(())
            }
            WizardStep::SelectingDisease => {
                self.system = None;
                Ok(())
            }
            WizardStep::SelectingSystem => {
                self.condition_type = None;
                Ok(())
            }
        }
    }

    /// Nộp phiếu: kiểm tra trường bắt buộc rồi dựng bản nháp hồ sơ.
    ///
    /// Khi phiếu thiếu thông tin, wizard giữ nguyên ở bước điền phiếu.
    pub fn submit(&mut self, form: IntakeForm) -> Result<ConsultationDraft, IntakeError> {
        if self.step() != WizardStep::FillingForm {
            return Err(IntakeError::InvalidTransition(self.step().as_str()));
        }
        form.validate()?;

        let condition_type = self
            .condition_type
            .ok_or(IntakeError::InvalidTransition("filling_form"))?;
        let body_system = self
            .system
            .clone()
            .ok_or(IntakeError::InvalidTransition("filling_form"))?;
        let condition_name = self
            .disease
            .clone()
            .ok_or(IntakeError::InvalidTransition("filling_form"))?;

        let draft = ConsultationDraft {
            patient_name: form.patient_name,
            age: form.age,
            gender: form.gender,
            contact: form.contact,
            national_id: form.national_id,
            condition_name,
            condition_type,
            body_system,
            fee: condition_type.fee(),
            mode: form.mode,
            symptoms: form.symptoms,
            onset_date: form.onset_date,
            medical_history: form.medical_history,
        };

        self.submitted = true;
        Ok(draft)
    }

    /// Về trạng thái ban đầu, xóa mọi lựa chọn.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
