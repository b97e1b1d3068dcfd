//! Danh mục bệnh tĩnh: nhóm bệnh -> hệ cơ quan -> tên bệnh.
//!
//! Tên đồng thời là khóa tra cứu, không có định danh riêng.

use serde::Serialize;

use crate::ConditionType;

/// Một hệ cơ quan cùng danh sách bệnh thuộc hệ đó.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct SystemGroup {
    pub name: &'static str,
    pub diseases: &'static [&'static str],
}

const ACUTE_SYSTEMS: &[SystemGroup] = &[
    SystemGroup {
        name: "Respiratory System",
        diseases: &[
            "Pneumonia",
            "Acute Bronchitis",
            "Asthma Attack",
            "Influenza",
            "Tonsillitis",
        ],
    },
    SystemGroup {
        name: "Digestive System",
        diseases: &[
            "Gastroenteritis",
            "Food Poisoning",
            "Peptic Ulcer Flare",
            "Acute Gastritis",
        ],
    },
    SystemGroup {
        name: "Urinary System",
        diseases: &[
            "Urinary Tract Infection",
            "Acute Pyelonephritis",
            "Renal Colic",
        ],
    },
    SystemGroup {
        name: "Skin",
        diseases: &["Cellulitis", "Skin Abscess", "Allergic Rash"],
    },
    SystemGroup {
        name: "Febrile Illness",
        diseases: &["Malaria", "Typhoid Fever", "Dengue Fever"],
    },
];

const CHRONIC_SYSTEMS: &[SystemGroup] = &[
    SystemGroup {
        name: "Cardiovascular System",
        diseases: &[
            "Hypertension",
            "Heart Failure",
            "Ischaemic Heart Disease",
            "Arrhythmia",
        ],
    },
    SystemGroup {
        name: "Endocrine System",
        diseases: &["Diabetes Mellitus", "Thyroid Disorder", "Obesity"],
    },
    SystemGroup {
        name: "Respiratory System",
        diseases: &["Bronchial Asthma", "Chronic Obstructive Pulmonary Disease"],
    },
    SystemGroup {
        name: "Musculoskeletal System",
        diseases: &[
            "Rheumatoid Arthritis",
            "Osteoarthritis",
            "Chronic Back Pain",
        ],
    },
    SystemGroup {
        name: "Renal System",
        diseases: &["Chronic Kidney Disease"],
    },
    SystemGroup {
        name: "Neurological System",
        diseases: &["Epilepsy", "Migraine", "Stroke Follow-up"],
    },
];

const OBSTETRICS_SYSTEMS: &[SystemGroup] = &[
    SystemGroup {
        name: "Pregnancy Care",
        diseases: &[
            "Antenatal Checkup",
            "Pregnancy-induced Hypertension",
            "Gestational Diabetes",
            "Hyperemesis Gravidarum",
        ],
    },
    SystemGroup {
        name: "Gynaecology",
        diseases: &[
            "Menstrual Disorder",
            "Polycystic Ovary Syndrome",
            "Pelvic Inflammatory Disease",
            "Infertility Consultation",
        ],
    },
    SystemGroup {
        name: "Postnatal Care",
        diseases: &[
            "Postpartum Follow-up",
            "Breastfeeding Problems",
            "Postpartum Depression",
        ],
    },
];

const PAEDIATRICS_SYSTEMS: &[SystemGroup] = &[
    SystemGroup {
        name: "Newborn Care",
        diseases: &[
            "Neonatal Jaundice",
            "Feeding Difficulties",
            "Low Birth Weight Follow-up",
        ],
    },
    SystemGroup {
        name: "Childhood Infections",
        diseases: &[
            "Measles",
            "Chickenpox",
            "Whooping Cough",
            "Diarrhoeal Disease",
        ],
    },
    SystemGroup {
        name: "Growth and Nutrition",
        diseases: &["Malnutrition", "Growth Delay", "Vitamin Deficiency"],
    },
    SystemGroup {
        name: "Respiratory System",
        diseases: &["Childhood Asthma", "Croup", "Bronchiolitis"],
    },
];

const SURGICAL_SYSTEMS: &[SystemGroup] = &[
    SystemGroup {
        name: "General Surgery",
        diseases: &["Hernia", "Appendicitis", "Gallstones", "Haemorrhoids"],
    },
    SystemGroup {
        name: "Orthopaedics",
        diseases: &["Fracture", "Joint Dislocation", "Ligament Injury"],
    },
    SystemGroup {
        name: "Urology",
        diseases: &["Kidney Stones", "Prostate Enlargement", "Hydrocele"],
    },
    SystemGroup {
        name: "Ear, Nose and Throat",
        diseases: &["Tonsillectomy Consultation", "Sinus Surgery Consultation"],
    },
];

/// Danh sách hệ cơ quan thuộc một nhóm bệnh.
pub fn systems_for(condition_type: ConditionType) -> &'static [SystemGroup] {
    match condition_type {
        ConditionType::Acute => ACUTE_SYSTEMS,
        ConditionType::Chronic => CHRONIC_SYSTEMS,
        ConditionType::Obstetrics => OBSTETRICS_SYSTEMS,
        ConditionType::Paediatrics => PAEDIATRICS_SYSTEMS,
        ConditionType::Surgical => SURGICAL_SYSTEMS,
    }
}

/// Danh sách bệnh của một hệ cơ quan, `None` nếu hệ không thuộc nhóm.
pub fn diseases_for(
    condition_type: ConditionType,
    system: &str,
) -> Option<&'static [&'static str]> {
    systems_for(condition_type)
        .iter()
        .find(|group| group.name == system)
        .map(|group| group.diseases)
}

/// Bệnh có nằm trong danh mục của nhóm và hệ đã chọn hay không.
pub fn contains(condition_type: ConditionType, system: &str, disease: &str) -> bool {
    diseases_for(condition_type, system)
        .map(|diseases| diseases.contains(&disease))
        .unwrap_or(false)
}
