// Per-section assessment records
//
// One record per wizard section. Numeric measurements are `Option<f64>`: `None` when the field was
// left empty, `Some(NaN)` when text was entered that does not parse as a number.

use serde::{Deserialize, Serialize};

/// Parse a numeric form field.
///
/// Empty text is "not provided". Text that is present but not a number is kept as a non-finite
/// value so that presence checks still see it while derived displays degrade to a placeholder.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    Some(s.parse::<f64>().unwrap_or(f64::NAN))
}

/// Render a stored measurement back into form text (inverse of [`parse_numeric`] for finite values).
pub fn numeric_to_text(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => {
            if v.fract() == 0.0 && v.abs() < 1e15 {
                format!("{}", v as i64)
            } else {
                format!("{}", v)
            }
        }
        Some(_) => "NaN".to_string(),
        None => String::new(),
    }
}

// =========================
// Consent
// =========================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentRecord {
    pub data_collection: bool,
    pub data_storage: bool,
    pub synthetic_generation: bool,
    pub research_use: bool,
}

impl ConsentRecord {
    pub fn all_granted(&self) -> bool {
        self.data_collection && self.data_storage && self.synthetic_generation && self.research_use
    }
}

// =========================
// Demographics
// =========================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Female,
    Male,
    Other,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Female => "Female",
            Sex::Male => "Male",
            Sex::Other => "Other",
        }
    }

    /// Cycle through choices; `None` is the unselected placeholder.
    pub fn cycle(current: Option<Sex>) -> Option<Sex> {
        match current {
            None => Some(Sex::Female),
            Some(Sex::Female) => Some(Sex::Male),
            Some(Sex::Male) => Some(Sex::Other),
            Some(Sex::Other) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ethnicity {
    Caucasian,
    African,
    Asian,
    Hispanic,
    Other,
}

impl Ethnicity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ethnicity::Caucasian => "Caucasian",
            Ethnicity::African => "African American",
            Ethnicity::Asian => "Asian",
            Ethnicity::Hispanic => "Hispanic/Latino",
            Ethnicity::Other => "Other",
        }
    }

    pub fn cycle(current: Option<Ethnicity>) -> Option<Ethnicity> {
        match current {
            None => Some(Ethnicity::Caucasian),
            Some(Ethnicity::Caucasian) => Some(Ethnicity::African),
            Some(Ethnicity::African) => Some(Ethnicity::Asian),
            Some(Ethnicity::Asian) => Some(Ethnicity::Hispanic),
            Some(Ethnicity::Hispanic) => Some(Ethnicity::Other),
            Some(Ethnicity::Other) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemographicsRecord {
    pub age: Option<f64>,
    pub sex: Option<Sex>,
    pub ethnicity: Option<Ethnicity>,
    /// Height in cm.
    pub height: Option<f64>,
    /// Weight in kg.
    pub weight: Option<f64>,
    /// Waist circumference in cm.
    pub waist: Option<f64>,
}

// =========================
// Symptoms & history
// =========================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleRegularity {
    Regular,
    Irregular,
    Absent,
    Infrequent,
}

impl CycleRegularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleRegularity::Regular => "Regular (21-35 days)",
            CycleRegularity::Irregular => "Irregular (variable length)",
            CycleRegularity::Absent => "Absent (amenorrhea)",
            CycleRegularity::Infrequent => "Infrequent (>35 days)",
        }
    }

    pub fn cycle(current: Option<CycleRegularity>) -> Option<CycleRegularity> {
        match current {
            None => Some(CycleRegularity::Regular),
            Some(CycleRegularity::Regular) => Some(CycleRegularity::Irregular),
            Some(CycleRegularity::Irregular) => Some(CycleRegularity::Absent),
            Some(CycleRegularity::Absent) => Some(CycleRegularity::Infrequent),
            Some(CycleRegularity::Infrequent) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomsRecord {
    pub menstrual_cycle: Option<CycleRegularity>,
    pub hirsutism: bool,
    pub acne: bool,
    pub hair_thinning: bool,
    pub fertility_issues: bool,
    #[serde(rename = "familyHistoryPCOS")]
    pub family_history_pcos: bool,
    pub family_history_diabetes: bool,
    #[serde(rename = "familyHistoryCVD")]
    pub family_history_cvd: bool,
}

// =========================
// Vitals
// =========================

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalsRecord {
    /// mmHg
    pub systolic: Option<f64>,
    /// mmHg
    pub diastolic: Option<f64>,
    /// bpm
    pub heart_rate: Option<f64>,
}

// =========================
// Labs
// =========================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlucoseUnit {
    #[default]
    #[serde(rename = "mg/dL")]
    MgPerDl,
    #[serde(rename = "mmol/L")]
    MmolPerL,
}

impl GlucoseUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            GlucoseUnit::MgPerDl => "mg/dL",
            GlucoseUnit::MmolPerL => "mmol/L",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            GlucoseUnit::MgPerDl => GlucoseUnit::MmolPerL,
            GlucoseUnit::MmolPerL => GlucoseUnit::MgPerDl,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabsRecord {
    pub glucose: Option<f64>,
    pub glucose_unit: GlucoseUnit,
    /// %
    pub hba1c: Option<f64>,
    /// μU/mL
    pub insulin: Option<f64>,
    pub total_cholesterol: Option<f64>,
    pub hdl: Option<f64>,
    pub ldl: Option<f64>,
    pub triglycerides: Option<f64>,
    /// mIU/mL
    pub lh: Option<f64>,
    /// mIU/mL
    pub fsh: Option<f64>,
    /// ng/dL
    pub testosterone: Option<f64>,
    /// nmol/L
    pub shbg: Option<f64>,
    /// μIU/mL
    pub tsh: Option<f64>,
    /// ng/mL
    pub prolactin: Option<f64>,
}

// =========================
// Imaging
// =========================

/// Metadata for an attached ultrasound image. Contents are never read or transmitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub name: String,
    pub size_bytes: u64,
}

impl UploadedFile {
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0 / 1024.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagingRecord {
    /// cm³
    pub ovarian_volume: Option<f64>,
    pub follicle_count: Option<f64>,
    #[serde(default)]
    pub ultrasound_files: Vec<UploadedFile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_numeric_distinguishes_empty_from_garbage() {
        assert_eq!(parse_numeric(""), None);
        assert_eq!(parse_numeric("   "), None);
        assert_eq!(parse_numeric("165"), Some(165.0));
        assert_eq!(parse_numeric(" 2.5 "), Some(2.5));

        let garbage = parse_numeric("12a");
        assert!(
            matches!(garbage, Some(v) if v.is_nan()),
            "Unparseable text should be present but NaN: {:?}",
            garbage
        );
    }

    #[test]
    fn numeric_to_text_round_trips_form_values() {
        assert_eq!(numeric_to_text(None), "");
        assert_eq!(numeric_to_text(Some(70.0)), "70");
        assert_eq!(numeric_to_text(Some(12.5)), "12.5");
        assert_eq!(numeric_to_text(Some(f64::NAN)), "NaN");
    }

    #[test]
    fn consent_requires_every_flag() {
        let mut c = ConsentRecord {
            data_collection: true,
            data_storage: true,
            synthetic_generation: true,
            research_use: false,
        };
        assert!(!c.all_granted(), "Three of four flags must not be enough");
        c.research_use = true;
        assert!(c.all_granted());
    }

    #[test]
    fn records_use_camel_case_wire_keys() {
        let s = SymptomsRecord {
            family_history_pcos: true,
            ..SymptomsRecord::default()
        };
        let json = serde_json::to_value(s).unwrap();
        assert_eq!(json["familyHistoryPCOS"], serde_json::json!(true));
        assert!(json.get("hairThinning").is_some());

        let labs = LabsRecord::default();
        let json = serde_json::to_value(labs).unwrap();
        assert_eq!(json["glucoseUnit"], serde_json::json!("mg/dL"));
    }

    #[test]
    fn choice_cycles_wrap_through_unselected() {
        let mut sex = None;
        for _ in 0..4 {
            sex = Sex::cycle(sex);
        }
        assert_eq!(sex, None, "Four presses should return to the placeholder");
        assert_eq!(Ethnicity::cycle(None), Some(Ethnicity::Caucasian));
        assert_eq!(GlucoseUnit::MgPerDl.toggle(), GlucoseUnit::MmolPerL);
    }

    #[test]
    fn uploaded_file_reports_megabytes() {
        let f = UploadedFile {
            name: "scan.dcm".to_string(),
            size_bytes: 3 * 1024 * 1024,
        };
        assert!((f.size_mb() - 3.0).abs() < f64::EPSILON);
    }
}
