// Derived clinical values shown alongside form fields.
//
// Plain arithmetic over whatever the user typed. Non-finite inputs propagate and are rendered as a
// placeholder by `format_fixed`; nothing here reports an error.

pub const PLACEHOLDER: &str = "—";

pub const HOMA_IR_DIVISOR: f64 = 405.0;
pub const HOMA_IR_RESISTANCE_THRESHOLD: f64 = 2.5;
pub const LH_FSH_ELEVATED_THRESHOLD: f64 = 2.0;
pub const SYSTOLIC_ELEVATED_MMHG: f64 = 140.0;
pub const DIASTOLIC_ELEVATED_MMHG: f64 = 90.0;
pub const ROTTERDAM_FOLLICLE_COUNT: f64 = 12.0;

pub const ROTTERDAM_ADVISORY: &str =
    "Antral follicle count ≥12 is one of the Rotterdam criteria for PCOS diagnosis";

/// Fixed-point display; non-finite values become [`PLACEHOLDER`].
pub fn format_fixed(value: f64, decimals: usize) -> String {
    if value.is_finite() {
        format!("{:.*}", decimals, value)
    } else {
        PLACEHOLDER.to_string()
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// weight (kg) / (height (m))²
pub fn bmi(height_cm: f64, weight_kg: f64) -> f64 {
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

/// (fasting insulin μU/mL × fasting glucose mg/dL) / 405
pub fn homa_ir(glucose: f64, insulin: f64) -> f64 {
    (insulin * glucose) / HOMA_IR_DIVISOR
}

pub fn lh_fsh_ratio(lh: f64, fsh: f64) -> f64 {
    lh / fsh
}

/// Compared on the displayed (2-decimal) value so the label always agrees with the number shown.
pub fn insulin_resistance(homa_ir: f64) -> bool {
    round_to(homa_ir, 2) > HOMA_IR_RESISTANCE_THRESHOLD
}

pub fn lh_fsh_elevated(ratio: f64) -> bool {
    round_to(ratio, 2) > LH_FSH_ELEVATED_THRESHOLD
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BloodPressureCategory {
    Normal,
    Elevated,
}

impl BloodPressureCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            BloodPressureCategory::Normal => "Normal range",
            BloodPressureCategory::Elevated => "Elevated - consider clinical evaluation",
        }
    }
}

/// Either threshold alone is enough.
pub fn blood_pressure_category(systolic: f64, diastolic: f64) -> BloodPressureCategory {
    if systolic >= SYSTOLIC_ELEVATED_MMHG || diastolic >= DIASTOLIC_ELEVATED_MMHG {
        BloodPressureCategory::Elevated
    } else {
        BloodPressureCategory::Normal
    }
}

pub fn rotterdam_follicle_advisory(follicle_count: Option<f64>) -> bool {
    matches!(follicle_count, Some(n) if n >= ROTTERDAM_FOLLICLE_COUNT)
}

/// A read-only value rendered next to the inputs it is computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedValue {
    pub label: String,
    pub value: String,
    pub note: Option<String>,
    /// Rendered as a warning.
    pub advisory: bool,
}

impl DerivedValue {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            note: None,
            advisory: false,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>, advisory: bool) -> Self {
        self.note = Some(note.into());
        self.advisory = advisory;
        self
    }
}

/// BMI card, e.g. `25.7`.
pub fn bmi_value(height_cm: f64, weight_kg: f64) -> DerivedValue {
    DerivedValue::new("Calculated BMI", format_fixed(bmi(height_cm, weight_kg), 1))
}

pub fn homa_ir_value(glucose: f64, insulin: f64) -> DerivedValue {
    let v = homa_ir(glucose, insulin);
    let resistant = insulin_resistance(v);
    let note = if resistant {
        "Indicates insulin resistance"
    } else {
        "Normal range"
    };
    DerivedValue::new("Calculated HOMA-IR", format_fixed(v, 2)).with_note(note, resistant)
}

pub fn lh_fsh_value(lh: f64, fsh: f64) -> DerivedValue {
    let v = lh_fsh_ratio(lh, fsh);
    let elevated = lh_fsh_elevated(v);
    let note = if elevated {
        "Elevated - common in PCOS"
    } else {
        "Normal range"
    };
    DerivedValue::new("LH/FSH Ratio", format_fixed(v, 2)).with_note(note, elevated)
}
