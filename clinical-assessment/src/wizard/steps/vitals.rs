use super::{FieldView, StepId, StepView};
use crate::models::aggregate::{AssessmentAggregate, SectionUpdate};
use crate::models::records::{numeric_to_text, parse_numeric, VitalsRecord};
use crate::wizard::derived::{self, BloodPressureCategory, DerivedValue};
use crate::wizard::input::TextInput;

#[derive(Debug, Clone, Default)]
pub struct VitalsDraft {
    pub systolic: TextInput,
    pub diastolic: TextInput,
    pub heart_rate: TextInput,
}

impl VitalsDraft {
    pub fn seed(aggregate: &AssessmentAggregate) -> Self {
        let r = aggregate.vitals.unwrap_or_default();
        Self {
            systolic: TextInput::new(numeric_to_text(r.systolic)),
            diastolic: TextInput::new(numeric_to_text(r.diastolic)),
            heart_rate: TextInput::new(numeric_to_text(r.heart_rate)),
        }
    }

    pub fn to_record(&self) -> VitalsRecord {
        VitalsRecord {
            systolic: parse_numeric(&self.systolic.value),
            diastolic: parse_numeric(&self.diastolic.value),
            heart_rate: parse_numeric(&self.heart_rate.value),
        }
    }

    /// Only available once both pressures are entered.
    pub fn blood_pressure_category(&self) -> Option<BloodPressureCategory> {
        let r = self.to_record();
        match (r.systolic, r.diastolic) {
            (Some(s), Some(d)) => Some(derived::blood_pressure_category(s, d)),
            _ => None,
        }
    }

    pub fn hypertension(&self) -> bool {
        self.blood_pressure_category() == Some(BloodPressureCategory::Elevated)
    }
}

impl StepView for VitalsDraft {
    fn step(&self) -> StepId {
        StepId::Vitals
    }

    fn fields(&self) -> Vec<FieldView> {
        vec![
            FieldView::text("Systolic Blood Pressure (mmHg)", &self.systolic, false),
            FieldView::text("Diastolic Blood Pressure (mmHg)", &self.diastolic, false),
            FieldView::text("Resting Heart Rate (bpm)", &self.heart_rate, false),
        ]
    }

    fn text_input_mut(&mut self, idx: usize) -> Option<&mut TextInput> {
        match idx {
            0 => Some(&mut self.systolic),
            1 => Some(&mut self.diastolic),
            2 => Some(&mut self.heart_rate),
            _ => None,
        }
    }

    fn derived(&self) -> Vec<DerivedValue> {
        let Some(category) = self.blood_pressure_category() else {
            return Vec::new();
        };
        let reading = format!(
            "{}/{} mmHg",
            self.systolic.value.trim(),
            self.diastolic.value.trim()
        );
        vec![DerivedValue::new("Blood Pressure Reading", reading)
            .with_note(category.as_str(), category == BloodPressureCategory::Elevated)]
    }

    fn confirm(&self) -> Option<SectionUpdate> {
        Some(SectionUpdate::Vitals(self.to_record()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(sys: &str, dia: &str) -> VitalsDraft {
        let mut d = VitalsDraft::default();
        d.systolic.set(sys);
        d.diastolic.set(dia);
        d
    }

    #[test]
    fn elevated_systolic_triggers_advisory() {
        let d = draft("145", "85");
        assert!(d.hypertension());
        let derived = d.derived();
        assert_eq!(derived[0].value, "145/85 mmHg");
        assert_eq!(
            derived[0].note.as_deref(),
            Some("Elevated - consider clinical evaluation")
        );
        assert!(derived[0].advisory);
    }

    #[test]
    fn normal_reading() {
        let d = draft("118", "76");
        assert!(!d.hypertension());
        assert_eq!(d.derived()[0].note.as_deref(), Some("Normal range"));
    }

    #[test]
    fn reading_needs_both_pressures() {
        let d = draft("150", "");
        assert!(d.derived().is_empty());
        assert!(!d.hypertension());
    }

    #[test]
    fn all_fields_optional() {
        let d = VitalsDraft::default();
        assert!(d.can_continue());
        assert_eq!(
            d.confirm(),
            Some(SectionUpdate::Vitals(VitalsRecord::default()))
        );
    }
}
