use super::{FieldView, StepId, StepView};
use crate::models::aggregate::{AssessmentAggregate, SectionUpdate};
use crate::models::records::{numeric_to_text, parse_numeric, GlucoseUnit, LabsRecord};
use crate::wizard::derived::{self, DerivedValue};
use crate::wizard::input::TextInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabField {
    Glucose,
    Hba1c,
    Insulin,
    TotalCholesterol,
    Hdl,
    Ldl,
    Triglycerides,
    Lh,
    Fsh,
    Testosterone,
    Shbg,
    Tsh,
    Prolactin,
}

impl LabField {
    pub const ALL: [LabField; 13] = [
        LabField::Glucose,
        LabField::Hba1c,
        LabField::Insulin,
        LabField::TotalCholesterol,
        LabField::Hdl,
        LabField::Ldl,
        LabField::Triglycerides,
        LabField::Lh,
        LabField::Fsh,
        LabField::Testosterone,
        LabField::Shbg,
        LabField::Tsh,
        LabField::Prolactin,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            LabField::Glucose => "Fasting Glucose",
            LabField::Hba1c => "HbA1c (%)",
            LabField::Insulin => "Fasting Insulin (μU/mL)",
            LabField::TotalCholesterol => "Total Cholesterol (mg/dL)",
            LabField::Hdl => "HDL Cholesterol (mg/dL)",
            LabField::Ldl => "LDL Cholesterol (mg/dL)",
            LabField::Triglycerides => "Triglycerides (mg/dL)",
            LabField::Lh => "LH (mIU/mL)",
            LabField::Fsh => "FSH (mIU/mL)",
            LabField::Testosterone => "Total Testosterone (ng/dL)",
            LabField::Shbg => "SHBG (nmol/L)",
            LabField::Tsh => "TSH (μIU/mL)",
            LabField::Prolactin => "Prolactin (ng/mL)",
        }
    }

    pub fn get(&self, r: &LabsRecord) -> Option<f64> {
        match self {
            LabField::Glucose => r.glucose,
            LabField::Hba1c => r.hba1c,
            LabField::Insulin => r.insulin,
            LabField::TotalCholesterol => r.total_cholesterol,
            LabField::Hdl => r.hdl,
            LabField::Ldl => r.ldl,
            LabField::Triglycerides => r.triglycerides,
            LabField::Lh => r.lh,
            LabField::Fsh => r.fsh,
            LabField::Testosterone => r.testosterone,
            LabField::Shbg => r.shbg,
            LabField::Tsh => r.tsh,
            LabField::Prolactin => r.prolactin,
        }
    }

    fn slot<'a>(&self, r: &'a mut LabsRecord) -> &'a mut Option<f64> {
        match self {
            LabField::Glucose => &mut r.glucose,
            LabField::Hba1c => &mut r.hba1c,
            LabField::Insulin => &mut r.insulin,
            LabField::TotalCholesterol => &mut r.total_cholesterol,
            LabField::Hdl => &mut r.hdl,
            LabField::Ldl => &mut r.ldl,
            LabField::Triglycerides => &mut r.triglycerides,
            LabField::Lh => &mut r.lh,
            LabField::Fsh => &mut r.fsh,
            LabField::Testosterone => &mut r.testosterone,
            LabField::Shbg => &mut r.shbg,
            LabField::Tsh => &mut r.tsh,
            LabField::Prolactin => &mut r.prolactin,
        }
    }

    fn position(&self) -> usize {
        LabField::ALL.iter().position(|f| f == self).unwrap_or(0)
    }
}

/// Field layout: 0 glucose, 1 glucose unit, then the remaining lab values in [`LabField::ALL`] order.
const UNIT_FIELD: usize = 1;

#[derive(Debug, Clone)]
pub struct LabsDraft {
    inputs: Vec<TextInput>,
    pub glucose_unit: GlucoseUnit,
}

impl Default for LabsDraft {
    fn default() -> Self {
        Self {
            inputs: vec![TextInput::default(); LabField::ALL.len()],
            glucose_unit: GlucoseUnit::default(),
        }
    }
}

impl LabsDraft {
    pub fn seed(aggregate: &AssessmentAggregate) -> Self {
        let r = aggregate.labs.unwrap_or_default();
        Self {
            inputs: LabField::ALL
                .iter()
                .map(|f| TextInput::new(numeric_to_text(f.get(&r))))
                .collect(),
            glucose_unit: r.glucose_unit,
        }
    }

    pub fn input(&self, field: LabField) -> &TextInput {
        &self.inputs[field.position()]
    }

    pub fn input_mut(&mut self, field: LabField) -> &mut TextInput {
        &mut self.inputs[field.position()]
    }

    fn value(&self, field: LabField) -> Option<f64> {
        parse_numeric(&self.input(field).value)
    }

    pub fn to_record(&self) -> LabsRecord {
        let mut r = LabsRecord {
            glucose_unit: self.glucose_unit,
            ..LabsRecord::default()
        };
        for field in LabField::ALL {
            *field.slot(&mut r) = self.value(field);
        }
        r
    }

    fn field_at(idx: usize) -> Option<LabField> {
        match idx {
            0 => Some(LabField::Glucose),
            UNIT_FIELD => None,
            i => LabField::ALL.get(i - 1).copied(),
        }
    }
}

impl StepView for LabsDraft {
    fn step(&self) -> StepId {
        StepId::Labs
    }

    fn fields(&self) -> Vec<FieldView> {
        let mut fields = Vec::with_capacity(LabField::ALL.len() + 1);
        for (i, field) in LabField::ALL.iter().enumerate() {
            fields.push(FieldView::text(field.label(), &self.inputs[i], false));
            if *field == LabField::Glucose {
                fields.push(FieldView::choice(
                    "Glucose Unit",
                    Some(self.glucose_unit.as_str()),
                    false,
                ));
            }
        }
        fields
    }

    fn text_input_mut(&mut self, idx: usize) -> Option<&mut TextInput> {
        let field = Self::field_at(idx)?;
        Some(self.input_mut(field))
    }

    fn cycle(&mut self, idx: usize) {
        if idx == UNIT_FIELD {
            self.glucose_unit = self.glucose_unit.toggle();
        }
    }

    fn derived(&self) -> Vec<DerivedValue> {
        let mut out = Vec::new();
        if let (Some(glucose), Some(insulin)) =
            (self.value(LabField::Glucose), self.value(LabField::Insulin))
        {
            out.push(derived::homa_ir_value(glucose, insulin));
        }
        if let (Some(lh), Some(fsh)) = (self.value(LabField::Lh), self.value(LabField::Fsh)) {
            out.push(derived::lh_fsh_value(lh, fsh));
        }
        out
    }

    fn confirm(&self) -> Option<SectionUpdate> {
        Some(SectionUpdate::Labs(self.to_record()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_indices_skip_the_unit_select() {
        let mut d = LabsDraft::default();
        d.text_input_mut(0).unwrap().set("95");
        assert!(d.text_input_mut(UNIT_FIELD).is_none());
        d.text_input_mut(3).unwrap().set("10"); // insulin
        assert_eq!(d.fields().len(), 14);
        assert_eq!(d.fields()[3].label, LabField::Insulin.label());

        let r = d.to_record();
        assert_eq!(r.glucose, Some(95.0));
        assert_eq!(r.insulin, Some(10.0));
        assert_eq!(r.hba1c, None);
    }

    #[test]
    fn homa_ir_and_ratio_appear_when_inputs_present() {
        let mut d = LabsDraft::default();
        assert!(d.derived().is_empty());

        d.input_mut(LabField::Glucose).set("95");
        d.input_mut(LabField::Insulin).set("10");
        let derived = d.derived();
        assert_eq!(derived.len(), 1);
        assert_eq!(derived[0].value, "2.35");
        assert_eq!(derived[0].note.as_deref(), Some("Normal range"));

        d.input_mut(LabField::Lh).set("12");
        d.input_mut(LabField::Fsh).set("5");
        let derived = d.derived();
        assert_eq!(derived.len(), 2);
        assert_eq!(derived[1].value, "2.40");
        assert!(derived[1].advisory);
    }

    #[test]
    fn unit_toggles_and_persists() {
        let mut d = LabsDraft::default();
        d.cycle(UNIT_FIELD);
        assert_eq!(d.to_record().glucose_unit, GlucoseUnit::MmolPerL);

        let mut agg = AssessmentAggregate::default();
        agg.merge(d.confirm().unwrap());
        assert_eq!(
            LabsDraft::seed(&agg).glucose_unit,
            GlucoseUnit::MmolPerL
        );
    }

    #[test]
    fn seed_restores_every_value() {
        let mut agg = AssessmentAggregate::default();
        agg.labs = Some(LabsRecord {
            prolactin: Some(15.0),
            tsh: Some(2.5),
            ..LabsRecord::default()
        });
        let d = LabsDraft::seed(&agg);
        assert_eq!(d.input(LabField::Prolactin).value, "15");
        assert_eq!(d.input(LabField::Tsh).value, "2.5");
        assert!(d.input(LabField::Glucose).is_blank());
    }
}
