use super::{FieldView, StepId, StepView};
use crate::models::aggregate::{AssessmentAggregate, SectionUpdate};
use crate::models::records::{numeric_to_text, parse_numeric, DemographicsRecord, Ethnicity, Sex};
use crate::wizard::derived::{self, DerivedValue};
use crate::wizard::input::TextInput;

const AGE: usize = 0;
const SEX: usize = 1;
const ETHNICITY: usize = 2;
const HEIGHT: usize = 3;
const WEIGHT: usize = 4;
const WAIST: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct DemographicsDraft {
    pub age: TextInput,
    pub sex: Option<Sex>,
    pub ethnicity: Option<Ethnicity>,
    pub height: TextInput,
    pub weight: TextInput,
    pub waist: TextInput,
}

impl DemographicsDraft {
    pub fn seed(aggregate: &AssessmentAggregate) -> Self {
        let r = aggregate.demographics.clone().unwrap_or_default();
        Self {
            age: TextInput::new(numeric_to_text(r.age)),
            sex: r.sex,
            ethnicity: r.ethnicity,
            height: TextInput::new(numeric_to_text(r.height)),
            weight: TextInput::new(numeric_to_text(r.weight)),
            waist: TextInput::new(numeric_to_text(r.waist)),
        }
    }

    pub fn to_record(&self) -> DemographicsRecord {
        DemographicsRecord {
            age: parse_numeric(&self.age.value),
            sex: self.sex,
            ethnicity: self.ethnicity,
            height: parse_numeric(&self.height.value),
            weight: parse_numeric(&self.weight.value),
            waist: parse_numeric(&self.waist.value),
        }
    }
}

impl StepView for DemographicsDraft {
    fn step(&self) -> StepId {
        StepId::Demographics
    }

    fn fields(&self) -> Vec<FieldView> {
        vec![
            FieldView::text("Age (years)", &self.age, true),
            FieldView::choice("Sex", self.sex.map(|s| s.as_str()), true),
            FieldView::choice("Ethnicity", self.ethnicity.map(|e| e.as_str()), false),
            FieldView::text("Height (cm)", &self.height, true),
            FieldView::text("Weight (kg)", &self.weight, true),
            FieldView::text("Waist Circumference (cm)", &self.waist, false),
        ]
    }

    fn text_input_mut(&mut self, idx: usize) -> Option<&mut TextInput> {
        match idx {
            AGE => Some(&mut self.age),
            HEIGHT => Some(&mut self.height),
            WEIGHT => Some(&mut self.weight),
            WAIST => Some(&mut self.waist),
            _ => None,
        }
    }

    fn cycle(&mut self, idx: usize) {
        match idx {
            SEX => self.sex = Sex::cycle(self.sex),
            ETHNICITY => self.ethnicity = Ethnicity::cycle(self.ethnicity),
            _ => {}
        }
    }

    fn derived(&self) -> Vec<DerivedValue> {
        let (Some(height), Some(weight)) = (
            parse_numeric(&self.height.value),
            parse_numeric(&self.weight.value),
        ) else {
            return Vec::new();
        };
        vec![derived::bmi_value(height, weight)]
    }

    fn can_continue(&self) -> bool {
        !self.age.is_blank()
            && self.sex.is_some()
            && !self.height.is_blank()
            && !self.weight.is_blank()
    }

    fn confirm(&self) -> Option<SectionUpdate> {
        if !self.can_continue() {
            return None;
        }
        Some(SectionUpdate::Demographics(self.to_record()))
    }
}
