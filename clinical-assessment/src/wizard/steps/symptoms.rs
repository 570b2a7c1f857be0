use super::{FieldView, StepId, StepView};
use crate::models::aggregate::{AssessmentAggregate, SectionUpdate};
use crate::models::records::{CycleRegularity, SymptomsRecord};

/// Field 0 is the cycle select; 1..=4 current symptoms; 5..=7 family history.
const TOGGLE_LABELS: [&str; 7] = [
    "Hirsutism (excessive hair growth)",
    "Persistent acne",
    "Hair thinning or loss",
    "Fertility concerns",
    "Family history of PCOS",
    "Family history of diabetes",
    "Family history of cardiovascular disease",
];

pub const FAMILY_HISTORY_START: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct SymptomsDraft {
    pub record: SymptomsRecord,
}

impl SymptomsDraft {
    pub fn seed(aggregate: &AssessmentAggregate) -> Self {
        Self {
            record: aggregate.symptoms.unwrap_or_default(),
        }
    }

    fn flag_mut(&mut self, idx: usize) -> Option<&mut bool> {
        let r = &mut self.record;
        match idx {
            1 => Some(&mut r.hirsutism),
            2 => Some(&mut r.acne),
            3 => Some(&mut r.hair_thinning),
            4 => Some(&mut r.fertility_issues),
            5 => Some(&mut r.family_history_pcos),
            6 => Some(&mut r.family_history_diabetes),
            7 => Some(&mut r.family_history_cvd),
            _ => None,
        }
    }
}

impl StepView for SymptomsDraft {
    fn step(&self) -> StepId {
        StepId::Symptoms
    }

    fn fields(&self) -> Vec<FieldView> {
        let r = &self.record;
        let flags = [
            r.hirsutism,
            r.acne,
            r.hair_thinning,
            r.fertility_issues,
            r.family_history_pcos,
            r.family_history_diabetes,
            r.family_history_cvd,
        ];
        let mut fields = vec![FieldView::choice(
            "Menstrual Cycle Regularity",
            r.menstrual_cycle.map(|c| c.as_str()),
            false,
        )];
        fields.extend(
            TOGGLE_LABELS
                .iter()
                .zip(flags)
                .map(|(label, on)| FieldView::toggle(*label, on)),
        );
        fields
    }

    fn toggle(&mut self, idx: usize) {
        if let Some(flag) = self.flag_mut(idx) {
            *flag = !*flag;
        }
    }

    fn cycle(&mut self, idx: usize) {
        if idx == 0 {
            self.record.menstrual_cycle = CycleRegularity::cycle(self.record.menstrual_cycle);
        }
    }

    fn confirm(&self) -> Option<SectionUpdate> {
        Some(SectionUpdate::Symptoms(self.record))
    }
}
