use super::{FieldView, StepId, StepView};
use crate::models::aggregate::{AssessmentAggregate, SectionUpdate};
use crate::models::records::ConsentRecord;

pub const CONSENT_ITEMS: [(&str, &str); 4] = [
    (
        "Data Collection & Processing",
        "I consent to the collection and processing of my clinical data for risk assessment purposes.",
    ),
    (
        "Secure Storage",
        "I consent to secure, encrypted storage of my de-identified health data for model improvement and continuous learning.",
    ),
    (
        "Synthetic Data Generation",
        "I consent to my de-identified data being used to generate synthetic clinical records for research and model training (no identifiable information will be retained).",
    ),
    (
        "Research Use",
        "I consent to anonymized use of my data for clinical research and publication (fully de-identified, no individual traceability).",
    ),
];

#[derive(Debug, Clone, Default)]
pub struct ConsentDraft {
    pub record: ConsentRecord,
}

impl ConsentDraft {
    pub fn seed(aggregate: &AssessmentAggregate) -> Self {
        Self {
            record: aggregate.consents.unwrap_or_default(),
        }
    }

    fn flag_mut(&mut self, idx: usize) -> Option<&mut bool> {
        match idx {
            0 => Some(&mut self.record.data_collection),
            1 => Some(&mut self.record.data_storage),
            2 => Some(&mut self.record.synthetic_generation),
            3 => Some(&mut self.record.research_use),
            _ => None,
        }
    }

    fn flag(&self, idx: usize) -> bool {
        match idx {
            0 => self.record.data_collection,
            1 => self.record.data_storage,
            2 => self.record.synthetic_generation,
            3 => self.record.research_use,
            _ => false,
        }
    }
}

impl StepView for ConsentDraft {
    fn step(&self) -> StepId {
        StepId::Consent
    }

    fn fields(&self) -> Vec<FieldView> {
        CONSENT_ITEMS
            .iter()
            .enumerate()
            .map(|(i, (label, _))| FieldView::toggle(*label, self.flag(i)))
            .collect()
    }

    fn toggle(&mut self, idx: usize) {
        if let Some(flag) = self.flag_mut(idx) {
            *flag = !*flag;
        }
    }

    fn can_continue(&self) -> bool {
        self.record.all_granted()
    }

    fn confirm(&self) -> Option<SectionUpdate> {
        if !self.can_continue() {
            return None;
        }
        Some(SectionUpdate::Consents(self.record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_of_four_keeps_continue_disabled() {
        let mut d = ConsentDraft::seed(&AssessmentAggregate::default());
        d.toggle(0);
        d.toggle(1);
        d.toggle(2);
        assert!(!d.can_continue(), "Research use is still unchecked");
        assert!(d.confirm().is_none());

        d.toggle(3);
        assert!(d.can_continue());
        assert!(matches!(d.confirm(), Some(SectionUpdate::Consents(r)) if r.all_granted()));
    }

    #[test]
    fn seeds_from_previous_answers() {
        let mut agg = AssessmentAggregate::default();
        agg.consents = Some(ConsentRecord {
            data_collection: true,
            data_storage: true,
            synthetic_generation: true,
            research_use: true,
        });
        let d = ConsentDraft::seed(&agg);
        assert!(d.can_continue());
        assert!(d.fields().iter().all(|f| f.value == "[x]"));
    }

    #[test]
    fn out_of_range_toggle_is_ignored() {
        let mut d = ConsentDraft::default();
        d.toggle(9);
        assert_eq!(d.record, ConsentRecord::default());
    }
}
