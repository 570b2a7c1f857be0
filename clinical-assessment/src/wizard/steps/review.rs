use super::{FieldView, StepId, StepView};
use crate::models::aggregate::{AssessmentAggregate, SectionUpdate};
use crate::models::results::ModelInfo;
use crate::wizard::derived::{self, DerivedValue};

/// One row of the "Assessment Completeness" checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletenessItem {
    pub name: &'static str,
    pub complete: bool,
}

/// Read-only snapshot of the aggregate at the time the Review step was entered.
#[derive(Debug, Clone, Default)]
pub struct ReviewDraft {
    aggregate: AssessmentAggregate,
}

impl ReviewDraft {
    pub fn seed(aggregate: &AssessmentAggregate) -> Self {
        Self {
            aggregate: aggregate.clone(),
        }
    }

    pub fn aggregate(&self) -> &AssessmentAggregate {
        &self.aggregate
    }

    /// A section counts as complete when its anchor value is present; Symptoms and Imaging only
    /// need to have been visited.
    pub fn completeness(&self) -> Vec<CompletenessItem> {
        let a = &self.aggregate;
        vec![
            CompletenessItem {
                name: "Demographics",
                complete: a.demographics.as_ref().is_some_and(|d| d.age.is_some()),
            },
            CompletenessItem {
                name: "Symptoms",
                complete: a.symptoms.is_some(),
            },
            CompletenessItem {
                name: "Vital Signs",
                complete: a.vitals.is_some_and(|v| v.systolic.is_some()),
            },
            CompletenessItem {
                name: "Laboratory Values",
                complete: a.labs.is_some_and(|l| l.glucose.is_some()),
            },
            CompletenessItem {
                name: "Medical Imaging",
                complete: a.imaging.is_some(),
            },
        ]
    }

    pub fn consent_confirmed(&self) -> bool {
        self.aggregate.consents.is_some_and(|c| c.all_granted())
    }

    /// BMI, HOMA-IR and LH/FSH, each only when its inputs were captured.
    pub fn key_metrics(&self) -> Vec<DerivedValue> {
        let a = &self.aggregate;
        let mut out = Vec::new();
        if let Some(d) = &a.demographics {
            if let (Some(h), Some(w)) = (d.height, d.weight) {
                out.push(derived::bmi_value(h, w).with_note("kg/m²", false));
            }
        }
        if let Some(l) = &a.labs {
            if let (Some(g), Some(i)) = (l.glucose, l.insulin) {
                out.push(derived::homa_ir_value(g, i));
            }
            if let (Some(lh), Some(fsh)) = (l.lh, l.fsh) {
                out.push(derived::lh_fsh_value(lh, fsh));
            }
        }
        out
    }

    pub fn model_info() -> ModelInfo {
        ModelInfo::placeholder()
    }
}

impl StepView for ReviewDraft {
    fn step(&self) -> StepId {
        StepId::Review
    }

    /// Nothing is editable here; the checklist is rendered from [`ReviewDraft::completeness`].
    fn fields(&self) -> Vec<FieldView> {
        Vec::new()
    }

    fn derived(&self) -> Vec<DerivedValue> {
        self.key_metrics()
    }

    fn confirm(&self) -> Option<SectionUpdate> {
        None
    }
}
