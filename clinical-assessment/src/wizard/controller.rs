// Wizard controller
//
// Single owner of the step index and the assessment aggregate. Steps never write the aggregate
// themselves; they hand back a `SectionUpdate` and the controller merges it.

use log::debug;

use super::steps::StepId;
use crate::models::aggregate::{AssessmentAggregate, SectionUpdate};

pub const STEP_COUNT: usize = StepId::ALL.len();

#[derive(Debug, Clone, Default)]
pub struct WizardController {
    index: usize,
    aggregate: AssessmentAggregate,
}

impl WizardController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `update` and move forward. On the last step the merge still happens but the index
    /// stays put.
    pub fn advance(&mut self, update: SectionUpdate) {
        let section = update.section();
        self.aggregate.merge(update);
        if !self.is_last_step() {
            self.index += 1;
        }
        debug!(
            "[PHASE: wizard] [STEP: advance] Merged section '{}', now at step {} ({})",
            section.as_id(),
            self.index + 1,
            self.current_step().as_id()
        );
    }

    /// Step back without touching the aggregate. No-op on the first step.
    pub fn retreat(&mut self) {
        if self.is_first_step() {
            return;
        }
        self.index -= 1;
        debug!(
            "[PHASE: wizard] [STEP: retreat] Back to step {} ({})",
            self.index + 1,
            self.current_step().as_id()
        );
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn current_step(&self) -> StepId {
        StepId::ALL[self.index]
    }

    pub fn is_first_step(&self) -> bool {
        self.index == 0
    }

    pub fn is_last_step(&self) -> bool {
        self.index + 1 == STEP_COUNT
    }

    pub fn aggregate(&self) -> &AssessmentAggregate {
        &self.aggregate
    }

    pub fn progress_percent(&self) -> f64 {
        (self.index + 1) as f64 / STEP_COUNT as f64 * 100.0
    }

    /// "Step N of 7: Title"
    pub fn step_label(&self) -> String {
        format!(
            "Step {} of {}: {}",
            self.index + 1,
            STEP_COUNT,
            self.current_step().title()
        )
    }
}
