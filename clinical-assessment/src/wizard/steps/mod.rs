//! Wizard step views.
//!
//! Every step follows the same contract:
//! - seed a local draft from the aggregate's section (or defaults)
//! - expose editable fields
//! - compute derived display values from the current draft
//! - gate the continue action on required fields
//! - on confirm, hand back `{ section: record }` for the controller to merge
//!
//! Drafts are UI-agnostic; the terminal front-end drives them through [`StepView`].

mod consent;
mod demographics;
mod imaging;
mod labs;
mod review;
mod symptoms;
mod vitals;

pub use consent::{ConsentDraft, CONSENT_ITEMS};
pub use demographics::DemographicsDraft;
pub use imaging::{is_accepted_image_name, ImagingDraft, FIRST_FILE_FIELD, PATH_FIELD};
pub use labs::{LabField, LabsDraft};
pub use review::{CompletenessItem, ReviewDraft};
pub use symptoms::SymptomsDraft;
pub use vitals::VitalsDraft;

use crate::models::aggregate::{AssessmentAggregate, Section, SectionUpdate};
use crate::wizard::derived::DerivedValue;
use crate::wizard::input::TextInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepId {
    Consent,
    Demographics,
    Symptoms,
    Vitals,
    Labs,
    Imaging,
    Review,
}

impl StepId {
    pub const ALL: [StepId; 7] = [
        StepId::Consent,
        StepId::Demographics,
        StepId::Symptoms,
        StepId::Vitals,
        StepId::Labs,
        StepId::Imaging,
        StepId::Review,
    ];

    pub fn as_id(&self) -> &'static str {
        match self {
            StepId::Consent => "consent",
            StepId::Demographics => "demographics",
            StepId::Symptoms => "symptoms",
            StepId::Vitals => "vitals",
            StepId::Labs => "labs",
            StepId::Imaging => "imaging",
            StepId::Review => "review",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            StepId::Consent => "Consent & Privacy",
            StepId::Demographics => "Demographics",
            StepId::Symptoms => "Symptoms & History",
            StepId::Vitals => "Vital Signs",
            StepId::Labs => "Laboratory Values",
            StepId::Imaging => "Medical Imaging",
            StepId::Review => "Review & Submit",
        }
    }

    /// Aggregate section this step writes; Review writes none.
    pub fn section(&self) -> Option<Section> {
        match self {
            StepId::Consent => Some(Section::Consents),
            StepId::Demographics => Some(Section::Demographics),
            StepId::Symptoms => Some(Section::Symptoms),
            StepId::Vitals => Some(Section::Vitals),
            StepId::Labs => Some(Section::Labs),
            StepId::Imaging => Some(Section::Imaging),
            StepId::Review => None,
        }
    }

    pub fn index(&self) -> usize {
        StepId::ALL.iter().position(|s| s == self).unwrap_or(0)
    }

    pub fn from_id(id: &str) -> Option<StepId> {
        StepId::ALL
            .iter()
            .copied()
            .find(|s| s.as_id().eq_ignore_ascii_case(id.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text / numeric entry.
    Text,
    /// Checkbox.
    Toggle,
    /// Select; Left/Right cycles options.
    Choice,
    /// A removable list entry.
    Item,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldView {
    pub label: String,
    pub kind: FieldKind,
    /// Current value as displayed ("[x]", selected option, typed text, ...).
    pub value: String,
    pub required: bool,
}

impl FieldView {
    pub fn text(label: impl Into<String>, input: &TextInput, required: bool) -> Self {
        Self {
            label: label.into(),
            kind: FieldKind::Text,
            value: input.value.clone(),
            required,
        }
    }

    pub fn toggle(label: impl Into<String>, checked: bool) -> Self {
        Self {
            label: label.into(),
            kind: FieldKind::Toggle,
            value: if checked { "[x]" } else { "[ ]" }.to_string(),
            required: false,
        }
    }

    pub fn choice(label: impl Into<String>, selected: Option<&str>, required: bool) -> Self {
        Self {
            label: label.into(),
            kind: FieldKind::Choice,
            value: selected.unwrap_or("Select...").to_string(),
            required,
        }
    }

    pub fn item(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: FieldKind::Item,
            value: value.into(),
            required: false,
        }
    }
}

/// Contract shared by all seven steps.
pub trait StepView {
    fn step(&self) -> StepId;

    fn fields(&self) -> Vec<FieldView>;

    fn text_input_mut(&mut self, _idx: usize) -> Option<&mut TextInput> {
        None
    }

    /// Flip a checkbox field.
    fn toggle(&mut self, _idx: usize) {}

    /// Advance a choice field to its next option.
    fn cycle(&mut self, _idx: usize) {}

    /// Enter on a field. Returns a status line for the user, if any.
    fn activate(&mut self, _idx: usize) -> Option<String> {
        None
    }

    /// Remove a list entry. Returns true when something was removed.
    fn remove(&mut self, _idx: usize) -> bool {
        false
    }

    fn derived(&self) -> Vec<DerivedValue> {
        Vec::new()
    }

    fn can_continue(&self) -> bool {
        true
    }

    /// `None` while the continue gate is closed, or for steps that write no section.
    fn confirm(&self) -> Option<SectionUpdate>;
}

/// Local draft for whichever step is active.
#[derive(Debug, Clone)]
pub enum StepDraft {
    Consent(ConsentDraft),
    Demographics(DemographicsDraft),
    Symptoms(SymptomsDraft),
    Vitals(VitalsDraft),
    Labs(LabsDraft),
    Imaging(ImagingDraft),
    Review(ReviewDraft),
}

impl StepDraft {
    pub fn seed(step: StepId, aggregate: &AssessmentAggregate) -> Self {
        match step {
            StepId::Consent => StepDraft::Consent(ConsentDraft::seed(aggregate)),
            StepId::Demographics => StepDraft::Demographics(DemographicsDraft::seed(aggregate)),
            StepId::Symptoms => StepDraft::Symptoms(SymptomsDraft::seed(aggregate)),
            StepId::Vitals => StepDraft::Vitals(VitalsDraft::seed(aggregate)),
            StepId::Labs => StepDraft::Labs(LabsDraft::seed(aggregate)),
            StepId::Imaging => StepDraft::Imaging(ImagingDraft::seed(aggregate)),
            StepId::Review => StepDraft::Review(ReviewDraft::seed(aggregate)),
        }
    }

    pub fn view(&self) -> &dyn StepView {
        match self {
            StepDraft::Consent(d) => d,
            StepDraft::Demographics(d) => d,
            StepDraft::Symptoms(d) => d,
            StepDraft::Vitals(d) => d,
            StepDraft::Labs(d) => d,
            StepDraft::Imaging(d) => d,
            StepDraft::Review(d) => d,
        }
    }

    pub fn view_mut(&mut self) -> &mut dyn StepView {
        match self {
            StepDraft::Consent(d) => d,
            StepDraft::Demographics(d) => d,
            StepDraft::Symptoms(d) => d,
            StepDraft::Vitals(d) => d,
            StepDraft::Labs(d) => d,
            StepDraft::Imaging(d) => d,
            StepDraft::Review(d) => d,
        }
    }
}
