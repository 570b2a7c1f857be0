pub mod controller;
pub mod derived;
pub mod input;
pub mod steps;

pub use controller::WizardController;
pub use steps::{StepDraft, StepId, StepView};
