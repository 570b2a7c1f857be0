// Assessment aggregate (in-memory only)
//
// Accumulates one record per section as the user advances through the wizard. Never persisted and
// never validated as a whole.

use serde::{Deserialize, Serialize};

use super::records::{
    ConsentRecord, DemographicsRecord, ImagingRecord, LabsRecord, SymptomsRecord, VitalsRecord,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Consents,
    Demographics,
    Symptoms,
    Vitals,
    Labs,
    Imaging,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Consents,
        Section::Demographics,
        Section::Symptoms,
        Section::Vitals,
        Section::Labs,
        Section::Imaging,
    ];

    pub fn as_id(&self) -> &'static str {
        match self {
            Section::Consents => "consents",
            Section::Demographics => "demographics",
            Section::Symptoms => "symptoms",
            Section::Vitals => "vitals",
            Section::Labs => "labs",
            Section::Imaging => "imaging",
        }
    }
}

/// A partial update handed back by a step on confirm: `{ [section]: record }`.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionUpdate {
    Consents(ConsentRecord),
    Demographics(DemographicsRecord),
    Symptoms(SymptomsRecord),
    Vitals(VitalsRecord),
    Labs(LabsRecord),
    Imaging(ImagingRecord),
}

impl SectionUpdate {
    pub fn section(&self) -> Section {
        match self {
            SectionUpdate::Consents(_) => Section::Consents,
            SectionUpdate::Demographics(_) => Section::Demographics,
            SectionUpdate::Symptoms(_) => Section::Symptoms,
            SectionUpdate::Vitals(_) => Section::Vitals,
            SectionUpdate::Labs(_) => Section::Labs,
            SectionUpdate::Imaging(_) => Section::Imaging,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentAggregate {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub consents: Option<ConsentRecord>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub demographics: Option<DemographicsRecord>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub symptoms: Option<SymptomsRecord>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub vitals: Option<VitalsRecord>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub labs: Option<LabsRecord>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub imaging: Option<ImagingRecord>,
}

impl AssessmentAggregate {
    /// Shallow key overwrite: the section's previous record (if any) is replaced wholesale.
    pub fn merge(&mut self, update: SectionUpdate) {
        match update {
            SectionUpdate::Consents(r) => self.consents = Some(r),
            SectionUpdate::Demographics(r) => self.demographics = Some(r),
            SectionUpdate::Symptoms(r) => self.symptoms = Some(r),
            SectionUpdate::Vitals(r) => self.vitals = Some(r),
            SectionUpdate::Labs(r) => self.labs = Some(r),
            SectionUpdate::Imaging(r) => self.imaging = Some(r),
        }
    }

    pub fn has_section(&self, section: Section) -> bool {
        match section {
            Section::Consents => self.consents.is_some(),
            Section::Demographics => self.demographics.is_some(),
            Section::Symptoms => self.symptoms.is_some(),
            Section::Vitals => self.vitals.is_some(),
            Section::Labs => self.labs.is_some(),
            Section::Imaging => self.imaging.is_some(),
        }
    }

    /// Section ids present, in wizard order. Safe to log (no clinical values).
    pub fn present_sections(&self) -> Vec<&'static str> {
        Section::ALL
            .iter()
            .filter(|s| self.has_section(**s))
            .map(|s| s.as_id())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.present_sections().is_empty()
    }
}
