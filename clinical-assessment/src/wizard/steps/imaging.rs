use std::fs;
use std::path::Path;

use log::{info, warn};
use regex::Regex;

use super::{FieldView, StepId, StepView};
use crate::models::aggregate::{AssessmentAggregate, SectionUpdate};
use crate::models::records::{numeric_to_text, parse_numeric, ImagingRecord, UploadedFile};
use crate::wizard::derived::{self, DerivedValue};
use crate::wizard::input::TextInput;

pub const VOLUME_FIELD: usize = 0;
pub const FOLLICLE_FIELD: usize = 1;
pub const PATH_FIELD: usize = 2;
/// Attached files are listed from this index onward.
pub const FIRST_FILE_FIELD: usize = 3;

const ACCEPTED_IMAGE_PATTERN: &str = r"(?i)\.(dcm|png|jpe?g|gif|bmp|webp|tiff?)$";

/// Image types plus DICOM (`.dcm`).
pub fn is_accepted_image_name(name: &str) -> bool {
    match Regex::new(ACCEPTED_IMAGE_PATTERN) {
        Ok(re) => re.is_match(name.trim()),
        Err(e) => {
            warn!(
                "[PHASE: wizard] [STEP: imaging] Internal error compiling image name pattern: {}",
                e
            );
            false
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImagingDraft {
    pub ovarian_volume: TextInput,
    pub follicle_count: TextInput,
    /// Path entry for attaching a file, or a directory of files.
    pub file_path: TextInput,
    pub files: Vec<UploadedFile>,
}

impl ImagingDraft {
    pub fn seed(aggregate: &AssessmentAggregate) -> Self {
        let r = aggregate.imaging.clone().unwrap_or_default();
        Self {
            ovarian_volume: TextInput::new(numeric_to_text(r.ovarian_volume)),
            follicle_count: TextInput::new(numeric_to_text(r.follicle_count)),
            file_path: TextInput::default(),
            files: r.ultrasound_files,
        }
    }

    pub fn to_record(&self) -> ImagingRecord {
        ImagingRecord {
            ovarian_volume: parse_numeric(&self.ovarian_volume.value),
            follicle_count: parse_numeric(&self.follicle_count.value),
            ultrasound_files: self.files.clone(),
        }
    }

    /// Attach whatever `path` names. A directory contributes every accepted image directly inside it.
    ///
    /// Only the name and size are kept; file contents are never read.
    pub fn attach(&mut self, path: &Path) -> Result<usize, String> {
        let meta = fs::metadata(path).map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;

        if meta.is_dir() {
            let entries =
                fs::read_dir(path).map_err(|e| format!("Cannot list {}: {}", path.display(), e))?;
            let mut found: Vec<UploadedFile> = entries
                .filter_map(|entry| entry.ok())
                .filter_map(|entry| {
                    let meta = entry.metadata().ok()?;
                    let name = entry.file_name().to_string_lossy().to_string();
                    (meta.is_file() && is_accepted_image_name(&name)).then_some(UploadedFile {
                        name,
                        size_bytes: meta.len(),
                    })
                })
                .collect();
            if found.is_empty() {
                return Err(format!("No image files found in {}", path.display()));
            }
            found.sort_by(|a, b| a.name.cmp(&b.name));
            let n = found.len();
            self.files.extend(found);
            return Ok(n);
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if !is_accepted_image_name(&name) {
            return Err(format!(
                "Unsupported file type: {} (accepted: images or .dcm)",
                name
            ));
        }
        self.files.push(UploadedFile {
            name,
            size_bytes: meta.len(),
        });
        Ok(1)
    }
}

impl StepView for ImagingDraft {
    fn step(&self) -> StepId {
        StepId::Imaging
    }

    fn fields(&self) -> Vec<FieldView> {
        let mut fields = vec![
            FieldView::text("Ovarian Volume (cm³)", &self.ovarian_volume, false),
            FieldView::text("Antral Follicle Count", &self.follicle_count, false),
            FieldView::text("Add ultrasound image (path)", &self.file_path, false),
        ];
        fields.extend(
            self.files
                .iter()
                .map(|f| FieldView::item(f.name.clone(), format!("{:.2} MB", f.size_mb()))),
        );
        fields
    }

    fn text_input_mut(&mut self, idx: usize) -> Option<&mut TextInput> {
        match idx {
            VOLUME_FIELD => Some(&mut self.ovarian_volume),
            FOLLICLE_FIELD => Some(&mut self.follicle_count),
            PATH_FIELD => Some(&mut self.file_path),
            _ => None,
        }
    }

    fn activate(&mut self, idx: usize) -> Option<String> {
        if idx != PATH_FIELD || self.file_path.is_blank() {
            return None;
        }
        let raw = self.file_path.value.trim().to_string();
        match self.attach(Path::new(&raw)) {
            Ok(n) => {
                self.file_path.clear();
                info!(
                    "[PHASE: wizard] [STEP: imaging] Attached {} file(s), {} total",
                    n,
                    self.files.len()
                );
                Some(format!("{} file(s) added", n))
            }
            Err(msg) => {
                warn!("[PHASE: wizard] [STEP: imaging] Attachment rejected");
                Some(msg)
            }
        }
    }

    fn remove(&mut self, idx: usize) -> bool {
        match idx.checked_sub(FIRST_FILE_FIELD) {
            Some(i) if i < self.files.len() => {
                self.files.remove(i);
                true
            }
            _ => false,
        }
    }

    fn derived(&self) -> Vec<DerivedValue> {
        let count = parse_numeric(&self.follicle_count.value);
        if derived::rotterdam_follicle_advisory(count) {
            vec![DerivedValue::new("Rotterdam Criteria", numeric_to_text(count))
                .with_note(derived::ROTTERDAM_ADVISORY, true)]
        } else {
            Vec::new()
        }
    }

    fn confirm(&self) -> Option<SectionUpdate> {
        Some(SectionUpdate::Imaging(self.to_record()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn accepted_names() {
        assert!(is_accepted_image_name("scan.dcm"));
        assert!(is_accepted_image_name("Left_Ovary.JPG"));
        assert!(is_accepted_image_name("frame.tiff"));
        assert!(!is_accepted_image_name("notes.pdf"));
        assert!(!is_accepted_image_name("dcm"));
    }

    #[test]
    fn rotterdam_advisory_from_twelve_follicles() {
        let mut d = ImagingDraft::default();
        d.follicle_count.set("11");
        assert!(d.derived().is_empty());
        d.follicle_count.set("12");
        let derived = d.derived();
        assert_eq!(derived.len(), 1);
        assert_eq!(derived[0].note.as_deref(), Some(derived::ROTTERDAM_ADVISORY));
        assert!(derived[0].advisory);
    }

    #[test]
    fn attach_list_and_remove_files() {
        let dir = tempfile::tempdir().unwrap();
        let scan = dir.path().join("scan.dcm");
        let mut f = fs::File::create(&scan).unwrap();
        f.write_all(&vec![0u8; 2 * 1024 * 1024]).unwrap();
        drop(f);

        let mut d = ImagingDraft::default();
        d.file_path.set(scan.to_string_lossy().to_string());
        assert_eq!(d.activate(PATH_FIELD).as_deref(), Some("1 file(s) added"));
        assert!(d.file_path.is_blank(), "Path entry clears after a successful add");

        let fields = d.fields();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[FIRST_FILE_FIELD].label, "scan.dcm");
        assert_eq!(fields[FIRST_FILE_FIELD].value, "2.00 MB");

        assert!(!d.remove(PATH_FIELD), "Only list entries are removable");
        assert!(d.remove(FIRST_FILE_FIELD));
        assert!(d.files.is_empty());
        assert!(!d.remove(FIRST_FILE_FIELD));
    }

    #[test]
    fn attach_directory_picks_images_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.png"), b"png").unwrap();
        fs::write(dir.path().join("a.dcm"), b"dicom").unwrap();
        fs::write(dir.path().join("report.pdf"), b"pdf").unwrap();

        let mut d = ImagingDraft::default();
        assert_eq!(d.attach(dir.path()), Ok(2));
        let names: Vec<&str> = d.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.dcm", "b.png"]);
    }

    #[test]
    fn rejected_file_keeps_path_for_correction() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("report.pdf");
        fs::write(&pdf, b"pdf").unwrap();

        let mut d = ImagingDraft::default();
        d.file_path.set(pdf.to_string_lossy().to_string());
        let status = d.activate(PATH_FIELD).unwrap();
        assert!(status.starts_with("Unsupported file type"), "{}", status);
        assert!(!d.file_path.is_blank());
        assert!(d.files.is_empty());
    }

    #[test]
    fn confirm_carries_file_metadata() {
        let mut d = ImagingDraft::default();
        d.files.push(UploadedFile {
            name: "x.png".into(),
            size_bytes: 10,
        });
        d.ovarian_volume.set("11.5");
        let Some(SectionUpdate::Imaging(r)) = d.confirm() else {
            panic!("expected imaging update");
        };
        assert_eq!(r.ovarian_volume, Some(11.5));
        assert_eq!(r.ultrasound_files.len(), 1);
        assert_eq!(r.follicle_count, None);
    }
}
