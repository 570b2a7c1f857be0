//! Terminal UI (TUI) for the clinical assessment wizard.
//!
//! Layout:
//! - Centered window titled "Clinical Assessment"
//! - Left panel listing the seven steps, current one highlighted
//! - Main content panel: "Step N of 7" header, progress gauge, step fields and derived values
//! - Bottom button row: [ Back ] [ Continue ] [ Cancel ]
//! - Modal overlays for cancel confirmation and messages
//!
//! Logging is file-only in TUI mode so the terminal is never corrupted.

mod render;

use crate::models::aggregate::SectionUpdate;
use crate::models::records::{
    ConsentRecord, CycleRegularity, DemographicsRecord, ImagingRecord, LabsRecord, Sex,
    SymptomsRecord, UploadedFile, VitalsRecord,
};
use crate::models::requests::AssessmentSubmission;
use crate::models::results::ResultSummary;
use crate::submission::SubmissionBackend;
use crate::utils::logging::summarize_sections;
use crate::wizard::input::TextInput;
use crate::wizard::steps::{FieldKind, StepDraft, StepId};
use crate::wizard::WizardController;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use log::{info, warn};
use ratatui::backend::{CrosstermBackend, TestBackend};
use ratatui::Terminal;
use std::collections::HashMap;
use std::io::{self, Stdout};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const RESULTS_PAGE_LINES: u16 = 5;

pub const SMOKE_TARGETS: [&str; 10] = [
    "home",
    "consent",
    "demographics",
    "symptoms",
    "vitals",
    "labs",
    "imaging",
    "review",
    "submitting",
    "results",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Home,
    Assessment,
    Submitting,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ButtonFocus {
    Back,
    Next,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Modal {
    ConfirmCancel,
    Message {
        title: String,
        body: String,
        return_to: Option<Page>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FocusTarget {
    Field(usize),
    Button(ButtonFocus),
}

#[derive(Debug)]
enum UiMsg {
    SubmissionFinished {
        correlation_id: String,
        result: std::result::Result<ResultSummary, String>,
    },
}

struct WizardState {
    page: Page,
    controller: WizardController,
    draft: StepDraft,
    modal: Option<Modal>,
    focus: FocusTarget,
    quit: bool,

    /// Feedback from the last field action (e.g. "1 file(s) added").
    status: Option<String>,

    backend_name: &'static str,
    correlation_id: Option<String>,
    submitted_at: Option<Instant>,
    result: Option<ResultSummary>,
    /// First visible line of the Results body (PageUp/PageDown).
    results_scroll: u16,
    /// Drafts as they were when confirmed, so Back restores exactly what was typed.
    confirmed_drafts: HashMap<StepId, StepDraft>,
    tick: u64,
}

impl WizardState {
    fn new(backend_name: &'static str) -> Self {
        let controller = WizardController::new();
        let draft = StepDraft::seed(controller.current_step(), controller.aggregate());
        Self {
            page: Page::Home,
            controller,
            draft,
            modal: None,
            focus: FocusTarget::Button(ButtonFocus::Next),
            quit: false,
            status: None,
            backend_name,
            correlation_id: None,
            submitted_at: None,
            result: None,
            results_scroll: 0,
            confirmed_drafts: HashMap::new(),
            tick: 0,
        }
    }

    fn reseed_draft(&mut self) {
        let step = self.controller.current_step();
        self.draft = match self.confirmed_drafts.get(&step) {
            Some(draft) => draft.clone(),
            None => StepDraft::seed(step, self.controller.aggregate()),
        };
        self.status = None;
        reset_focus(self);
    }
}

fn page_title(state: &WizardState) -> &'static str {
    match state.page {
        Page::Home => "Clinical Assessment",
        Page::Assessment => state.controller.current_step().title(),
        Page::Submitting => "Analyzing",
        Page::Results => "Assessment Results",
    }
}

fn next_label(state: &WizardState) -> &'static str {
    match state.page {
        Page::Home => "Start Assessment",
        Page::Assessment if state.controller.is_last_step() => "Submit Assessment",
        Page::Assessment => "Continue",
        Page::Submitting => "Submitting...",
        Page::Results => "New Assessment",
    }
}

fn back_label(page: Page) -> &'static str {
    match page {
        Page::Results => "Home",
        _ => "Back",
    }
}

fn can_go_back(state: &WizardState) -> bool {
    match state.page {
        Page::Assessment => !state.controller.is_first_step(),
        Page::Results => true,
        Page::Home | Page::Submitting => false,
    }
}

fn can_go_next(state: &WizardState) -> bool {
    match state.page {
        Page::Home | Page::Results => true,
        Page::Assessment => state.draft.view().can_continue(),
        Page::Submitting => false,
    }
}

fn can_cancel(page: Page) -> bool {
    !matches!(page, Page::Submitting)
}

fn page_field_count(state: &WizardState) -> usize {
    match state.page {
        Page::Assessment => state.draft.view().fields().len(),
        _ => 0,
    }
}

fn focused_field_kind(state: &WizardState) -> Option<(usize, FieldKind)> {
    let FocusTarget::Field(i) = state.focus else {
        return None;
    };
    if state.page != Page::Assessment {
        return None;
    }
    state.draft.view().fields().get(i).map(|f| (i, f.kind))
}

fn reset_focus(state: &mut WizardState) {
    state.focus = if page_field_count(state) > 0 {
        FocusTarget::Field(0)
    } else {
        FocusTarget::Button(ButtonFocus::Next)
    };
}

fn focused_button(state: &WizardState) -> ButtonFocus {
    match state.focus {
        FocusTarget::Button(b) => b,
        _ => ButtonFocus::Next,
    }
}

fn set_focused_button(state: &mut WizardState, b: ButtonFocus) {
    state.focus = FocusTarget::Button(b);
}

/// Tab order: fields, then Back, Next, Cancel, then around again.
fn focus_next(state: &mut WizardState) {
    let fields = page_field_count(state);
    state.focus = match state.focus {
        FocusTarget::Field(i) if i + 1 < fields => FocusTarget::Field(i + 1),
        FocusTarget::Field(_) => FocusTarget::Button(ButtonFocus::Back),
        FocusTarget::Button(ButtonFocus::Back) => FocusTarget::Button(ButtonFocus::Next),
        FocusTarget::Button(ButtonFocus::Next) => FocusTarget::Button(ButtonFocus::Cancel),
        FocusTarget::Button(ButtonFocus::Cancel) if fields > 0 => FocusTarget::Field(0),
        FocusTarget::Button(ButtonFocus::Cancel) => FocusTarget::Button(ButtonFocus::Back),
    };
}

fn focus_prev(state: &mut WizardState) {
    let fields = page_field_count(state);
    state.focus = match state.focus {
        FocusTarget::Field(0) => FocusTarget::Button(ButtonFocus::Cancel),
        FocusTarget::Field(i) => FocusTarget::Field(i - 1),
        FocusTarget::Button(ButtonFocus::Back) if fields > 0 => FocusTarget::Field(fields - 1),
        FocusTarget::Button(ButtonFocus::Back) => FocusTarget::Button(ButtonFocus::Cancel),
        FocusTarget::Button(ButtonFocus::Next) => FocusTarget::Button(ButtonFocus::Back),
        FocusTarget::Button(ButtonFocus::Cancel) => FocusTarget::Button(ButtonFocus::Next),
    };
}

/// Standard line-editing keys. Returns true when the key was consumed.
fn edit_text(input: &mut TextInput, code: KeyCode) -> bool {
    match code {
        KeyCode::Char(c) => input.insert(c),
        KeyCode::Backspace => input.backspace(),
        KeyCode::Delete => input.delete(),
        KeyCode::Left => input.left(),
        KeyCode::Right => input.right(),
        KeyCode::Home => input.home(),
        KeyCode::End => input.end(),
        _ => return false,
    }
    true
}

pub fn run(backend: Arc<dyn SubmissionBackend>) -> Result<()> {
    info!(
        "[PHASE: tui] [STEP: start] Starting assessment wizard (submission backend: {})",
        backend.name()
    );

    let mut terminal = setup_terminal()?;
    let result = run_loop(&mut terminal, backend);
    restore_terminal(&mut terminal)?;

    info!("[PHASE: tui] [STEP: exit] Assessment wizard closed");
    result
}

fn sample_update(step: StepId) -> Option<SectionUpdate> {
    Some(match step {
        StepId::Consent => SectionUpdate::Consents(ConsentRecord {
            data_collection: true,
            data_storage: true,
            synthetic_generation: true,
            research_use: true,
        }),
        StepId::Demographics => SectionUpdate::Demographics(DemographicsRecord {
            age: Some(29.0),
            sex: Some(Sex::Female),
            ethnicity: None,
            height: Some(165.0),
            weight: Some(70.0),
            waist: Some(84.0),
        }),
        StepId::Symptoms => SectionUpdate::Symptoms(SymptomsRecord {
            menstrual_cycle: Some(CycleRegularity::Irregular),
            hirsutism: true,
            acne: true,
            family_history_diabetes: true,
            ..SymptomsRecord::default()
        }),
        StepId::Vitals => SectionUpdate::Vitals(VitalsRecord {
            systolic: Some(145.0),
            diastolic: Some(85.0),
            heart_rate: Some(72.0),
        }),
        StepId::Labs => SectionUpdate::Labs(LabsRecord {
            glucose: Some(95.0),
            insulin: Some(10.0),
            lh: Some(12.0),
            fsh: Some(5.0),
            testosterone: Some(68.0),
            ..LabsRecord::default()
        }),
        StepId::Imaging => SectionUpdate::Imaging(ImagingRecord {
            ovarian_volume: Some(11.5),
            follicle_count: Some(12.0),
            ultrasound_files: vec![UploadedFile {
                name: "left_ovary.dcm".to_string(),
                size_bytes: 2_202_009,
            }],
        }),
        StepId::Review => return None,
    })
}

fn new_smoke_wizard_state(target: &str) -> WizardState {
    // Smoke-only: seeded sample values for deterministic rendering.
    let mut state = WizardState::new("mock");

    let step = match target {
        "home" => None,
        "submitting" | "results" => Some(StepId::Review),
        other => Some(StepId::from_id(other).unwrap_or(StepId::Consent)),
    };

    if let Some(step) = step {
        state.page = Page::Assessment;
        while state.controller.current_step() != step {
            match sample_update(state.controller.current_step()) {
                Some(update) => state.controller.advance(update),
                None => break,
            }
        }
        // Fill the target step too, then step back onto it so its draft shows the sample.
        if let Some(update) = sample_update(step) {
            state.controller.advance(update);
            state.controller.retreat();
        }
        state.reseed_draft();
    }

    match target {
        "submitting" => {
            state.page = Page::Submitting;
            state.correlation_id = Some("00000000-0000-4000-8000-000000000000".to_string());
            state.submitted_at = Some(Instant::now());
        }
        "results" => {
            state.page = Page::Results;
            state.result = Some(ResultSummary::mock());
            set_focused_button(&mut state, ButtonFocus::Next);
        }
        _ => {}
    }
    state
}

/// Non-interactive smoke mode: render a single frame to an in-memory backend and exit.
/// Targets: home|consent|demographics|symptoms|vitals|labs|imaging|review|submitting|results
pub fn smoke(target: &str) -> Result<()> {
    info!(
        "[PHASE: tui] [STEP: smoke] Rendering single-frame TUI smoke target={}",
        target
    );

    let t = target.trim().to_ascii_lowercase();
    if !SMOKE_TARGETS.contains(&t.as_str()) {
        anyhow::bail!(
            "Unknown smoke target '{}'. Expected one of: {}",
            target,
            SMOKE_TARGETS.join("|")
        );
    }
    let state = new_smoke_wizard_state(t.as_str());

    let backend = TestBackend::new(100, 30);
    let mut terminal = Terminal::new(backend)?;
    terminal.draw(|f| render::draw(f.size(), f, &state))?;

    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    backend: Arc<dyn SubmissionBackend>,
) -> Result<()> {
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();
    let mut state = WizardState::new(backend.name());
    let (tx, rx) = mpsc::channel::<UiMsg>();

    while !state.quit {
        drain_messages(&mut state, &rx);
        terminal.draw(|f| render::draw(f.size(), f, &state))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_millis(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(&mut state, key.code, &tx, &backend);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
            state.tick = state.tick.wrapping_add(1);
        }
    }

    Ok(())
}

fn drain_messages(state: &mut WizardState, rx: &mpsc::Receiver<UiMsg>) {
    while let Ok(msg) = rx.try_recv() {
        apply_message(state, msg);
    }
}

fn apply_message(state: &mut WizardState, msg: UiMsg) {
    match msg {
        UiMsg::SubmissionFinished {
            correlation_id,
            result,
        } => {
            if state.correlation_id.as_deref() != Some(correlation_id.as_str()) {
                warn!(
                    "[PHASE: submission] [STEP: finished] Ignoring result for stale submission (correlation_id={})",
                    correlation_id
                );
                return;
            }
            let elapsed_ms = state
                .submitted_at
                .map(|t| t.elapsed().as_millis())
                .unwrap_or(0);
            match result {
                Ok(summary) => {
                    info!(
                        "[PHASE: submission] [STEP: finished] Results received in {} ms, risk level {} (correlation_id={})",
                        elapsed_ms,
                        summary.risk_level().as_str(),
                        correlation_id
                    );
                    state.result = Some(summary);
                    state.results_scroll = 0;
                    state.page = Page::Results;
                    set_focused_button(state, ButtonFocus::Next);
                }
                Err(message) => {
                    warn!(
                        "[PHASE: submission] [STEP: finished] Submission failed after {} ms: {} (correlation_id={})",
                        elapsed_ms, message, correlation_id
                    );
                    state.modal = Some(Modal::Message {
                        title: "Submission failed".to_string(),
                        body: format!(
                            "{}\n\nYour answers are still here. Review them and submit again.\n\nReference: {}",
                            message, correlation_id
                        ),
                        return_to: Some(Page::Assessment),
                    });
                    set_focused_button(state, ButtonFocus::Next);
                }
            }
        }
    }
}

fn start_submission(
    state: &mut WizardState,
    tx: &mpsc::Sender<UiMsg>,
    backend: &Arc<dyn SubmissionBackend>,
) {
    let submission = AssessmentSubmission::new(state.controller.aggregate().clone());
    let correlation_id = submission.correlation_id.clone();
    info!(
        "[PHASE: submission] [STEP: start] Submitting {} via {} backend (correlation_id={})",
        summarize_sections(&submission.assessment),
        backend.name(),
        correlation_id
    );

    state.page = Page::Submitting;
    state.correlation_id = Some(correlation_id.clone());
    state.submitted_at = Some(Instant::now());
    state.result = None;

    let backend = Arc::clone(backend);
    let tx = tx.clone();
    thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build();
        let result = match rt {
            Ok(rt) => rt
                .block_on(backend.submit(&submission))
                .map_err(|e| e.to_string()),
            Err(e) => Err(format!("Internal error starting submission worker: {}", e)),
        };
        let _ = tx.send(UiMsg::SubmissionFinished {
            correlation_id,
            result,
        });
    });
}

fn start_new_assessment(state: &mut WizardState) {
    state.controller = WizardController::new();
    state.confirmed_drafts.clear();
    state.result = None;
    state.correlation_id = None;
    state.submitted_at = None;
    state.page = Page::Assessment;
    state.reseed_draft();
    info!("[PHASE: wizard] [STEP: start] New assessment started");
}

fn go_back(state: &mut WizardState) {
    if !can_go_back(state) {
        return;
    }
    match state.page {
        Page::Assessment => {
            // Unconfirmed edits on the current step are discarded.
            state.controller.retreat();
            state.reseed_draft();
        }
        Page::Results => {
            state.controller = WizardController::new();
            state.confirmed_drafts.clear();
            state.result = None;
            state.page = Page::Home;
            state.reseed_draft();
        }
        Page::Home | Page::Submitting => {}
    }
}

fn go_next(
    state: &mut WizardState,
    tx: &mpsc::Sender<UiMsg>,
    backend: &Arc<dyn SubmissionBackend>,
) {
    if !can_go_next(state) {
        return;
    }
    match state.page {
        Page::Home | Page::Results => start_new_assessment(state),
        Page::Assessment => {
            if state.controller.current_step() == StepId::Review {
                start_submission(state, tx, backend);
                return;
            }
            if let Some(update) = state.draft.view().confirm() {
                let step = state.controller.current_step();
                state.confirmed_drafts.insert(step, state.draft.clone());
                state.controller.advance(update);
                info!(
                    "[PHASE: wizard] [STEP: {}] {} ({})",
                    state.controller.current_step().as_id(),
                    state.controller.step_label(),
                    summarize_sections(state.controller.aggregate())
                );
                state.reseed_draft();
            }
        }
        Page::Submitting => {}
    }
}

fn handle_field_key(state: &mut WizardState, idx: usize, kind: FieldKind, code: KeyCode) -> bool {
    let view = state.draft.view_mut();
    match (kind, code) {
        (FieldKind::Text, KeyCode::Enter) => match view.activate(idx) {
            Some(status) => {
                state.status = Some(status);
                true
            }
            None => false,
        },
        (FieldKind::Text, code) => match view.text_input_mut(idx) {
            Some(input) => edit_text(input, code),
            None => false,
        },
        (FieldKind::Toggle, KeyCode::Char(' ')) => {
            view.toggle(idx);
            true
        }
        (FieldKind::Choice, KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')) => {
            view.cycle(idx);
            true
        }
        (FieldKind::Item, KeyCode::Char('x') | KeyCode::Char('X') | KeyCode::Delete) => {
            if view.remove(idx) {
                state.status = Some("File removed".to_string());
                let remaining = page_field_count(state);
                if idx >= remaining {
                    state.focus = FocusTarget::Field(remaining.saturating_sub(1));
                }
            }
            true
        }
        _ => false,
    }
}

fn handle_key(
    state: &mut WizardState,
    code: KeyCode,
    tx: &mpsc::Sender<UiMsg>,
    backend: &Arc<dyn SubmissionBackend>,
) {
    // Modal handling
    if let Some(modal) = state.modal.clone() {
        match modal {
            Modal::ConfirmCancel => match code {
                KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::BackTab => {
                    let next = match focused_button(state) {
                        ButtonFocus::Cancel => ButtonFocus::Next,
                        _ => ButtonFocus::Cancel,
                    };
                    set_focused_button(state, next);
                }
                KeyCode::Enter => {
                    let confirm = focused_button(state) == ButtonFocus::Cancel;
                    state.modal = None;
                    if confirm {
                        info!("[PHASE: tui] [STEP: cancel] Assessment cancelled by user");
                        state.quit = true;
                    } else {
                        reset_focus(state);
                    }
                }
                KeyCode::Esc => {
                    state.modal = None;
                    reset_focus(state);
                }
                _ => {}
            },
            Modal::Message { return_to, .. } => {
                if matches!(code, KeyCode::Enter | KeyCode::Esc) {
                    state.modal = None;
                    if let Some(p) = return_to {
                        state.page = p;
                    }
                    reset_focus(state);
                }
            }
        }
        return;
    }

    // Global keys
    if matches!(code, KeyCode::Esc) {
        if can_cancel(state.page) {
            state.modal = Some(Modal::ConfirmCancel);
            set_focused_button(state, ButtonFocus::Next); // "No"
        }
        return;
    }
    match code {
        KeyCode::Tab => {
            focus_next(state);
            return;
        }
        KeyCode::BackTab => {
            focus_prev(state);
            return;
        }
        _ => {}
    }

    if state.page == Page::Results {
        match code {
            KeyCode::PageDown => {
                state.results_scroll = state.results_scroll.saturating_add(RESULTS_PAGE_LINES);
                return;
            }
            KeyCode::PageUp => {
                state.results_scroll = state.results_scroll.saturating_sub(RESULTS_PAGE_LINES);
                return;
            }
            KeyCode::Down => {
                state.results_scroll = state.results_scroll.saturating_add(1);
                return;
            }
            KeyCode::Up => {
                state.results_scroll = state.results_scroll.saturating_sub(1);
                return;
            }
            _ => {}
        }
    }

    // Field handling (when a field is focused)
    if let Some((idx, kind)) = focused_field_kind(state) {
        if handle_field_key(state, idx, kind, code) {
            return;
        }
        if matches!(code, KeyCode::Enter | KeyCode::Down) {
            focus_next(state);
        } else if matches!(code, KeyCode::Up) {
            focus_prev(state);
        }
        return;
    }

    match code {
        KeyCode::Left => focus_prev(state),
        KeyCode::Right => focus_next(state),
        KeyCode::Enter => match focused_button(state) {
            ButtonFocus::Back => go_back(state),
            ButtonFocus::Next => go_next(state, tx, backend),
            ButtonFocus::Cancel => {
                if can_cancel(state.page) {
                    state.modal = Some(Modal::ConfirmCancel);
                    set_focused_button(state, ButtonFocus::Next);
                }
            }
        },
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::aggregate::AssessmentAggregate;
    use crate::models::results::RECOMMENDATIONS;
    use crate::submission::{MockSubmitter, SubmissionError};
    use async_trait::async_trait;
    use ratatui::buffer::Buffer;

    struct RejectingBackend;

    #[async_trait]
    impl SubmissionBackend for RejectingBackend {
        fn name(&self) -> &'static str {
            "rejecting"
        }

        async fn submit(
            &self,
            _submission: &AssessmentSubmission,
        ) -> std::result::Result<ResultSummary, SubmissionError> {
            Err(SubmissionError::Rejected { status: 422 })
        }
    }

    struct Harness {
        state: WizardState,
        tx: mpsc::Sender<UiMsg>,
        rx: mpsc::Receiver<UiMsg>,
        backend: Arc<dyn SubmissionBackend>,
    }

    impl Harness {
        fn new(backend: Arc<dyn SubmissionBackend>) -> Self {
            let (tx, rx) = mpsc::channel();
            Self {
                state: WizardState::new(backend.name()),
                tx,
                rx,
                backend,
            }
        }

        fn mock() -> Self {
            Self::new(Arc::new(MockSubmitter::new(Duration::from_millis(0))))
        }

        fn press(&mut self, code: KeyCode) {
            handle_key(&mut self.state, code, &self.tx, &self.backend);
        }

        fn type_text(&mut self, text: &str) {
            for c in text.chars() {
                self.press(KeyCode::Char(c));
            }
        }

        fn press_button(&mut self, b: ButtonFocus) {
            set_focused_button(&mut self.state, b);
            self.press(KeyCode::Enter);
        }

        fn focus_field(&mut self, idx: usize) {
            self.state.focus = FocusTarget::Field(idx);
        }

        fn wait_for_submission(&mut self) {
            let msg = self
                .rx
                .recv_timeout(Duration::from_secs(5))
                .expect("submission worker should report back");
            apply_message(&mut self.state, msg);
        }

        fn step(&self) -> StepId {
            self.state.controller.current_step()
        }
    }

    fn buffer_text(buf: &Buffer) -> String {
        let width = buf.area.width as usize;
        buf.content()
            .chunks(width)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render(state: &WizardState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal
            .draw(|f| render::draw(f.size(), f, state))
            .unwrap();
        buffer_text(terminal.backend().buffer())
    }

    fn accept_consent(h: &mut Harness) {
        for i in 0..4 {
            h.focus_field(i);
            h.press(KeyCode::Char(' '));
        }
        h.press_button(ButtonFocus::Next);
    }

    fn fill_demographics(h: &mut Harness) {
        h.focus_field(0);
        h.type_text("29");
        h.focus_field(1);
        h.press(KeyCode::Right);
        h.focus_field(3);
        h.type_text("165");
        h.focus_field(4);
        h.type_text("70");
        h.press_button(ButtonFocus::Next);
    }

    #[test]
    fn every_smoke_target_renders() {
        for target in SMOKE_TARGETS {
            smoke(target).unwrap_or_else(|e| panic!("smoke {} failed: {}", target, e));
        }
        assert!(smoke("nonsense").is_err());
    }

    #[test]
    fn smoke_pages_show_expected_headers() {
        let text = render(&new_smoke_wizard_state("labs"));
        assert!(text.contains("Step 5 of 7: Laboratory Values"), "{}", text);
        assert!(text.contains("2.35"), "HOMA-IR card missing:\n{}", text);

        let text = render(&new_smoke_wizard_state("results"));
        assert!(text.contains("68"), "{}", text);
        assert!(text.contains("72.0%"), "{}", text);

        // Everything below the fold is reachable by scrolling.
        let mut state = new_smoke_wizard_state("results");
        let mut seen = String::new();
        for offset in 0..40 {
            state.results_scroll = offset;
            seen.push_str(&render(&state));
        }
        for (title, _) in RECOMMENDATIONS {
            assert!(seen.contains(title), "Recommendation '{}' never shown", title);
        }
        assert!(seen.contains("Model: GAN-PINN v2.1.0"), "Model line never shown");
    }

    #[test]
    fn results_scroll_with_page_keys() {
        let mut h = Harness::mock();
        h.state = new_smoke_wizard_state("results");
        h.press(KeyCode::PageDown);
        assert_eq!(h.state.results_scroll, RESULTS_PAGE_LINES);
        h.press(KeyCode::Down);
        assert_eq!(h.state.results_scroll, RESULTS_PAGE_LINES + 1);
        h.press(KeyCode::PageUp);
        h.press(KeyCode::PageUp);
        assert_eq!(h.state.results_scroll, 0, "Scrolling up stops at the top");

        for _ in 0..10 {
            h.press(KeyCode::PageDown);
        }
        let text = render(&h.state);
        assert!(text.contains("Lifestyle Modifications"), "{}", text);
        assert_eq!(h.state.page, Page::Results, "Scrolling never navigates");
    }

    #[test]
    fn tiny_terminal_renders_modals_without_panicking() {
        let mut state = WizardState::new("mock");
        for modal in [
            Modal::ConfirmCancel,
            Modal::Message {
                title: "Submission failed".to_string(),
                body: "inference service rejected the request (HTTP 422)".to_string(),
                return_to: Some(Page::Assessment),
            },
        ] {
            state.modal = Some(modal);
            for (w, h) in [(30, 10), (44, 12), (20, 5)] {
                let mut terminal = Terminal::new(TestBackend::new(w, h)).unwrap();
                terminal
                    .draw(|f| render::draw(f.size(), f, &state))
                    .unwrap();
            }
        }

        let mut results = new_smoke_wizard_state("results");
        results.modal = Some(Modal::ConfirmCancel);
        let mut terminal = Terminal::new(TestBackend::new(30, 10)).unwrap();
        terminal
            .draw(|f| render::draw(f.size(), f, &results))
            .unwrap();
        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("[ No ]"), "{}", text);
    }

    #[test]
    fn back_restores_unparseable_text_as_typed() {
        let mut h = Harness::mock();
        h.press(KeyCode::Enter);
        accept_consent(&mut h);
        h.focus_field(0);
        h.type_text("29");
        h.focus_field(1);
        h.press(KeyCode::Right);
        h.focus_field(3);
        h.type_text("165");
        h.focus_field(4);
        h.type_text("seventy");
        h.press_button(ButtonFocus::Next);
        assert_eq!(h.step(), StepId::Symptoms, "Presence, not validity, gates the step");
        let weight = h.state.controller.aggregate().demographics.as_ref().and_then(|d| d.weight);
        assert!(weight.is_some_and(f64::is_nan), "{:?}", weight);

        h.press_button(ButtonFocus::Back);
        assert_eq!(h.step(), StepId::Demographics);
        assert_eq!(h.state.draft.view().fields()[4].value, "seventy");

        // A fresh assessment forgets earlier drafts.
        start_new_assessment(&mut h.state);
        accept_consent(&mut h);
        assert_eq!(h.step(), StepId::Demographics);
        assert_eq!(h.state.draft.view().fields()[4].value, "");
    }

    #[test]
    fn home_starts_assessment_on_consent() {
        let mut h = Harness::mock();
        assert_eq!(h.state.page, Page::Home);
        h.press(KeyCode::Enter);
        assert_eq!(h.state.page, Page::Assessment);
        assert_eq!(h.step(), StepId::Consent);
        assert_eq!(h.state.focus, FocusTarget::Field(0));
    }

    #[test]
    fn consent_blocks_until_all_four_checked() {
        let mut h = Harness::mock();
        h.press(KeyCode::Enter);
        for i in 0..3 {
            h.focus_field(i);
            h.press(KeyCode::Char(' '));
        }
        h.press_button(ButtonFocus::Next);
        assert_eq!(h.step(), StepId::Consent, "Continue must be inert with 3 of 4");

        h.focus_field(3);
        h.press(KeyCode::Char(' '));
        h.press_button(ButtonFocus::Next);
        assert_eq!(h.step(), StepId::Demographics);
        assert!(h.state.controller.aggregate().consents.is_some());
    }

    #[test]
    fn demographics_typing_and_back_navigation() {
        let mut h = Harness::mock();
        h.press(KeyCode::Enter);
        accept_consent(&mut h);
        fill_demographics(&mut h);
        assert_eq!(h.step(), StepId::Symptoms);

        let demo = h.state.controller.aggregate().demographics.clone().unwrap();
        assert_eq!(demo.age, Some(29.0));
        assert_eq!(demo.sex, Some(Sex::Female));
        assert_eq!(demo.height, Some(165.0));

        h.press_button(ButtonFocus::Back);
        assert_eq!(h.step(), StepId::Demographics);
        let text = render(&h.state);
        assert!(text.contains("25.7"), "Reseeded draft shows BMI:\n{}", text);
    }

    #[test]
    fn back_is_disabled_on_first_step() {
        let mut h = Harness::mock();
        h.press(KeyCode::Enter);
        h.press_button(ButtonFocus::Back);
        assert_eq!(h.state.page, Page::Assessment);
        assert_eq!(h.step(), StepId::Consent);
    }

    #[test]
    fn tab_cycles_fields_then_buttons() {
        let mut h = Harness::mock();
        h.press(KeyCode::Enter);
        for _ in 0..4 {
            h.press(KeyCode::Tab);
        }
        assert_eq!(h.state.focus, FocusTarget::Button(ButtonFocus::Back));
        h.press(KeyCode::Tab);
        h.press(KeyCode::Tab);
        assert_eq!(h.state.focus, FocusTarget::Button(ButtonFocus::Cancel));
        h.press(KeyCode::Tab);
        assert_eq!(h.state.focus, FocusTarget::Field(0));
        h.press(KeyCode::BackTab);
        assert_eq!(h.state.focus, FocusTarget::Button(ButtonFocus::Cancel));
    }

    #[test]
    fn escape_opens_cancel_and_no_keeps_running() {
        let mut h = Harness::mock();
        h.press(KeyCode::Esc);
        assert_eq!(h.state.modal, Some(Modal::ConfirmCancel));
        h.press(KeyCode::Enter);
        assert!(h.state.modal.is_none());
        assert!(!h.state.quit);

        h.press(KeyCode::Esc);
        h.press(KeyCode::Left);
        h.press(KeyCode::Enter);
        assert!(h.state.quit);
    }

    #[test]
    fn full_flow_submits_and_shows_results() {
        let mut h = Harness::mock();
        h.press(KeyCode::Enter);
        accept_consent(&mut h);
        fill_demographics(&mut h);
        for _ in 0..4 {
            h.press_button(ButtonFocus::Next);
        }
        assert_eq!(h.step(), StepId::Review);
        assert_eq!(
            h.state.controller.aggregate().present_sections(),
            vec!["consents", "demographics", "symptoms", "vitals", "labs", "imaging"]
        );

        h.press_button(ButtonFocus::Next);
        assert_eq!(h.state.page, Page::Submitting);
        h.press(KeyCode::Esc);
        assert!(h.state.modal.is_none(), "Cancel is unavailable while submitting");

        h.wait_for_submission();
        assert_eq!(h.state.page, Page::Results);
        assert_eq!(h.state.result.as_ref().map(|r| r.risk_score), Some(68));

        h.press_button(ButtonFocus::Next);
        assert_eq!(h.state.page, Page::Assessment);
        assert_eq!(h.step(), StepId::Consent);
        assert!(h.state.controller.aggregate().is_empty());
    }

    #[test]
    fn failed_submission_returns_to_review() {
        let mut h = Harness::new(Arc::new(RejectingBackend));
        h.press(KeyCode::Enter);
        accept_consent(&mut h);
        fill_demographics(&mut h);
        for _ in 0..4 {
            h.press_button(ButtonFocus::Next);
        }
        h.press_button(ButtonFocus::Next);
        h.wait_for_submission();

        match &h.state.modal {
            Some(Modal::Message { title, body, .. }) => {
                assert_eq!(title, "Submission failed");
                assert!(body.contains("422"), "{}", body);
            }
            other => panic!("expected message modal, got {:?}", other),
        }
        h.press(KeyCode::Enter);
        assert_eq!(h.state.page, Page::Assessment);
        assert_eq!(h.step(), StepId::Review);
        assert!(h.state.controller.aggregate().demographics.is_some());
    }

    #[test]
    fn stale_submission_result_is_ignored() {
        let mut h = Harness::mock();
        h.state.page = Page::Submitting;
        h.state.correlation_id = Some("current".to_string());
        apply_message(
            &mut h.state,
            UiMsg::SubmissionFinished {
                correlation_id: "old".to_string(),
                result: Ok(ResultSummary::mock()),
            },
        );
        assert_eq!(h.state.page, Page::Submitting);
        assert!(h.state.result.is_none());
    }

    #[test]
    fn imaging_file_add_and_remove_through_keys() {
        let dir = tempfile::tempdir().unwrap();
        let scan = dir.path().join("scan.png");
        std::fs::write(&scan, vec![0u8; 1024]).unwrap();

        let mut h = Harness::mock();
        h.state = new_smoke_wizard_state("imaging");
        let before = h.state.draft.view().fields().len();

        h.focus_field(crate::wizard::steps::PATH_FIELD);
        h.type_text(&scan.to_string_lossy());
        h.press(KeyCode::Enter);
        assert_eq!(h.state.status.as_deref(), Some("1 file(s) added"));
        assert_eq!(h.state.draft.view().fields().len(), before + 1);

        h.focus_field(before);
        h.press(KeyCode::Char('x'));
        assert_eq!(h.state.draft.view().fields().len(), before);
        assert_eq!(h.state.focus, FocusTarget::Field(before - 1));
    }

    #[test]
    fn labs_unit_cycles_with_arrows() {
        let mut h = Harness::mock();
        h.state = new_smoke_wizard_state("labs");
        h.focus_field(1);
        h.press(KeyCode::Right);
        let unit = h.state.draft.view().fields()[1].value.clone();
        assert_eq!(unit, "mmol/L");
    }

    #[test]
    fn aggregate_is_untouched_by_rendering() {
        let state = new_smoke_wizard_state("review");
        let before: AssessmentAggregate = state.controller.aggregate().clone();
        let text = render(&state);
        assert!(text.contains("Review & Submit"), "{}", text);
        assert_eq!(state.controller.aggregate(), &before);
    }
}
