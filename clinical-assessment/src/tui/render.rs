// Frame rendering for the assessment TUI.

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap};
use ratatui::Frame;

use super::{
    back_label, can_cancel, can_go_back, can_go_next, focused_button, next_label, page_title,
    ButtonFocus, FocusTarget, Modal, Page, WizardState,
};
use crate::models::results::{ResidualStatus, ResultSummary, RiskLevel, RECOMMENDATIONS};
use crate::wizard::derived::DerivedValue;
use crate::wizard::steps::{FieldKind, FieldView, ReviewDraft, StepDraft, StepId, CONSENT_ITEMS};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

const PRIVACY_NOTICE: &str = "All personal health information (PHI) is de-identified before processing. Data is encrypted and handled in line with HIPAA requirements.";

pub(super) fn draw(area: Rect, f: &mut Frame<'_>, state: &WizardState) {
    let window_area = centered_window(area, 100, 30);

    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title("Clinical Assessment");
    f.render_widget(outer_block, window_area);

    let inner = window_area.inner(&Margin {
        vertical: 1,
        horizontal: 1,
    });
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)].as_ref())
        .split(inner);
    let body = rows[0];
    let buttons = rows[1];

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(26), Constraint::Min(0)].as_ref())
        .split(body);

    draw_step_panel(f, cols[0], state);

    let content_block = Block::default()
        .borders(Borders::ALL)
        .title(page_title(state));
    f.render_widget(content_block, cols[1]);
    let content_inner = cols[1].inner(&Margin {
        vertical: 1,
        horizontal: 1,
    });

    // A very small terminal leaves no room for the body; buttons and modals still draw.
    let body_visible = !content_inner.is_empty();
    match state.page {
        _ if !body_visible => {}
        Page::Home => draw_paragraph(f, content_inner, home_text(), 0),
        Page::Assessment => draw_assessment(f, content_inner, state),
        Page::Submitting => draw_paragraph(f, content_inner, submitting_text(state), 0),
        Page::Results => match state.result.as_ref() {
            Some(summary) => draw_results(f, content_inner, summary, state),
            None => draw_paragraph(f, content_inner, Text::from("No results available."), 0),
        },
    }

    draw_buttons(f, buttons, state);

    if let Some(modal) = state.modal.as_ref() {
        match modal {
            Modal::ConfirmCancel => draw_cancel_modal(f, window_area, state),
            Modal::Message { title, body, .. } => {
                draw_message_modal(f, window_area, title, body, state)
            }
        }
    }
}

fn centered_window(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width.saturating_sub(2)).max(60).min(area.width);
    let h = height.min(area.height.saturating_sub(2)).max(20).min(area.height);
    let x = area.x + (area.width.saturating_sub(w)) / 2;
    let y = area.y + (area.height.saturating_sub(h)) / 2;
    Rect {
        x,
        y,
        width: w,
        height: h,
    }
}

fn draw_paragraph(f: &mut Frame<'_>, area: Rect, text: Text<'static>, scroll: u16) {
    let p = Paragraph::new(text)
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    f.render_widget(p, area);
}

/// Left panel: the seven steps with done / current markers.
fn draw_step_panel(f: &mut Frame<'_>, area: Rect, state: &WizardState) {
    let current = match state.page {
        Page::Assessment | Page::Submitting => Some(state.controller.current_index()),
        Page::Results => Some(StepId::ALL.len()),
        Page::Home => None,
    };

    let mut lines = vec![Line::from(""), Line::from(" Steps"), Line::from("")];
    for (i, step) in StepId::ALL.iter().enumerate() {
        let (marker, style) = match current {
            Some(c) if i < c => ("x", Style::default().fg(Color::Green)),
            Some(c) if i == c => (">", Style::default().add_modifier(Modifier::BOLD)),
            _ => (" ", Style::default().fg(Color::DarkGray)),
        };
        lines.push(Line::from(Span::styled(
            format!(" [{}] {}", marker, step.title()),
            style,
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!(" Backend: {}", state.backend_name),
        Style::default().fg(Color::DarkGray),
    )));

    let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
    f.render_widget(p, area);
}

fn home_text() -> Text<'static> {
    Text::from(vec![
        Line::from(Span::styled(
            "Advanced PCOS & Metabolic Syndrome Prediction",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Guided clinical intake across seven short steps:"),
        Line::from("consent, demographics, symptoms, vital signs, laboratory values,"),
        Line::from("imaging and a final review."),
        Line::from(""),
        Line::from("  - Derived indices (BMI, HOMA-IR, LH/FSH) shown as you type"),
        Line::from("  - Advisory flags for elevated blood pressure and Rotterdam criteria"),
        Line::from("  - Risk summary with key factors and recommendations"),
        Line::from(""),
        Line::from(Span::styled(
            "This tool supports, and does not replace, clinical judgement.",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
        Line::from("Select Start Assessment to begin. Esc exits at any time."),
    ])
}

fn field_line(field: &FieldView, focused: bool) -> Line<'static> {
    let marker = if focused { "> " } else { "  " };
    let required = if field.required { " *" } else { "" };
    let value_style = if focused {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    };

    let spans = match field.kind {
        FieldKind::Text => vec![
            Span::raw(format!("{}{}{}: ", marker, field.label, required)),
            Span::styled(format!("[{}]", field.value), value_style),
        ],
        FieldKind::Toggle => vec![
            Span::raw(marker.to_string()),
            Span::styled(field.value.clone(), value_style),
            Span::raw(format!(" {}{}", field.label, required)),
        ],
        FieldKind::Choice => vec![
            Span::raw(format!("{}{}{}: ", marker, field.label, required)),
            Span::styled(format!("< {} >", field.value), value_style),
        ],
        FieldKind::Item => vec![
            Span::raw(format!("{}  ", marker)),
            Span::styled(field.label.clone(), value_style),
            Span::styled(
                format!("  {}", field.value),
                Style::default().fg(Color::DarkGray),
            ),
        ],
    };
    Line::from(spans)
}

fn derived_lines(values: &[DerivedValue]) -> Vec<Line<'static>> {
    values
        .iter()
        .map(|d| {
            let mut spans = vec![
                Span::raw(format!("  {}: ", d.label)),
                Span::styled(
                    d.value.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ];
            if let Some(note) = d.note.as_ref() {
                let color = if d.advisory {
                    Color::Yellow
                } else {
                    Color::Green
                };
                spans.push(Span::styled(
                    format!("  {}", note),
                    Style::default().fg(color),
                ));
            }
            Line::from(spans)
        })
        .collect()
}

fn review_lines(review: &ReviewDraft) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if review.consent_confirmed() {
        lines.push(Line::from(Span::styled(
            "Consent confirmed: all required consents accepted.",
            Style::default().fg(Color::Green),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "Consent not confirmed.",
            Style::default().fg(Color::Yellow),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from("Data Completeness"));
    for item in review.completeness() {
        let (mark, label, color) = if item.complete {
            ("[x]", "Complete", Color::Green)
        } else {
            ("[ ]", "Incomplete", Color::DarkGray)
        };
        lines.push(Line::from(vec![
            Span::raw(format!("  {} {:<20}", mark, item.name)),
            Span::styled(label, Style::default().fg(color)),
        ]));
    }

    let metrics = review.key_metrics();
    if !metrics.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from("Key Metrics"));
        lines.extend(derived_lines(&metrics));
    }

    let model = ReviewDraft::model_info();
    lines.push(Line::from(""));
    lines.push(Line::from("Analysis Method"));
    for l in [
        format!("  Model: {}", model.version),
        format!("  Training: {}", model.training_dataset),
        "  Validation: physiological constraint residuals".to_string(),
    ] {
        lines.push(Line::from(Span::styled(
            l,
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines
}

fn help_line(step: StepId) -> &'static str {
    match step {
        StepId::Consent | StepId::Symptoms => "Tab: next  Space: check  Left/Right: choose  Esc: cancel",
        StepId::Imaging => "Tab: next  Enter on path: add file  x/Del on file: remove  Esc: cancel",
        StepId::Review => "Review your answers, then Submit Assessment. Esc: cancel",
        _ => "Tab: next  Type to edit  Left/Right: choose  Esc: cancel",
    }
}

fn draw_assessment(f: &mut Frame<'_>, area: Rect, state: &WizardState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(area);

    let controller = &state.controller;
    let header = Paragraph::new(Line::from(Span::styled(
        controller.step_label(),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    f.render_widget(header, rows[0]);

    let percent = controller.progress_percent().round().clamp(0.0, 100.0) as u16;
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan))
        .percent(percent)
        .label(format!("{}%", percent));
    f.render_widget(gauge, rows[1]);

    let view = state.draft.view();
    let step = view.step();
    let focused_idx = match state.focus {
        FocusTarget::Field(i) => Some(i),
        FocusTarget::Button(_) => None,
    };

    let mut lines: Vec<Line<'static>> = vec![Line::from("")];
    if step == StepId::Consent {
        lines.push(Line::from(Span::styled(
            PRIVACY_NOTICE,
            Style::default().fg(Color::Cyan),
        )));
        lines.push(Line::from(""));
    }

    let mut focused_line = 0usize;
    for (i, field) in view.fields().iter().enumerate() {
        let focused = focused_idx == Some(i);
        if focused {
            focused_line = lines.len();
        }
        lines.push(field_line(field, focused));
        if step == StepId::Consent {
            if let Some((_, description)) = CONSENT_ITEMS.get(i) {
                lines.push(Line::from(Span::styled(
                    format!("      {}", description),
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }
    }

    if let StepDraft::Review(review) = &state.draft {
        lines.extend(review_lines(review));
    } else {
        let derived = view.derived();
        if !derived.is_empty() {
            lines.push(Line::from(""));
            lines.extend(derived_lines(&derived));
        }
    }

    if let Some(status) = state.status.as_ref() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            status.clone(),
            Style::default().fg(Color::Cyan),
        )));
    }

    if !view.can_continue() {
        lines.push(Line::from(""));
        let hint = match step {
            StepId::Consent => "All four consents are required to continue.",
            _ => "Fields marked * are required to continue.",
        };
        lines.push(Line::from(Span::styled(
            hint,
            Style::default().fg(Color::Yellow),
        )));
    }

    let visible = rows[2].height as usize;
    let scroll = focused_line.saturating_sub(visible.saturating_sub(2)) as u16;
    draw_paragraph(f, rows[2], Text::from(lines), scroll);

    let help = Paragraph::new(Line::from(Span::styled(
        help_line(step),
        Style::default().fg(Color::DarkGray),
    )));
    f.render_widget(help, rows[3]);
}

fn submitting_text(state: &WizardState) -> Text<'static> {
    let frame = SPINNER[(state.tick % SPINNER.len() as u64) as usize];
    let elapsed = state
        .submitted_at
        .map(|t| t.elapsed().as_secs())
        .unwrap_or(0);
    let mut lines = vec![
        Line::from(""),
        Line::from(format!("{} Submitting assessment...", frame)),
        Line::from(""),
        Line::from(format!(
            "Processing your data with the {} model ({} backend).",
            ReviewDraft::model_info().version,
            state.backend_name
        )),
        Line::from(format!("Elapsed: {}s", elapsed)),
    ];
    if let Some(id) = state.correlation_id.as_ref() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Reference: {}", id),
            Style::default().fg(Color::DarkGray),
        )));
    }
    Text::from(lines)
}

fn risk_color(level: RiskLevel) -> Color {
    match level {
        RiskLevel::High => Color::Red,
        RiskLevel::Moderate => Color::Yellow,
        RiskLevel::Low => Color::Green,
    }
}

fn draw_results(f: &mut Frame<'_>, area: Rect, summary: &ResultSummary, state: &WizardState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
            ]
            .as_ref(),
        )
        .split(area);

    let level = summary.risk_level();
    let header = Paragraph::new(Line::from(vec![
        Span::raw(format!(
            "Generated {}  ",
            summary.generated_at.format("%Y-%m-%d %H:%M UTC")
        )),
        Span::styled(
            format!("Overall risk: {} ({})", summary.risk_score, level.as_str()),
            Style::default()
                .fg(risk_color(level))
                .add_modifier(Modifier::BOLD),
        ),
    ]));
    f.render_widget(header, rows[0]);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(risk_color(level)))
        .percent(u16::from(summary.risk_score.min(100)))
        .label(format!("{}/100", summary.risk_score));
    f.render_widget(gauge, rows[1]);

    let mut lines = vec![Line::from(Span::styled(
        "PgUp/PgDn or Up/Down: scroll",
        Style::default().fg(Color::DarkGray),
    ))];
    if summary.consultation_recommended() {
        lines.push(Line::from(Span::styled(
            "High risk detected: clinical consultation is recommended.",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(""));
    }
    lines.push(Line::from(format!(
        "PCOS probability: {}    Metabolic syndrome probability: {}",
        ResultSummary::percent(summary.pcos_probability),
        ResultSummary::percent(summary.metabolic_syndrome_probability)
    )));
    lines.push(Line::from(""));

    lines.push(Line::from("Key Contributing Factors"));
    for k in &summary.key_factors {
        lines.push(Line::from(format!(
            "  {:<20} {:<10} impact {:<9} trend {}",
            k.factor, k.value, k.impact, k.trend
        )));
    }
    lines.push(Line::from(""));

    lines.push(Line::from("Physiological Constraint Residuals"));
    for r in &summary.constraint_residuals {
        let (label, color) = match r.status {
            ResidualStatus::Normal => ("normal", Color::Green),
            ResidualStatus::Attention => ("attention", Color::Yellow),
        };
        lines.push(Line::from(vec![
            Span::raw(format!("  {:<26} {:.2}  ", r.constraint, r.residual)),
            Span::styled(label, Style::default().fg(color)),
        ]));
    }
    lines.push(Line::from(""));

    lines.push(Line::from("Recommendations"));
    for (i, (title, body)) in RECOMMENDATIONS.iter().enumerate() {
        lines.push(Line::from(format!("  {}. {}", i + 1, title)));
        lines.push(Line::from(Span::styled(
            format!("     {}", body),
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!(
            "Model: {}  Training: {}  Updated: {}",
            summary.model.version, summary.model.training_dataset, summary.model.last_updated
        ),
        Style::default().fg(Color::DarkGray),
    )));
    if let Some(id) = state.correlation_id.as_ref() {
        lines.push(Line::from(Span::styled(
            format!("Reference: {}", id),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let offset = state
        .results_scroll
        .min(u16::try_from(lines.len().saturating_sub(1)).unwrap_or(u16::MAX));
    draw_paragraph(f, rows[2], Text::from(lines), offset);
}

fn draw_buttons(f: &mut Frame<'_>, area: Rect, state: &WizardState) {
    let back = button_text(
        back_label(state.page),
        matches!(state.focus, FocusTarget::Button(ButtonFocus::Back)),
        can_go_back(state),
    );
    let next = button_text(
        next_label(state),
        matches!(state.focus, FocusTarget::Button(ButtonFocus::Next)),
        can_go_next(state),
    );
    let cancel = button_text(
        "Cancel",
        matches!(state.focus, FocusTarget::Button(ButtonFocus::Cancel)),
        can_cancel(state.page),
    );

    let line = Line::from(vec![back, Span::raw(" "), next, Span::raw(" "), cancel]);
    let p = Paragraph::new(Text::from(line)).alignment(Alignment::Right);
    f.render_widget(p, area);
}

fn button_text(label: &str, focused: bool, enabled: bool) -> Span<'static> {
    let mut style = Style::default();
    if !enabled {
        style = style.fg(Color::DarkGray);
    }
    if focused && enabled {
        style = style.add_modifier(Modifier::REVERSED);
    }
    Span::styled(format!("[ {} ]", label), style)
}

fn modal_area(window_area: Rect, width: u16, height: u16) -> Rect {
    let w = width
        .min(window_area.width.saturating_sub(4))
        .max(40)
        .min(window_area.width);
    let h = height
        .min(window_area.height.saturating_sub(4))
        .max(7)
        .min(window_area.height);
    Rect {
        x: window_area.x + (window_area.width.saturating_sub(w)) / 2,
        y: window_area.y + (window_area.height.saturating_sub(h)) / 2,
        width: w,
        height: h,
    }
}

fn modal_buttons_area(area: Rect) -> Rect {
    Rect {
        x: area.x + 1,
        y: area.y + area.height.saturating_sub(2),
        width: area.width.saturating_sub(2),
        height: 1,
    }
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    }
}

fn draw_cancel_modal(f: &mut Frame<'_>, window_area: Rect, state: &WizardState) {
    let area = modal_area(window_area, 56, 7);

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Cancel Assessment?");
    let body = Paragraph::new(Text::from(vec![
        Line::from("If you exit now, the answers entered so far are discarded."),
        Line::from(""),
        Line::from(""),
    ]))
    .block(block)
    .wrap(Wrap { trim: false });
    f.render_widget(Clear, area);
    f.render_widget(body, area);

    let yes = Span::styled(
        "[ Yes, exit ]",
        focus_style(focused_button(state) == ButtonFocus::Cancel),
    );
    let no = Span::styled(
        "[ No ]",
        focus_style(focused_button(state) == ButtonFocus::Next),
    );
    let line = Line::from(vec![yes, Span::raw(" "), no]);
    let p = Paragraph::new(Text::from(line)).alignment(Alignment::Right);
    f.render_widget(p, modal_buttons_area(area));
}

fn draw_message_modal(
    f: &mut Frame<'_>,
    window_area: Rect,
    title: &str,
    body: &str,
    state: &WizardState,
) {
    let area = modal_area(window_area, 70, 12);

    let block = Block::default().borders(Borders::ALL).title(title.to_string());
    let p = Paragraph::new(Text::from(body.to_string()))
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, area);
    f.render_widget(p, area);

    let ok = Span::styled(
        "[ OK ]",
        focus_style(matches!(state.focus, FocusTarget::Button(ButtonFocus::Next))),
    );
    let p = Paragraph::new(Text::from(Line::from(vec![ok]))).alignment(Alignment::Right);
    f.render_widget(p, modal_buttons_area(area));
}
