use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::auth_form::{AuthForm, AuthMode, Field};
use crate::ui::{centered_rect, HORIZONTAL_MARGIN, VERTICAL_MARGIN};

const FORM_WIDTH: u16 = 56;

pub const WAITING_FOR_PROVIDER: &str = "Waiting for provider… (esc to cancel)";

fn field_label(field: Field) -> &'static str {
    match field {
        Field::Email => "Email",
        Field::Password => "Password",
        Field::Confirm => "Confirm Password",
    }
}

fn field_title(form: &AuthForm, field: Field) -> String {
    let shown = match field {
        Field::Email => return field_label(field).to_string(),
        Field::Password => form.show_password,
        Field::Confirm => form.show_confirm,
    };
    let toggle = if shown { "Hide" } else { "Show" };
    format!("{} (ctrl-s: {})", field_label(field), toggle)
}

/// `waiting` is set while a federated sign-in is in flight
pub fn render_auth(form: &AuthForm, waiting: bool, f: &mut Frame) {
    let fields = form.fields();
    let status = if waiting {
        Some((WAITING_FOR_PROVIDER, Color::Yellow))
    } else {
        form.error.as_deref().map(|error| (error, Color::Red))
    };
    let error_lines = if status.is_some() { 3 } else { 0 };
    // title(2) + mode(1) + 3 per field + error + help(4) + margins
    let height = 2 + 1 + 3 * fields.len() as u16 + error_lines + 4 + 2 * VERTICAL_MARGIN + 2;
    let area = centered_rect(FORM_WIDTH, height, f.area());

    let outer = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let mut constraints = vec![Constraint::Length(2), Constraint::Length(1)];
    constraints.extend(fields.iter().map(|_| Constraint::Length(3)));
    constraints.push(Constraint::Length(error_lines));
    constraints.push(Constraint::Min(4));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints(constraints)
        .split(inner);

    let bold = Style::default().add_modifier(Modifier::BOLD);

    let title = Paragraph::new(vec![
        Line::from(Span::styled("Pomodoro Timer", bold.fg(Color::Magenta))),
        Line::from(Span::styled(
            "Stay focused, work smart",
            Style::default().fg(Color::Gray),
        )),
    ])
    .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let mode = Paragraph::new(Span::styled(form.mode.to_string(), bold))
        .alignment(Alignment::Center);
    f.render_widget(mode, chunks[1]);

    for (i, field) in fields.iter().enumerate() {
        let focused = *field == form.focus;
        let border = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let mut value = form.display_value(*field);
        if focused {
            value.push('▏');
        }
        let input = Paragraph::new(value).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(field_title(form, *field)),
        );
        f.render_widget(input, chunks[2 + i]);
    }

    if let Some((text, color)) = status {
        let status = Paragraph::new(text)
            .style(Style::default().fg(color))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color)),
            )
            .wrap(Wrap { trim: true });
        f.render_widget(status, chunks[2 + fields.len()]);
    }

    let (submit, switch) = match form.mode {
        AuthMode::Login => ("Login", "Don't have an account? Sign Up"),
        AuthMode::SignUp => ("Sign Up", "Already have an account? Login"),
    };
    let help = Paragraph::new(vec![
        Line::from(format!("(enter) {}", submit)),
        Line::from(format!("(ctrl-t) {}", switch)),
        Line::from("(ctrl-g) Or continue with federated login"),
        Line::from("(tab) next field / (esc)ape"),
    ])
    .style(Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC))
    .alignment(Alignment::Center);
    f.render_widget(help, chunks[3 + fields.len()]);
}
