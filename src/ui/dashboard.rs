use chrono::Local;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use crate::session::Session;
use crate::timer::{Phase, TimerController};
use crate::ui::{HORIZONTAL_MARGIN, VERTICAL_MARGIN};
use crate::util::{fit_width, format_clock, format_elapsed};

fn phase_color(phase: Phase) -> Color {
    match phase {
        Phase::Work => Color::Magenta,
        Phase::Break => Color::Cyan,
    }
}

/// Start/pause legend changes with the running flag
pub fn controls_legend(running: bool) -> &'static str {
    if running {
        "(space) pause / (r)eset / (l)ogout / (q)uit"
    } else {
        "(space) start / (r)eset / (l)ogout / (q)uit"
    }
}

pub fn render_dashboard(session: &Session, timer: &TimerController, f: &mut Frame) {
    let state = timer.state();
    let durations = timer.durations();
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let accent = Style::default().fg(phase_color(state.phase));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(3), // user header
            Constraint::Min(1),    // padding
            Constraint::Length(1), // phase label
            Constraint::Length(1), // padding
            Constraint::Length(1), // clock
            Constraint::Length(1), // padding
            Constraint::Length(3), // progress
            Constraint::Length(1), // cycles
            Constraint::Min(1),    // padding
            Constraint::Length(1), // how it works
            Constraint::Length(1), // legend
        ])
        .split(f.area());

    let identity = &session.identity;
    let header_width = chunks[0].width.saturating_sub(4) as usize;
    let header = Paragraph::new(Line::from(vec![
        Span::styled(format!("[{}] ", identity.initial()), bold.patch(accent)),
        Span::styled(identity.name.clone(), bold),
        Span::raw("  "),
        Span::styled(identity.email.clone(), Style::default().fg(Color::Gray)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(fit_width(
                &format!(
                    "signed in {}",
                    format_elapsed(Local::now() - session.authenticated_at)
                ),
                header_width,
            )),
    );
    f.render_widget(header, chunks[0]);

    let phase = Paragraph::new(Span::styled(state.phase.to_string(), bold.patch(accent)))
        .alignment(Alignment::Center);
    f.render_widget(phase, chunks[2]);

    let clock_style = if state.is_running {
        bold
    } else {
        bold.add_modifier(Modifier::DIM)
    };
    let clock = Paragraph::new(Span::styled(timer.clock(), clock_style))
        .alignment(Alignment::Center);
    f.render_widget(clock, chunks[4]);

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(accent)
        .ratio(timer.progress_fraction())
        .label(format!(
            "{:.0}% of {}",
            timer.progress_fraction() * 100.0,
            format_clock(durations.of(state.phase))
        ));
    f.render_widget(gauge, chunks[6]);

    let cycles = Paragraph::new(Line::from(vec![
        Span::raw("Completed Pomodoros: "),
        Span::styled(state.completed_cycles.to_string(), bold.patch(accent)),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(cycles, chunks[7]);

    let how = Paragraph::new(Span::styled(
        format!(
            "Focus for {} / Break for {} / Repeat",
            format_clock(durations.of(Phase::Work)),
            format_clock(durations.of(Phase::Break))
        ),
        Style::default().fg(Color::Gray),
    ))
    .alignment(Alignment::Center);
    f.render_widget(how, chunks[9]);

    let legend = Paragraph::new(Span::styled(
        controls_legend(state.is_running),
        Style::default().add_modifier(Modifier::ITALIC),
    ));
    f.render_widget(legend, chunks[10]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legend_tracks_running_flag() {
        assert!(controls_legend(false).contains("start"));
        assert!(controls_legend(true).contains("pause"));
    }
}
