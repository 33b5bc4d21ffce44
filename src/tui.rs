use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::Frame;

use crate::error::Result;
use crate::fmt::percent;
use crate::models::EnrollmentStatus;

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

pub const GOOD_STYLE: Style = Style::new().fg(Color::Rgb(80, 220, 100));
pub const WARN_STYLE: Style = Style::new().fg(Color::Yellow);
pub const BAD_STYLE: Style = Style::new().fg(Color::Red);

/// Attendance below this is shown as a warning.
pub const LOW_ATTENDANCE: f64 = 85.0;

pub fn attendance_span(rate: f64) -> Span<'static> {
    let style = if rate >= 95.0 {
        GOOD_STYLE
    } else if rate >= LOW_ATTENDANCE {
        Style::new()
    } else {
        WARN_STYLE
    };
    Span::styled(percent(rate), style)
}

pub fn status_span(status: EnrollmentStatus) -> Span<'static> {
    let style = match status {
        EnrollmentStatus::Enrolled => GOOD_STYLE,
        EnrollmentStatus::Graduated => Style::new().fg(Color::Cyan),
        EnrollmentStatus::Transferred => WARN_STYLE,
        EnrollmentStatus::Dropped => BAD_STYLE,
    };
    Span::styled(status.as_str(), style)
}

// ---------------------------------------------------------------------------
// View loop
// ---------------------------------------------------------------------------

pub enum ViewAction {
    Continue,
    Close,
}

pub trait View {
    fn draw(&mut self, frame: &mut Frame);
    fn handle_key(&mut self, code: KeyCode) -> ViewAction;
}

/// Run an interactive ratatui view. Sets up the terminal, event loop,
/// and panic hook, then restores the terminal on exit.
pub fn run_view(view: &mut dyn View) -> Result<()> {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));

    let mut terminal = ratatui::init();

    let result: Result<()> = loop {
        if let Err(e) = terminal.draw(|frame| view.draw(frame)) {
            break Err(e.into());
        }

        match event::read() {
            Err(e) => break Err(e.into()),
            Ok(Event::Key(key)) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                    break Ok(());
                }
                match view.handle_key(key.code) {
                    ViewAction::Close => break Ok(()),
                    ViewAction::Continue => {}
                }
            }
            _ => {}
        }
    };

    drop(terminal);
    ratatui::restore();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attendance_span_styles() {
        assert_eq!(attendance_span(98.0).style, GOOD_STYLE);
        assert_eq!(attendance_span(70.0).style, WARN_STYLE);
        assert_eq!(attendance_span(90.0).content, "90.0%");
    }

    #[test]
    fn test_status_span_text() {
        let span = status_span(EnrollmentStatus::Dropped);
        assert_eq!(span.content, "Dropped");
        assert_eq!(span.style, BAD_STYLE);
    }
}
