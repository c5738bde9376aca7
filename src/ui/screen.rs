use ratatui::{buffer::Buffer, layout::Rect};

use crate::app::{App, AppState};
use crate::ui::{render_play, render_results, render_selection};

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer);
}

/// Mode, theme and length selection
pub struct SelectionScreen;

impl Screen for SelectionScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        render_selection(app, area, buf);
    }
}

/// Prompt, input box and HUD while a session runs
pub struct PlayScreen;

impl Screen for PlayScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        render_play(app, area, buf);
    }
}

pub struct ResultsScreen;

impl Screen for ResultsScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        render_results(app, area, buf);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Selecting => Box::new(SelectionScreen),
        AppState::Playing => Box::new(PlayScreen),
        AppState::Finished => Box::new(ResultsScreen),
    }
}
