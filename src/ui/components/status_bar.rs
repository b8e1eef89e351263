//! One-line status and error display

use crate::ui::state::{AppState, DebatePhase};
use crate::ui::theme::Theme;
use egui::{self, RichText};

pub struct StatusBar<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> StatusBar<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let (text, color) = match self.state.phase {
                DebatePhase::Idle if !self.state.is_connected() => {
                    ("Backend offline", self.theme.error)
                }
                DebatePhase::Idle => ("Ready", self.theme.text_muted),
                DebatePhase::Debating => ("Debating", self.theme.accent),
                DebatePhase::Finished => ("Finished", self.theme.success),
                DebatePhase::Failed => ("Failed", self.theme.error),
                DebatePhase::Cancelled => ("Stopped", self.theme.text_secondary),
            };
            ui.label(RichText::new(format!("● {}", text)).small().color(color));

            if let Some(status) = &self.state.status {
                ui.label(RichText::new(status).small().color(self.theme.text_secondary));
            }

            if self.state.is_playing {
                ui.label(RichText::new("♪ playing").small().color(self.theme.speaking));
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let mut dismissed = false;
                if let Some(error) = &self.state.last_error {
                    dismissed = ui.small_button("✕").on_hover_text("Dismiss").clicked();
                    ui.label(RichText::new(error).small().color(self.theme.error));
                }
                if dismissed {
                    self.state.last_error = None;
                }
            });
        });
    }
}
