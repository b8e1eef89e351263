//! Transcript view
//!
//! One card per turn, colored by speaker. The card being played is outlined.
//! Each card carries its own play button and the header offers playback of
//! the whole debate.

use crate::debate::Turn;
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, RichText, Stroke};

pub const PLAY_ALL_LABEL: &str = "Listen to the entire debate";
pub const STOP_PLAYBACK_LABEL: &str = "Stop playback";

/// Accessible name of a turn's play button
pub fn play_label(turn: &Turn) -> String {
    format!("Play turn {}", turn.ordinal)
}

/// Accessible name of a turn card
pub fn turn_label(turn: &Turn) -> String {
    format!("{}: {}", turn.name, turn.text)
}

pub struct TranscriptView<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> TranscriptView<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        let can_play = self.state.can_play();

        ui.horizontal(|ui| {
            ui.heading("Transcript");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if self.state.is_playing {
                    if ui.button(STOP_PLAYBACK_LABEL).clicked() {
                        self.state.stop_playback();
                    }
                } else if ui
                    .add_enabled(can_play, egui::Button::new(PLAY_ALL_LABEL))
                    .clicked()
                {
                    self.state.speak_all();
                }
            });
        });

        ui.add_space(self.theme.spacing_sm);

        if self.state.transcript.is_empty() && !self.state.is_debating() {
            ui.vertical_centered(|ui| {
                ui.add_space(60.0);
                ui.label(
                    RichText::new("Pick a topic and let the Optimist and the Skeptic argue it out.")
                        .color(self.theme.text_muted),
                );
            });
            return;
        }

        let mut play_request = None;

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for turn in &self.state.transcript {
                    let speaking = self.state.current_playing == Some(turn.ordinal);
                    if show_turn(ui, self.theme, turn, speaking, can_play) {
                        play_request = Some(turn.ordinal);
                    }
                    ui.add_space(self.theme.spacing_sm);
                }
            });

        if let Some(ordinal) = play_request {
            self.state.speak(ordinal);
        }
    }
}

/// Draw one turn; returns true when its play button was clicked
fn show_turn(ui: &mut egui::Ui, theme: &Theme, turn: &Turn, speaking: bool, can_play: bool) -> bool {
    let color = theme.speaker_color(turn.speaker);
    let stroke = if speaking {
        Stroke::new(2.0, theme.speaking)
    } else {
        Stroke::new(1.0, color.gamma_multiply(0.4))
    };

    let mut clicked = false;

    egui::Frame::none()
        .fill(theme.bg_card)
        .stroke(stroke)
        .rounding(theme.card_rounding)
        .inner_margin(theme.spacing)
        .show(ui, |ui| {
            ui.set_width(ui.available_width());

            ui.horizontal(|ui| {
                ui.label(RichText::new(&turn.name).strong().color(color));
                ui.label(
                    RichText::new(format!("Round {}", turn.round))
                        .small()
                        .color(theme.text_muted),
                );
                if speaking {
                    ui.label(RichText::new("speaking").small().color(theme.speaking));
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let response = ui.add_enabled(can_play, egui::Button::new("▶"));
                    response.widget_info(|| {
                        egui::WidgetInfo::labeled(egui::WidgetType::Button, can_play, play_label(turn))
                    });
                    clicked = response.clicked();
                });
            });

            let response = ui.label(RichText::new(&turn.text).color(theme.text_primary));
            response.widget_info(|| {
                egui::WidgetInfo::labeled(egui::WidgetType::Label, true, turn_label(turn))
            });
        });

    clicked
}
