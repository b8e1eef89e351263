//! Topic entry, exchange count and the start/stop buttons

use crate::ui::state::{AppState, MAX_ROUNDS, MIN_ROUNDS};
use crate::ui::theme::Theme;
use egui::{self, Key, RichText, Vec2};

pub const START_LABEL: &str = "Commence the Debate";
pub const STOP_LABEL: &str = "Stop the Debate";

pub struct TopicForm<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> TopicForm<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing)
            .show(ui, |ui| {
                let debating = self.state.is_debating();

                ui.label(RichText::new("What should they argue about?").color(self.theme.text_secondary));
                let response = ui.add_enabled(
                    !debating,
                    egui::TextEdit::singleline(&mut self.state.topic_input)
                        .hint_text("e.g. Should cities ban cars from their centres?")
                        .desired_width(f32::INFINITY)
                        .id(egui::Id::new("topic_input")),
                );
                response.widget_info(|| {
                    egui::WidgetInfo::labeled(egui::WidgetType::TextEdit, !debating, "Debate topic")
                });

                let submitted =
                    response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter));

                ui.add_space(self.theme.spacing_sm);

                ui.add_enabled(
                    !debating,
                    egui::Slider::new(&mut self.state.rounds, MIN_ROUNDS..=MAX_ROUNDS)
                        .text("Number of exchanges"),
                );

                ui.add_space(self.theme.spacing_sm);

                ui.horizontal(|ui| {
                    let can_start = self.state.can_start();
                    let start = egui::Button::new(
                        RichText::new(START_LABEL).color(egui::Color32::WHITE),
                    )
                    .min_size(Vec2::new(180.0, 32.0))
                    .rounding(self.theme.button_rounding)
                    .fill(if can_start { self.theme.accent } else { self.theme.bg_card });

                    if ui.add_enabled(can_start, start).clicked() || (submitted && can_start) {
                        self.state.start_debate();
                    }

                    if self.state.is_debating() {
                        if ui.button(STOP_LABEL).clicked() {
                            self.state.cancel_debate();
                        }

                        ui.spinner();
                        if let Some(name) = &self.state.thinking {
                            ui.label(
                                RichText::new(format!("{} is thinking...", name))
                                    .italics()
                                    .color(self.theme.text_muted),
                            );
                        }
                    }
                });
            });
    }
}
