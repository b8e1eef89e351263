//! eframe integration

use crate::debate::DebateHandle;
use crate::ui::components::{StatusBar, TopicForm, TranscriptView};
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use crate::Result;
use egui::{self, CentralPanel, RichText, TopBottomPanel};
use std::time::Duration;
use tracing::info;

pub struct ParleyApp {
    state: AppState,
    theme: Theme,
}

impl ParleyApp {
    pub fn new(cc: &eframe::CreationContext<'_>, backend: Result<DebateHandle>, rounds: usize) -> Self {
        let theme = Theme::dark();
        theme.apply(&cc.egui_ctx);

        Self {
            state: Self::initial_state(backend, rounds),
            theme,
        }
    }

    fn initial_state(backend: Result<DebateHandle>, rounds: usize) -> AppState {
        let state = AppState::new().with_rounds(rounds);
        match backend {
            Ok(handle) => state.with_handle(handle),
            Err(e) => state.with_error(format!("{} ({})", e.user_message(), e)),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    fn show_header(&mut self, ctx: &egui::Context) {
        TopBottomPanel::top("header")
            .frame(egui::Frame::none().fill(self.theme.bg_secondary).inner_margin(12.0))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new("Parley")
                            .size(20.0)
                            .strong()
                            .color(self.theme.text_primary),
                    );
                    ui.label(
                        RichText::new("Optimist vs. Skeptic")
                            .size(14.0)
                            .color(self.theme.text_muted),
                    );
                });
            });
    }

    fn show_status(&mut self, ctx: &egui::Context) {
        TopBottomPanel::bottom("status")
            .frame(egui::Frame::none().fill(self.theme.bg_secondary).inner_margin(8.0))
            .show(ctx, |ui| {
                StatusBar::new(&mut self.state, &self.theme).show(ui);
            });
    }

    fn show_content(&mut self, ctx: &egui::Context) {
        CentralPanel::default()
            .frame(egui::Frame::none().fill(self.theme.bg_primary).inner_margin(self.theme.spacing))
            .show(ctx, |ui| {
                TopicForm::new(&mut self.state, &self.theme).show(ui);
                ui.add_space(self.theme.spacing);
                TranscriptView::new(&mut self.state, &self.theme).show(ui);
            });
    }
}

impl eframe::App for ParleyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state.poll_events();

        self.show_header(ctx);
        self.show_status(ctx);
        self.show_content(ctx);

        // Keep draining worker events while something is in flight
        if self.state.is_debating() || self.state.is_playing {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("Parley shutting down");
        self.state.shutdown();
    }
}
