//! Colors and spacing for the debate UI

use crate::debate::Speaker;
use egui::{Color32, Rounding, Stroke, Visuals};

#[derive(Clone, Debug)]
pub struct Theme {
    pub accent: Color32,
    /// Participant A's cards and name
    pub optimist: Color32,
    /// Participant B's cards and name
    pub skeptic: Color32,
    pub speaking: Color32,
    pub success: Color32,
    pub error: Color32,

    pub bg_primary: Color32,
    pub bg_secondary: Color32,
    pub bg_card: Color32,

    pub text_primary: Color32,
    pub text_secondary: Color32,
    pub text_muted: Color32,

    pub button_rounding: Rounding,
    pub card_rounding: Rounding,

    pub spacing: f32,
    pub spacing_sm: f32,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            accent: Color32::from_rgb(120, 119, 255),
            optimist: Color32::from_rgb(96, 165, 250),
            skeptic: Color32::from_rgb(251, 146, 60),
            speaking: Color32::from_rgb(250, 204, 21),
            success: Color32::from_rgb(74, 222, 128),
            error: Color32::from_rgb(248, 113, 113),

            bg_primary: Color32::from_rgb(17, 17, 23),
            bg_secondary: Color32::from_rgb(26, 26, 34),
            bg_card: Color32::from_rgb(36, 36, 46),

            text_primary: Color32::from_rgb(240, 240, 245),
            text_secondary: Color32::from_rgb(180, 180, 192),
            text_muted: Color32::from_rgb(120, 120, 135),

            button_rounding: Rounding::same(6.0),
            card_rounding: Rounding::same(10.0),

            spacing: 16.0,
            spacing_sm: 8.0,
        }
    }

    pub fn speaker_color(&self, speaker: Speaker) -> Color32 {
        match speaker {
            Speaker::A => self.optimist,
            Speaker::B => self.skeptic,
        }
    }

    pub fn apply(&self, ctx: &egui::Context) {
        let mut visuals = Visuals::dark();

        visuals.panel_fill = self.bg_primary;
        visuals.window_fill = self.bg_secondary;
        visuals.extreme_bg_color = self.bg_card;
        visuals.widgets.inactive.rounding = self.button_rounding;
        visuals.widgets.hovered.rounding = self.button_rounding;
        visuals.widgets.active.rounding = self.button_rounding;
        visuals.selection.bg_fill = self.accent;
        visuals.selection.stroke = Stroke::new(1.0, self.text_primary);
        visuals.override_text_color = Some(self.text_primary);

        ctx.set_visuals(visuals);

        let mut style = (*ctx.style()).clone();
        style.spacing.item_spacing = egui::vec2(self.spacing_sm, self.spacing_sm);
        style.spacing.button_padding = egui::vec2(12.0, 6.0);
        style.text_styles.insert(
            egui::TextStyle::Heading,
            egui::FontId::new(22.0, egui::FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Body,
            egui::FontId::new(15.0, egui::FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Button,
            egui::FontId::new(14.0, egui::FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Small,
            egui::FontId::new(12.0, egui::FontFamily::Proportional),
        );
        ctx.set_style(style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_sets_spacing_and_visuals() {
        let ctx = egui::Context::default();
        let theme = Theme::dark();
        theme.apply(&ctx);

        let style = ctx.style();
        assert_eq!(style.spacing.item_spacing, egui::vec2(theme.spacing_sm, theme.spacing_sm));
        assert_eq!(style.visuals.selection.bg_fill, theme.accent);
        assert!(theme.spacing > theme.spacing_sm);
    }
}
