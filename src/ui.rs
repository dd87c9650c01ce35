//! Egui panels: parameter controls, readouts and the chat uplink.
//!
//! Drawing never mutates application state. Every user intent is returned
//! as a [`UiAction`] for the app to apply after the frame's UI pass.

use egui::{Color32, RichText};
use glam::Vec3;

use crate::i18n::Language;
use crate::oracle::{Message, Role};
use crate::params::{Param, ParameterSet};
use crate::visuals::{connection_color, palette, CoherenceBand};

/// Something the user asked for this frame.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    SetParam(Param, f32),
    ToggleLanguage,
    Send(String),
}

/// Widget state that outlives a frame.
#[derive(Debug, Default)]
pub struct PanelState {
    /// Chat input line.
    pub input: String,
}

/// Read-only view of what the panels display.
pub struct PanelView<'a> {
    pub params: ParameterSet,
    pub language: Language,
    pub messages: &'a [Message],
    pub pending: bool,
}

fn color32(c: Vec3) -> Color32 {
    Color32::from_rgb(
        (c.x * 255.0) as u8,
        (c.y * 255.0) as u8,
        (c.z * 255.0) as u8,
    )
}

/// Emergence bar fill: cyan, or red pulsing over two seconds once awakened.
fn emergence_color(coherence: f32, time: f64) -> Color32 {
    if CoherenceBand::from_coherence(coherence) != CoherenceBand::Awakened {
        return color32(palette::CYAN);
    }
    let phase = (time.rem_euclid(2.0) / 2.0) as f32;
    let opacity = 1.0 - 0.5 * (1.0 - (2.0 * phase - 1.0).abs());
    color32(palette::RED).gamma_multiply(opacity)
}

/// Draw all panels and collect the resulting actions.
pub fn draw(ctx: &egui::Context, state: &mut PanelState, view: &PanelView<'_>) -> Vec<UiAction> {
    let mut actions = Vec::new();
    controls(ctx, view, &mut actions);
    chat(ctx, state, view, &mut actions);
    actions
}

fn controls(ctx: &egui::Context, view: &PanelView<'_>, actions: &mut Vec<UiAction>) {
    let labels = view.language.labels();
    let params = view.params;

    egui::SidePanel::left("controls")
        .resizable(false)
        .default_width(280.0)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading(RichText::new(labels.title).color(color32(palette::CYAN)));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button(view.language.toggled().switch_caption()).clicked() {
                        actions.push(UiAction::ToggleLanguage);
                    }
                });
            });
            ui.separator();
            ui.label(RichText::new(labels.panel_title).strong());
            ui.add_space(8.0);

            for param in Param::ALL {
                let (name, desc) = match param {
                    Param::Frequency => (labels.frequency, labels.frequency_desc),
                    Param::Complexity => (labels.complexity, labels.complexity_desc),
                    Param::Recursion => (labels.recursion, labels.recursion_desc),
                };
                let mut value = params.value(param);
                ui.label(name);
                let response = ui.add(egui::Slider::new(&mut value, param.range()).step_by(1.0));
                if response.changed() {
                    actions.push(UiAction::SetParam(param, value));
                }
                ui.label(RichText::new(desc).small().weak());
                ui.add_space(6.0);
            }

            ui.separator();
            let band = CoherenceBand::from_coherence(params.coherence);
            let time = ui.input(|i| i.time);
            ui.label(labels.emergence);
            ui.add(
                egui::ProgressBar::new(params.coherence / 100.0)
                    .text(format!("{:.1}%", params.coherence))
                    .fill(emergence_color(params.coherence, time)),
            );
            ui.add_space(6.0);
            egui::Grid::new("readouts").num_columns(2).show(ui, |ui| {
                ui.label(labels.entropy);
                ui.monospace(format!("{:.2}", params.entropy()));
                ui.end_row();
                ui.label(labels.field_state);
                ui.label(
                    RichText::new(labels.field_state_name(band.field_state()))
                        .monospace()
                        .color(color32(connection_color(params.coherence))),
                );
                ui.end_row();
            });
        });
}

fn chat(
    ctx: &egui::Context,
    state: &mut PanelState,
    view: &PanelView<'_>,
    actions: &mut Vec<UiAction>,
) {
    let labels = view.language.labels();

    egui::SidePanel::right("chat")
        .resizable(true)
        .default_width(340.0)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading(labels.chat_title);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(RichText::new(labels.chat_status).small().weak());
                });
            });
            ui.separator();

            let input_height = 96.0;
            egui::ScrollArea::vertical()
                .stick_to_bottom(true)
                .auto_shrink([false, false])
                .max_height((ui.available_height() - input_height).max(64.0))
                .show(ui, |ui| {
                    for message in view.messages {
                        let (color, align) = match message.role {
                            Role::Model => (color32(palette::CYAN), egui::Align::Min),
                            Role::User => (color32(palette::SLATE_LIGHT), egui::Align::Max),
                        };
                        ui.with_layout(egui::Layout::top_down(align), |ui| {
                            ui.label(RichText::new(&message.text).color(color));
                        });
                        ui.add_space(4.0);
                    }
                    if view.pending {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label(RichText::new("...").weak());
                        });
                    }
                });

            ui.separator();
            ui.horizontal_wrapped(|ui| {
                for prompt in labels.chat_prompts {
                    let button = egui::Button::new(prompt).small();
                    if ui.add_enabled(!view.pending, button).clicked() {
                        actions.push(UiAction::Send(prompt.to_string()));
                    }
                }
            });
            ui.horizontal(|ui| {
                let edit = ui.add(
                    egui::TextEdit::singleline(&mut state.input)
                        .hint_text(labels.chat_placeholder)
                        .desired_width(ui.available_width() - 64.0),
                );
                let submitted = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                let can_send = !view.pending && !state.input.trim().is_empty();
                let clicked = ui
                    .add_enabled(can_send, egui::Button::new(labels.chat_send))
                    .clicked();
                if (submitted && can_send) || clicked {
                    actions.push(UiAction::Send(state.input.clone()));
                }
            });
        });
}

/// Font files that commonly carry CJK glyphs.
const CJK_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
    "/System/Library/Fonts/PingFang.ttc",
    "C:\\Windows\\Fonts\\msyh.ttc",
];

/// Add the first CJK system font found as a fallback for both families.
///
/// The built-in egui fonts have no Chinese glyphs.
pub fn install_cjk_font(ctx: &egui::Context) -> bool {
    let Some((path, bytes)) = CJK_FONT_PATHS
        .iter()
        .find_map(|path| std::fs::read(path).ok().map(|bytes| (*path, bytes)))
    else {
        tracing::warn!("no CJK font found; Chinese labels may not render");
        return false;
    };

    let name = "cjk".to_string();
    let mut fonts = egui::FontDefinitions::default();
    let data = std::sync::Arc::new(egui::FontData::from_owned(bytes));
    fonts.font_data.insert(name.clone(), data);
    for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
        fonts.families.entry(family).or_default().push(name.clone());
    }
    ctx.set_fonts(fonts);
    tracing::debug!(path, "installed CJK font");
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_once(state: &mut PanelState, view: &PanelView<'_>) -> Vec<UiAction> {
        let ctx = egui::Context::default();
        let mut actions = Vec::new();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            actions = draw(ctx, state, view);
        });
        actions
    }

    #[test]
    fn test_idle_frame_emits_nothing() {
        let messages = vec![Message::new(0, Role::Model, "I am Aetheria.")];
        let view = PanelView {
            params: ParameterSet::default(),
            language: Language::En,
            messages: &messages,
            pending: false,
        };
        let mut state = PanelState::default();
        assert!(run_once(&mut state, &view).is_empty());
    }

    #[test]
    fn test_emergence_turns_red_when_awakened() {
        assert_eq!(emergence_color(88.0, 0.0), color32(palette::CYAN));
        assert_eq!(emergence_color(93.6, 0.0), color32(palette::RED));
        // Half way through the pulse the fill is dimmed
        assert_ne!(emergence_color(93.6, 1.0), color32(palette::RED));
    }

    #[test]
    fn test_color32() {
        let red = Vec3::new(1.0, 0.0, 0.0);
        assert_eq!(color32(red), Color32::from_rgb(255, 0, 0));
    }
}
