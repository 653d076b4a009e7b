use super::state::{FlowState, FollowUpAction, Panel};
use super::ParkingAnalyzer;
use crate::analysis::Language;
use crate::utils::file_size::FileSizeUtils;
use eframe::egui::{self, Align, Color32, RichText};

const ACCENT: Color32 = Color32::from_rgb(37, 99, 235);
const SUCCESS: Color32 = Color32::from_rgb(0, 150, 60);
const FAILURE: Color32 = Color32::from_rgb(220, 50, 50);

impl ParkingAnalyzer {
    pub fn render(&mut self, ctx: &egui::Context) {
        let time = ctx.input(|i| i.time);

        egui::CentralPanel::default().show(ctx, |ui| {
            let total_height = ui.available_height();
            let footer_height = 30.0;
            let content_height = total_height - footer_height;

            egui::ScrollArea::vertical()
                .max_height(content_height)
                .show(ui, |ui| {
                    ui.add_space(20.0);
                    ui.vertical_centered(|ui| {
                        ui.heading("Parking Sign Analyzer 🅿");
                        ui.add_space(5.0);
                        ui.label(
                            RichText::new("Snap a parking sign and find out if you can park here")
                                .color(ui.visuals().text_color().gamma_multiply(0.7)),
                        );
                    });

                    ui.add_space(20.0);
                    self.render_language_selector(ui, time);

                    ui.add_space(15.0);
                    self.render_preview(ui);

                    ui.add_space(15.0);
                    self.render_actions(ui);

                    if let Some(panel) = self.flow.state().visible_panel() {
                        ui.add_space(15.0);
                        self.render_results(ui, panel);
                    }

                    if let Some(notice) = &self.notice {
                        ui.add_space(10.0);
                        ui.vertical_centered(|ui| {
                            ui.colored_label(ACCENT, notice);
                        });
                    }

                    ui.add_space(20.0);
                });

            ui.with_layout(egui::Layout::bottom_up(Align::Center), |ui| {
                ui.add_space(8.0);
                self.render_footer(ui);
            });
        });
    }

    fn render_language_selector(&mut self, ui: &mut egui::Ui, time: f64) {
        let prompt = Language::ALL[Self::prompt_index(time)].select_prompt();
        let mut selected = self.flow.language();

        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.label(prompt);
                egui::ComboBox::from_id_source("language-select")
                    .selected_text(selected.label())
                    .show_ui(ui, |ui| {
                        for language in Language::ALL {
                            ui.selectable_value(&mut selected, language, language.label());
                        }
                    });
            });
        });

        self.set_language(selected);
    }

    fn render_preview(&self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.set_min_height(200.0);
            ui.vertical_centered(|ui| match self.flow.preview() {
                Some(preview) => {
                    ui.add(
                        egui::Image::from_bytes(
                            preview.uri.clone(),
                            egui::load::Bytes::Shared(preview.bytes.clone()),
                        )
                        .max_width(ui.available_width())
                        .max_height(280.0),
                    );
                    ui.add_space(4.0);
                    ui.label(
                        RichText::new(format!(
                            "{} ({})",
                            preview.name,
                            FileSizeUtils::format_size(preview.size)
                        ))
                        .small(),
                    );
                }
                None => {
                    ui.add_space(70.0);
                    ui.label(RichText::new("📷").size(32.0));
                    ui.label("Drop a photo of the sign here, or use the button below");
                }
            });
        });
    }

    fn render_actions(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            if self.flow.state().shows_follow_up_actions() {
                ui.horizontal(|ui| {
                    for action in [FollowUpAction::SetReminder, FollowUpAction::ReportIssue] {
                        if ui.button(action.label()).clicked() {
                            self.request_follow_up(action);
                        }
                    }
                    if ui.button("📷 Analyze Another Sign").clicked() {
                        self.pick_file();
                    }
                });
            } else {
                let button = egui::Button::new("📤 Upload Photo").min_size(egui::vec2(200.0, 40.0));
                if ui.add(button).clicked() {
                    self.pick_file();
                }
            }
        });
    }

    fn render_results(&self, ui: &mut egui::Ui, panel: Panel) {
        ui.group(|ui| {
            ui.set_width(ui.available_width());
            match (panel, self.flow.state()) {
                (Panel::Loading, _) => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Analyzing your parking sign...");
                    });
                }
                (Panel::Result, FlowState::Success { result }) => {
                    ui.label(RichText::new("✅ Result").strong().color(SUCCESS));
                    ui.add_space(6.0);
                    ui.label(RichText::new(result).size(16.0));
                }
                (Panel::Error, FlowState::Error { error }) => {
                    ui.colored_label(FAILURE, format!("❌ {}", error.user_message()));
                    if let Some(hint) = error.hint() {
                        ui.label(
                            RichText::new(hint)
                                .small()
                                .color(ui.visuals().text_color().gamma_multiply(0.7)),
                        );
                    }
                }
                _ => {}
            }
        });
    }

    fn render_footer(&self, ui: &mut egui::Ui) {
        ui.label(
            RichText::new(format!(
                "Provider: {} · {}",
                self.flow.provider_name(),
                self.endpoint_label
            ))
            .small()
            .color(ui.visuals().text_color().gamma_multiply(0.5)),
        );
    }
}
