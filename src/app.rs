use crate::annotation_canvas::AnnotationCanvas;
use crate::detail_panel::{DetailAction, DetailPanel};
use crate::heatmap::Heatmap;
use crate::session::Session;
use eframe::egui::{self, menu, Ui};

const DEFAULT_ACTIVATIONS: &str = "test_files/activation_indices.json";
const DEFAULT_SEQUENCE: &str = "test_files/wild_type.txt";
const DEFAULT_CORPUS: &str = "test_files/top_activations.json";

#[derive(Default)]
pub struct LatentScopeApp {
    session: Option<Session>,
    load_error: Option<String>,
    activations_path: Option<String>,
    sequence_path: Option<String>,
    corpus_path: Option<String>,
    heatmap: Heatmap,
    detail: DetailPanel,
    canvas: AnnotationCanvas,
    show_canvas: bool,
}

impl LatentScopeApp {
    pub fn new() -> Self {
        let mut ret = Self {
            activations_path: Some(DEFAULT_ACTIVATIONS.to_string()),
            sequence_path: Some(DEFAULT_SEQUENCE.to_string()),
            corpus_path: Some(DEFAULT_CORPUS.to_string()),
            ..Self::default()
        };

        // Load the bundled demo session when it is around
        ret.reload();
        ret.load_error = None;
        ret
    }

    /// Replaces the whole session; selection and load errors reset with it.
    fn reload(&mut self) {
        let (Some(activations), Some(sequence), Some(corpus)) = (
            self.activations_path.as_deref(),
            self.sequence_path.as_deref(),
            self.corpus_path.as_deref(),
        ) else {
            return;
        };
        match Session::load(activations, sequence, corpus) {
            Ok(session) => {
                self.session = Some(session);
                self.load_error = None;
                self.detail = DetailPanel::default();
            }
            Err(e) => {
                eprintln!("Could not load session: {e}");
                self.load_error = Some(e.to_string());
            }
        }
    }

    fn pick_file(title: &str) -> Option<String> {
        rfd::FileDialog::new()
            .set_title(title)
            .pick_file()
            .map(|path| path.display().to_string())
    }

    pub fn render_menu_bar(&mut self, ui: &mut Ui) {
        menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open activation records...").clicked() {
                    if let Some(path) = Self::pick_file("Activation records (JSON)") {
                        self.activations_path = Some(path);
                        self.reload();
                    }
                }
                if ui.button("Open wild-type sequence...").clicked() {
                    if let Some(path) = Self::pick_file("Wild-type sequence (text)") {
                        self.sequence_path = Some(path);
                        self.reload();
                    }
                }
                if ui.button("Open reference corpus...").clicked() {
                    if let Some(path) = Self::pick_file("Top activations (JSON)") {
                        self.corpus_path = Some(path);
                        self.reload();
                    }
                }
                ui.separator();
                if ui.button("Reload session").clicked() {
                    self.reload();
                }
            });
            ui.menu_button("View", |ui| {
                ui.checkbox(&mut self.show_canvas, "Annotation canvas");
            });
        });
    }

    fn render_left_panel(&mut self, ui: &mut Ui) {
        egui::ScrollArea::both().show(ui, |ui| {
            ui.heading("Session");
            match &self.session {
                Some(session) => {
                    if let Some(family) = session.family() {
                        ui.label(format!("Family: {family}"));
                    }
                    ui.label(format!("Sequence: {} residues", session.sequence_length()));
                    ui.label(format!("Layers: {}", session.index().layers().len()));
                    if let Some(selection) = self.detail.selection() {
                        ui.separator();
                        ui.label(format!(
                            "Selected: layer {}, position {}",
                            selection.layer(),
                            selection.position()
                        ));
                    }
                }
                None => {
                    ui.label("No session loaded");
                }
            }
            if let Some(error) = &self.load_error {
                ui.separator();
                ui.colored_label(egui::Color32::RED, error);
            }
            ui.separator();
            ui.label(format!("Annotations: {}", self.canvas.graph().len()));
        });
    }
}

impl eframe::App for LatentScopeApp {
    fn ui(&mut self, ui: &mut egui::Ui, frame: &mut eframe::Frame) {
        let ctx = ui.ctx().clone();
        self.update(&ctx, frame);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            self.render_menu_bar(ui);
        });

        egui::SidePanel::left("session")
            .default_width(180.0)
            .show(ctx, |ui| {
                self.render_left_panel(ui);
            });

        if self.show_canvas {
            egui::CentralPanel::default().show(ctx, |ui| {
                self.canvas.render(ui);
            });
            return;
        }

        let Some(session) = &self.session else {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.label("Load the three datasets via the File menu");
            });
            return;
        };
        let detail = &mut self.detail;
        let canvas = &mut self.canvas;
        let heatmap = &self.heatmap;

        let full_height = ctx.available_rect().height();
        egui::TopBottomPanel::bottom("detail")
            .resizable(true)
            .default_height(full_height * 0.4)
            .max_height(full_height * 0.7)
            .show(ctx, |ui| {
                if let Some(DetailAction::Pin {
                    layer,
                    latent_index,
                }) = detail.render(ui, session)
                {
                    canvas.pin(layer, latent_index);
                }
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(clicked) = heatmap.render(ui, session, detail.selection()) {
                detail.select_cell(clicked);
            }
        });
    }
}
