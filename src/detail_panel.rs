//! Per-latent detail: activation table, wild-type profile strip, reference
//! cards and the anchor-aligned multi-sequence view.

use crate::alignment::{self, AlignedLayout, AlignedRow};
use crate::color_scale::activation_color;
use crate::heatmap::CellSelection;
use crate::ruler::{self, TickMark};
use crate::session::Session;
use eframe::egui::{self, Align2, Color32, Painter, Pos2, Rect, Sense, Stroke, Vec2};
use egui_extras::{Column, TableBuilder};

const CELL_WIDTH: f32 = 14.0;
const ROW_HEIGHT: f32 = 18.0;
const RULER_HEIGHT: f32 = 26.0;
const LABEL_WIDTH: f32 = 150.0;
const ANCHOR_LINE: Color32 = Color32::from_rgb(40, 80, 160);

/// Request from the detail panel back to the application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetailAction {
    Pin { layer: u32, latent_index: u32 },
}

#[derive(Debug, Default)]
pub struct DetailPanel {
    selection: Option<CellSelection>,
    focused_latent: Option<(u32, u32)>,
}

impl DetailPanel {
    /// A new grid selection resets the latent focus.
    pub fn select_cell(&mut self, selection: CellSelection) {
        self.selection = Some(selection);
        self.focused_latent = None;
    }

    #[inline(always)]
    pub fn selection(&self) -> Option<CellSelection> {
        self.selection
    }

    pub fn render(&mut self, ui: &mut egui::Ui, session: &Session) -> Option<DetailAction> {
        let Some(selection) = self.selection else {
            ui.label("Click an activated cell in the grid to inspect its latents");
            return None;
        };

        let mut action = None;
        egui::ScrollArea::vertical().show(ui, |ui| {
            let residue = session
                .wild_type()
                .as_bytes()
                .get(selection.position())
                .map(|r| *r as char)
                .unwrap_or('?');
            ui.heading(format!(
                "Layer {}, position {} ({residue})",
                selection.layer(),
                selection.position()
            ));

            action = self.render_latent_table(ui, session, &selection);

            if let Some((layer, latent_index)) = self.focused_latent {
                ui.separator();
                self.render_latent_detail(ui, session, layer, latent_index);
            }
        });
        action
    }

    fn render_latent_table(
        &mut self,
        ui: &mut egui::Ui,
        session: &Session,
        selection: &CellSelection,
    ) -> Option<DetailAction> {
        let latents = session
            .index()
            .active_latents_at(selection.layer(), selection.position());
        let mut action = None;
        TableBuilder::new(ui)
            .striped(true)
            .column(Column::auto().at_least(80.0))
            .column(Column::auto().at_least(80.0))
            .column(Column::remainder())
            .header(18.0, |mut header| {
                header.col(|ui| {
                    ui.strong("Latent");
                });
                header.col(|ui| {
                    ui.strong("Activation");
                });
                header.col(|_ui| {});
            })
            .body(|mut body| {
                for (value, latent_index) in latents {
                    body.row(20.0, |mut row| {
                        row.col(|ui| {
                            ui.monospace(format!("{latent_index}"));
                        });
                        row.col(|ui| {
                            ui.monospace(format!("{value:.3}"));
                        });
                        row.col(|ui| {
                            ui.horizontal(|ui| {
                                if ui.button("Inspect").clicked() {
                                    self.focused_latent =
                                        Some((selection.layer(), *latent_index));
                                }
                                if ui.button("Pin").clicked() {
                                    action = Some(DetailAction::Pin {
                                        layer: selection.layer(),
                                        latent_index: *latent_index,
                                    });
                                }
                            });
                        });
                    });
                }
            });
        action
    }

    fn render_latent_detail(
        &mut self,
        ui: &mut egui::Ui,
        session: &Session,
        layer: u32,
        latent_index: u32,
    ) {
        ui.heading(format!("Latent {latent_index}"));

        let wild_type = session.wild_type_track(layer, latent_index);
        Self::render_profile_strip(ui, &wild_type);

        let references = session.corpus().top_sequences_for(layer, latent_index);
        if references.is_empty() {
            // Same affordance either way, only the wording differs.
            if session.corpus().has_layer(layer) {
                ui.label("No reference data for this latent");
            } else {
                ui.label(format!("No reference data for layer {layer}"));
            }
        } else {
            egui::CollapsingHeader::new(format!("References ({})", references.len()))
                .default_open(true)
                .show(ui, |ui| {
                    for reference in references {
                        ui.horizontal(|ui| {
                            ui.monospace(reference.display_name());
                            ui.label(reference.entry_id());
                            ui.label(format!("score {:.2}", reference.score()));
                        });
                        if !reference.protein_description().is_empty() {
                            ui.small(reference.protein_description());
                        }
                    }
                });
        }

        ui.separator();
        match alignment::align(&wild_type, references) {
            Ok(layout) => Self::render_aligned_view(ui, &layout),
            // Surface the error; the rest of the panel stays as it was.
            Err(e) => {
                ui.colored_label(Color32::RED, format!("Alignment failed: {e}"));
            }
        }
    }

    /// The wild-type profile as one row of cells, colored by its own peak.
    fn render_profile_strip(ui: &mut egui::Ui, wild_type: &crate::alignment::WildTypeTrack) {
        let peak = wild_type.activations().iter().copied().fold(0.0, f64::max);
        egui::ScrollArea::horizontal()
            .id_salt("profile_strip")
            .show(ui, |ui| {
                let size = Vec2::new(wild_type.len() as f32 * CELL_WIDTH, ROW_HEIGHT);
                let (response, painter) = ui.allocate_painter(size, Sense::hover());
                let rect = response.rect;
                for (column, (residue, value)) in wild_type
                    .residues()
                    .bytes()
                    .zip(wild_type.activations())
                    .enumerate()
                {
                    paint_residue_cell(&painter, &rect, column, 0.0, residue, *value, peak);
                }
            });
    }

    /// Ruler plus all aligned rows in one painter inside one horizontal
    /// scroll area, so every row scrolls together. Row labels sit in a
    /// fixed column to the left.
    fn render_aligned_view(ui: &mut egui::Ui, layout: &AlignedLayout) {
        ui.horizontal_top(|ui| {
            ui.vertical(|ui| {
                ui.set_width(LABEL_WIDTH);
                let spacing = ui.spacing().item_spacing.y;
                ui.add_space(RULER_HEIGHT + spacing);
                for row in layout.rows() {
                    let label = match row.source().score() {
                        Some(score) => format!("{} ({score:.2})", row.source().label()),
                        None => row.source().label().to_string(),
                    };
                    ui.add_sized(
                        [LABEL_WIDTH, ROW_HEIGHT - spacing],
                        egui::Label::new(egui::RichText::new(label).monospace().size(11.0))
                            .truncate(),
                    );
                }
            });

            egui::ScrollArea::horizontal()
                .id_salt("aligned_view")
                .show(ui, |ui| {
                    let size = Vec2::new(
                        layout.total_width() as f32 * CELL_WIDTH,
                        RULER_HEIGHT + layout.rows().len() as f32 * ROW_HEIGHT,
                    );
                    let (response, painter) = ui.allocate_painter(size, Sense::hover());
                    let rect = response.rect;

                    Self::paint_ruler(&painter, &rect, layout);
                    for (row_num, row) in layout.rows().iter().enumerate() {
                        Self::paint_aligned_row(&painter, &rect, row_num, row, layout.total_width());
                    }
                    Self::paint_anchor_line(&painter, &rect, layout);
                });
        });
    }

    fn paint_ruler(painter: &Painter, rect: &Rect, layout: &AlignedLayout) {
        let bottom = rect.top() + RULER_HEIGHT;
        for tick in ruler::build_ruler(layout.total_width(), layout.anchor_column()) {
            let x = rect.left() + (tick.column() as f32 + 0.5) * CELL_WIDTH;
            let height = match tick.mark() {
                TickMark::Major => 8.0,
                TickMark::Minor => 5.0,
                TickMark::Filler => 2.0,
            };
            painter.line_segment(
                [Pos2::new(x, bottom - height), Pos2::new(x, bottom)],
                Stroke::new(1.0, Color32::DARK_GRAY),
            );
            if let Some(label) = tick.label() {
                painter.text(
                    Pos2::new(x, rect.top() + 2.0),
                    Align2::CENTER_TOP,
                    label,
                    egui::FontId::monospace(10.0),
                    Color32::DARK_GRAY,
                );
            }
        }
    }

    fn paint_aligned_row(
        painter: &Painter,
        rect: &Rect,
        row_num: usize,
        row: &AlignedRow,
        total_width: usize,
    ) {
        let y = RULER_HEIGHT + row_num as f32 * ROW_HEIGHT;
        let peak = row
            .source()
            .activations()
            .get(row.max_activation_index())
            .copied()
            .unwrap_or(0.0);
        for column in 0..total_width {
            let Some((residue, value)) = row.cell(column) else {
                continue;
            };
            paint_residue_cell(painter, rect, column, y, residue, value, peak);
        }
    }

    /// The shared peak column, drawn through the ruler and every row.
    fn paint_anchor_line(painter: &Painter, rect: &Rect, layout: &AlignedLayout) {
        let x = rect.left() + (layout.anchor_column() as f32 + 0.5) * CELL_WIDTH;
        painter.line_segment(
            [
                Pos2::new(x, rect.top() + RULER_HEIGHT - 12.0),
                Pos2::new(x, rect.bottom()),
            ],
            Stroke::new(1.5, ANCHOR_LINE),
        );
    }
}

fn paint_residue_cell(
    painter: &Painter,
    rect: &Rect,
    column: usize,
    y_offset: f32,
    residue: u8,
    value: f64,
    peak: f64,
) {
    let cell = Rect::from_min_size(
        Pos2::new(
            rect.left() + column as f32 * CELL_WIDTH,
            rect.top() + y_offset,
        ),
        Vec2::new(CELL_WIDTH, ROW_HEIGHT),
    );
    painter.rect_filled(cell.shrink(0.5), 2.0, activation_color(value, peak));
    painter.text(
        cell.center(),
        Align2::CENTER_CENTER,
        residue as char,
        egui::FontId::monospace(11.0),
        Color32::BLACK,
    );
}
