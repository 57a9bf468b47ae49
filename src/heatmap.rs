//! Layer × position activation grid.

use crate::color_scale::activation_color;
use crate::session::Session;
use eframe::egui::{self, Align2, Color32, Pos2, Rect, Sense, Vec2};

const SELECTION_OUTLINE: Color32 = Color32::from_rgb(40, 80, 160);

/// A clicked grid cell. Only cells with at least one active latent are
/// selectable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellSelection {
    layer: u32,
    position: usize,
}

impl CellSelection {
    pub fn new(layer: u32, position: usize) -> Self {
        Self { layer, position }
    }

    #[inline(always)]
    pub fn layer(&self) -> u32 {
        self.layer
    }

    #[inline(always)]
    pub fn position(&self) -> usize {
        self.position
    }
}

#[derive(Clone, Debug)]
pub struct Heatmap {
    cell_width: f32,
    cell_height: f32,
    label_width: f32,
    header_height: f32,
}

impl Default for Heatmap {
    fn default() -> Self {
        Self {
            cell_width: 16.0,
            cell_height: 18.0,
            label_width: 70.0,
            header_height: 20.0,
        }
    }
}

impl Heatmap {
    /// Paints the grid and reports a click on a non-empty cell.
    pub fn render(
        &self,
        ui: &mut egui::Ui,
        session: &Session,
        selected: Option<CellSelection>,
    ) -> Option<CellSelection> {
        let layers = session.index().layers();
        let columns = self.column_count(session);
        if layers.is_empty() || columns == 0 {
            ui.label("No activation records loaded");
            return None;
        }

        let size = Vec2::new(
            self.label_width + columns as f32 * self.cell_width,
            self.header_height + layers.len() as f32 * self.cell_height,
        );

        let mut clicked = None;
        egui::ScrollArea::both().show(ui, |ui| {
            let (mut response, painter) = ui.allocate_painter(size, Sense::click());
            let rect = response.rect;

            self.paint_residue_header(&painter, &rect, session);
            for (row, layer) in layers.iter().enumerate() {
                self.paint_layer_row(&painter, &rect, session, *layer, row, columns, selected);
            }

            if let Some(pointer) = response.hover_pos() {
                if let Some((layer, position)) = self.cell_at(&rect, pointer, layers, columns) {
                    let latents = session.index().active_latents_at(layer, position);
                    if !latents.is_empty() {
                        response = response.on_hover_ui_at_pointer(|ui| {
                            Self::render_tooltip(ui, session, layer, position, latents);
                        });
                    }
                }
            }

            if response.clicked() {
                clicked = response
                    .interact_pointer_pos()
                    .and_then(|pointer| self.cell_at(&rect, pointer, layers, columns))
                    .filter(|(layer, position)| {
                        !session.index().active_latents_at(*layer, *position).is_empty()
                    })
                    .map(|(layer, position)| CellSelection::new(layer, position));
            }
        });
        clicked
    }

    /// The grid spans the wild-type sequence; records beyond it still get a
    /// column so nothing loaded is hidden.
    fn column_count(&self, session: &Session) -> usize {
        let from_records = if session.index().is_empty() {
            0
        } else {
            session.index().max_position() + 1
        };
        session.sequence_length().max(from_records)
    }

    fn paint_residue_header(&self, painter: &egui::Painter, rect: &Rect, session: &Session) {
        for (column, residue) in session.wild_type().bytes().enumerate() {
            painter.text(
                Pos2 {
                    x: rect.left() + self.label_width + (column as f32 + 0.5) * self.cell_width,
                    y: rect.top() + self.header_height * 0.5,
                },
                Align2::CENTER_CENTER,
                residue as char,
                egui::FontId::monospace(12.0),
                Color32::DARK_GRAY,
            );
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn paint_layer_row(
        &self,
        painter: &egui::Painter,
        rect: &Rect,
        session: &Session,
        layer: u32,
        row: usize,
        columns: usize,
        selected: Option<CellSelection>,
    ) {
        let top = rect.top() + self.header_height + row as f32 * self.cell_height;
        painter.text(
            Pos2 {
                x: rect.left() + self.label_width - 6.0,
                y: top + self.cell_height * 0.5,
            },
            Align2::RIGHT_CENTER,
            format!("Layer {layer}"),
            egui::FontId::proportional(12.0),
            Color32::BLACK,
        );

        let max_value = session.index().max_value();
        for column in 0..columns {
            let Some(peak) = session.index().cell_peak(layer, column) else {
                continue;
            };
            let cell = self.cell_rect(rect, row, column);
            let is_selected = selected
                .map(|s| s.layer() == layer && s.position() == column)
                .unwrap_or(false);
            if is_selected {
                painter.rect_filled(cell.expand(1.5), 2.0, SELECTION_OUTLINE);
            }
            painter.rect_filled(cell.shrink(0.5), 2.0, activation_color(peak, max_value));
        }
    }

    fn cell_rect(&self, rect: &Rect, row: usize, column: usize) -> Rect {
        Rect::from_min_size(
            Pos2 {
                x: rect.left() + self.label_width + column as f32 * self.cell_width,
                y: rect.top() + self.header_height + row as f32 * self.cell_height,
            },
            Vec2::new(self.cell_width, self.cell_height),
        )
    }

    /// Maps a pointer position back to (layer, column), None outside the
    /// cell area.
    fn cell_at(
        &self,
        rect: &Rect,
        pointer: Pos2,
        layers: &[u32],
        columns: usize,
    ) -> Option<(u32, usize)> {
        let x = pointer.x - rect.left() - self.label_width;
        let y = pointer.y - rect.top() - self.header_height;
        if x < 0.0 || y < 0.0 {
            return None;
        }
        let column = (x / self.cell_width) as usize;
        let row = (y / self.cell_height) as usize;
        if column >= columns || row >= layers.len() {
            return None;
        }
        Some((layers[row], column))
    }

    fn render_tooltip(
        ui: &mut egui::Ui,
        session: &Session,
        layer: u32,
        position: usize,
        latents: &[(f64, u32)],
    ) {
        let residue = session
            .wild_type()
            .as_bytes()
            .get(position)
            .map(|r| *r as char)
            .unwrap_or('?');
        ui.label(format!("Layer {layer}, position {position} ({residue})"));
        ui.separator();
        for (value, latent_index) in latents {
            ui.label(format!("latent {latent_index}: {value:.3}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_at_maps_pointer_to_grid() {
        let heatmap = Heatmap::default();
        let rect = Rect::from_min_size(Pos2::new(100.0, 50.0), Vec2::new(600.0, 300.0));
        let layers = [0, 2, 5];

        // First cell, just inside the label/header margins.
        let pointer = Pos2::new(100.0 + heatmap.label_width + 1.0, 50.0 + heatmap.header_height + 1.0);
        assert_eq!(heatmap.cell_at(&rect, pointer, &layers, 12), Some((0, 0)));

        // Third column of the second layer row.
        let pointer = Pos2::new(
            100.0 + heatmap.label_width + 2.5 * heatmap.cell_width,
            50.0 + heatmap.header_height + 1.5 * heatmap.cell_height,
        );
        assert_eq!(heatmap.cell_at(&rect, pointer, &layers, 12), Some((2, 2)));

        // Inside the label column and beyond the grid.
        assert_eq!(
            heatmap.cell_at(&rect, Pos2::new(110.0, 120.0), &layers, 12),
            None
        );
        let pointer = Pos2::new(
            100.0 + heatmap.label_width + 20.0 * heatmap.cell_width,
            50.0 + heatmap.header_height + 1.0,
        );
        assert_eq!(heatmap.cell_at(&rect, pointer, &layers, 12), None);
    }

    #[test]
    fn test_cell_rect_roundtrips_through_cell_at() {
        let heatmap = Heatmap::default();
        let rect = Rect::from_min_size(Pos2::ZERO, Vec2::new(600.0, 300.0));
        let layers = [0, 2];
        let cell = heatmap.cell_rect(&rect, 1, 4);
        assert_eq!(
            heatmap.cell_at(&rect, cell.center(), &layers, 12),
            Some((2, 4))
        );
    }
}
