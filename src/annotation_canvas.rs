//! Freeform node/edge canvas for annotating relationships between selected
//! activations.
//!
//! Nodes are addressed by integer handles, never by references, so deletes
//! and merges cannot leave anything dangling. Handles are never reused.

use eframe::egui::{self, Align2, Color32, Painter, Pos2, Rect, Sense, Stroke, Vec2};
use std::collections::{BTreeMap, BTreeSet};

fn latent_label(layer: u32, latent_index: u32) -> String {
    format!("L{layer}/{latent_index}")
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationNode {
    handle: usize,
    label: String,
    members: Vec<String>,
    position: Pos2,
}

impl AnnotationNode {
    #[inline(always)]
    pub fn handle(&self) -> usize {
        self.handle
    }

    #[inline(always)]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The latent labels folded into this node; a single pinned latent has
    /// exactly one member.
    #[inline(always)]
    pub fn members(&self) -> &[String] {
        &self.members
    }

    #[inline(always)]
    pub fn position(&self) -> Pos2 {
        self.position
    }
}

#[derive(Clone, Debug, Default)]
pub struct AnnotationGraph {
    nodes: BTreeMap<usize, AnnotationNode>,
    edges: BTreeSet<(usize, usize)>,
    next_handle: usize,
}

impl AnnotationGraph {
    pub fn add_node(&mut self, label: String, position: Pos2) -> usize {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.nodes.insert(
            handle,
            AnnotationNode {
                handle,
                members: vec![label.clone()],
                label,
                position,
            },
        );
        handle
    }

    /// Removes the node and every edge touching it.
    pub fn remove_node(&mut self, handle: usize) {
        self.nodes.remove(&handle);
        self.edges.retain(|(a, b)| *a != handle && *b != handle);
    }

    /// Connects two existing nodes. Self-edges and duplicates are rejected.
    pub fn connect(&mut self, a: usize, b: usize) -> bool {
        if a == b || !self.nodes.contains_key(&a) || !self.nodes.contains_key(&b) {
            return false;
        }
        self.edges.insert((a.min(b), a.max(b)))
    }

    /// Merges the given nodes into one super node at `position`. External
    /// edges are rewired to the new node, edges between merged nodes vanish
    /// with them. Returns the new handle, or None for fewer than two nodes.
    pub fn combine(&mut self, handles: &[usize], position: Pos2) -> Option<usize> {
        let handles: BTreeSet<usize> = handles
            .iter()
            .copied()
            .filter(|handle| self.nodes.contains_key(handle))
            .collect();
        if handles.len() < 2 {
            return None;
        }

        let mut members = Vec::new();
        for handle in &handles {
            members.extend(self.nodes[handle].members().to_vec());
        }
        let label = members.join(" + ");

        let neighbors: Vec<usize> = self
            .edges
            .iter()
            .filter_map(|(a, b)| match (handles.contains(a), handles.contains(b)) {
                (true, false) => Some(*b),
                (false, true) => Some(*a),
                _ => None,
            })
            .collect();

        for handle in &handles {
            self.remove_node(*handle);
        }
        let merged = self.next_handle;
        self.next_handle += 1;
        self.nodes.insert(
            merged,
            AnnotationNode {
                handle: merged,
                label,
                members,
                position,
            },
        );
        for neighbor in neighbors {
            self.connect(merged, neighbor);
        }
        Some(merged)
    }

    pub fn move_by(&mut self, handle: usize, delta: Vec2) {
        if let Some(node) = self.nodes.get_mut(&handle) {
            node.position += delta;
        }
    }

    #[inline(always)]
    pub fn node(&self, handle: usize) -> Option<&AnnotationNode> {
        self.nodes.get(&handle)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &AnnotationNode> {
        self.nodes.values()
    }

    #[inline(always)]
    pub fn edges(&self) -> impl Iterator<Item = &(usize, usize)> {
        self.edges.iter()
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

const NODE_SIZE: Vec2 = Vec2::new(120.0, 36.0);
const NODE_FILL: Color32 = Color32::from_rgb(225, 235, 248);
const NODE_SELECTED: Color32 = Color32::from_rgb(70, 120, 200);
const EDGE_STROKE: Color32 = Color32::from_rgb(130, 130, 130);

#[derive(Debug, Default)]
pub struct AnnotationCanvas {
    graph: AnnotationGraph,
    selected: BTreeSet<usize>,
    dragging: Option<usize>,
    pin_count: usize,
}

impl AnnotationCanvas {
    /// Adds a node for a pinned (layer, latent), staggered so consecutive
    /// pins do not stack.
    pub fn pin(&mut self, layer: u32, latent_index: u32) {
        let offset = (self.pin_count % 8) as f32;
        self.pin_count += 1;
        self.graph.add_node(
            latent_label(layer, latent_index),
            Pos2::new(40.0 + offset * 30.0, 40.0 + offset * 45.0),
        );
    }

    #[inline(always)]
    pub fn graph(&self) -> &AnnotationGraph {
        &self.graph
    }

    pub fn render(&mut self, ui: &mut egui::Ui) {
        self.render_toolbar(ui);
        ui.separator();

        let size = ui.available_size();
        let (response, painter) = ui.allocate_painter(size, Sense::click_and_drag());
        let origin = response.rect.min;

        self.handle_pointer(&response, origin);

        for (a, b) in self.graph.edges.clone() {
            if let (Some(from), Some(to)) = (self.graph.node(a), self.graph.node(b)) {
                painter.line_segment(
                    [origin + from.position().to_vec2(), origin + to.position().to_vec2()],
                    Stroke::new(1.5, EDGE_STROKE),
                );
            }
        }

        for node in self.graph.nodes.values() {
            let rect = Self::node_rect(node, origin);
            if self.selected.contains(&node.handle()) {
                painter.rect_filled(rect.expand(2.0), 6.0, NODE_SELECTED);
            }
            painter.rect_filled(rect, 5.0, NODE_FILL);
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                node.label(),
                egui::FontId::proportional(12.0),
                Color32::BLACK,
            );
        }

        if self.graph.is_empty() {
            Self::render_empty_hint(&painter, &response.rect);
        }
    }

    fn render_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let connect = egui::Button::new("Connect");
            if ui.add_enabled(self.selected.len() == 2, connect).clicked() {
                let selected: Vec<usize> = self.selected.iter().copied().collect();
                self.graph.connect(selected[0], selected[1]);
            }
            let combine = egui::Button::new("Combine");
            if ui.add_enabled(self.selected.len() >= 2, combine).clicked() {
                let selected: Vec<usize> = self.selected.iter().copied().collect();
                let position = self.merge_position(&selected);
                if let Some(merged) = self.graph.combine(&selected, position) {
                    self.selected.clear();
                    self.selected.insert(merged);
                }
            }
            let delete = egui::Button::new("Delete");
            if ui.add_enabled(!self.selected.is_empty(), delete).clicked() {
                for handle in std::mem::take(&mut self.selected) {
                    self.graph.remove_node(handle);
                }
            }
            if ui.button("Clear selection").clicked() {
                self.selected.clear();
            }
            ui.label(format!(
                "{} nodes, {} edges",
                self.graph.len(),
                self.graph.edges.len()
            ));
        });
    }

    fn handle_pointer(&mut self, response: &egui::Response, origin: Pos2) {
        if response.drag_started() {
            self.dragging = response
                .interact_pointer_pos()
                .and_then(|pos| self.node_at(pos, origin));
        }
        if let Some(handle) = self.dragging {
            self.graph.move_by(handle, response.drag_delta());
        }
        if response.drag_stopped() {
            self.dragging = None;
        }
        if response.clicked() {
            match response
                .interact_pointer_pos()
                .and_then(|pos| self.node_at(pos, origin))
            {
                Some(handle) => {
                    if !self.selected.remove(&handle) {
                        self.selected.insert(handle);
                    }
                }
                None => self.selected.clear(),
            }
        }
    }

    fn node_at(&self, pointer: Pos2, origin: Pos2) -> Option<usize> {
        self.graph
            .nodes
            .values()
            .rev()
            .find(|node| Self::node_rect(node, origin).contains(pointer))
            .map(|node| node.handle())
    }

    fn node_rect(node: &AnnotationNode, origin: Pos2) -> Rect {
        Rect::from_center_size(origin + node.position().to_vec2(), NODE_SIZE)
    }

    fn merge_position(&self, handles: &[usize]) -> Pos2 {
        let positions: Vec<Pos2> = handles
            .iter()
            .filter_map(|handle| self.graph.node(*handle))
            .map(|node| node.position())
            .collect();
        if positions.is_empty() {
            return Pos2::new(60.0, 60.0);
        }
        let sum = positions
            .iter()
            .fold(Vec2::ZERO, |acc, pos| acc + pos.to_vec2());
        (sum / positions.len() as f32).to_pos2()
    }

    fn render_empty_hint(painter: &Painter, rect: &Rect) {
        painter.text(
            rect.center(),
            Align2::CENTER_CENTER,
            "Pin latents from the detail panel to annotate them here",
            egui::FontId::proportional(13.0),
            Color32::GRAY,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_never_reused() {
        let mut graph = AnnotationGraph::default();
        let a = graph.add_node("L0/17".to_string(), Pos2::new(10.0, 10.0));
        let b = graph.add_node("L0/23".to_string(), Pos2::new(20.0, 20.0));
        graph.remove_node(a);
        let c = graph.add_node("L2/5".to_string(), Pos2::new(30.0, 30.0));
        assert_ne!(c, a);
        assert_ne!(c, b);
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_connect_rejects_self_and_unknown() {
        let mut graph = AnnotationGraph::default();
        let a = graph.add_node("L0/17".to_string(), Pos2::ZERO);
        let b = graph.add_node("L0/23".to_string(), Pos2::ZERO);
        assert!(graph.connect(a, b));
        assert!(!graph.connect(a, b)); // duplicate
        assert!(!graph.connect(b, a)); // duplicate, other direction
        assert!(!graph.connect(a, a));
        assert!(!graph.connect(a, 999));
        assert_eq!(graph.edges().count(), 1);
    }

    #[test]
    fn test_delete_removes_incident_edges() {
        let mut graph = AnnotationGraph::default();
        let a = graph.add_node("a".to_string(), Pos2::ZERO);
        let b = graph.add_node("b".to_string(), Pos2::ZERO);
        let c = graph.add_node("c".to_string(), Pos2::ZERO);
        graph.connect(a, b);
        graph.connect(b, c);
        graph.remove_node(b);
        assert_eq!(graph.edges().count(), 0);
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_combine_rewires_external_edges() {
        let mut graph = AnnotationGraph::default();
        let a = graph.add_node("L0/17".to_string(), Pos2::ZERO);
        let b = graph.add_node("L0/23".to_string(), Pos2::ZERO);
        let c = graph.add_node("L2/5".to_string(), Pos2::ZERO);
        graph.connect(a, b); // internal, must vanish
        graph.connect(b, c); // external, must follow the merge
        let merged = graph.combine(&[a, b], Pos2::new(50.0, 50.0)).unwrap();

        assert_eq!(graph.len(), 2);
        assert!(graph.node(a).is_none());
        assert!(graph.node(b).is_none());
        let node = graph.node(merged).unwrap();
        assert_eq!(node.members(), &["L0/17".to_string(), "L0/23".to_string()]);
        let edges: Vec<(usize, usize)> = graph.edges().copied().collect();
        assert_eq!(edges, vec![(merged.min(c), merged.max(c))]);
    }

    #[test]
    fn test_combine_needs_two_nodes() {
        let mut graph = AnnotationGraph::default();
        let a = graph.add_node("a".to_string(), Pos2::ZERO);
        assert!(graph.combine(&[a], Pos2::ZERO).is_none());
        assert!(graph.combine(&[a, 999], Pos2::ZERO).is_none());
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_move_by() {
        let mut graph = AnnotationGraph::default();
        let a = graph.add_node("a".to_string(), Pos2::new(10.0, 10.0));
        graph.move_by(a, Vec2::new(5.0, -5.0));
        assert_eq!(graph.node(a).unwrap().position(), Pos2::new(15.0, 5.0));
    }
}
