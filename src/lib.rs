//! LatentScope: interactive inspection of sparse-latent activations over a
//! protein sequence.
//!
//! The core is deliberately GUI-free: [`activation_index`],
//! [`reference_corpus`], [`alignment`] and [`ruler`] operate on plain
//! values and are bundled into an immutable [`session::Session`] once the
//! three input datasets are loaded. The remaining modules render that
//! session with egui.

pub mod about;
pub mod activation_index;
pub mod alignment;
pub mod annotation_canvas;
pub mod app;
pub mod color_scale;
pub mod detail_panel;
pub mod error;
pub mod heatmap;
pub mod reference_corpus;
pub mod ruler;
pub mod session;
