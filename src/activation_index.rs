//! (layer, position) => active-latent lookup, built once from loaded records.

use crate::error::LatentScopeError;
use anyhow::Result;
use itertools::Itertools;
use rayon::prelude::*;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;

#[derive(Clone, Debug, PartialEq)]
pub struct ActivationRecord {
    layer: u32,
    position: usize,
    value: f64,
    latent_index: u32,
}

impl ActivationRecord {
    pub fn new(layer: u32, position: usize, value: f64, latent_index: u32) -> Self {
        Self {
            layer,
            position,
            value,
            latent_index,
        }
    }

    #[inline(always)]
    pub fn layer(&self) -> u32 {
        self.layer
    }

    #[inline(always)]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline(always)]
    pub fn value(&self) -> f64 {
        self.value
    }

    #[inline(always)]
    pub fn latent_index(&self) -> u32 {
        self.latent_index
    }
}

/// Immutable once built. Most (layer, position) pairs have no bucket at all;
/// queries for them return the empty slice.
#[derive(Clone, Debug, Default)]
pub struct ActivationIndex {
    buckets: HashMap<(u32, usize), Vec<(f64, u32)>>,
    layers: Vec<u32>,
    max_position: usize,
    max_value: f64,
}

impl ActivationIndex {
    pub fn from_records(records: &[ActivationRecord]) -> Self {
        let mut buckets: HashMap<(u32, usize), Vec<(f64, u32)>> = HashMap::new();
        for record in records {
            buckets
                .entry((record.layer, record.position))
                .or_default()
                .push((record.value, record.latent_index));
        }
        let layers: Vec<u32> = buckets.keys().map(|(layer, _)| *layer).sorted().dedup().collect();
        let max_position = buckets.keys().map(|(_, pos)| *pos).max().unwrap_or(0);
        let max_value = buckets
            .par_iter()
            .flat_map_iter(|(_, latents)| latents.iter().map(|(value, _)| *value))
            .reduce(|| 0.0, f64::max);
        Self {
            buckets,
            layers,
            max_position,
            max_value,
        }
    }

    /// Expects a JSON array of `[layer, position, value, latent_index]`
    /// 4-tuples. Any malformed row fails the whole load; a partially built
    /// index is not usable.
    pub fn from_json_file(filename: &str) -> Result<Self> {
        let data = fs::read_to_string(filename)?;
        let json: Value = serde_json::from_str(&data)?;
        let rows = json.as_array().ok_or_else(|| {
            LatentScopeError::InvalidInput("activation records: expected a JSON array".to_string())
        })?;
        let mut records = Vec::with_capacity(rows.len());
        for (row_num, row) in rows.iter().enumerate() {
            records.push(Self::parse_record(row, row_num)?);
        }
        Ok(Self::from_records(&records))
    }

    fn parse_record(row: &Value, row_num: usize) -> Result<ActivationRecord, LatentScopeError> {
        let fields = row.as_array().ok_or_else(|| {
            LatentScopeError::InvalidInput(format!("record {row_num}: not an array"))
        })?;
        if fields.len() != 4 {
            return Err(LatentScopeError::InvalidInput(format!(
                "record {row_num}: expected 4 fields, got {}",
                fields.len()
            )));
        }
        let layer = fields[0].as_u64().ok_or_else(|| {
            LatentScopeError::InvalidInput(format!("record {row_num}: layer is not an integer"))
        })?;
        let position = fields[1].as_u64().ok_or_else(|| {
            LatentScopeError::InvalidInput(format!("record {row_num}: position is not an integer"))
        })?;
        let value = fields[2].as_f64().ok_or_else(|| {
            LatentScopeError::InvalidInput(format!("record {row_num}: value is not a number"))
        })?;
        let latent_index = fields[3].as_u64().ok_or_else(|| {
            LatentScopeError::InvalidInput(format!(
                "record {row_num}: latent index is not an integer"
            ))
        })?;
        Ok(ActivationRecord::new(
            layer as u32,
            position as usize,
            value,
            latent_index as u32,
        ))
    }

    /// All (value, latent) pairs active at (layer, position), in source
    /// record order. Positions without a bucket yield the empty slice.
    pub fn active_latents_at(&self, layer: u32, position: usize) -> &[(f64, u32)] {
        self.buckets
            .get(&(layer, position))
            .map(|latents| latents.as_slice())
            .unwrap_or(&[])
    }

    /// Per-position activation of one latent across the whole wild-type
    /// sequence; unlisted positions stay 0.0. Full scan over the layer's
    /// buckets, invoked once per user click.
    pub fn profile_for(&self, layer: u32, latent_index: u32, sequence_length: usize) -> Vec<f64> {
        let mut profile = vec![0.0; sequence_length];
        for ((bucket_layer, position), latents) in &self.buckets {
            if *bucket_layer != layer || *position >= sequence_length {
                continue;
            }
            if let Some((value, _)) = latents.iter().find(|(_, latent)| *latent == latent_index) {
                profile[*position] = *value;
            }
        }
        profile
    }

    /// Strongest activation in a cell's bucket, for heatmap coloring.
    pub fn cell_peak(&self, layer: u32, position: usize) -> Option<f64> {
        self.buckets
            .get(&(layer, position))?
            .iter()
            .map(|(value, _)| *value)
            .reduce(f64::max)
    }

    /// Layers with at least one record, ascending.
    #[inline(always)]
    pub fn layers(&self) -> &[u32] {
        &self.layers
    }

    #[inline(always)]
    pub fn max_position(&self) -> usize {
        self.max_position
    }

    /// Largest activation value in the index, for color normalization.
    #[inline(always)]
    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_records() -> Vec<ActivationRecord> {
        vec![
            ActivationRecord::new(0, 1, 0.9, 17),
            ActivationRecord::new(0, 1, 0.4, 23),
            ActivationRecord::new(0, 3, 0.2, 17),
            ActivationRecord::new(2, 1, 1.5, 5),
        ]
    }

    #[test]
    fn test_bucket_order_and_content() {
        let index = ActivationIndex::from_records(&test_records());
        assert_eq!(index.active_latents_at(0, 1), &[(0.9, 17), (0.4, 23)]);
        assert_eq!(index.active_latents_at(0, 3), &[(0.2, 17)]);
        assert_eq!(index.active_latents_at(2, 1), &[(1.5, 5)]);
    }

    #[test]
    fn test_missing_bucket_is_empty() {
        let index = ActivationIndex::from_records(&test_records());
        assert!(index.active_latents_at(0, 2).is_empty());
        assert!(index.active_latents_at(7, 0).is_empty());
    }

    #[test]
    fn test_profile_defaults_to_zero() {
        let index = ActivationIndex::from_records(&test_records());
        let profile = index.profile_for(0, 17, 5);
        assert_eq!(profile, vec![0.0, 0.9, 0.0, 0.2, 0.0]);
    }

    #[test]
    fn test_profile_ignores_positions_beyond_sequence() {
        let index = ActivationIndex::from_records(&test_records());
        let profile = index.profile_for(0, 17, 2);
        assert_eq!(profile, vec![0.0, 0.9]);
    }

    #[test]
    fn test_bounds() {
        let index = ActivationIndex::from_records(&test_records());
        assert_eq!(index.layers(), &[0, 2]);
        assert_eq!(index.max_position(), 3);
        assert_eq!(index.max_value(), 1.5);
        assert_eq!(index.cell_peak(0, 1), Some(0.9));
        assert_eq!(index.cell_peak(0, 2), None);
    }

    #[test]
    fn test_malformed_record_fails_load() {
        let row: Value = serde_json::from_str("[0, 1, 0.5]").unwrap();
        assert!(ActivationIndex::parse_record(&row, 0).is_err());
        let row: Value = serde_json::from_str("[0, 1, \"x\", 2]").unwrap();
        assert!(ActivationIndex::parse_record(&row, 0).is_err());
    }
}
