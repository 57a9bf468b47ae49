//! Per-layer, per-latent top-activating reference sequences.

use crate::error::LatentScopeError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;

/// One top-activating corpus entry, with its full per-position activation
/// profile. Field names mirror the corpus JSON.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSequence {
    #[serde(rename = "Entry Name")]
    display_name: String,
    #[serde(rename = "Entry")]
    entry_id: String,
    #[serde(rename = "Protein names", default)]
    protein_description: String,
    #[serde(rename = "Score")]
    score: f64,
    #[serde(rename = "Sequence")]
    residues: String,
    #[serde(rename = "Activations", default)]
    activations: Vec<f64>,
    #[serde(rename = "seq_len", default)]
    seq_len: Option<usize>,
}

impl ReferenceSequence {
    #[inline(always)]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[inline(always)]
    pub fn entry_id(&self) -> &str {
        &self.entry_id
    }

    #[inline(always)]
    pub fn protein_description(&self) -> &str {
        &self.protein_description
    }

    #[inline(always)]
    pub fn score(&self) -> f64 {
        self.score
    }

    #[inline(always)]
    pub fn residues(&self) -> &str {
        &self.residues
    }

    #[inline(always)]
    pub fn activations(&self) -> &[f64] {
        &self.activations
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.residues.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    /// Restores the activations==residues length invariant after
    /// deserialization: missing per-position values are zeros, surplus
    /// values are cut. `seq_len` defaults to the sequence length.
    fn normalize(&mut self) {
        self.activations.resize(self.residues.len(), 0.0);
        if self.seq_len.is_none() {
            self.seq_len = Some(self.residues.len());
        }
    }

    #[cfg(test)]
    pub fn new_for_test(residues: &str, activations: Vec<f64>) -> Self {
        Self {
            display_name: format!("TEST_{}", residues.len()),
            entry_id: "T00000".to_string(),
            residues: residues.to_string(),
            activations,
            ..Default::default()
        }
    }
}

/// layer => latent => entries, ranked by descending score as supplied.
/// Never re-sorted here.
#[derive(Clone, Debug, Default)]
pub struct ReferenceCorpus {
    family: Option<String>,
    layers: HashMap<u32, HashMap<u32, Vec<ReferenceSequence>>>,
}

impl ReferenceCorpus {
    /// Expects `{"family": …, "layers": {layer: {latent: [entry, …]}}}`.
    /// Entries that fail to deserialize are reported and skipped; damaged
    /// structure fails the whole load.
    pub fn from_json_file(filename: &str) -> Result<Self> {
        let data = fs::read_to_string(filename)?;
        let json: Value = serde_json::from_str(&data)?;
        let family = json["family"].as_str().map(|s| s.to_string());
        let layer_map = json["layers"].as_object().ok_or_else(|| {
            LatentScopeError::InvalidInput("reference corpus: missing \"layers\" object".to_string())
        })?;

        let mut layers = HashMap::new();
        for (layer_key, latent_map) in layer_map {
            let layer: u32 = layer_key.parse().map_err(|_| {
                LatentScopeError::InvalidInput(format!("reference corpus: bad layer key \"{layer_key}\""))
            })?;
            let latent_map = latent_map.as_object().ok_or_else(|| {
                LatentScopeError::InvalidInput(format!("reference corpus: layer {layer} is not an object"))
            })?;
            let mut latents = HashMap::new();
            for (latent_key, entries) in latent_map {
                let latent: u32 = latent_key.parse().map_err(|_| {
                    LatentScopeError::InvalidInput(format!(
                        "reference corpus: bad latent key \"{latent_key}\" in layer {layer}"
                    ))
                })?;
                let entries = entries.as_array().ok_or_else(|| {
                    LatentScopeError::InvalidInput(format!(
                        "reference corpus: layer {layer} latent {latent} is not an array"
                    ))
                })?;
                let mut sequences = Vec::with_capacity(entries.len());
                for entry in entries {
                    let mut sequence: ReferenceSequence =
                        match serde_json::from_value(entry.clone()) {
                            Ok(sequence) => sequence,
                            Err(e) => {
                                eprintln!("Bad corpus entry in layer {layer} latent {latent}: {e}");
                                continue;
                            }
                        };
                    sequence.normalize();
                    sequences.push(sequence);
                }
                latents.insert(latent, sequences);
            }
            layers.insert(layer, latents);
        }

        Ok(Self { family, layers })
    }

    /// Top entries for (layer, latent) in corpus rank order. Missing layer
    /// and missing latent both resolve to the empty slice.
    pub fn top_sequences_for(&self, layer: u32, latent_index: u32) -> &[ReferenceSequence] {
        self.layers
            .get(&layer)
            .and_then(|latents| latents.get(&latent_index))
            .map(|sequences| sequences.as_slice())
            .unwrap_or(&[])
    }

    /// Only for "no data" message wording; lookups never fail either way.
    #[inline(always)]
    pub fn has_layer(&self, layer: u32) -> bool {
        self.layers.contains_key(&layer)
    }

    #[inline(always)]
    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus_json() -> &'static str {
        r#"{
            "family": "IPR001478",
            "layers": {
                "0": {
                    "17": [
                        {
                            "Score": 2.5,
                            "Activations": [0.0, 0.1, 2.5],
                            "Sequence": "MKVLT",
                            "Entry Name": "PDZ1_HUMAN",
                            "Protein names": "PDZ domain protein 1",
                            "Entry": "P00001"
                        },
                        {
                            "Score": 1.0,
                            "Activations": [1.0, 0.0, 0.0, 0.0],
                            "Sequence": "AMKV",
                            "Entry Name": "PDZ2_MOUSE",
                            "Protein names": "PDZ domain protein 2",
                            "Entry": "P00002",
                            "seq_len": 4
                        }
                    ]
                }
            }
        }"#
    }

    fn load_test_corpus(name: &str) -> ReferenceCorpus {
        let path = std::env::temp_dir().join(name);
        fs::write(&path, corpus_json()).unwrap();
        ReferenceCorpus::from_json_file(path.to_str().unwrap()).unwrap()
    }

    #[test]
    fn test_rank_order_preserved() {
        let corpus = load_test_corpus("latentscope_corpus_rank.json");
        let sequences = corpus.top_sequences_for(0, 17);
        assert_eq!(sequences.len(), 2);
        assert_eq!(sequences[0].display_name(), "PDZ1_HUMAN");
        assert_eq!(sequences[0].score(), 2.5);
        assert_eq!(sequences[1].entry_id(), "P00002");
    }

    #[test]
    fn test_activations_zero_filled_to_sequence_length() {
        let corpus = load_test_corpus("latentscope_corpus_fill.json");
        let first = &corpus.top_sequences_for(0, 17)[0];
        assert_eq!(first.len(), 5);
        assert_eq!(first.activations(), &[0.0, 0.1, 2.5, 0.0, 0.0]);
    }

    #[test]
    fn test_missing_layer_and_latent_are_empty() {
        let corpus = load_test_corpus("latentscope_corpus_missing.json");
        assert!(corpus.top_sequences_for(9, 17).is_empty());
        assert!(corpus.top_sequences_for(0, 99).is_empty());
        assert!(corpus.has_layer(0));
        assert!(!corpus.has_layer(9));
    }

    #[test]
    fn test_family_label() {
        let corpus = load_test_corpus("latentscope_corpus_family.json");
        assert_eq!(corpus.family(), Some("IPR001478"));
    }

    #[test]
    fn test_missing_layers_object_fails() {
        let path = std::env::temp_dir().join("latentscope_corpus_bad.json");
        fs::write(&path, r#"{"family": "x"}"#).unwrap();
        assert!(ReferenceCorpus::from_json_file(path.to_str().unwrap()).is_err());
    }
}
