//! The three loaded datasets as one immutable value object.
//!
//! Built once when a load completes, then passed by reference to the
//! alignment engine and the panels. No globals; reloading replaces the
//! whole session.

use crate::activation_index::ActivationIndex;
use crate::alignment::WildTypeTrack;
use crate::error::LatentScopeError;
use crate::reference_corpus::ReferenceCorpus;
use anyhow::Result;
use std::fs;

#[derive(Clone, Debug)]
pub struct Session {
    wild_type: String,
    index: ActivationIndex,
    corpus: ReferenceCorpus,
}

impl Session {
    /// Builds the whole session from the three input files. Any failure
    /// aborts the load; there is no partially loaded state.
    pub fn load(activations_path: &str, sequence_path: &str, corpus_path: &str) -> Result<Self> {
        let index = ActivationIndex::from_json_file(activations_path)?;
        let wild_type = Self::load_wild_type(sequence_path)?;
        let corpus = ReferenceCorpus::from_json_file(corpus_path)?;
        Ok(Self {
            wild_type,
            index,
            corpus,
        })
    }

    fn load_wild_type(filename: &str) -> Result<String> {
        let text = fs::read_to_string(filename)?;
        let sequence = text.trim().to_string();
        if sequence.is_empty() {
            return Err(
                LatentScopeError::InvalidInput(format!("{filename}: empty sequence")).into(),
            );
        }
        Ok(sequence)
    }

    #[inline(always)]
    pub fn wild_type(&self) -> &str {
        &self.wild_type
    }

    #[inline(always)]
    pub fn sequence_length(&self) -> usize {
        self.wild_type.len()
    }

    #[inline(always)]
    pub fn index(&self) -> &ActivationIndex {
        &self.index
    }

    #[inline(always)]
    pub fn corpus(&self) -> &ReferenceCorpus {
        &self.corpus
    }

    #[inline(always)]
    pub fn family(&self) -> Option<&str> {
        self.corpus.family()
    }

    /// The wild-type participant for an alignment: the loaded sequence plus
    /// the selected latent's per-position profile.
    pub fn wild_type_track(&self, layer: u32, latent_index: u32) -> WildTypeTrack {
        let profile = self
            .index
            .profile_for(layer, latent_index, self.sequence_length());
        WildTypeTrack::new(self.wild_type.clone(), profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::align;

    fn load_test_session() -> Session {
        Session::load(
            "test_files/activation_indices.json",
            "test_files/wild_type.txt",
            "test_files/top_activations.json",
        )
        .unwrap()
    }

    #[test]
    fn test_load_fixture_session() {
        let session = load_test_session();
        assert_eq!(session.wild_type(), "MKVLTAGKQLFD");
        assert_eq!(session.sequence_length(), 12);
        assert_eq!(session.index().layers(), &[0, 2]);
        assert_eq!(session.family(), Some("IPR001478"));
    }

    #[test]
    fn test_wild_type_track_matches_profile() {
        let session = load_test_session();
        let track = session.wild_type_track(0, 17);
        assert_eq!(track.len(), session.sequence_length());
        assert_eq!(track.activations()[1], 0.9);
        assert_eq!(track.activations()[0], 0.0);
    }

    #[test]
    fn test_fixture_alignment_end_to_end() {
        let session = load_test_session();
        let track = session.wild_type_track(0, 17);
        let references = session.corpus().top_sequences_for(0, 17);
        assert!(!references.is_empty());
        let layout = align(&track, references).unwrap();
        assert_eq!(layout.rows().len(), references.len() + 1);
        for row in layout.rows() {
            assert_eq!(
                row.left_padding() + row.source().len() + row.right_padding(),
                layout.total_width()
            );
            assert_eq!(
                row.left_padding() + row.max_activation_index(),
                layout.anchor_column()
            );
        }
    }

    #[test]
    fn test_missing_file_fails_load() {
        assert!(
            Session::load(
                "test_files/no_such_file.json",
                "test_files/wild_type.txt",
                "test_files/top_activations.json",
            )
            .is_err()
        );
    }
}
