//! Anchor-and-pad alignment of the wild type and reference sequences on
//! their activation peaks.
//!
//! This is deliberately not biological sequence alignment: no gaps inside a
//! sequence, no scoring matrix. Every participant is anchored at the first
//! occurrence of its maximum activation and padded on both sides so all
//! peaks land in the same column.

use crate::error::LatentScopeError;
use crate::reference_corpus::ReferenceSequence;

/// The wild-type participant: the loaded sequence plus the per-position
/// profile of the selected latent. Derived on demand, not persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct WildTypeTrack {
    residues: String,
    activations: Vec<f64>,
}

impl WildTypeTrack {
    pub fn new(residues: String, activations: Vec<f64>) -> Self {
        Self {
            residues,
            activations,
        }
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
}

/// What an aligned row was built from.
#[derive(Clone, Debug, PartialEq)]
pub enum RowSource {
    WildType(WildTypeTrack),
    Reference(ReferenceSequence),
}

impl RowSource {
    pub fn label(&self) -> &str {
        match self {
            Self::WildType(_) => "wild type",
            Self::Reference(sequence) => sequence.display_name(),
        }
    }

    pub fn residues(&self) -> &str {
        match self {
            Self::WildType(track) => track.residues(),
            Self::Reference(sequence) => sequence.residues(),
        }
    }

    pub fn activations(&self) -> &[f64] {
        match self {
            Self::WildType(track) => track.activations(),
            Self::Reference(sequence) => sequence.activations(),
        }
    }

    pub fn len(&self) -> usize {
        self.residues().len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues().is_empty()
    }

    pub fn score(&self) -> Option<f64> {
        match self {
            Self::WildType(_) => None,
            Self::Reference(sequence) => Some(sequence.score()),
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::WildType(_) => "",
            Self::Reference(sequence) => sequence.protein_description(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AlignedRow {
    source: RowSource,
    left_padding: usize,
    right_padding: usize,
    max_activation_index: usize,
}

impl AlignedRow {
    #[inline(always)]
    pub fn source(&self) -> &RowSource {
        &self.source
    }

    #[inline(always)]
    pub fn left_padding(&self) -> usize {
        self.left_padding
    }

    #[inline(always)]
    pub fn right_padding(&self) -> usize {
        self.right_padding
    }

    #[inline(always)]
    pub fn max_activation_index(&self) -> usize {
        self.max_activation_index
    }

    /// Residue and activation at an aligned column, None inside padding.
    pub fn cell(&self, column: usize) -> Option<(u8, f64)> {
        let offset = column.checked_sub(self.left_padding)?;
        let residue = *self.source.residues().as_bytes().get(offset)?;
        let activation = self.source.activations().get(offset).copied().unwrap_or(0.0);
        Some((residue, activation))
    }
}

/// Every row spans `total_width` columns and peaks at `anchor_column`.
#[derive(Clone, Debug)]
pub struct AlignedLayout {
    rows: Vec<AlignedRow>,
    anchor_column: usize,
    total_width: usize,
}

impl AlignedLayout {
    #[inline(always)]
    pub fn rows(&self) -> &[AlignedRow] {
        &self.rows
    }

    #[inline(always)]
    pub fn anchor_column(&self) -> usize {
        self.anchor_column
    }

    #[inline(always)]
    pub fn total_width(&self) -> usize {
        self.total_width
    }
}

/// Index of the first occurrence of the maximum activation. The
/// first-occurrence tie-break is load-bearing for reproducibility; an
/// all-zero array peaks at 0.
pub fn peak_index(activations: &[f64]) -> Result<usize, LatentScopeError> {
    if activations.is_empty() {
        return Err(LatentScopeError::InvalidInput(
            "empty activation array".to_string(),
        ));
    }
    let mut best = 0;
    for (i, value) in activations.iter().enumerate().skip(1) {
        if *value > activations[best] {
            best = i;
        }
    }
    Ok(best)
}

fn check_lengths(label: &str, residues: &str, activations: &[f64]) -> Result<(), LatentScopeError> {
    if residues.len() != activations.len() {
        return Err(LatentScopeError::InvalidInput(format!(
            "{label}: {} residues but {} activation values",
            residues.len(),
            activations.len()
        )));
    }
    Ok(())
}

/// Anchor-aligns the wild type and its references for one latent. Wild
/// type first, references in corpus rank order. Empty reference list is
/// fine; a length mismatch or empty activation array is not.
pub fn align(
    wild_type: &WildTypeTrack,
    references: &[ReferenceSequence],
) -> Result<AlignedLayout, LatentScopeError> {
    let mut sources = Vec::with_capacity(references.len() + 1);
    sources.push(RowSource::WildType(wild_type.clone()));
    for reference in references {
        sources.push(RowSource::Reference(reference.clone()));
    }

    let mut peaks = Vec::with_capacity(sources.len());
    for source in &sources {
        check_lengths(source.label(), source.residues(), source.activations())?;
        peaks.push(peak_index(source.activations())?);
    }

    // No sequence needs negative left padding this way.
    let anchor_column = peaks.iter().copied().max().unwrap_or(0);
    let total_width = sources
        .iter()
        .zip(&peaks)
        .map(|(source, peak)| anchor_column - peak + source.len())
        .max()
        .unwrap_or(0);

    let rows = sources
        .into_iter()
        .zip(peaks)
        .map(|(source, peak)| {
            let left_padding = anchor_column - peak;
            let right_padding = total_width - left_padding - source.len();
            AlignedRow {
                source,
                left_padding,
                right_padding,
                max_activation_index: peak,
            }
        })
        .collect();

    Ok(AlignedLayout {
        rows,
        anchor_column,
        total_width,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wild_type() -> WildTypeTrack {
        WildTypeTrack::new("MKV".to_string(), vec![0.1, 0.9, 0.2])
    }

    #[test]
    fn test_peak_index_first_occurrence_wins() {
        assert_eq!(peak_index(&[0.0, 0.0, 0.7, 0.1, 0.3, 0.7]).unwrap(), 2);
    }

    #[test]
    fn test_peak_index_all_zero() {
        assert_eq!(peak_index(&[0.0, 0.0, 0.0]).unwrap(), 0);
    }

    #[test]
    fn test_peak_index_empty_is_invalid() {
        assert!(peak_index(&[]).is_err());
    }

    #[test]
    fn test_align_example() {
        // Wild type MKV peaks at 1, reference AMKVG peaks at 2. Aligned
        // lengths are 4 and 5, so the wild type gets one column of padding
        // on each side.
        let reference =
            ReferenceSequence::new_for_test("AMKVG", vec![0.0, 0.0, 0.8, 0.1, 0.0]);
        let layout = align(&wild_type(), &[reference]).unwrap();
        assert_eq!(layout.anchor_column(), 2);
        assert_eq!(layout.total_width(), 5);

        let wt = &layout.rows()[0];
        assert_eq!(wt.left_padding(), 1);
        assert_eq!(wt.right_padding(), 1);
        assert_eq!(wt.max_activation_index(), 1);

        let re = &layout.rows()[1];
        assert_eq!(re.left_padding(), 0);
        assert_eq!(re.right_padding(), 0);
        assert_eq!(re.max_activation_index(), 2);
    }

    #[test]
    fn test_align_invariants() {
        let references = vec![
            ReferenceSequence::new_for_test("AMKVG", vec![0.0, 0.0, 0.8, 0.1, 0.0]),
            ReferenceSequence::new_for_test("KV", vec![0.5, 0.1]),
            ReferenceSequence::new_for_test("TTMKVLTA", vec![0.0, 0.0, 0.0, 1.2, 0.0, 0.0, 0.0, 0.0]),
        ];
        let layout = align(&wild_type(), &references).unwrap();
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
    fn test_align_is_deterministic() {
        let references = vec![
            ReferenceSequence::new_for_test("AMKVG", vec![0.0, 0.0, 0.8, 0.1, 0.0]),
            ReferenceSequence::new_for_test("KV", vec![0.5, 0.1]),
        ];
        let a = align(&wild_type(), &references).unwrap();
        let b = align(&wild_type(), &references).unwrap();
        assert_eq!(a.anchor_column(), b.anchor_column());
        assert_eq!(a.total_width(), b.total_width());
        for (row_a, row_b) in a.rows().iter().zip(b.rows()) {
            assert_eq!(row_a.left_padding(), row_b.left_padding());
            assert_eq!(row_a.right_padding(), row_b.right_padding());
            assert_eq!(row_a.source(), row_b.source());
        }
    }

    #[test]
    fn test_align_row_order() {
        let references = vec![
            ReferenceSequence::new_for_test("KV", vec![0.5, 0.1]),
            ReferenceSequence::new_for_test("AMKVG", vec![0.0, 0.0, 0.8, 0.1, 0.0]),
        ];
        let layout = align(&wild_type(), &references).unwrap();
        assert!(matches!(layout.rows()[0].source(), RowSource::WildType(_)));
        assert_eq!(layout.rows()[1].source().residues(), "KV");
        assert_eq!(layout.rows()[2].source().residues(), "AMKVG");
    }

    #[test]
    fn test_align_without_references() {
        let layout = align(&wild_type(), &[]).unwrap();
        assert_eq!(layout.rows().len(), 1);
        assert_eq!(layout.anchor_column(), 1);
        assert_eq!(layout.total_width(), 3);
        assert_eq!(layout.rows()[0].left_padding(), 0);
        assert_eq!(layout.rows()[0].right_padding(), 0);
    }

    #[test]
    fn test_align_rejects_length_mismatch() {
        let bad = ReferenceSequence::new_for_test("AMKVG", vec![0.0, 0.8]);
        assert!(align(&wild_type(), &[bad]).is_err());
    }

    #[test]
    fn test_align_rejects_empty_activations() {
        let bad = WildTypeTrack::new(String::new(), vec![]);
        assert!(align(&bad, &[]).is_err());
    }

    #[test]
    fn test_cell_lookup() {
        let reference =
            ReferenceSequence::new_for_test("AMKVG", vec![0.0, 0.0, 0.8, 0.1, 0.0]);
        let layout = align(&wild_type(), &[reference]).unwrap();
        let wt = &layout.rows()[0];
        assert_eq!(wt.cell(0), None); // left padding
        assert_eq!(wt.cell(1), Some((b'M', 0.1)));
        assert_eq!(wt.cell(2), Some((b'K', 0.9))); // the anchor column
        assert_eq!(wt.cell(4), None); // right padding
    }
}
