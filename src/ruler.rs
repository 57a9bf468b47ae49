//! Column tick annotations for an aligned layout.

/// Major ticks carry a label, minor ticks a longer mark, fillers a dot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickMark {
    Major,
    Minor,
    Filler,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RulerTick {
    column: usize,
    mark: TickMark,
    label: Option<String>,
    is_anchor: bool,
}

impl RulerTick {
    #[inline(always)]
    pub fn column(&self) -> usize {
        self.column
    }

    #[inline(always)]
    pub fn mark(&self) -> &TickMark {
        &self.mark
    }

    #[inline(always)]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Set on the anchor column regardless of its modulus, so the renderer
    /// can draw a distinguishing line through it.
    #[inline(always)]
    pub fn is_anchor(&self) -> bool {
        self.is_anchor
    }
}

/// One tick per column: labeled major every 10, unlabeled minor every 5,
/// filler otherwise. Pure function of the two integers.
pub fn build_ruler(total_width: usize, anchor_column: usize) -> Vec<RulerTick> {
    (0..total_width)
        .map(|column| {
            let (mark, label) = if column % 10 == 0 {
                (TickMark::Major, Some(column.to_string()))
            } else if column % 5 == 0 {
                (TickMark::Minor, None)
            } else {
                (TickMark::Filler, None)
            };
            RulerTick {
                column,
                mark,
                label,
                is_anchor: column == anchor_column,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_classes() {
        let ruler = build_ruler(21, 3);
        assert_eq!(ruler.len(), 21);
        assert_eq!(*ruler[0].mark(), TickMark::Major);
        assert_eq!(ruler[0].label(), Some("0"));
        assert_eq!(*ruler[5].mark(), TickMark::Minor);
        assert_eq!(ruler[5].label(), None);
        assert_eq!(*ruler[7].mark(), TickMark::Filler);
        assert_eq!(*ruler[10].mark(), TickMark::Major);
        assert_eq!(ruler[10].label(), Some("10"));
        assert_eq!(*ruler[20].mark(), TickMark::Major);
    }

    #[test]
    fn test_anchor_flag_is_independent_of_modulus() {
        let ruler = build_ruler(12, 7);
        assert!(ruler[7].is_anchor());
        assert_eq!(*ruler[7].mark(), TickMark::Filler);
        assert_eq!(ruler.iter().filter(|t| t.is_anchor()).count(), 1);

        let ruler = build_ruler(12, 10);
        assert!(ruler[10].is_anchor());
        assert_eq!(*ruler[10].mark(), TickMark::Major);
    }

    #[test]
    fn test_empty_ruler() {
        assert!(build_ruler(0, 0).is_empty());
    }
}
