use std::ops::Range;
use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Placement {
    Before,
    After,
    Replace,
}

/// A payload spliced in relative to an anchor match.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Edit {
    pub label: &'static str,
    pub anchor: Range<usize>,
    pub placement: Placement,
    pub payload: String,
}

impl Edit {
    fn position(&self) -> usize {
        match self.placement {
            Placement::Before | Placement::Replace => self.anchor.start,
            Placement::After => self.anchor.end,
        }
    }

    fn consumed(&self) -> usize {
        match self.placement {
            Placement::Replace => self.anchor.end - self.anchor.start,
            _ => 0,
        }
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum Error {
    #[error("Edit `{label}` anchored at {anchor:?} lies outside the {len} byte source")]
    OutOfBounds {
        label: &'static str,
        anchor: Range<usize>,
        len: usize,
    },
    #[error("Edits `{first}` and `{second}` overlap")]
    Overlap {
        first: &'static str,
        second: &'static str,
    },
}

/// Edits computed against one snapshot of a file, applied together.
///
/// Every anchor refers to the original text, so the order edits are planned
/// in doesn't shift anyone else's offsets. Edits landing on the same offset
/// keep their planning order.
#[derive(Debug, Default)]
pub struct EditPlan {
    edits: Vec<Edit>,
}

impl EditPlan {
    pub fn push(
        &mut self,
        label: &'static str,
        anchor: Range<usize>,
        placement: Placement,
        payload: impl Into<String>,
    ) {
        self.edits.push(Edit {
            label,
            anchor,
            placement,
            payload: payload.into(),
        });
    }

    pub fn apply(&self, text: &str) -> Result<String, Error> {
        let mut ordered = self.edits.iter().collect::<Vec<_>>();
        for edit in &ordered {
            let in_bounds = edit.anchor.start <= edit.anchor.end
                && edit.anchor.end <= text.len()
                && text.is_char_boundary(edit.anchor.start)
                && text.is_char_boundary(edit.anchor.end);
            if !in_bounds {
                return Err(Error::OutOfBounds {
                    label: edit.label,
                    anchor: edit.anchor.clone(),
                    len: text.len(),
                });
            }
        }
        // stable, so ties stay in planning order
        ordered.sort_by_key(|edit| edit.position());
        let mut out = String::with_capacity(
            text.len() + ordered.iter().map(|edit| edit.payload.len()).sum::<usize>(),
        );
        let mut cursor = 0;
        let mut last: Option<&Edit> = None;
        for edit in ordered {
            let at = edit.position();
            if at < cursor {
                return Err(Error::Overlap {
                    first: last.map_or("", |last| last.label),
                    second: edit.label,
                });
            }
            out.push_str(&text[cursor..at]);
            out.push_str(&edit.payload);
            cursor = at + edit.consumed();
            last = Some(edit);
        }
        out.push_str(&text[cursor..]);
        Ok(out)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn edits_use_original_offsets() {
        let text = "alpha beta gamma";
        let mut plan = EditPlan::default();
        plan.push("tail", 11..16, Placement::After, "!");
        plan.push("head", 0..5, Placement::Before, ">> ");
        plan.push("middle", 6..10, Placement::Replace, "BETA");
        assert_eq!(plan.apply(text).unwrap(), ">> alpha BETA gamma!");
    }

    #[test]
    fn same_offset_keeps_planning_order() {
        let text = "class A {\n}";
        let close = text.rfind('}').unwrap();
        let mut plan = EditPlan::default();
        plan.push("first", close..close + 1, Placement::Before, "one\n");
        plan.push("second", close..close + 1, Placement::Before, "two\n");
        assert_eq!(plan.apply(text).unwrap(), "class A {\none\ntwo\n}");
    }

    #[test]
    fn overlapping_replacements_are_rejected() {
        let mut plan = EditPlan::default();
        plan.push("wide", 0..6, Placement::Replace, "x");
        plan.push("inside", 2..3, Placement::After, "y");
        assert_eq!(
            plan.apply("abcdefgh"),
            Err(Error::Overlap {
                first: "wide",
                second: "inside"
            })
        );
    }

    #[test]
    fn out_of_bounds_anchor_is_rejected() {
        let mut plan = EditPlan::default();
        plan.push("far", 10..12, Placement::After, "x");
        assert!(matches!(plan.apply("short"), Err(Error::OutOfBounds { .. })));
    }
}
