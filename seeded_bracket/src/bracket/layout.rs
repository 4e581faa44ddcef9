//! Columnar bracket layout for renderers.
//!
//! Columns run from the final (one cell) back to the first round. Every
//! cell knows whether it is the upper or lower child of the cell it feeds
//! and how much of the column height it takes, so any client can stack the
//! cells without recomputing the tree.

use super::{
    models::{Entrant, Match, MatchMap, Slot},
    seeding::{round_count, validate_bracket_size},
};
use crate::errors::BracketResult;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Presentation tags attached to a layout cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellTag {
    BracketCellWithMatch,
    BracketCellWithoutMatch,
    UpperChildCell,
    LowerChildCell,
    BracketFinalsCell,
}

impl CellTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            CellTag::BracketCellWithMatch => "bracket_cell_with_match",
            CellTag::BracketCellWithoutMatch => "bracket_cell_without_match",
            CellTag::UpperChildCell => "upper_child_cell",
            CellTag::LowerChildCell => "lower_child_cell",
            CellTag::BracketFinalsCell => "bracket_finals_cell",
        }
    }
}

impl std::fmt::Display for CellTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One cell of a layout column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutCell {
    /// Slot the cell stands for
    pub slot: Slot,
    /// The match, or None for a placeholder
    pub match_ref: Option<Match>,
    /// Presentation tags
    pub tags: BTreeSet<CellTag>,
    /// Share of the column height, in percent
    pub height_percent: f64,
}

impl LayoutCell {
    /// Tags joined with spaces, ready for use as a class attribute
    pub fn css_classes(&self) -> String {
        self.tags
            .iter()
            .map(CellTag::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_placeholder(&self) -> bool {
        self.match_ref.is_none()
    }
}

/// One round of the layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutColumn {
    /// Round number (0 is the first round)
    pub round: u32,
    pub cells: Vec<LayoutCell>,
}

/// Full bracket grid, final first (empty before the bracket exists)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BracketLayout {
    pub columns: Vec<LayoutColumn>,
    /// Pixel height of every column
    pub column_height_px: u32,
}

impl BracketLayout {
    /// Serialize the layout for a renderer
    pub fn to_json(&self) -> BracketResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Cell at a slot, if the slot is inside the bracket
    pub fn cell(&self, slot: Slot) -> Option<&LayoutCell> {
        self.columns
            .iter()
            .find(|column| column.round == slot.round)
            .and_then(|column| column.cells.get(slot.index as usize))
    }
}

/// Build the layout grid for a bracket
///
/// `cell_unit_height_px` is the height given to one first-round match; the
/// column height is that times the number of first-round matches.
///
/// # Errors
///
/// Returns `Configuration` if `bracket_size` is not a power of two >= 2.
pub fn layout(
    matches: &MatchMap,
    bracket_size: u32,
    cell_unit_height_px: u32,
) -> BracketResult<BracketLayout> {
    validate_bracket_size(bracket_size)?;

    let rounds = round_count(bracket_size);
    let final_round = rounds - 1;

    let columns = (0..rounds)
        .map(|depth| {
            let round = final_round - depth;
            let cell_count = 1u32 << depth;
            let height_percent = 100.0 / f64::from(cell_count);
            let cells = (0..cell_count)
                .map(|index| {
                    let slot = Slot::new(round, index);
                    let match_ref = matches.get(&slot).cloned();
                    let mut tags = BTreeSet::new();
                    if match_ref.is_some() {
                        tags.insert(CellTag::BracketCellWithMatch);
                    } else {
                        tags.insert(CellTag::BracketCellWithoutMatch);
                    }
                    if round == final_round && match_ref.is_some() {
                        tags.insert(CellTag::BracketFinalsCell);
                    } else if index % 2 == 1 {
                        tags.insert(CellTag::LowerChildCell);
                    } else {
                        tags.insert(CellTag::UpperChildCell);
                    }
                    LayoutCell {
                        slot,
                        match_ref,
                        tags,
                        height_percent,
                    }
                })
                .collect();
            LayoutColumn { round, cells }
        })
        .collect();

    Ok(BracketLayout {
        columns,
        column_height_px: cell_unit_height_px.saturating_mul(bracket_size / 2),
    })
}

/// Registered entrants that do not sit in any match
///
/// These are offered to the operator for manual slot assignment.
pub fn unassigned_entrants(registrations: &[Entrant], matches: &MatchMap) -> Vec<Entrant> {
    let placed: HashSet<_> = matches
        .values()
        .flat_map(|m| [m.upper, m.lower])
        .flatten()
        .collect();

    registrations
        .iter()
        .filter(|e| !placed.contains(&e.id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BracketError;

    fn first_round_only() -> MatchMap {
        let mut matches = MatchMap::new();
        for (index, (upper, lower)) in [(1, None), (4, Some(5)), (2, None), (3, Some(6))]
            .into_iter()
            .enumerate()
        {
            let slot = Slot::new(0, index as u32);
            matches.insert(slot, Match::new(slot, Some(upper), lower));
        }
        matches
    }

    #[test]
    fn test_column_shape() {
        let grid = layout(&first_round_only(), 8, 64).unwrap();
        let sizes: Vec<usize> = grid.columns.iter().map(|c| c.cells.len()).collect();
        assert_eq!(sizes, vec![1, 2, 4]);
        let rounds: Vec<u32> = grid.columns.iter().map(|c| c.round).collect();
        assert_eq!(rounds, vec![2, 1, 0]);
        assert_eq!(grid.column_height_px, 256);
    }

    #[test]
    fn test_heights() {
        let grid = layout(&first_round_only(), 8, 64).unwrap();
        assert_eq!(grid.columns[0].cells[0].height_percent, 100.0);
        assert_eq!(grid.columns[1].cells[1].height_percent, 50.0);
        assert_eq!(grid.columns[2].cells[3].height_percent, 25.0);
    }

    #[test]
    fn test_placeholders_and_parity() {
        let grid = layout(&first_round_only(), 8, 64).unwrap();
        let semi = &grid.columns[1].cells[1];
        assert!(semi.is_placeholder());
        assert_eq!(
            semi.css_classes(),
            "bracket_cell_without_match lower_child_cell"
        );
        let first = &grid.columns[2].cells[2];
        assert!(!first.is_placeholder());
        assert_eq!(first.css_classes(), "bracket_cell_with_match upper_child_cell");
    }

    #[test]
    fn test_final_cell_tags() {
        let mut matches = MatchMap::new();
        let slot = Slot::new(1, 0);
        matches.insert(slot, Match::new(slot, Some(1), Some(2)));
        let grid = layout(&matches, 4, 64).unwrap();
        let tags = &grid.columns[0].cells[0].tags;
        assert_eq!(tags.len(), 2);
        assert!(tags.contains(&CellTag::BracketCellWithMatch));
        assert!(tags.contains(&CellTag::BracketFinalsCell));
    }

    #[test]
    fn test_missing_final_is_plain_placeholder() {
        let grid = layout(&first_round_only(), 8, 64).unwrap();
        assert_eq!(
            grid.columns[0].cells[0].css_classes(),
            "bracket_cell_without_match upper_child_cell"
        );
    }

    #[test]
    fn test_cell_lookup() {
        let grid = layout(&first_round_only(), 8, 64).unwrap();
        let cell = grid.cell(Slot::new(0, 1)).unwrap();
        assert_eq!(cell.match_ref.as_ref().unwrap().lower, Some(5));
        assert!(grid.cell(Slot::new(0, 4)).is_none());
    }

    #[test]
    fn test_json_uses_tag_names() {
        let grid = layout(&first_round_only(), 8, 64).unwrap();
        let json = grid.to_json().unwrap();
        assert!(json.contains("\"bracket_cell_with_match\""));
        assert!(json.contains("\"upper_child_cell\""));
    }

    #[test]
    fn test_invalid_size_rejected() {
        for size in [0, 1, 6] {
            assert!(matches!(
                layout(&MatchMap::new(), size, 64),
                Err(BracketError::Configuration(_))
            ));
        }
        assert!(BracketLayout::default().columns.is_empty());
    }

    #[test]
    fn test_unassigned_entrants() {
        let regs: Vec<Entrant> = (1..=7).map(|id| Entrant::new(id, 1, format!("T{}", id))).collect();
        let unassigned = unassigned_entrants(&regs, &first_round_only());
        let ids: Vec<i64> = unassigned.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![7]);
    }
}
