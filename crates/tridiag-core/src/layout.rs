//! Batch shape and memory layout.
//!
//! The layout decides which parallel access pattern is contiguous, so it is
//! carried by every batch and view rather than fixed by convention.

use serde::{Deserialize, Serialize};

/// Dimensions of a batch: `rows` independent systems of `levels` unknowns each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    /// Number of independent systems (N).
    pub rows: usize,
    /// Recurrence length of each system (K).
    pub levels: usize,
}

impl Shape {
    /// Create a new shape.
    pub const fn new(rows: usize, levels: usize) -> Self {
        Self { rows, levels }
    }

    /// Total number of elements in one `rows x levels` array.
    pub const fn len(&self) -> usize {
        self.rows * self.levels
    }

    /// True when either dimension is zero.
    pub const fn is_empty(&self) -> bool {
        self.rows == 0 || self.levels == 0
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.rows, self.levels)
    }
}

/// Storage order of a `rows x levels` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    /// Row index varies fastest: element `(i, k)` lives at `k * rows + i`.
    ///
    /// All rows of one level are contiguous, so a dispatch over rows at a
    /// fixed level reads and writes consecutive memory.
    #[default]
    RowFastest,
    /// Level index varies fastest: element `(i, k)` lives at `i * levels + k`.
    ///
    /// Each system is contiguous, which favors one worker walking a whole row.
    LevelFastest,
}

impl Layout {
    /// Flat offset of element `(row, level)`.
    #[inline(always)]
    pub fn index(self, shape: Shape, row: usize, level: usize) -> usize {
        match self {
            Layout::RowFastest => level * shape.rows + row,
            Layout::LevelFastest => row * shape.levels + level,
        }
    }

    /// Distance between consecutive levels of the same row.
    #[inline]
    pub fn level_stride(self, shape: Shape) -> usize {
        match self {
            Layout::RowFastest => shape.rows,
            Layout::LevelFastest => 1,
        }
    }

    /// Offset of level 0 of `row`.
    #[inline]
    pub fn row_offset(self, shape: Shape, row: usize) -> usize {
        self.index(shape, row, 0)
    }

    /// Parse from a string.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "row-fastest" | "row" | "left" | "column-major" => Some(Self::RowFastest),
            "level-fastest" | "level" | "right" | "row-major" => Some(Self::LevelFastest),
            _ => None,
        }
    }

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            Layout::RowFastest => "row-fastest",
            Layout::LevelFastest => "level-fastest",
        }
    }
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_row_fastest() {
        let shape = Shape::new(4, 3);
        assert_eq!(Layout::RowFastest.index(shape, 0, 0), 0);
        assert_eq!(Layout::RowFastest.index(shape, 1, 0), 1);
        assert_eq!(Layout::RowFastest.index(shape, 0, 1), 4);
        assert_eq!(Layout::RowFastest.index(shape, 3, 2), 11);
        assert_eq!(Layout::RowFastest.level_stride(shape), 4);
    }

    #[test]
    fn index_level_fastest() {
        let shape = Shape::new(4, 3);
        assert_eq!(Layout::LevelFastest.index(shape, 0, 1), 1);
        assert_eq!(Layout::LevelFastest.index(shape, 1, 0), 3);
        assert_eq!(Layout::LevelFastest.index(shape, 3, 2), 11);
        assert_eq!(Layout::LevelFastest.level_stride(shape), 1);
    }

    #[test]
    fn every_offset_is_hit_once() {
        let shape = Shape::new(5, 7);
        for layout in [Layout::RowFastest, Layout::LevelFastest] {
            let mut seen = vec![false; shape.len()];
            for i in 0..shape.rows {
                for k in 0..shape.levels {
                    let idx = layout.index(shape, i, k);
                    assert!(!seen[idx], "{layout}: offset {idx} hit twice");
                    seen[idx] = true;
                }
            }
            assert!(seen.iter().all(|&s| s));
        }
    }

    #[test]
    fn layout_from_name() {
        assert_eq!(Layout::from_name("row-fastest"), Some(Layout::RowFastest));
        assert_eq!(Layout::from_name("LEFT"), Some(Layout::RowFastest));
        assert_eq!(Layout::from_name("level"), Some(Layout::LevelFastest));
        assert_eq!(Layout::from_name("diagonal"), None);
    }

    #[test]
    fn shape_display() {
        assert_eq!(Shape::new(1024, 50).to_string(), "[1024, 50]");
        assert!(Shape::new(0, 50).is_empty());
    }
}
