//! Row and column label arrays stored alongside the loom matrix.

use crate::core::error::{LoomError, Result};
use rustc_hash::FxHashSet;

/// Attribute name used for feature (row) labels.
pub const DEFAULT_ROW_ATTR: &str = "rname";
/// Attribute name used for cell (column) labels.
pub const DEFAULT_COL_ATTR: &str = "cname";

/// Values of one label array.
#[derive(Debug, Clone, PartialEq)]
pub enum LabelValues {
    /// Synthesized positional identifiers `0..n`.
    Index(Vec<i64>),
    /// Identifiers carried by the input file.
    Names(Vec<String>),
}

impl LabelValues {
    pub fn len(&self) -> usize {
        match self {
            LabelValues::Index(values) => values.len(),
            LabelValues::Names(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named label array aligned to one matrix axis.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisLabels {
    name: String,
    values: LabelValues,
}

impl AxisLabels {
    /// Dense integer labels `0..len`.
    pub fn range(name: impl Into<String>, len: usize) -> Self {
        Self {
            name: name.into(),
            values: LabelValues::Index((0..len as i64).collect()),
        }
    }

    pub fn names(name: impl Into<String>, names: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values: LabelValues::Names(names),
        }
    }

    pub fn from_values(name: impl Into<String>, values: LabelValues) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Use `names` when present, positional integers otherwise.
    pub fn names_or_range(name: impl Into<String>, names: Option<Vec<String>>, len: usize) -> Self {
        match names {
            Some(names) => Self::names(name, names),
            None => Self::range(name, len),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &LabelValues {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fail unless there is exactly one label per entry on the matrix axis.
    pub fn ensure_len(&self, expected: usize, axis: &str) -> Result<()> {
        if self.len() != expected {
            return Err(LoomError::DimensionMismatch {
                expected: format!("{} {} labels for '{}'", expected, axis, self.name),
                actual: format!("{} labels", self.len()),
            });
        }
        Ok(())
    }

    /// Number of names that repeat an earlier name. Always zero for index labels.
    pub fn duplicate_count(&self) -> usize {
        match &self.values {
            LabelValues::Index(_) => 0,
            LabelValues::Names(names) => {
                let mut seen = FxHashSet::default();
                names.iter().filter(|name| !seen.insert(name.as_str())).count()
            }
        }
    }

    /// Up to `limit` leading labels rendered as strings.
    pub fn preview(&self, limit: usize) -> Vec<String> {
        match &self.values {
            LabelValues::Index(values) => values.iter().take(limit).map(|v| v.to_string()).collect(),
            LabelValues::Names(values) => values.iter().take(limit).cloned().collect(),
        }
    }
}
