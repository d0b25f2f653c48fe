//! Severity types and verdicts
//!
//! A log is classified against an ordered list of severity types, most severe
//! first. Each type carries its own thresholds so that label, absolute limit
//! and variation limit can never drift out of alignment.

use crate::analysis::Variation;
use std::fmt;

/// One severity label together with the thresholds that apply to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityType {
    /// Label as it appears in the log (e.g. `ERROR`)
    pub label: String,
    /// Maximum number of occurrences before the type breaches, `None` when disabled
    pub max_absolute: Option<u64>,
    /// Maximum variation in percent before the type breaches, `None` when disabled
    pub max_variation_percent: Option<i64>,
}

impl SeverityType {
    /// Create a severity type without any threshold
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            max_absolute: None,
            max_variation_percent: None,
        }
    }

    /// Set the absolute threshold
    pub fn with_max_absolute(mut self, max: u64) -> Self {
        self.max_absolute = Some(max);
        self
    }

    /// Set the variation threshold, in percent
    pub fn with_max_variation(mut self, percent: i64) -> Self {
        self.max_variation_percent = Some(percent);
        self
    }
}

/// Ordered severity types, index 0 being the most severe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityTable {
    types: Vec<SeverityType>,
}

impl SeverityTable {
    pub fn new(types: Vec<SeverityType>) -> Self {
        Self { types }
    }

    /// Build a table from labels only, with every threshold disabled
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(labels.into_iter().map(SeverityType::new).collect())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SeverityType> {
        self.types.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SeverityType> {
        self.types.iter()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|t| t.label.as_str())
    }

    /// Index of the type with exactly this label
    pub fn position(&self, label: &str) -> Option<usize> {
        self.types.iter().position(|t| t.label == label)
    }
}

impl<'a> IntoIterator for &'a SeverityTable {
    type Item = &'a SeverityType;
    type IntoIter = std::slice::Iter<'a, SeverityType>;

    fn into_iter(self) -> Self::IntoIter {
        self.types.iter()
    }
}

/// Which criterion made a severity type breach
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreachReason {
    /// The occurrence count is above the absolute maximum
    Absolute { count: u64, max: u64 },
    /// The variation is above the maximum percentage
    Variation { variation: Variation, max_percent: i64 },
}

impl fmt::Display for BreachReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreachReason::Absolute { count, max } => {
                write!(f, "{} occurrences (max {})", count, max)
            }
            BreachReason::Variation {
                variation,
                max_percent,
            } => write!(f, "variation {} (max +{}%)", variation, max_percent),
        }
    }
}

/// Outcome of the threshold evaluation for one analysis pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// No severity type breached
    None,
    /// The most severe breached type
    Breached {
        index: usize,
        label: String,
        reason: BreachReason,
    },
}

impl Verdict {
    pub fn is_breached(&self) -> bool {
        matches!(self, Verdict::Breached { .. })
    }

    /// Label of the breached type, if any
    pub fn label(&self) -> Option<&str> {
        match self {
            Verdict::None => None,
            Verdict::Breached { label, .. } => Some(label),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::None => write!(f, "none"),
            Verdict::Breached { label, reason, .. } => write!(f, "{} ({})", label, reason),
        }
    }
}
