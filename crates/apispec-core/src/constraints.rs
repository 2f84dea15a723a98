//! Semantic queries over a descriptor's validation constraints.
//!
//! Constraints arrive as a flat list of `{name, configuration}` records. The
//! schema builders only care about a handful of questions (is the value
//! required, how long may it be, which bounds apply), answered here.
//! Absent information is `None`, never a sentinel.

// Internal imports (std, crate)
use std::str::FromStr;

use crate::model::{Constraint, ConstraintKind};

// External imports (alphabetized)
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;

/// Read-only view over a slice of constraints.
#[derive(Debug, Clone, Copy)]
pub struct Constraints<'a> {
    constraints: &'a [Constraint],
}

impl<'a> Constraints<'a> {
    pub fn new(constraints: &'a [Constraint]) -> Self {
        Self { constraints }
    }

    /// True if any of NotNull, NotEmpty or NotBlank is present.
    pub fn is_required(&self) -> bool {
        self.constraints.iter().any(|c| {
            matches!(
                c.name,
                ConstraintKind::NotNull | ConstraintKind::NotEmpty | ConstraintKind::NotBlank
            )
        })
    }

    /// Largest lower size bound. NotEmpty and NotBlank imply 1.
    pub fn min_size(&self) -> Option<u64> {
        self.constraints
            .iter()
            .filter_map(|c| match c.name {
                ConstraintKind::NotEmpty | ConstraintKind::NotBlank => Some(1),
                ConstraintKind::Size | ConstraintKind::Length => config_u64(c, "min"),
                _ => None,
            })
            .max()
    }

    /// Smallest upper size bound.
    pub fn max_size(&self) -> Option<u64> {
        self.constraints
            .iter()
            .filter_map(|c| match c.name {
                ConstraintKind::Size | ConstraintKind::Length => config_u64(c, "max"),
                _ => None,
            })
            .min()
    }

    /// Tightest numeric lower bound from Min/DecimalMin.
    pub fn min_number(&self) -> Option<Decimal> {
        self.constraints
            .iter()
            .filter_map(|c| match c.name {
                ConstraintKind::Min | ConstraintKind::DecimalMin => config_decimal(c, "value"),
                _ => None,
            })
            .max()
    }

    /// Tightest numeric upper bound from Max/DecimalMax.
    pub fn max_number(&self) -> Option<Decimal> {
        self.constraints
            .iter()
            .filter_map(|c| match c.name {
                ConstraintKind::Max | ConstraintKind::DecimalMax => config_decimal(c, "value"),
                _ => None,
            })
            .min()
    }

    /// Regular expression of the first Pattern constraint.
    pub fn pattern(&self) -> Option<&'a str> {
        self.constraints
            .iter()
            .filter(|c| c.name == ConstraintKind::Pattern)
            .find_map(|c| {
                c.configuration
                    .get("pattern")
                    .or_else(|| c.configuration.get("regexp"))
                    .and_then(JsonValue::as_str)
            })
    }
}

// Decimal bounds are often serialized as strings.
fn config_decimal(constraint: &Constraint, key: &str) -> Option<Decimal> {
    match constraint.configuration.get(key)? {
        JsonValue::Number(n) => parse_decimal(&n.to_string()),
        JsonValue::String(s) => parse_decimal(s.trim()),
        _ => None,
    }
}

/// Exact decimal from plain (`12.5`) or scientific (`1.25e1`) notation.
pub(crate) fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

fn config_u64(constraint: &Constraint, key: &str) -> Option<u64> {
    match constraint.configuration.get(key)? {
        JsonValue::Number(n) => n.as_u64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
