//! Name-based taxonomy rules
//!
//! Which optional product attributes a category or subcategory requires is
//! derived from its name, not from a stored flag. The token lists below
//! are the single source of these classifications.

use serde::{Deserialize, Serialize};

/// An optional attribute a taxonomy name can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeRequirement {
    Flavor,
    Nicotine,
}

/// A token set that activates one attribute requirement.
#[derive(Debug, Clone, Copy)]
pub struct RequirementRule {
    pub requirement: AttributeRequirement,
    /// Matched case-insensitively as substrings of the taxonomy name.
    pub tokens: &'static [&'static str],
}

/// Category names containing any of these tokens expose a flavor field.
const FLAVOR_TOKENS: &[&str] = &[
    "vape",
    "disposable",
    "pod",
    "eliquid",
    "ejuice",
    "e-juice",
    "juice",
];

/// Subcategory names containing any of these tokens expose a nicotine field.
const NICOTINE_TOKENS: &[&str] = &["eliquid", "ejuice", "e-juice", "pod", "pods"];

/// The full rule table, one entry per requirement.
pub const REQUIREMENT_RULES: &[RequirementRule] = &[
    RequirementRule {
        requirement: AttributeRequirement::Flavor,
        tokens: FLAVOR_TOKENS,
    },
    RequirementRule {
        requirement: AttributeRequirement::Nicotine,
        tokens: NICOTINE_TOKENS,
    },
];

fn name_matches(name: &str, tokens: &[&str]) -> bool {
    let lowered = name.to_lowercase();
    tokens.iter().any(|token| lowered.contains(token))
}

fn requirement_matches(requirement: AttributeRequirement, name: &str) -> bool {
    REQUIREMENT_RULES
        .iter()
        .any(|r| r.requirement == requirement && name_matches(name, r.tokens))
}

/// Whether products in this category carry a flavor attribute.
pub fn requires_flavor(category_name: &str) -> bool {
    requirement_matches(AttributeRequirement::Flavor, category_name)
}

/// Whether products in this subcategory carry a nicotine strength.
pub fn requires_nicotine(subcategory_name: &str) -> bool {
    requirement_matches(AttributeRequirement::Nicotine, subcategory_name)
}
