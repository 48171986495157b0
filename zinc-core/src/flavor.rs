//! Flavor predicates: tagged matchers over a manifest file path, persisted
//! in their source form so a manifest remains self-describing.

use std::collections::BTreeSet;

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A predicate over a relative file path, serialized as its source form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Matcher {
    Glob(String),
    Regex(String),
    LiteralSet(BTreeSet<String>),
}

impl Matcher {
    pub fn matches(&self, path: &str) -> Result<bool> {
        Ok(match self {
            Matcher::Glob(pattern) => Pattern::new(pattern)?.matches(path),
            Matcher::Regex(pattern) => Regex::new(pattern)?.is_match(path),
            Matcher::LiteralSet(set) => set.contains(path),
        })
    }
}

/// A named flavor: a label plus the predicate that selects files for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlavorSpec {
    pub name: String,
    pub matcher: Matcher,
}

/// Evaluate every flavor spec against `path`, returning the matching
/// flavor names in the order the specs were given.
pub fn assign_flavors(specs: &[FlavorSpec], path: &str) -> Result<Vec<String>> {
    let mut assigned = Vec::new();
    for spec in specs {
        if spec.matcher.matches(path)? {
            assigned.push(spec.name.clone());
        }
    }
    Ok(assigned)
}
