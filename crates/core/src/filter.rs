// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Keyword filter deciding which fragment types are captured

use crate::payload::type_full_name;

/// Keywords marking a fragment type as progression-relevant
pub const PROGRESSION_KEYWORDS: &[&str] = &[
    "Research",
    "VBlood",
    "Achievement",
    "Unlock",
    "Tech",
    "Recipe",
    "Progress",
];

/// Case-insensitive substring match over type names
///
/// Matching looks at the type's full name (assembly part stripped), so new
/// types containing a keyword are picked up without changes here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordFilter {
    keywords: Vec<String>,
}

impl KeywordFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn progression() -> Self {
        Self::new(PROGRESSION_KEYWORDS)
    }

    pub fn matches(&self, qualified_type: &str) -> bool {
        let name = type_full_name(qualified_type).to_lowercase();
        if name.is_empty() {
            return false;
        }
        self.keywords.iter().any(|k| name.contains(k.as_str()))
    }
}

impl Default for KeywordFilter {
    fn default() -> Self {
        Self::progression()
    }
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
