//! Static reference data: medicine dictionary, common-name alias table,
//! and the drug-interaction table.
//!
//! Loaded once at startup from JSON files and held immutable behind an
//! `Arc` for the lifetime of the process — request handling only reads.
//! The name-matching regex and lookup maps are prebuilt here so the
//! extractor and interaction checker stay pure functions over this data.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::interactions::normalize_medicine_name;
use crate::models::InteractionEntry;

pub const DICTIONARY_FILE: &str = "medicine_dictionary.json";
pub const ALIASES_FILE: &str = "common_names.json";
pub const INTERACTIONS_FILE: &str = "drug_interactions.json";

/// Common-name alias, e.g. "PCM" → "Paracetamol".
#[derive(Debug, Clone, Deserialize)]
pub struct AliasEntry {
    #[serde(rename = "commonName")]
    pub common_name: String,
    #[serde(rename = "dictionaryName")]
    pub dictionary_name: String,
}

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("Cannot read reference file {file}: {source}")]
    Io {
        file: String,
        source: std::io::Error,
    },
    #[error("Cannot parse reference file {file}: {source}")]
    Parse {
        file: String,
        source: serde_json::Error,
    },
    #[error("Invalid name pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Immutable lookup structures built once from the reference files.
#[derive(Debug)]
pub struct ReferenceData {
    dictionary: Vec<String>,
    interactions: Vec<InteractionEntry>,

    /// Alternation over dictionary ∪ alias common names, longest-first,
    /// case-insensitive, word-bounded. `None` when there are no names.
    name_pattern: Option<Regex>,
    /// Word-bounded matcher per dictionary name, for segment resolution.
    dictionary_matchers: Vec<(String, Regex)>,
    /// Word-bounded matcher per alias common name → canonical name.
    alias_matchers: Vec<(String, Regex)>,
    /// Lowercased common name → canonical dictionary name.
    alias_by_common: HashMap<String, String>,
    /// Unique canonical names (dictionary ∪ alias targets), original case.
    canonical_names: Vec<String>,
    /// Lowercased canonical name → lowercased search terms (the name
    /// itself plus its common-name aliases), for the fallback pass.
    search_terms: HashMap<String, Vec<String>>,
    /// Normalized symmetric pair → index into `interactions`.
    interaction_index: HashMap<(String, String), usize>,
}

impl ReferenceData {
    pub fn load(dir: &Path) -> Result<Self, ReferenceError> {
        let dictionary: Vec<String> = read_json(&dir.join(DICTIONARY_FILE))?;
        let aliases: Vec<AliasEntry> = read_json(&dir.join(ALIASES_FILE))?;
        let interactions: Vec<InteractionEntry> = read_json(&dir.join(INTERACTIONS_FILE))?;
        tracing::info!(
            dictionary = dictionary.len(),
            aliases = aliases.len(),
            interactions = interactions.len(),
            "Reference data loaded"
        );
        Self::from_parts(dictionary, aliases, interactions)
    }

    pub fn from_parts(
        dictionary: Vec<String>,
        aliases: Vec<AliasEntry>,
        interactions: Vec<InteractionEntry>,
    ) -> Result<Self, ReferenceError> {
        // Longest-first so a short name never shadows a longer superstring
        // inside the alternation.
        let mut all_names: Vec<&str> = dictionary
            .iter()
            .map(|s| s.as_str())
            .chain(aliases.iter().map(|a| a.common_name.as_str()))
            .filter(|s| !s.is_empty())
            .collect();
        all_names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        all_names.dedup();

        let name_pattern = if all_names.is_empty() {
            None
        } else {
            let alternation: Vec<String> =
                all_names.iter().map(|n| regex::escape(n)).collect();
            Some(Regex::new(&format!(r"(?i)\b(?:{})\b", alternation.join("|")))?)
        };

        let dictionary_matchers = dictionary
            .iter()
            .map(|name| word_matcher(name).map(|re| (name.clone(), re)))
            .collect::<Result<Vec<_>, _>>()?;
        let alias_matchers = aliases
            .iter()
            .map(|a| word_matcher(&a.common_name).map(|re| (a.dictionary_name.clone(), re)))
            .collect::<Result<Vec<_>, _>>()?;

        let alias_by_common: HashMap<String, String> = aliases
            .iter()
            .map(|a| (a.common_name.to_lowercase(), a.dictionary_name.clone()))
            .collect();

        let mut canonical_names: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for name in dictionary.iter().chain(aliases.iter().map(|a| &a.dictionary_name)) {
            if seen.insert(name.to_lowercase()) {
                canonical_names.push(name.clone());
            }
        }

        let mut search_terms: HashMap<String, Vec<String>> = HashMap::new();
        for name in &canonical_names {
            search_terms
                .entry(name.to_lowercase())
                .or_default()
                .push(name.to_lowercase());
        }
        for alias in &aliases {
            search_terms
                .entry(alias.dictionary_name.to_lowercase())
                .or_default()
                .push(alias.common_name.to_lowercase());
        }

        let mut interaction_index = HashMap::new();
        for (i, entry) in interactions.iter().enumerate() {
            interaction_index.insert(pair_key(&entry.med1, &entry.med2), i);
        }

        Ok(Self {
            dictionary,
            interactions,
            name_pattern,
            dictionary_matchers,
            alias_matchers,
            alias_by_common,
            canonical_names,
            search_terms,
            interaction_index,
        })
    }

    pub fn name_pattern(&self) -> Option<&Regex> {
        self.name_pattern.as_ref()
    }

    /// Map a matched name to its canonical form: alias → dictionary name,
    /// dictionary match → dictionary-case spelling.
    pub fn canonical_for_match(&self, matched: &str) -> String {
        let lower = matched.trim().to_lowercase();
        if let Some(canonical) = self.alias_by_common.get(&lower) {
            return canonical.clone();
        }
        self.dictionary
            .iter()
            .find(|d| d.to_lowercase() == lower)
            .cloned()
            .unwrap_or_else(|| matched.trim().to_string())
    }

    /// Resolve a medicine segment to a canonical name: exact dictionary
    /// match first, alias-table match second.
    pub fn resolve_segment(&self, segment: &str) -> Option<&str> {
        self.dictionary_matchers
            .iter()
            .chain(self.alias_matchers.iter())
            .find(|(_, re)| re.is_match(segment))
            .map(|(canonical, _)| canonical.as_str())
    }

    pub fn canonical_names(&self) -> &[String] {
        &self.canonical_names
    }

    /// Lowercased substrings that count as a mention of `canonical`
    /// (the name itself plus its aliases). Used by the fallback pass.
    pub fn search_terms_for(&self, canonical: &str) -> &[String] {
        self.search_terms
            .get(&canonical.to_lowercase())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Symmetric interaction lookup on normalized names.
    pub fn find_interaction(&self, med1: &str, med2: &str) -> Option<&InteractionEntry> {
        self.interaction_index
            .get(&pair_key(med1, med2))
            .map(|&i| &self.interactions[i])
    }

    pub fn interactions(&self) -> &[InteractionEntry] {
        &self.interactions
    }
}

fn word_matcher(name: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(name)))
}

/// Order-independent key for an interaction pair.
fn pair_key(a: &str, b: &str) -> (String, String) {
    let a = normalize_medicine_name(a);
    let b = normalize_medicine_name(b);
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ReferenceError> {
    let file = path.display().to_string();
    let raw = std::fs::read_to_string(path)
        .map_err(|source| ReferenceError::Io { file: file.clone(), source })?;
    serde_json::from_str(&raw).map_err(|source| ReferenceError::Parse { file, source })
}
