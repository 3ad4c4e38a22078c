use crate::error::ImportError;
use crate::models::{EntityKind, EntityRecord};
use once_cell::sync::Lazy;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// Wikimedia-internal classes: disambiguation pages, templates, categories,
/// list articles, project pages and the like.
const META_ITEMS: &[&str] = &[
    "Q163875", "Q191780", "Q224414", "Q4167836", "Q4167410", "Q4663903", "Q11266439",
    "Q13406463", "Q15407973", "Q18616576", "Q19887878", "Q22808320", "Q23894233",
    "Q33120876", "Q42104522", "Q47460393", "Q64875536", "Q66480449",
];

const PUNCTUATION_ITEMS: &[&str] = &["Q1383557", "Q10617810"];

const LETTER_ITEMS: &[&str] = &[
    "Q188725", "Q19776628", "Q3841820", "Q17907810", "Q9788", "Q9398093",
];

/// Relations the meta preset checks: instance of, subclass of.
const META_RELATIONS: &[&str] = &["P31", "P279"];

static META_EXCLUSIONS: Lazy<FxHashSet<String>> = Lazy::new(|| {
    META_ITEMS
        .iter()
        .chain(PUNCTUATION_ITEMS)
        .chain(LETTER_ITEMS)
        .map(|s| s.to_string())
        .collect()
});

/// Drop a record whose claims under `relation` point at any of `targets`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRule {
    pub relation: String,
    pub targets: FxHashSet<String>,
}

impl FilterRule {
    pub fn new<I, S>(relation: &str, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            relation: relation.to_string(),
            targets: targets.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, record: &EntityRecord) -> bool {
        record
            .claim_targets(&self.relation)
            .any(|target| self.targets.contains(target))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict<'a> {
    Keep,
    WrongKind,
    Excluded { relation: &'a str },
}

/// Keeps items and properties, minus anything a configured rule excludes.
/// With no rules this is a pure kind check.
#[derive(Debug, Clone, Default)]
pub struct EntityFilter {
    rules: Vec<FilterRule>,
}

impl EntityFilter {
    pub fn new(rules: Vec<FilterRule>) -> Self {
        Self { rules }
    }

    /// Instance-of / subclass-of exclusion of Wikimedia meta, punctuation
    /// and letter classes.
    pub fn meta_exclusions() -> Vec<FilterRule> {
        META_RELATIONS
            .iter()
            .map(|relation| FilterRule {
                relation: relation.to_string(),
                targets: META_EXCLUSIONS.clone(),
            })
            .collect()
    }

    /// Loads rules from a JSON object mapping relation ids to target id lists,
    /// e.g. `{"P31": ["Q4167836", "Q4167410"]}`.
    pub fn load_rules(path: &Path) -> Result<Vec<FilterRule>, ImportError> {
        let invalid = |reason: String| ImportError::FilterRules {
            path: path.to_path_buf(),
            reason,
        };

        let file = File::open(path).map_err(|e| invalid(e.to_string()))?;
        let raw: FxHashMap<String, Vec<String>> =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| invalid(e.to_string()))?;

        let mut rules: Vec<FilterRule> = raw
            .into_iter()
            .map(|(relation, targets)| FilterRule::new(&relation, targets))
            .collect();
        // Map order is arbitrary; keep verdicts reproducible
        rules.sort_by(|a, b| a.relation.cmp(&b.relation));

        info!(path = %path.display(), rules = rules.len(), "Loaded filter rules");
        Ok(rules)
    }

    pub fn with_rules(mut self, rules: impl IntoIterator<Item = FilterRule>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn rules(&self) -> &[FilterRule] {
        &self.rules
    }

    pub fn verdict(&self, record: &EntityRecord) -> Verdict<'_> {
        if !matches!(record.kind, EntityKind::Item | EntityKind::Property) {
            return Verdict::WrongKind;
        }
        match self.rules.iter().find(|rule| rule.matches(record)) {
            Some(rule) => Verdict::Excluded {
                relation: &rule.relation,
            },
            None => Verdict::Keep,
        }
    }

    pub fn keeps(&self, record: &EntityRecord) -> bool {
        self.verdict(record) == Verdict::Keep
    }
}
