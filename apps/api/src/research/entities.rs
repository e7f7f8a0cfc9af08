//! Entity extraction: mines role, location, industry, company size and
//! seniority from accumulated insight text.
//!
//! Each entity type owns an ordered pattern list. Patterns are tried in order
//! against the insight text, one insight per line, and the first match wins. A pattern
//! with a capture group yields group 1, otherwise the whole match.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::insights::Insight;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Role,
    Location,
    Industry,
    CompanySize,
    Seniority,
}

impl EntityType {
    pub fn key(&self) -> &'static str {
        match self {
            EntityType::Role => "role",
            EntityType::Location => "location",
            EntityType::Industry => "industry",
            EntityType::CompanySize => "company_size",
            EntityType::Seniority => "seniority",
        }
    }

    pub fn all() -> [EntityType; 5] {
        [
            EntityType::Role,
            EntityType::Location,
            EntityType::Industry,
            EntityType::CompanySize,
            EntityType::Seniority,
        ]
    }

    pub fn from_key(key: &str) -> Option<EntityType> {
        EntityType::all().into_iter().find(|entity| entity.key() == key)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// At most one value per entity type; absent types are simply missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedEntities(BTreeMap<EntityType, String>);

impl ExtractedEntities {
    pub fn get(&self, entity: EntityType) -> Option<&str> {
        self.0.get(&entity).map(String::as_str)
    }

    pub fn get_key(&self, key: &str) -> Option<&str> {
        EntityType::from_key(key).and_then(|entity| self.get(entity))
    }

    pub fn contains(&self, entity: EntityType) -> bool {
        self.0.contains_key(&entity)
    }

    pub fn insert(&mut self, entity: EntityType, value: impl Into<String>) {
        self.0.insert(entity, value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Terminates a free-text capture at the end of its insight or at punctuation.
const END_OF_VALUE: &str = r"(?:\n|[,.;]|$)";

const CITIES: &str = "stockholm|göteborg|malmö|uppsala|linköping|örebro|västerås|umeå|lund|helsingborg|jönköping";

fn pattern_table() -> Vec<(EntityType, Vec<String>)> {
    vec![
        (
            EntityType::Role,
            vec![
                format!(r"(?i)\b(?:roll|tjänst|position|role)\s*:\s*(.+?){END_OF_VALUE}"),
                r"(?i)\b((?:senior|junior|medior|lead)?\s*(?:backend|frontend|fullstack|full-stack|devops|data|mobil|mobile|ml)[\s-]*(?:developer|utvecklare|engineer|ingenjör|scientist))".to_string(),
                r"(?i)\b(utvecklare|developer|engineer|designer|projektledare|produktägare|säljare|ekonom)\b".to_string(),
            ],
        ),
        (
            EntityType::Location,
            vec![
                r"(?i)\b(?:plats|ort|kontor|stad|location)\s*:\s*([\p{L}-]+)".to_string(),
                format!(r"(?i)\b({CITIES})\b"),
                r"(?i)\b(remote|distans)\b".to_string(),
            ],
        ),
        (
            EntityType::Industry,
            vec![
                format!(r"(?i)\b(?:bransch|industri|industry)\s*:\s*(.+?){END_OF_VALUE}"),
                r"(?i)\b(saas|fintech|e-handel|e-commerce|medtech|healthtech|edtech|gaming|telekom|bank|försäkring|detaljhandel|logistik|tillverkning)\b".to_string(),
            ],
        ),
        (
            EntityType::CompanySize,
            vec![
                r"(?i)\b\d+\s*(?:personer|anställda|medarbetare|employees|people)\b".to_string(),
                r"(?i)\b(?:storlek|size)\s*:\s*\D{0,20}\d+".to_string(),
            ],
        ),
        (
            EntityType::Seniority,
            vec![r"(?i)\b(junior|medior|senior|lead|principal|staff)\b".to_string()],
        ),
    ]
}

static ENTITY_PATTERNS: LazyLock<Vec<(EntityType, Vec<Regex>)>> = LazyLock::new(|| {
    pattern_table()
        .into_iter()
        .map(|(entity, patterns)| {
            let compiled = patterns
                .iter()
                // Static literal patterns; covered by the tests below.
                .map(|p| Regex::new(p).expect("entity pattern must compile"))
                .collect();
            (entity, compiled)
        })
        .collect()
});

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("number pattern must compile"));

fn first_match(patterns: &[Regex], text: &str) -> Option<String> {
    patterns.iter().find_map(|re| {
        re.captures(text).map(|caps| {
            caps.get(1)
                .or_else(|| caps.get(0))
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default()
        })
    })
}

pub fn extract_entities(insights: &[Insight]) -> ExtractedEntities {
    let text = insights
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("\n");

    let mut entities = ExtractedEntities::default();
    for (entity, patterns) in ENTITY_PATTERNS.iter() {
        let Some(value) = first_match(patterns, &text) else {
            continue;
        };
        let value = match entity {
            EntityType::CompanySize => match NUMBER_RE.find(&value) {
                Some(number) => number.as_str().to_string(),
                None => continue,
            },
            _ => value,
        };
        if !value.is_empty() {
            entities.insert(*entity, value);
        }
    }
    entities
}
