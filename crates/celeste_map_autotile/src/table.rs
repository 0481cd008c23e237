//! Ruleset descriptions and the table built from them

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{Ignores, Mask, Rule, RuleSet, RulesetError};

/// One tileset record of a ruleset description file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TilesetDescription {
    pub id: String,
    /// Defaults to the game's own tileset name for `id`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atlas_path: Option<String>,
    /// `"*"` or comma-separated tile ids
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignores: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<RuleDescription>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDescription {
    pub mask: String,
    pub tiles: Vec<[u32; 2]>,
}

/// Tileset name the game uses for a foreground tile id
pub fn vanilla_tileset_name(id: char) -> Option<&'static str> {
    Some(match id {
        '1' => "dirt",
        '3' => "snow",
        '4' => "girder",
        '5' => "tower",
        '6' => "stone",
        '7' => "cement",
        '8' => "rock",
        '9' => "wood",
        'a' => "woodStoneEdges",
        'b' => "cliffside",
        'c' => "poolEdges",
        'd' => "templeA",
        'e' => "templeB",
        'f' => "cliffsideAlt",
        'g' => "reflection",
        'G' => "reflectionAlt",
        'h' => "grass",
        'i' => "summit",
        'j' => "summitNoSnow",
        'k' => "core",
        'l' => "deadgrass",
        'm' => "lostlevels",
        'n' => "scifi",
        'z' => "template",
        _ => return None,
    })
}

/// Rulesets keyed by tile-id character
#[derive(Debug, Clone, Default)]
pub struct RuleSetTable {
    sets: HashMap<char, RuleSet>,
}

impl RuleSetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table from records in declaration order.
    ///
    /// A record with `copy` shares the rule list of an earlier record and
    /// keeps its own atlas path and ignores.
    pub fn from_descriptions(descriptions: &[TilesetDescription]) -> Result<Self, RulesetError> {
        let mut table = Self::new();

        for description in descriptions {
            let id = single_char(&description.id)
                .ok_or_else(|| RulesetError::InvalidId(description.id.clone()))?;
            if table.sets.contains_key(&id) {
                return Err(RulesetError::DuplicateId(id));
            }

            let rules = match (&description.copy, &description.rules) {
                (Some(_), Some(_)) => return Err(RulesetError::CopyWithRules(id)),
                (Some(copy), None) => {
                    let source = single_char(copy)
                        .and_then(|c| table.sets.get(&c))
                        .ok_or_else(|| RulesetError::UnknownCopy {
                            id,
                            copy: copy.clone(),
                        })?;
                    Arc::clone(&source.rules)
                }
                (None, Some(rules)) => parse_rules(id, rules)?.into(),
                (None, None) => Arc::from(Vec::new()),
            };

            let atlas_path = description
                .atlas_path
                .clone()
                .or_else(|| vanilla_tileset_name(id).map(str::to_string))
                .unwrap_or_else(|| id.to_string());

            let ignores = match &description.ignores {
                Some(list) => parse_ignores(id, list)?,
                None => Ignores::Nothing,
            };

            table.sets.insert(
                id,
                RuleSet {
                    id,
                    atlas_path,
                    ignores,
                    rules,
                },
            );
        }

        tracing::debug!(rulesets = table.sets.len(), "built ruleset table");
        Ok(table)
    }

    pub fn insert(&mut self, set: RuleSet) -> Option<RuleSet> {
        self.sets.insert(set.id, set)
    }

    pub fn get(&self, id: char) -> Option<&RuleSet> {
        self.sets.get(&id)
    }

    /// The ruleset for `id`, else the one for `fallback`
    pub fn get_or_fallback(&self, id: char, fallback: Option<char>) -> Option<&RuleSet> {
        self.get(id).or_else(|| fallback.and_then(|f| self.get(f)))
    }

    pub fn contains(&self, id: char) -> bool {
        self.sets.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RuleSet> {
        self.sets.values()
    }
}

/// Parse a JSON ruleset description
pub fn parse_rulesets(json: &str) -> Result<RuleSetTable, RulesetError> {
    let descriptions: Vec<TilesetDescription> = serde_json::from_str(json)?;
    RuleSetTable::from_descriptions(&descriptions)
}

pub fn load_rulesets_from_bytes(bytes: &[u8]) -> Result<RuleSetTable, RulesetError> {
    let descriptions: Vec<TilesetDescription> = serde_json::from_slice(bytes)?;
    RuleSetTable::from_descriptions(&descriptions)
}

pub fn load_rulesets(path: impl AsRef<Path>) -> Result<RuleSetTable, RulesetError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| RulesetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_rulesets_from_bytes(&bytes)
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn parse_ignores(id: char, list: &str) -> Result<Ignores, RulesetError> {
    let list = list.trim();
    if list == "*" {
        return Ok(Ignores::All);
    }
    if list.is_empty() {
        return Ok(Ignores::Nothing);
    }

    let mut set = HashSet::new();
    for entry in list.split(',') {
        let c = single_char(entry.trim()).ok_or_else(|| RulesetError::InvalidIgnore {
            id,
            entry: entry.to_string(),
        })?;
        set.insert(c);
    }
    Ok(Ignores::Set(set))
}

fn parse_rules(id: char, rules: &[RuleDescription]) -> Result<Vec<Rule>, RulesetError> {
    rules
        .iter()
        .map(|rule| {
            let mask = rule.mask.parse::<Mask>().map_err(|reason| RulesetError::InvalidMask {
                id,
                mask: rule.mask.clone(),
                reason,
            })?;
            if rule.tiles.is_empty() {
                return Err(RulesetError::EmptyRule {
                    id,
                    mask: rule.mask.clone(),
                });
            }
            Ok(Rule::new(mask, rule.tiles.iter().map(|&[x, y]| (x, y)).collect()))
        })
        .collect()
}
