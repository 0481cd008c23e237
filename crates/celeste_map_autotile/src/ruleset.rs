//! Rulesets: ordered neighborhood rules for one tile material

use std::collections::HashSet;
use std::sync::Arc;

use celeste_map_core::{is_solid_id, Adjacents, Tile};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::Mask;

/// Atlas cell, in tiles
pub type AtlasCoord = (u32, u32);

/// Foreign materials that blend into this one when matching
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Ignores {
    #[default]
    Nothing,
    /// `"*"`: every other material
    All,
    Set(HashSet<char>),
}

impl Ignores {
    pub fn contains(&self, c: char) -> bool {
        match self {
            Ignores::Nothing => false,
            Ignores::All => true,
            Ignores::Set(set) => set.contains(&c),
        }
    }
}

/// A mask and the atlas cells it can pick from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(with = "mask_string")]
    pub mask: Mask,
    pub tiles: Vec<AtlasCoord>,
}

impl Rule {
    pub fn new(mask: Mask, tiles: Vec<AtlasCoord>) -> Self {
        Self { mask, tiles }
    }
}

mod mask_string {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use crate::Mask;

    pub fn serialize<S: Serializer>(mask: &Mask, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(mask)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Mask, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// Rules for one tile-id character.
///
/// `rules` is shared between a ruleset and every ruleset that copies it.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub id: char,
    pub atlas_path: String,
    pub ignores: Ignores,
    pub rules: Arc<[Rule]>,
}

impl RuleSet {
    pub fn new(id: char, atlas_path: impl Into<String>, rules: Vec<Rule>) -> Self {
        Self {
            id,
            atlas_path: atlas_path.into(),
            ignores: Ignores::Nothing,
            rules: rules.into(),
        }
    }

    pub fn with_ignores(mut self, ignores: Ignores) -> Self {
        self.ignores = ignores;
        self
    }

    /// Whether `neighbor` is treated as solid around a tile of material
    /// `own`. The tile's own material is never ignored, even when this
    /// ruleset stands in for it as a fallback.
    pub fn counts_as_solid(&self, own: u32, neighbor: u32) -> bool {
        if !is_solid_id(neighbor) {
            return false;
        }
        if neighbor == own {
            return true;
        }
        match char::from_u32(neighbor) {
            Some(c) => !self.ignores.contains(c),
            None => true,
        }
    }

    /// Fully solid block whose distance-2 cardinal ring is also solid
    pub fn is_surrounded(&self, adjacents: &Adjacents) -> bool {
        let own = adjacents.center();
        match adjacents.outer() {
            Some(outer) => outer.iter().all(|&id| self.counts_as_solid(own, id)),
            None => false,
        }
    }

    pub fn mask_matches(&self, mask: &Mask, adjacents: &Adjacents) -> bool {
        let own = adjacents.center();
        let block = mask
            .cells()
            .iter()
            .zip(adjacents.ids())
            .all(|(cell, &id)| cell.accepts(self.counts_as_solid(own, id)));

        match mask {
            Mask::Pattern(_) => block,
            Mask::Center => block && self.is_surrounded(adjacents),
            Mask::Padding => block && !self.is_surrounded(adjacents),
        }
    }

    /// First rule whose mask matches, in declaration order
    pub fn matching_rule(&self, adjacents: &Adjacents) -> Option<&Rule> {
        self.rules.iter().find(|rule| self.mask_matches(&rule.mask, adjacents))
    }

    /// Pick an atlas cell for `tile` from the first matching rule.
    ///
    /// Returns `None` when the tile has no recorded neighborhood or no rule
    /// matches it.
    pub fn match_tile(&self, tile: &Tile, rng: &mut impl Rng) -> Option<AtlasCoord> {
        let adjacents = tile.adjacents()?;
        let rule = self.matching_rule(adjacents)?;
        rule.tiles.choose(rng).copied()
    }
}
