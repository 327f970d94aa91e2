use super::NamedResource;
use crate::evolution::{self, EvolutionStage};
use serde::{Deserialize, Serialize};

/// Evolution tree rooted at the chain's base species.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvolutionChain {
    pub id: u32,
    #[serde(default)]
    pub baby_trigger_item: Option<NamedResource>,
    pub chain: ChainLink,
}

impl EvolutionChain {
    /// Flatten the tree into display order; see [`evolution::stages`].
    pub fn stages(&self) -> Vec<EvolutionStage> {
        evolution::stages(self)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainLink {
    #[serde(default)]
    pub is_baby: bool,
    pub species: NamedResource,
    /// How this link is reached from its parent; `null` or empty at the root.
    #[serde(default)]
    pub evolution_details: Option<Vec<EvolutionDetail>>,
    #[serde(default)]
    pub evolves_to: Vec<ChainLink>,
}

impl ChainLink {
    pub fn details(&self) -> &[EvolutionDetail] {
        self.evolution_details.as_deref().unwrap_or(&[])
    }
}

/// One trigger condition. Every field may be absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionDetail {
    #[serde(default)]
    pub trigger: Option<NamedResource>,
    #[serde(default)]
    pub item: Option<NamedResource>,
    #[serde(default)]
    pub held_item: Option<NamedResource>,
    #[serde(default)]
    pub gender: Option<i32>,
    #[serde(default)]
    pub known_move: Option<NamedResource>,
    #[serde(default)]
    pub known_move_type: Option<NamedResource>,
    #[serde(default)]
    pub location: Option<NamedResource>,
    #[serde(default)]
    pub min_level: Option<u32>,
    #[serde(default)]
    pub min_happiness: Option<u32>,
    #[serde(default)]
    pub min_beauty: Option<u32>,
    #[serde(default)]
    pub min_affection: Option<u32>,
    #[serde(default)]
    pub needs_overworld_rain: bool,
    #[serde(default)]
    pub party_species: Option<NamedResource>,
    #[serde(default)]
    pub party_type: Option<NamedResource>,
    #[serde(default)]
    pub relative_physical_stats: Option<i32>,
    #[serde(default)]
    pub time_of_day: String,
    #[serde(default)]
    pub trade_species: Option<NamedResource>,
    #[serde(default)]
    pub turn_upside_down: bool,
}
