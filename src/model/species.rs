use super::{id_from_url, NamedResource};
use serde::{Deserialize, Serialize};

/// Taxonomy record for a catalog entity, including its evolution-chain link.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PokemonSpecies {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub gender_rate: i32,
    #[serde(default)]
    pub capture_rate: u32,
    #[serde(default)]
    pub base_happiness: Option<u32>,
    #[serde(default)]
    pub is_baby: bool,
    #[serde(default)]
    pub is_legendary: bool,
    #[serde(default)]
    pub is_mythical: bool,
    #[serde(default)]
    pub hatch_counter: Option<u32>,
    #[serde(default)]
    pub has_gender_differences: bool,
    #[serde(default)]
    pub forms_switchable: bool,
    #[serde(default)]
    pub growth_rate: Option<NamedResource>,
    #[serde(default)]
    pub egg_groups: Vec<NamedResource>,
    #[serde(default)]
    pub color: Option<NamedResource>,
    #[serde(default)]
    pub shape: Option<NamedResource>,
    #[serde(default)]
    pub evolves_from_species: Option<NamedResource>,
    #[serde(default)]
    pub evolution_chain: Option<ApiResource>,
    #[serde(default)]
    pub habitat: Option<NamedResource>,
    #[serde(default)]
    pub generation: Option<NamedResource>,
    #[serde(default)]
    pub names: Vec<LocalizedName>,
    #[serde(default)]
    pub flavor_text_entries: Vec<FlavorText>,
    #[serde(default)]
    pub genera: Vec<Genus>,
    #[serde(default)]
    pub varieties: Vec<Variety>,
}

impl PokemonSpecies {
    /// Id of the evolution chain this species belongs to.
    pub fn evolution_chain_id(&self) -> Option<u32> {
        self.evolution_chain
            .as_ref()
            .and_then(|chain| id_from_url(&chain.url))
    }

    /// First flavor text in `language`, with the catalog's hard line breaks
    /// and form feeds flattened to spaces.
    pub fn flavor_text(&self, language: &str) -> Option<String> {
        self.flavor_text_entries
            .iter()
            .find(|entry| entry.language.name == language)
            .map(|entry| {
                entry
                    .flavor_text
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
    }

    /// Genus label in `language`, e.g. `"Mouse Pokémon"`.
    pub fn genus(&self, language: &str) -> Option<&str> {
        self.genera
            .iter()
            .find(|g| g.language.name == language)
            .map(|g| g.genus.as_str())
    }
}

/// Reference carrying only a URL.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResource {
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedName {
    pub name: String,
    pub language: NamedResource,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorText {
    pub flavor_text: String,
    pub language: NamedResource,
    #[serde(default)]
    pub version: Option<NamedResource>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genus {
    pub genus: String,
    pub language: NamedResource,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variety {
    pub is_default: bool,
    pub pokemon: NamedResource,
}
