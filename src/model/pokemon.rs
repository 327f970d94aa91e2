use super::NamedResource;
use serde::{Deserialize, Serialize};

/// Raw sprite repository used when the catalog has no front sprite.
pub const SPRITE_FALLBACK_BASE: &str =
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon";

/// A single catalog entity. Immutable once fetched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pokemon {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub base_experience: Option<u32>,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub weight: u32,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub abilities: Vec<PokemonAbility>,
    #[serde(default)]
    pub cries: Option<PokemonCries>,
    #[serde(default)]
    pub forms: Vec<NamedResource>,
    #[serde(default)]
    pub species: NamedResource,
    #[serde(default)]
    pub sprites: PokemonSprites,
    #[serde(default)]
    pub stats: Vec<PokemonStat>,
    #[serde(default)]
    pub types: Vec<PokemonType>,
}

impl Pokemon {
    /// Front sprite, or the raw-sprite URL derived from the id.
    pub fn image_url(&self) -> String {
        self.sprites
            .front_default
            .clone()
            .unwrap_or_else(|| format!("{}/{}.png", SPRITE_FALLBACK_BASE, self.id))
    }

    /// Name of the first-slot type, `"normal"` when the entity lists none.
    pub fn primary_type(&self) -> &str {
        self.types
            .iter()
            .min_by_key(|t| t.slot)
            .map(|t| t.kind.name.as_str())
            .unwrap_or("normal")
    }

    /// Base value of a named stat (`"hp"`, `"attack"`, ...).
    pub fn base_stat(&self, name: &str) -> Option<u32> {
        self.stats
            .iter()
            .find(|s| s.stat.name == name)
            .map(|s| s.base_stat)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonAbility {
    pub ability: NamedResource,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub slot: u8,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonCries {
    #[serde(default)]
    pub latest: Option<String>,
    #[serde(default)]
    pub legacy: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonStat {
    pub base_stat: u32,
    #[serde(default)]
    pub effort: u32,
    pub stat: NamedResource,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonType {
    pub slot: u8,
    #[serde(rename = "type")]
    pub kind: NamedResource,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonSprites {
    #[serde(default)]
    pub front_default: Option<String>,
    #[serde(default)]
    pub front_shiny: Option<String>,
    #[serde(default)]
    pub back_default: Option<String>,
    #[serde(default)]
    pub back_shiny: Option<String>,
    #[serde(default)]
    pub other: SpriteVariants,
}

/// Artwork sets under `sprites.other`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteVariants {
    #[serde(default)]
    pub dream_world: Option<FrontSprites>,
    #[serde(default)]
    pub home: Option<FrontSprites>,
    #[serde(default, rename = "official-artwork")]
    pub official_artwork: Option<FrontSprites>,
}

/// Front-facing images of one artwork set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontSprites {
    #[serde(default)]
    pub front_default: Option<String>,
    #[serde(default)]
    pub front_shiny: Option<String>,
}

/// One window of the catalog listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonListResponse {
    pub count: u32,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<NamedResource>,
}

/// A list window annotated with its 1-based page number.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginatedPokemonResponse {
    pub count: u32,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<NamedResource>,
    pub page: u32,
    pub has_next_page: bool,
}

impl PaginatedPokemonResponse {
    pub fn from_list(list: PokemonListResponse, page: u32) -> Self {
        let has_next_page = list.next.is_some();
        PaginatedPokemonResponse {
            count: list.count,
            next: list.next,
            previous: list.previous,
            results: list.results,
            page,
            has_next_page,
        }
    }
}
