//! Typed catalog entities and the local favourite record.
//!
//! Catalog types mirror the remote JSON closely enough to deserialize it
//! directly; unknown fields are ignored. They are also stored in the
//! response cache through [`crate::serialization`], so they avoid serde
//! features postcard cannot express.

mod evolution;
mod favourite;
mod pokemon;
mod species;

pub use evolution::{ChainLink, EvolutionChain, EvolutionDetail};
pub use favourite::{FavouritePokemon, NewFavourite};
pub use pokemon::{
    FrontSprites, PaginatedPokemonResponse, Pokemon, PokemonAbility, PokemonCries,
    PokemonListResponse, PokemonSprites, PokemonStat, PokemonType, SpriteVariants,
    SPRITE_FALLBACK_BASE,
};
pub use species::{ApiResource, FlavorText, Genus, LocalizedName, PokemonSpecies, Variety};

use serde::{Deserialize, Serialize};

/// `{ name, url }` reference to another catalog resource.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResource {
    pub name: String,
    pub url: String,
}

impl NamedResource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        NamedResource {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Numeric id at the end of the resource URL.
    pub fn id(&self) -> Option<u32> {
        id_from_url(&self.url)
    }
}

/// `https://pokeapi.co/api/v2/pokemon-species/25/` → `Some(25)`.
pub fn id_from_url(url: &str) -> Option<u32> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse().ok())
}
