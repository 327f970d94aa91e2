//! Request signatures used as response-cache keys.
//!
//! A key is the logical request (operation + parameters), not the URL, so
//! two operations that happen to hit the same endpoint keep separate entries.

use std::fmt;

/// Logical catalog request, one variant per client operation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RequestKey {
    List { offset: u32, limit: u32 },
    Page { page: u32, limit: u32 },
    PokemonById(u32),
    PokemonByName(String),
    Species(u32),
    EvolutionChain(u32),
}

impl RequestKey {
    /// Namespace of the key, e.g. `"pokemon"` or `"species"`.
    pub fn prefix(&self) -> &'static str {
        match self {
            RequestKey::List { .. } => "list",
            RequestKey::Page { .. } => "pokemon-page",
            RequestKey::PokemonById(_) => "pokemon",
            RequestKey::PokemonByName(_) => "pokemon-name",
            RequestKey::Species(_) => "species",
            RequestKey::EvolutionChain(_) => "evolution",
        }
    }

    /// Build the full backend key: `"{prefix}:{param}[:{param}]"`.
    pub fn build(&self) -> String {
        self.to_string()
    }

    /// Split a built key back into its parts.
    pub fn parse(key: &str) -> Vec<&str> {
        key.split(':').collect()
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = self.prefix();
        match self {
            RequestKey::List { offset, limit } => write!(f, "{}:{}:{}", prefix, offset, limit),
            RequestKey::Page { page, limit } => write!(f, "{}:{}:{}", prefix, page, limit),
            RequestKey::PokemonById(id)
            | RequestKey::Species(id)
            | RequestKey::EvolutionChain(id) => write!(f, "{}:{}", prefix, id),
            RequestKey::PokemonByName(name) => write!(f, "{}:{}", prefix, name),
        }
    }
}
