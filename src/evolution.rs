//! Evolution-chain traversal.
//!
//! Turns the recursive `chain` / `evolves_to` tree into the flat list an
//! evolutions tab renders: parent before children, siblings in the order
//! the catalog lists them (depth-first pre-order).

use crate::model::{ChainLink, EvolutionChain};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionStage {
    /// Species id parsed from the species URL.
    pub id: u32,
    pub name: String,
    /// Level required to reach this stage; `None` for the root or for
    /// non-level triggers (items, trades, friendship).
    pub min_level: Option<u32>,
    /// Trigger kind, e.g. `"level-up"` or `"use-item"`.
    pub trigger: Option<String>,
    /// 0 for the chain root.
    pub depth: usize,
}

/// Ordered stages of `chain`.
///
/// Links whose species URL carries no numeric id are skipped.
pub fn stages(chain: &EvolutionChain) -> Vec<EvolutionStage> {
    let mut out = Vec::new();
    let mut pending: Vec<(&ChainLink, usize)> = vec![(&chain.chain, 0)];

    while let Some((link, depth)) = pending.pop() {
        match stage_of(link, depth) {
            Some(stage) => out.push(stage),
            None => warn!(
                "Skipping evolution link {:?} in chain {}: no species id",
                link.species.name, chain.id
            ),
        }

        for child in link.evolves_to.iter().rev() {
            pending.push((child, depth + 1));
        }
    }

    out
}

fn stage_of(link: &ChainLink, depth: usize) -> Option<EvolutionStage> {
    let id = link.species.id()?;
    let detail = link.details().first();

    Some(EvolutionStage {
        id,
        name: link.species.name.clone(),
        min_level: detail.and_then(|d| d.min_level),
        trigger: detail.and_then(|d| d.trigger.as_ref().map(|t| t.name.clone())),
        depth,
    })
}
