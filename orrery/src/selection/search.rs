use crate::registry::{BodyKind, CelestialBody, EntityRegistry};
use hecs::Entity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchFilter {
    #[default]
    All,
    Star,
    Planet,
    Moon,
}

impl SearchFilter {
    pub fn accepts(&self, kind: BodyKind) -> bool {
        match self {
            SearchFilter::All => true,
            SearchFilter::Star => kind == BodyKind::Star,
            SearchFilter::Planet => kind == BodyKind::Planet,
            SearchFilter::Moon => kind == BodyKind::Moon,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub entity: Entity,
    pub name: String,
    pub kind: BodyKind,
    pub system: String,
}

/// Case-insensitive substring search in registry order
///
/// An empty or blank query matches nothing. Hidden bodies never match.
pub fn search(registry: &EntityRegistry, query: &str, filter: SearchFilter) -> Vec<SearchResult> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    registry
        .all_bodies()
        .iter()
        .filter_map(|&entity| {
            let body = registry.get::<CelestialBody>(entity)?;
            let matches = !body.hidden
                && filter.accepts(body.kind)
                && body.name.to_lowercase().contains(&needle);
            matches.then(|| SearchResult {
                entity,
                name: body.name.clone(),
                kind: body.kind,
                system: body.system.clone(),
            })
        })
        .collect()
}
