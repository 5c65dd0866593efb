use serde::{Deserialize, Serialize};

/// A country tracked by the remote source.
///
/// The same field names are used on the wire (`{"Country", "Slug"}`) and in
/// the `countries.csv` header, so one serde mapping serves both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "Slug")]
    pub slug: String,
    #[serde(rename = "Country")]
    pub name: String,
}

impl Entity {
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
        }
    }

    /// Lowercase display name, used to match user input and series rows.
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }
}

/// Ordered set of known countries, in the order the source returned them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entities: Vec<Entity>,
}

impl Catalog {
    pub fn new(entities: Vec<Entity>) -> Self {
        Self { entities }
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Find a country by lowercase name or by slug.
    pub fn find(&self, name: &str) -> Option<&Entity> {
        let wanted = name.to_lowercase();
        self.entities
            .iter()
            .find(|e| e.key() == wanted)
            .or_else(|| self.entities.iter().find(|e| e.slug == wanted))
    }

    /// Entities sorted by slug, for listing.
    pub fn sorted_by_slug(&self) -> Vec<&Entity> {
        let mut sorted: Vec<&Entity> = self.entities.iter().collect();
        sorted.sort_by(|a, b| a.slug.cmp(&b.slug));
        sorted
    }
}
