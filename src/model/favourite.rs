use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row of the local favourites table.
///
/// `name` and `image_url` are snapshots taken when the entity was
/// favourited; they are never refreshed from the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavouritePokemon {
    pub id: u32,
    pub name: String,
    /// Empty when no image was supplied.
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

impl FavouritePokemon {
    /// Record as the UI shows it before the store has confirmed the write.
    pub fn provisional(item: &NewFavourite, created_at: DateTime<Utc>) -> Self {
        FavouritePokemon {
            id: item.id,
            name: item.name.clone(),
            image_url: item.image_url.clone().unwrap_or_default(),
            created_at,
        }
    }
}

/// Input to an add: the identity and snapshot fields of a favourite.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFavourite {
    pub id: u32,
    pub name: String,
    pub image_url: Option<String>,
}

impl NewFavourite {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        NewFavourite {
            id,
            name: name.into(),
            image_url: None,
        }
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }
}
