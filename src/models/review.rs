// Review Entity - written by a User about a Place

use super::{BaseModel, Child, Entity, EntityKind, Model};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    #[serde(flatten)]
    pub base: BaseModel,

    /// Foreign key → Place.id
    pub place_id: String,

    /// Foreign key → User.id
    pub user_id: String,

    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewUpdate {
    pub text: Option<String>,
}

impl Review {
    pub fn new(place_id: impl Into<String>, user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Review {
            base: BaseModel::new(),
            place_id: place_id.into(),
            user_id: user_id.into(),
            text: text.into(),
        }
    }
}

impl Model for Review {
    const KIND: EntityKind = EntityKind::Review;
    const REQUIRED: &'static [&'static str] = &["user_id", "text"];
    const REFERENCES: &'static [(&'static str, EntityKind)] = &[("user_id", EntityKind::User)];
    type Update = ReviewUpdate;

    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }

    fn apply(&mut self, update: ReviewUpdate) {
        if let Some(text) = update.text {
            self.text = text;
        }
    }

    fn from_entity(entity: Entity) -> Option<Self> {
        match entity {
            Entity::Review(review) => Some(review),
            _ => None,
        }
    }

    fn parents(&self) -> Vec<(EntityKind, &str)> {
        vec![
            (EntityKind::Place, self.place_id.as_str()),
            (EntityKind::User, self.user_id.as_str()),
        ]
    }
}

impl Child for Review {
    type Parent = super::Place;
    const PARENT_KEY: &'static str = "place_id";

    fn parent_id(&self) -> &str {
        &self.place_id
    }
}
