// Amenity Entity - linked to places through the place_amenity join relation

use super::{BaseModel, Entity, EntityKind, Model};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Amenity {
    #[serde(flatten)]
    pub base: BaseModel,

    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct AmenityUpdate {
    pub name: Option<String>,
}

impl Amenity {
    pub fn new(name: impl Into<String>) -> Self {
        Amenity {
            base: BaseModel::new(),
            name: name.into(),
        }
    }
}

impl Model for Amenity {
    const KIND: EntityKind = EntityKind::Amenity;
    const REQUIRED: &'static [&'static str] = &["name"];
    type Update = AmenityUpdate;

    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }

    fn apply(&mut self, update: AmenityUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
    }

    fn from_entity(entity: Entity) -> Option<Self> {
        match entity {
            Entity::Amenity(amenity) => Some(amenity),
            _ => None,
        }
    }
}
