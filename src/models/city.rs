// 🏙️ City Entity - belongs to a State, owns Places

use super::{BaseModel, Child, Entity, EntityKind, Model};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct City {
    #[serde(flatten)]
    pub base: BaseModel,

    /// Foreign key → State.id (fixed at creation)
    pub state_id: String,

    pub name: String,
}

/// Fields a PUT may change on a City (state_id is not one of them)
#[derive(Debug, Default, Deserialize)]
pub struct CityUpdate {
    pub name: Option<String>,
}

impl City {
    pub fn new(state_id: impl Into<String>, name: impl Into<String>) -> Self {
        City {
            base: BaseModel::new(),
            state_id: state_id.into(),
            name: name.into(),
        }
    }
}

impl Model for City {
    const KIND: EntityKind = EntityKind::City;
    const REQUIRED: &'static [&'static str] = &["name"];
    type Update = CityUpdate;

    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }

    fn apply(&mut self, update: CityUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
    }

    fn from_entity(entity: Entity) -> Option<Self> {
        match entity {
            Entity::City(city) => Some(city),
            _ => None,
        }
    }

    fn parents(&self) -> Vec<(EntityKind, &str)> {
        vec![(EntityKind::State, self.state_id.as_str())]
    }
}

impl Child for City {
    type Parent = super::State;
    const PARENT_KEY: &'static str = "state_id";

    fn parent_id(&self) -> &str {
        &self.state_id
    }
}
