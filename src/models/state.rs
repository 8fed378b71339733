// 🗺️ State Entity - top of the location hierarchy (State → City → Place)

use super::{BaseModel, Entity, EntityKind, Model};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    #[serde(flatten)]
    pub base: BaseModel,

    pub name: String,
}

/// Fields a PUT may change on a State
#[derive(Debug, Default, Deserialize)]
pub struct StateUpdate {
    pub name: Option<String>,
}

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        State {
            base: BaseModel::new(),
            name: name.into(),
        }
    }
}

impl Model for State {
    const KIND: EntityKind = EntityKind::State;
    const REQUIRED: &'static [&'static str] = &["name"];
    type Update = StateUpdate;

    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }

    fn apply(&mut self, update: StateUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
    }

    fn from_entity(entity: Entity) -> Option<Self> {
        match entity {
            Entity::State(state) => Some(state),
            _ => None,
        }
    }
}
