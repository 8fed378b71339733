// Entity Models
//
// Each entity has:
// - Stable identity (BaseModel.id) assigned once at construction
// - Plain serde fields for its values and foreign keys
// - A typed update request listing exactly the fields a PUT may change

pub mod base;
pub mod state;
pub mod city;
pub mod amenity;
pub mod user;
pub mod place;
pub mod review;

pub use amenity::{Amenity, AmenityUpdate};
pub use base::BaseModel;
pub use city::{City, CityUpdate};
pub use place::{Place, PlaceUpdate};
pub use review::{Review, ReviewUpdate};
pub use state::{State, StateUpdate};
pub use user::{User, UserUpdate};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Unknown class: {0}")]
    UnknownKind(String),

    #[error("Invalid {kind} fields: {source}")]
    InvalidFields {
        kind: EntityKind,
        #[source]
        source: serde_json::Error,
    },
}

// ============================================================================
// ENTITY KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    State,
    City,
    Amenity,
    User,
    Place,
    Review,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::State,
        EntityKind::City,
        EntityKind::Amenity,
        EntityKind::User,
        EntityKind::Place,
        EntityKind::Review,
    ];

    /// Class name, also the prefix of storage keys ("City.<id>")
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::State => "State",
            EntityKind::City => "City",
            EntityKind::Amenity => "Amenity",
            EntityKind::User => "User",
            EntityKind::Place => "Place",
            EntityKind::Review => "Review",
        }
    }

    /// Table name, also the resource name in URLs and stats
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::State => "states",
            EntityKind::City => "cities",
            EntityKind::Amenity => "amenities",
            EntityKind::User => "users",
            EntityKind::Place => "places",
            EntityKind::Review => "reviews",
        }
    }

    /// Kinds holding a foreign key to this kind, with the key's field name
    pub fn children(&self) -> &'static [(EntityKind, &'static str)] {
        match self {
            EntityKind::State => &[(EntityKind::City, "state_id")],
            EntityKind::City => &[(EntityKind::Place, "city_id")],
            EntityKind::User => &[
                (EntityKind::Place, "user_id"),
                (EntityKind::Review, "user_id"),
            ],
            EntityKind::Place => &[(EntityKind::Review, "place_id")],
            EntityKind::Amenity | EntityKind::Review => &[],
        }
    }

    /// Storage key for an id of this kind
    pub fn key(&self, id: &str) -> String {
        format!("{}.{}", self.as_str(), id)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ModelError::UnknownKind(s.to_string()))
    }
}

// ============================================================================
// MODEL TRAIT
// ============================================================================

/// Behaviour shared by the six entity structs.
pub trait Model: Clone + Serialize + DeserializeOwned + Into<Entity> + Send + 'static {
    const KIND: EntityKind;

    /// Fields a creation payload must carry
    const REQUIRED: &'static [&'static str];

    /// Creation fields that name another object, which must exist
    const REFERENCES: &'static [(&'static str, EntityKind)] = &[];

    /// Whitelist of fields an update may change
    type Update: DeserializeOwned;

    fn base(&self) -> &BaseModel;

    fn base_mut(&mut self) -> &mut BaseModel;

    fn apply(&mut self, update: Self::Update);

    fn from_entity(entity: Entity) -> Option<Self>;

    /// (parent kind, parent id) for every foreign key this entity holds
    fn parents(&self) -> Vec<(EntityKind, &str)> {
        Vec::new()
    }

    fn id(&self) -> &str {
        &self.base().id
    }
}

/// An entity created and listed under its parent's resource path
/// (cities under states, places under cities, reviews under places).
pub trait Child: Model {
    type Parent: Model;

    /// Foreign key field filled in from the parent's path segment
    const PARENT_KEY: &'static str;

    fn parent_id(&self) -> &str;
}

fn apply_fields<M: Model>(model: &mut M, fields: Value) -> Result<(), ModelError> {
    let update: M::Update = serde_json::from_value(fields).map_err(|source| {
        ModelError::InvalidFields {
            kind: M::KIND,
            source,
        }
    })?;
    model.apply(update);
    Ok(())
}

fn to_object<T: Serialize>(value: &T) -> Map<String, Value> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

// ============================================================================
// ENTITY
// ============================================================================

/// Any stored object, tagged by its kind.
#[derive(Debug, Clone)]
pub enum Entity {
    State(State),
    City(City),
    Amenity(Amenity),
    User(User),
    Place(Place),
    Review(Review),
}

macro_rules! each_entity {
    ($entity:expr, $inner:ident => $body:expr) => {
        match $entity {
            Entity::State($inner) => $body,
            Entity::City($inner) => $body,
            Entity::Amenity($inner) => $body,
            Entity::User($inner) => $body,
            Entity::Place($inner) => $body,
            Entity::Review($inner) => $body,
        }
    };
}

impl Entity {
    /// Construct from a field mapping (a request body or console arguments).
    ///
    /// Missing id/timestamps are generated, unknown fields are ignored and a
    /// User's plaintext password is hashed.
    pub fn from_payload(kind: EntityKind, mut fields: Map<String, Value>) -> Result<Self, ModelError> {
        BaseModel::fill_defaults(&mut fields);

        let mut entity = Self::from_record(kind, Value::Object(fields))?;
        if let Entity::User(user) = &mut entity {
            user.hash_password();
        }

        Ok(entity)
    }

    /// Rehydrate from persisted data. Nothing is generated or rehashed.
    pub fn from_record(kind: EntityKind, record: Value) -> Result<Self, ModelError> {
        let invalid = |source| ModelError::InvalidFields { kind, source };

        let entity = match kind {
            EntityKind::State => Entity::State(serde_json::from_value(record).map_err(invalid)?),
            EntityKind::City => Entity::City(serde_json::from_value(record).map_err(invalid)?),
            EntityKind::Amenity => Entity::Amenity(serde_json::from_value(record).map_err(invalid)?),
            EntityKind::User => Entity::User(serde_json::from_value(record).map_err(invalid)?),
            EntityKind::Place => Entity::Place(serde_json::from_value(record).map_err(invalid)?),
            EntityKind::Review => Entity::Review(serde_json::from_value(record).map_err(invalid)?),
        };

        Ok(entity)
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::State(_) => EntityKind::State,
            Entity::City(_) => EntityKind::City,
            Entity::Amenity(_) => EntityKind::Amenity,
            Entity::User(_) => EntityKind::User,
            Entity::Place(_) => EntityKind::Place,
            Entity::Review(_) => EntityKind::Review,
        }
    }

    pub fn base(&self) -> &BaseModel {
        each_entity!(self, inner => inner.base())
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    /// Storage key ("Class.id")
    pub fn key(&self) -> String {
        self.kind().key(self.id())
    }

    pub fn touch(&mut self) {
        each_entity!(self, inner => inner.base_mut().touch())
    }

    pub fn parents(&self) -> Vec<(EntityKind, &str)> {
        each_entity!(self, inner => inner.parents())
    }

    /// Apply an update payload through the kind's whitelist.
    pub fn update_from(&mut self, fields: Map<String, Value>) -> Result<(), ModelError> {
        let fields = Value::Object(fields);
        each_entity!(self, inner => apply_fields(inner, fields))
    }

    /// Client-facing representation (never carries a password)
    pub fn to_dict(&self) -> Map<String, Value> {
        let mut dict = self.to_record();
        if let Entity::User(_) = self {
            dict.remove("password");
        }
        dict
    }

    /// Persisted representation, tagged with __class__
    pub fn to_record(&self) -> Map<String, Value> {
        let mut record = each_entity!(self, inner => to_object(inner));
        record.insert(
            "__class__".to_string(),
            Value::String(self.kind().as_str().to_string()),
        );
        record
    }

    pub fn into_model<M: Model>(self) -> Option<M> {
        M::from_entity(self)
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.id() == other.id()
    }
}

/// Wires a struct into the Entity enum and gives it identity-based equality.
macro_rules! entity_variant {
    ($model:ident) => {
        impl From<$model> for Entity {
            fn from(model: $model) -> Self {
                Entity::$model(model)
            }
        }

        impl PartialEq for $model {
            fn eq(&self, other: &Self) -> bool {
                self.base.id == other.base.id
            }
        }
    };
}

entity_variant!(State);
entity_variant!(City);
entity_variant!(Amenity);
entity_variant!(User);
entity_variant!(Place);
entity_variant!(Review);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_kind_parses_class_names() {
        assert_eq!("City".parse::<EntityKind>().unwrap(), EntityKind::City);
        assert!(matches!(
            "BaseModel".parse::<EntityKind>(),
            Err(ModelError::UnknownKind(_))
        ));
    }

    #[test]
    fn test_payload_fields_survive_serialization() {
        let payload = fields(json!({
            "state_id": "s-1",
            "name": "San Francisco",
        }));

        let city = Entity::from_payload(EntityKind::City, payload.clone()).unwrap();
        let dict = city.to_dict();

        for (key, value) in &payload {
            assert_eq!(&dict[key], value);
        }
        assert_eq!(dict["__class__"], "City");
        assert!(dict["id"].is_string());
        assert_eq!(dict["created_at"], dict["updated_at"]);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let payload = fields(json!({"name": "Wifi", "color": "blue"}));

        let amenity = Entity::from_payload(EntityKind::Amenity, payload).unwrap();

        assert!(!amenity.to_dict().contains_key("color"));
    }

    #[test]
    fn test_wrong_field_type_is_rejected() {
        let payload = fields(json!({"name": 42}));

        let result = Entity::from_payload(EntityKind::State, payload);

        assert!(matches!(
            result,
            Err(ModelError::InvalidFields { kind: EntityKind::State, .. })
        ));
    }

    #[test]
    fn test_record_roundtrip_keeps_identity() {
        let state = Entity::from_payload(EntityKind::State, fields(json!({"name": "Oregon"}))).unwrap();

        let restored = Entity::from_record(EntityKind::State, Value::Object(state.to_record())).unwrap();

        assert_eq!(restored, state);
        assert_eq!(restored.base().created_at, state.base().created_at);
    }

    #[test]
    fn test_equality_is_by_identifier() {
        let a = Entity::from_payload(EntityKind::State, fields(json!({"name": "A"}))).unwrap();
        let mut b = a.clone();
        b.update_from(fields(json!({"name": "B"}))).unwrap();
        let c = Entity::from_payload(EntityKind::State, fields(json!({"name": "A"}))).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_update_ignores_identity_and_foreign_keys() {
        let mut city = Entity::from_payload(
            EntityKind::City,
            fields(json!({"state_id": "s-1", "name": "Old"})),
        )
        .unwrap();
        let id = city.id().to_string();

        city.update_from(fields(json!({
            "id": "forged",
            "state_id": "s-2",
            "created_at": "2000-01-01T00:00:00.000000",
            "name": "New",
        })))
        .unwrap();

        let dict = city.to_dict();
        assert_eq!(dict["id"], id.as_str());
        assert_eq!(dict["state_id"], "s-1");
        assert_eq!(dict["name"], "New");
    }

    #[test]
    fn test_children_table() {
        assert_eq!(EntityKind::State.children(), &[(EntityKind::City, "state_id")]);
        assert_eq!(EntityKind::User.children().len(), 2);
        assert!(EntityKind::Amenity.children().is_empty());
    }
}
