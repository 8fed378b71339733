// Storage Engine - single point of truth for persistence
//
// Two interchangeable backends behind one trait:
// - FileStorage: every object in one JSON document keyed "Class.id"
// - DbStorage:   SQLite tables with foreign keys and a place_amenity join table
//
// The backend is chosen once at startup (config::StorageArgs::open) and used
// as Box<dyn Storage> from then on.

pub mod db;
pub mod file;

pub use db::DbStorage;
pub use file::FileStorage;

use crate::models::{Entity, EntityKind, Model, ModelError};
use indexmap::IndexMap;
use std::path::PathBuf;
use thiserror::Error;

/// Snapshot of stored objects keyed "Class.id", in insertion order
pub type Objects = IndexMap<String, Entity>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed storage document {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unreadable record {key}: {source}")]
    Record {
        key: String,
        #[source]
        source: ModelError,
    },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{kind} {id} is still referenced by at least one {child}")]
    Referenced {
        kind: EntityKind,
        id: String,
        child: EntityKind,
    },
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Uniform create/read/update/delete/count contract over both backends.
///
/// Absence is never an error: get returns None and count returns 0.
pub trait Storage: Send {
    /// Snapshot of every object, optionally only one kind
    fn all(&self, kind: Option<EntityKind>) -> Result<Objects>;

    fn get(&self, kind: EntityKind, id: &str) -> Result<Option<Entity>>;

    /// Register a new or modified object with the current unit of work
    fn new(&mut self, entity: Entity) -> Result<()>;

    /// Make the current unit of work durable
    fn save(&mut self) -> Result<()>;

    /// Remove an object. Refused while other objects reference it.
    fn delete(&mut self, entity: &Entity) -> Result<()>;

    /// Re-read durable state
    fn reload(&mut self) -> Result<()>;

    /// End the current unit of work, dropping anything not saved
    fn close(&mut self) -> Result<()>;

    fn count(&self, kind: Option<EntityKind>) -> Result<usize>;

    /// Backend name for logs ("file" or "db")
    fn backend(&self) -> &'static str;

    /// Refresh updated_at, register and save in one step.
    fn persist(&mut self, entity: &mut Entity) -> Result<()> {
        entity.touch();
        self.new(entity.clone())?;
        self.save()
    }
}

impl<'a> dyn Storage + 'a {
    /// Typed get
    pub fn find<M: Model>(&self, id: &str) -> Result<Option<M>> {
        Ok(self.get(M::KIND, id)?.and_then(Entity::into_model))
    }

    /// Typed all, in insertion order
    pub fn list<M: Model>(&self) -> Result<Vec<M>> {
        Ok(self
            .all(Some(M::KIND))?
            .into_values()
            .filter_map(Entity::into_model)
            .collect())
    }
}

/// First child kind that still points at `entity`, if any.
pub(crate) fn first_referencing(objects: &Objects, entity: &Entity) -> Option<EntityKind> {
    let kind = entity.kind();
    let id = entity.id();

    objects.values().find_map(|candidate| {
        candidate
            .parents()
            .into_iter()
            .any(|(parent_kind, parent_id)| parent_kind == kind && parent_id == id)
            .then(|| candidate.kind())
    })
}

#[cfg(test)]
pub(crate) mod contract {
    //! Behaviour both backends must share, run from each backend's tests.

    use super::*;
    use crate::models::{Amenity, City, Place, State, User};

    pub fn get_after_new_and_save(storage: &mut dyn Storage) {
        let state = State::new("California");
        let id = state.base.id.clone();

        storage.new(state.clone().into()).unwrap();
        storage.save().unwrap();

        let fetched = storage.find::<State>(&id).unwrap().unwrap();
        assert_eq!(fetched, state);
        assert_eq!(fetched.name, "California");
        assert!(storage.get(EntityKind::City, &id).unwrap().is_none());
        assert!(storage.get(EntityKind::State, "missing").unwrap().is_none());
    }

    pub fn count_tracks_one_kind(storage: &mut dyn Storage) {
        let states = storage.count(Some(EntityKind::State)).unwrap();
        let amenities = storage.count(Some(EntityKind::Amenity)).unwrap();
        let total = storage.count(None).unwrap();

        storage.new(State::new("Arizona").into()).unwrap();
        storage.save().unwrap();

        assert_eq!(storage.count(Some(EntityKind::State)).unwrap(), states + 1);
        assert_eq!(storage.count(Some(EntityKind::Amenity)).unwrap(), amenities);

        storage.new(Amenity::new("Wifi").into()).unwrap();
        storage.save().unwrap();

        assert_eq!(storage.count(Some(EntityKind::State)).unwrap(), states + 1);
        assert_eq!(storage.count(None).unwrap(), total + 2);
    }

    pub fn all_is_ordered_snapshot(storage: &mut dyn Storage) {
        let first = State::new("First");
        let second = State::new("Second");
        storage.new(first.clone().into()).unwrap();
        storage.new(second.clone().into()).unwrap();
        storage.new(Amenity::new("Pool").into()).unwrap();
        storage.save().unwrap();

        let snapshot = storage.all(Some(EntityKind::State)).unwrap();
        let keys: Vec<String> = snapshot.keys().cloned().collect();
        assert_eq!(
            keys,
            vec![
                EntityKind::State.key(&first.base.id),
                EntityKind::State.key(&second.base.id),
            ]
        );

        storage.new(State::new("Third").into()).unwrap();
        storage.save().unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(storage.all(None).unwrap().len(), 4);
    }

    pub fn persist_updates_in_place(storage: &mut dyn Storage) {
        let mut entity: Entity = State::new("Old").into();
        storage.new(entity.clone()).unwrap();
        storage.save().unwrap();
        let created = entity.base().updated_at;

        std::thread::sleep(std::time::Duration::from_millis(2));
        let mut fields = serde_json::Map::new();
        fields.insert("name".to_string(), "New".into());
        entity.update_from(fields).unwrap();
        storage.persist(&mut entity).unwrap();

        let fetched = storage.find::<State>(entity.id()).unwrap().unwrap();
        assert_eq!(fetched.name, "New");
        assert!(fetched.base.updated_at > created);
        assert_eq!(storage.count(Some(EntityKind::State)).unwrap(), 1);
    }

    pub fn delete_then_save_removes(storage: &mut dyn Storage) {
        let entity: Entity = Amenity::new("Sauna").into();
        storage.new(entity.clone()).unwrap();
        storage.save().unwrap();

        storage.delete(&entity).unwrap();
        storage.save().unwrap();

        assert!(storage.get(EntityKind::Amenity, entity.id()).unwrap().is_none());
    }

    pub fn delete_referenced_parent_is_refused(storage: &mut dyn Storage) {
        let state = State::new("Nevada");
        let city = City::new(state.base.id.clone(), "Reno");
        storage.new(state.clone().into()).unwrap();
        storage.new(city.clone().into()).unwrap();
        storage.save().unwrap();

        let result = storage.delete(&state.clone().into());
        assert!(matches!(
            result,
            Err(StorageError::Referenced { child: EntityKind::City, .. })
        ));

        storage.delete(&city.into()).unwrap();
        storage.delete(&state.clone().into()).unwrap();
        storage.save().unwrap();
        assert!(storage.find::<State>(&state.base.id).unwrap().is_none());
    }

    pub fn amenity_links_persist(storage: &mut dyn Storage) {
        let state = State::new("Texas");
        let city = City::new(state.base.id.clone(), "Austin");
        let user = User::new("host@example.com", "pw");
        let wifi = Amenity::new("Wifi");
        let mut place = Place::new(city.base.id.clone(), user.base.id.clone(), "Ranch");
        place.link_amenity(&wifi.base.id);

        for entity in [
            Entity::from(state),
            city.into(),
            user.into(),
            wifi.clone().into(),
            place.clone().into(),
        ] {
            storage.new(entity).unwrap();
        }
        storage.save().unwrap();

        let fetched = storage.find::<Place>(&place.base.id).unwrap().unwrap();
        assert_eq!(fetched.amenity_ids, vec![wifi.base.id.clone()]);

        storage.delete(&wifi.into()).unwrap();
        storage.save().unwrap();
        let fetched = storage.find::<Place>(&place.base.id).unwrap().unwrap();
        assert!(fetched.amenity_ids.is_empty());
    }

    pub fn close_discards_unsaved(storage: &mut dyn Storage) {
        let kept = State::new("Kept");
        storage.new(kept.clone().into()).unwrap();
        storage.save().unwrap();

        let dropped = State::new("Dropped");
        storage.new(dropped.clone().into()).unwrap();
        storage.close().unwrap();

        assert!(storage.find::<State>(&kept.base.id).unwrap().is_some());
        assert!(storage.find::<State>(&dropped.base.id).unwrap().is_none());
    }
}
