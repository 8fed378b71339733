// 📄 File Storage - all objects serialized into one JSON document
//
// Layout: { "State.<id>": { ...fields, "__class__": "State" }, ... }
//
// The in-memory map is the working set; save() rewrites the whole document
// and reload()/close() replace the working set with what is on disk.

use super::{first_referencing, Objects, Result, Storage, StorageError};
use crate::models::{Entity, EntityKind, ModelError};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct FileStorage {
    path: PathBuf,
    objects: Objects,
}

impl FileStorage {
    /// Open the document at `path`. A missing or empty file is an empty
    /// store; a malformed one is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let objects = load_document(&path)?;

        info!(path = %path.display(), objects = objects.len(), "file storage opened");

        Ok(FileStorage { path, objects })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn load_document(path: &Path) -> Result<Objects> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Objects::new()),
        Err(source) => {
            return Err(StorageError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if contents.trim().is_empty() {
        return Ok(Objects::new());
    }

    let document: IndexMap<String, Value> =
        serde_json::from_str(&contents).map_err(|source| StorageError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

    let mut objects = Objects::with_capacity(document.len());
    for (key, record) in document {
        let entity = parse_record(&key, record)
            .map_err(|source| StorageError::Record { key, source })?;
        objects.insert(entity.key(), entity);
    }

    Ok(objects)
}

fn parse_record(key: &str, record: Value) -> std::result::Result<Entity, ModelError> {
    let class = key.split_once('.').map(|(class, _)| class).unwrap_or(key);
    let kind: EntityKind = class.parse()?;
    Entity::from_record(kind, record)
}

impl Storage for FileStorage {
    fn all(&self, kind: Option<EntityKind>) -> Result<Objects> {
        Ok(self
            .objects
            .iter()
            .filter(|(_, entity)| kind.map_or(true, |k| entity.kind() == k))
            .map(|(key, entity)| (key.clone(), entity.clone()))
            .collect())
    }

    fn get(&self, kind: EntityKind, id: &str) -> Result<Option<Entity>> {
        Ok(self.objects.get(&kind.key(id)).cloned())
    }

    fn new(&mut self, entity: Entity) -> Result<()> {
        self.objects.insert(entity.key(), entity);
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        let document: IndexMap<&String, Map<String, Value>> = self
            .objects
            .iter()
            .map(|(key, entity)| (key, entity.to_record()))
            .collect();
        let json = serde_json::to_string(&document)?;

        fs::write(&self.path, json).map_err(|source| StorageError::Write {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), objects = self.objects.len(), "file storage saved");
        Ok(())
    }

    fn delete(&mut self, entity: &Entity) -> Result<()> {
        if let Some(child) = first_referencing(&self.objects, entity) {
            return Err(StorageError::Referenced {
                kind: entity.kind(),
                id: entity.id().to_string(),
                child,
            });
        }

        self.objects.shift_remove(&entity.key());

        // Links are not objects of their own: drop them with the amenity
        if entity.kind() == EntityKind::Amenity {
            for object in self.objects.values_mut() {
                if let Entity::Place(place) = object {
                    place.unlink_amenity(entity.id());
                }
            }
        }

        Ok(())
    }

    fn reload(&mut self) -> Result<()> {
        self.objects = load_document(&self.path)?;
        debug!(path = %self.path.display(), objects = self.objects.len(), "file storage reloaded");
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.reload()
    }

    fn count(&self, kind: Option<EntityKind>) -> Result<usize> {
        Ok(match kind {
            Some(kind) => self.objects.values().filter(|e| e.kind() == kind).count(),
            None => self.objects.len(),
        })
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}
