// 🏠 Place Entity - a rental listing in a City, hosted by a User
//
// Amenities are a many-to-many relation. The file backend stores the linked
// ids inline; the database backend keeps them in the place_amenity table and
// fills amenity_ids back in on load.

use super::{BaseModel, Child, Entity, EntityKind, Model};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    #[serde(flatten)]
    pub base: BaseModel,

    /// Foreign key → City.id
    pub city_id: String,

    /// Foreign key → User.id (the host)
    pub user_id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub number_rooms: i64,

    #[serde(default)]
    pub number_bathrooms: i64,

    #[serde(default)]
    pub max_guest: i64,

    #[serde(default)]
    pub price_by_night: i64,

    #[serde(default)]
    pub latitude: f64,

    #[serde(default)]
    pub longitude: f64,

    /// Linked Amenity ids, in link order
    #[serde(default)]
    pub amenity_ids: Vec<String>,
}

/// Fields a PUT may change on a Place.
///
/// city_id and user_id stay fixed; amenity links go through their own routes.
#[derive(Debug, Default, Deserialize)]
pub struct PlaceUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub number_rooms: Option<i64>,
    pub number_bathrooms: Option<i64>,
    pub max_guest: Option<i64>,
    pub price_by_night: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Place {
    pub fn new(city_id: impl Into<String>, user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Place {
            base: BaseModel::new(),
            city_id: city_id.into(),
            user_id: user_id.into(),
            name: name.into(),
            description: String::new(),
            number_rooms: 0,
            number_bathrooms: 0,
            max_guest: 0,
            price_by_night: 0,
            latitude: 0.0,
            longitude: 0.0,
            amenity_ids: Vec::new(),
        }
    }

    pub fn has_amenity(&self, amenity_id: &str) -> bool {
        self.amenity_ids.iter().any(|id| id == amenity_id)
    }

    /// Link an amenity. Returns false if it was already linked.
    pub fn link_amenity(&mut self, amenity_id: &str) -> bool {
        if self.has_amenity(amenity_id) {
            return false;
        }
        self.amenity_ids.push(amenity_id.to_string());
        true
    }

    /// Unlink an amenity. Returns false if it was not linked.
    pub fn unlink_amenity(&mut self, amenity_id: &str) -> bool {
        let before = self.amenity_ids.len();
        self.amenity_ids.retain(|id| id != amenity_id);
        self.amenity_ids.len() != before
    }
}

impl Model for Place {
    const KIND: EntityKind = EntityKind::Place;
    const REQUIRED: &'static [&'static str] = &["user_id", "name"];
    const REFERENCES: &'static [(&'static str, EntityKind)] = &[("user_id", EntityKind::User)];
    type Update = PlaceUpdate;

    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }

    fn apply(&mut self, update: PlaceUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(number_rooms) = update.number_rooms {
            self.number_rooms = number_rooms;
        }
        if let Some(number_bathrooms) = update.number_bathrooms {
            self.number_bathrooms = number_bathrooms;
        }
        if let Some(max_guest) = update.max_guest {
            self.max_guest = max_guest;
        }
        if let Some(price_by_night) = update.price_by_night {
            self.price_by_night = price_by_night;
        }
        if let Some(latitude) = update.latitude {
            self.latitude = latitude;
        }
        if let Some(longitude) = update.longitude {
            self.longitude = longitude;
        }
    }

    fn from_entity(entity: Entity) -> Option<Self> {
        match entity {
            Entity::Place(place) => Some(place),
            _ => None,
        }
    }

    fn parents(&self) -> Vec<(EntityKind, &str)> {
        vec![
            (EntityKind::City, self.city_id.as_str()),
            (EntityKind::User, self.user_id.as_str()),
        ]
    }
}

impl Child for Place {
    type Parent = super::City;
    const PARENT_KEY: &'static str = "city_id";

    fn parent_id(&self) -> &str {
        &self.city_id
    }
}
