// 👤 User Entity - owns Places and Reviews
//
// The password is stored as a SHA-256 hex digest and never leaves the
// process: Entity::to_dict drops it, only the persisted record keeps it.

use super::{BaseModel, Entity, EntityKind, Model};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(flatten)]
    pub base: BaseModel,

    /// Login identity, fixed at creation
    pub email: String,

    /// SHA-256 hex digest once hashed
    pub password: String,

    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,
}

/// Fields a PUT may change on a User (email is not one of them)
#[derive(Debug, Default, Deserialize)]
pub struct UserUpdate {
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Digest used for stored passwords
pub fn hash_password(plain: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plain.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl User {
    pub fn new(email: impl Into<String>, password: &str) -> Self {
        User {
            base: BaseModel::new(),
            email: email.into(),
            password: hash_password(password),
            first_name: String::new(),
            last_name: String::new(),
        }
    }

    /// Replace the plaintext password field with its digest
    pub fn hash_password(&mut self) {
        self.password = hash_password(&self.password);
    }

    pub fn check_password(&self, plain: &str) -> bool {
        self.password == hash_password(plain)
    }
}

impl Model for User {
    const KIND: EntityKind = EntityKind::User;
    const REQUIRED: &'static [&'static str] = &["email", "password"];
    type Update = UserUpdate;

    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }

    fn apply(&mut self, update: UserUpdate) {
        if let Some(password) = update.password {
            self.password = hash_password(&password);
        }
        if let Some(first_name) = update.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            self.last_name = last_name;
        }
    }

    fn from_entity(entity: Entity) -> Option<Self> {
        match entity {
            Entity::User(user) => Some(user),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_password_is_hashed() {
        let user = User::new("a@b.c", "secret");

        assert_ne!(user.password, "secret");
        assert_eq!(user.password.len(), 64);
        assert!(user.check_password("secret"));
        assert!(!user.check_password("Secret"));
    }

    #[test]
    fn test_user_payload_hashes_and_dict_hides_password() {
        let payload = match json!({"email": "a@b.c", "password": "pw", "first_name": "Betty"}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };

        let entity = Entity::from_payload(EntityKind::User, payload).unwrap();

        assert!(!entity.to_dict().contains_key("password"));
        assert_eq!(entity.to_dict()["last_name"], "");
        assert_eq!(entity.to_record()["password"], hash_password("pw").as_str());
    }

    #[test]
    fn test_user_record_is_not_rehashed() {
        let user = User::new("a@b.c", "pw");
        let record = Entity::User(user.clone()).to_record();

        let restored = Entity::from_record(EntityKind::User, serde_json::Value::Object(record))
            .unwrap()
            .into_model::<User>()
            .unwrap();

        assert!(restored.check_password("pw"));
    }

    #[test]
    fn test_user_update_rehashes_and_keeps_email() {
        let mut user = User::new("a@b.c", "pw");

        user.apply(UserUpdate {
            password: Some("new".to_string()),
            first_name: Some("Bob".to_string()),
            last_name: None,
        });

        assert!(user.check_password("new"));
        assert_eq!(user.first_name, "Bob");
        assert_eq!(user.email, "a@b.c");
    }
}
