// HBNB - Admin Console
// Inspect and edit stored objects without going through the HTTP API

use anyhow::Result;
use clap::{Parser, Subcommand};
use hbnb::{Entity, EntityKind, Storage, StorageArgs};
use serde_json::{Map, Value};

#[derive(Debug, Parser)]
#[command(name = "hbnb", version, about = "HBNB admin console")]
struct Cli {
    #[command(flatten)]
    storage: StorageArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create an object from key=value pairs and print its id
    Create {
        class: String,
        /// name="My_house" (underscores become spaces), rooms=3, lat=37.7
        params: Vec<String>,
    },
    /// Print one object
    Show { class: String, id: String },
    /// Delete one object
    Destroy { class: String, id: String },
    /// Print every object, optionally of one class
    All { class: Option<String> },
    /// Count objects, optionally of one class
    Count { class: Option<String> },
    /// Set one field of an object
    Update {
        class: String,
        id: String,
        field: String,
        value: String,
    },
}

const NO_CLASS: &str = "** class doesn't exist **";
const NO_INSTANCE: &str = "** no instance found **";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut storage = cli.storage.open()?;

    run(&mut *storage, cli.command)?;
    storage.close()?;

    Ok(())
}

fn run(storage: &mut dyn Storage, command: Command) -> Result<()> {
    match command {
        Command::Create { class, params } => {
            let Some(kind) = parse_kind(&class) else { return Ok(()) };

            let mut fields: Map<String, Value> = params.iter().filter_map(|p| parse_param(p)).collect();
            fields.remove("amenity_ids");

            let mut entity = match Entity::from_payload(kind, fields) {
                Ok(entity) => entity,
                Err(e) => {
                    println!("** {} **", e);
                    return Ok(());
                }
            };

            for (parent_kind, parent_id) in entity.parents() {
                if storage.get(parent_kind, parent_id)?.is_none() {
                    println!("{}", NO_INSTANCE);
                    return Ok(());
                }
            }

            storage.persist(&mut entity)?;
            println!("{}", entity.id());
        }

        Command::Show { class, id } => {
            let Some(kind) = parse_kind(&class) else { return Ok(()) };

            match storage.get(kind, &id)? {
                Some(entity) => println!("{}", describe(&entity)),
                None => println!("{}", NO_INSTANCE),
            }
        }

        Command::Destroy { class, id } => {
            let Some(kind) = parse_kind(&class) else { return Ok(()) };

            match storage.get(kind, &id)? {
                Some(entity) => {
                    storage.delete(&entity)?;
                    storage.save()?;
                }
                None => println!("{}", NO_INSTANCE),
            }
        }

        Command::All { class } => {
            let kind = match class {
                Some(class) => match parse_kind(&class) {
                    Some(kind) => Some(kind),
                    None => return Ok(()),
                },
                None => None,
            };

            for entity in storage.all(kind)?.values() {
                println!("{}", describe(entity));
            }
        }

        Command::Count { class } => {
            let kind = match class {
                Some(class) => match parse_kind(&class) {
                    Some(kind) => Some(kind),
                    None => return Ok(()),
                },
                None => None,
            };

            println!("{}", storage.count(kind)?);
        }

        Command::Update { class, id, field, value } => {
            let Some(kind) = parse_kind(&class) else { return Ok(()) };

            let Some(mut entity) = storage.get(kind, &id)? else {
                println!("{}", NO_INSTANCE);
                return Ok(());
            };

            let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
            let mut fields = Map::new();
            fields.insert(field, value);

            if let Err(e) = entity.update_from(fields) {
                println!("** {} **", e);
                return Ok(());
            }
            storage.persist(&mut entity)?;
        }
    }

    Ok(())
}

fn parse_kind(class: &str) -> Option<EntityKind> {
    let kind = class.parse().ok();
    if kind.is_none() {
        println!("{}", NO_CLASS);
    }
    kind
}

/// "[City] (<id>) {...}"
fn describe(entity: &Entity) -> String {
    format!(
        "[{}] ({}) {}",
        entity.kind(),
        entity.id(),
        Value::Object(entity.to_dict())
    )
}

/// key="quoted_value" → string (underscores become spaces), else integer,
/// else float. Anything else is skipped.
fn parse_param(param: &str) -> Option<(String, Value)> {
    let (key, raw) = param.split_once('=')?;

    let value = if let Some(quoted) = raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
        Value::String(quoted.replace('_', " ").replace("\\\"", "\""))
    } else if let Ok(int) = raw.parse::<i64>() {
        Value::from(int)
    } else if let Ok(float) = raw.parse::<f64>() {
        Value::from(float)
    } else {
        return None;
    };

    Some((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hbnb::FileStorage;
    use tempfile::TempDir;

    #[test]
    fn test_parse_param_kinds() {
        assert_eq!(
            parse_param(r#"name="My_little_house""#),
            Some(("name".to_string(), Value::from("My little house")))
        );
        assert_eq!(parse_param("number_rooms=4"), Some(("number_rooms".to_string(), Value::from(4))));
        assert_eq!(parse_param("latitude=37.77"), Some(("latitude".to_string(), Value::from(37.77))));
        assert_eq!(parse_param("name=unquoted"), None);
        assert_eq!(parse_param("no_equals"), None);
    }

    #[test]
    fn test_create_then_update_through_console() {
        let dir = TempDir::new().unwrap();
        let mut storage = FileStorage::open(dir.path().join("file.json")).unwrap();

        run(
            &mut storage,
            Command::Create {
                class: "State".to_string(),
                params: vec![r#"name="New_Mexico""#.to_string()],
            },
        )
        .unwrap();

        let state = storage.all(Some(EntityKind::State)).unwrap().into_values().next().unwrap();
        assert_eq!(state.to_dict()["name"], "New Mexico");

        run(
            &mut storage,
            Command::Update {
                class: "State".to_string(),
                id: state.id().to_string(),
                field: "name".to_string(),
                value: "Nevada".to_string(),
            },
        )
        .unwrap();

        let updated = storage.get(EntityKind::State, state.id()).unwrap().unwrap();
        assert_eq!(updated.to_dict()["name"], "Nevada");
    }

    #[test]
    fn test_unknown_class_changes_nothing() {
        let dir = TempDir::new().unwrap();
        let mut storage = FileStorage::open(dir.path().join("file.json")).unwrap();

        run(
            &mut storage,
            Command::Create {
                class: "Spaceship".to_string(),
                params: vec![],
            },
        )
        .unwrap();

        assert_eq!(storage.count(None).unwrap(), 0);
    }

    #[test]
    fn test_create_with_missing_parent_changes_nothing() {
        let dir = TempDir::new().unwrap();
        let mut storage = FileStorage::open(dir.path().join("file.json")).unwrap();

        run(
            &mut storage,
            Command::Create {
                class: "City".to_string(),
                params: vec![
                    r#"state_id="ghost""#.to_string(),
                    r#"name="Nowhere""#.to_string(),
                ],
            },
        )
        .unwrap();

        assert_eq!(storage.count(Some(EntityKind::City)).unwrap(), 0);
    }

    #[test]
    fn test_create_child_under_existing_parent() {
        let dir = TempDir::new().unwrap();
        let mut storage = FileStorage::open(dir.path().join("file.json")).unwrap();
        let state: Entity = hbnb::State::new("Oregon").into();
        storage.new(state.clone()).unwrap();
        storage.save().unwrap();

        run(
            &mut storage,
            Command::Create {
                class: "City".to_string(),
                params: vec![
                    format!(r#"state_id="{}""#, state.id()),
                    r#"name="Portland""#.to_string(),
                ],
            },
        )
        .unwrap();

        let cities = storage.all(Some(EntityKind::City)).unwrap();
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].to_dict()["state_id"], state.id());
    }
}
