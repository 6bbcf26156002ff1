//! Entity catalog
//!
//! Declares the entity types projections are written against and the
//! declared type of every member. Catalogs are loaded from YAML:
//!
//! ```yaml
//! entities:
//!   - name: Customer
//!     properties:
//!       Name: text
//!       Age: int
//!       Vip: bool
//!       OrderSet: set<Order>
//!       OrderList: list<Order>
//!   - name: Order
//!     properties:
//!       Id: int
//!       Total: float
//! ```
//!
//! Property types are `int`, `float`, `bool`, `text`, `object`, the name of
//! another entity, or `set<T>` / `list<T>` of any of those.

pub mod errors;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::query_planner::logical_expr::{CollectionKind, ValueType};

pub use errors::CatalogError;

/// Catalog file layout as written in YAML.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EntityCatalogConfig {
    #[serde(default)]
    pub entities: Vec<EntityDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDefinition {
    pub name: String,
    /// Property name to type string.
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

/// A resolved entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityType {
    pub name: String,
    pub properties: HashMap<String, ValueType>,
}

impl EntityType {
    pub fn property(&self, name: &str) -> Result<&ValueType, CatalogError> {
        self.properties.get(name).ok_or_else(|| {
            CatalogError::unknown_property_with_candidates(
                &self.name,
                name,
                self.properties.keys().map(String::as_str),
            )
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct EntityCatalog {
    entities: HashMap<String, EntityType>,
}

impl EntityCatalog {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let config: EntityCatalogConfig =
            serde_yaml::from_str(yaml).map_err(|e| CatalogError::ConfigParseError {
                error: e.to_string(),
            })?;
        Self::from_config(config)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| CatalogError::ConfigReadError {
                error: format!("{}: {}", path.as_ref().display(), e),
            })?;
        Self::from_yaml_str(&content)
    }

    /// Resolve every property type string. Entity references must name an
    /// entity defined in the same catalog.
    pub fn from_config(config: EntityCatalogConfig) -> Result<Self, CatalogError> {
        let mut names: Vec<&str> = Vec::with_capacity(config.entities.len());
        for definition in &config.entities {
            if names.contains(&definition.name.as_str()) {
                return Err(CatalogError::DuplicateEntity {
                    entity: definition.name.clone(),
                });
            }
            names.push(&definition.name);
        }

        let mut entities = HashMap::with_capacity(config.entities.len());
        for definition in &config.entities {
            let mut properties = HashMap::with_capacity(definition.properties.len());
            for (property, type_name) in &definition.properties {
                let ty = parse_type(type_name, &names).ok_or_else(|| {
                    CatalogError::InvalidPropertyType {
                        entity: definition.name.clone(),
                        property: property.clone(),
                        type_name: type_name.clone(),
                    }
                })?;
                properties.insert(property.clone(), ty);
            }
            log::debug!(
                "EntityCatalog: loaded entity {} with {} properties",
                definition.name,
                properties.len()
            );
            entities.insert(
                definition.name.clone(),
                EntityType {
                    name: definition.name.clone(),
                    properties,
                },
            );
        }

        Ok(Self { entities })
    }

    pub fn entity(&self, name: &str) -> Result<&EntityType, CatalogError> {
        self.entities
            .get(name)
            .ok_or_else(|| CatalogError::UnknownEntity {
                entity: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    /// Declared type of `entity.property`.
    pub fn property_type(&self, entity: &str, property: &str) -> Result<ValueType, CatalogError> {
        self.entity(entity)?.property(property).cloned()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Parse a property type string; `None` if it is malformed or names an
/// unknown entity.
fn parse_type(type_name: &str, entities: &[&str]) -> Option<ValueType> {
    let type_name = type_name.trim();

    for (prefix, kind) in [("set<", CollectionKind::Set), ("list<", CollectionKind::List)] {
        if type_name
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
        {
            let inner = type_name[prefix.len()..].strip_suffix('>')?;
            return Some(ValueType::Collection {
                kind,
                element: Box::new(parse_type(inner, entities)?),
            });
        }
    }

    match type_name.to_ascii_lowercase().as_str() {
        "int" => Some(ValueType::Int),
        "float" => Some(ValueType::Float),
        "bool" => Some(ValueType::Bool),
        "text" | "string" => Some(ValueType::Text),
        "object" => Some(ValueType::Object),
        _ => entities
            .contains(&type_name)
            .then(|| ValueType::entity(type_name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SHOP: &str = r#"
entities:
  - name: Customer
    properties:
      Name: text
      Age: int
      Vip: bool
      OrderSet: set<Order>
      OrderList: List<Order>
      Tags: set<text>
  - name: Order
    properties:
      Id: int
      Total: float
"#;

    #[test]
    fn test_load_catalog() {
        let catalog = EntityCatalog::from_yaml_str(SHOP).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.property_type("Customer", "OrderSet").unwrap(),
            ValueType::set_of(ValueType::entity("Order"))
        );
        assert_eq!(
            catalog.property_type("Customer", "OrderList").unwrap(),
            ValueType::list_of(ValueType::entity("Order"))
        );
        assert_eq!(
            catalog.property_type("Customer", "Tags").unwrap(),
            ValueType::set_of(ValueType::Text)
        );
        assert_eq!(
            catalog.property_type("Customer", "Name").unwrap(),
            ValueType::Text
        );
    }

    #[test]
    fn test_unknown_entity_and_property() {
        let catalog = EntityCatalog::from_yaml_str(SHOP).unwrap();
        assert_eq!(
            catalog.entity("Supplier").unwrap_err(),
            CatalogError::UnknownEntity {
                entity: "Supplier".to_string()
            }
        );
        let err = catalog.property_type("Order", "Customer").unwrap_err();
        assert!(matches!(err, CatalogError::UnknownProperty { .. }));
        assert!(err.to_string().contains("known: Id, Total"));
    }

    #[test]
    fn test_property_type_must_resolve() {
        let yaml = r#"
entities:
  - name: Customer
    properties:
      OrderSet: set<Order>
"#;
        let err = EntityCatalog::from_yaml_str(yaml).unwrap_err();
        assert_eq!(
            err,
            CatalogError::InvalidPropertyType {
                entity: "Customer".to_string(),
                property: "OrderSet".to_string(),
                type_name: "set<Order>".to_string(),
            }
        );
    }

    #[test]
    fn test_duplicate_entity() {
        let yaml = "entities:\n  - name: A\n  - name: A\n";
        assert!(matches!(
            EntityCatalog::from_yaml_str(yaml),
            Err(CatalogError::DuplicateEntity { .. })
        ));
    }

    #[test]
    fn test_malformed_yaml() {
        assert!(matches!(
            EntityCatalog::from_yaml_str("entities: [ {name: "),
            Err(CatalogError::ConfigParseError { .. })
        ));
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", SHOP).unwrap();
        let catalog = EntityCatalog::from_yaml_file(file.path()).unwrap();
        assert!(catalog.contains("Order"));

        assert!(matches!(
            EntityCatalog::from_yaml_file("/nonexistent/catalog.yaml"),
            Err(CatalogError::ConfigReadError { .. })
        ));
    }

    #[test]
    fn test_parse_nested_collection() {
        assert_eq!(
            parse_type("list<set<int>>", &[]),
            Some(ValueType::list_of(ValueType::set_of(ValueType::Int)))
        );
        assert_eq!(parse_type("set<int", &[]), None);
        assert_eq!(parse_type("Order", &[]), None);
    }
}
