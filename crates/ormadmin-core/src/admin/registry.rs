//! Registry of administered models.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::model_admin::ModelAdmin;
use super::options::AdminOptions;
use crate::catalog::Schema;
use crate::error::Error;

/// The set of models exposed through the admin.
///
/// Built once at startup and passed by reference afterwards.
#[derive(Debug, Clone)]
pub struct AdminRegistry {
    schema: Arc<Schema>,
    admins: HashMap<String, ModelAdmin>,
}

impl AdminRegistry {
    /// Create an empty registry over `schema`.
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            admins: HashMap::new(),
        }
    }

    /// The schema admins are built against.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Register `model`, replacing any previous registration.
    pub fn register(&mut self, model: &str, options: AdminOptions) -> Result<&ModelAdmin, Error> {
        let admin = ModelAdmin::new(Arc::clone(&self.schema), model, options)?;
        debug!(model, admin = %admin.admin_name(), group = admin.group(), "registered model admin");
        self.admins.insert(model.to_string(), admin);
        self.get_admin_for(model)
            .ok_or_else(|| Error::NotRegistered(model.to_string()))
    }

    /// Remove a registration.
    pub fn unregister(&mut self, model: &str) -> Result<ModelAdmin, Error> {
        self.admins
            .remove(model)
            .ok_or_else(|| Error::NotRegistered(model.to_string()))
    }

    /// Check if a model is registered.
    pub fn contains(&self, model: &str) -> bool {
        self.admins.contains_key(model)
    }

    /// Admin for `model`, if registered.
    pub fn get_admin_for(&self, model: &str) -> Option<&ModelAdmin> {
        self.admins.get(model)
    }

    /// Admin for `model`, failing with `NotRegistered`.
    pub fn admin(&self, model: &str) -> Result<&ModelAdmin, Error> {
        self.get_admin_for(model)
            .ok_or_else(|| Error::NotRegistered(model.to_string()))
    }

    /// Admin whose slug is `name`.
    pub fn by_admin_name(&self, name: &str) -> Option<&ModelAdmin> {
        self.admins.values().find(|a| a.admin_name() == name)
    }

    /// Every admin, sorted by admin name.
    pub fn model_admins(&self) -> Vec<&ModelAdmin> {
        let mut admins: Vec<&ModelAdmin> = self.admins.values().collect();
        admins.sort_by_key(|a| a.admin_name());
        admins
    }

    /// Admins in a menu group, sorted by admin name.
    pub fn group_admins(&self, group: &str) -> Vec<&ModelAdmin> {
        let mut admins: Vec<&ModelAdmin> =
            self.admins.values().filter(|a| a.group() == group).collect();
        admins.sort_by_key(|a| a.admin_name());
        admins
    }

    /// Number of registered models.
    pub fn len(&self) -> usize {
        self.admins.len()
    }

    /// Check if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.admins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FieldDef, ModelDef, ScalarType};

    fn registry() -> AdminRegistry {
        let models = ["Zebra", "Apple", "Mango"].map(|name| {
            ModelDef::new(name, "id").with_field(FieldDef::scalar("id", ScalarType::Int))
        });
        AdminRegistry::new(Arc::new(Schema::new(models).unwrap()))
    }

    #[test]
    fn test_register_and_sort() {
        let mut reg = registry();
        reg.register("Zebra", AdminOptions::default()).unwrap();
        reg.register("Apple", AdminOptions::new().group("fruit")).unwrap();
        reg.register("Mango", AdminOptions::new().group("fruit")).unwrap();

        let names: Vec<String> = reg.model_admins().iter().map(|a| a.admin_name()).collect();
        assert_eq!(names, vec!["apple", "mango", "zebra"]);

        let fruit: Vec<String> = reg.group_admins("fruit").iter().map(|a| a.admin_name()).collect();
        assert_eq!(fruit, vec!["apple", "mango"]);
        assert_eq!(reg.by_admin_name("zebra").map(|a| a.model().name.as_str()), Some("Zebra"));
    }

    #[test]
    fn test_register_unknown_model() {
        let mut reg = registry();
        assert!(matches!(
            reg.register("Kiwi", AdminOptions::default()),
            Err(Error::UnknownModel(_))
        ));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_unregister() {
        let mut reg = registry();
        reg.register("Apple", AdminOptions::default()).unwrap();
        assert!(reg.contains("Apple"));
        reg.unregister("Apple").unwrap();
        assert!(reg.get_admin_for("Apple").is_none());
        assert!(matches!(reg.unregister("Apple"), Err(Error::NotRegistered(_))));
    }
}
