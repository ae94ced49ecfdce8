//! Schema - the validated set of model descriptors.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::model::ModelDef;
use super::relation::ForeignKeyEdge;
use crate::error::Error;

/// All model descriptors known to the admin, in declaration order.
///
/// Construction validates every model and every foreign-key target, so code
/// holding a `Schema` may assume references resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ModelDef>", into = "Vec<ModelDef>")]
pub struct Schema {
    models: Vec<ModelDef>,
    index: HashMap<String, usize>,
}

impl Schema {
    /// Build and validate a schema.
    pub fn new(models: impl IntoIterator<Item = ModelDef>) -> Result<Self, Error> {
        let models: Vec<ModelDef> = models.into_iter().collect();
        let mut index = HashMap::with_capacity(models.len());

        for (i, model) in models.iter().enumerate() {
            model.validate()?;
            if index.insert(model.name.clone(), i).is_some() {
                return Err(Error::InvalidSchema(format!(
                    "duplicate model `{}`",
                    model.name
                )));
            }
        }

        for model in &models {
            for field in model.foreign_keys() {
                let target = field.target().unwrap_or_default();
                if !index.contains_key(target) {
                    return Err(Error::InvalidSchema(format!(
                        "`{}.{}` references unknown model `{}`",
                        model.name, field.name, target
                    )));
                }
            }
        }

        Ok(Self { models, index })
    }

    /// Get a model by name.
    pub fn get_model(&self, name: &str) -> Option<&ModelDef> {
        self.index.get(name).map(|&i| &self.models[i])
    }

    /// Get a model by name, failing with `UnknownModel`.
    pub fn model(&self, name: &str) -> Result<&ModelDef, Error> {
        self.get_model(name)
            .ok_or_else(|| Error::UnknownModel(name.to_string()))
    }

    /// Check if a model exists.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Models in declaration order.
    pub fn models(&self) -> impl Iterator<Item = &ModelDef> {
        self.models.iter()
    }

    /// Model names in declaration order.
    pub fn model_names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name.as_str()).collect()
    }

    /// Every foreign-key edge, ordered by model then field declaration.
    pub fn edges(&self) -> impl Iterator<Item = ForeignKeyEdge<'_>> {
        self.models.iter().flat_map(|model| {
            model.foreign_keys().map(move |field| ForeignKeyEdge {
                from_model: &model.name,
                from_field: &field.name,
                to_model: field.target().unwrap_or_default(),
                nullable: field.is_nullable(),
            })
        })
    }

    /// Edges pointing at `model`, nullable ones included.
    pub fn edges_to<'a>(&'a self, model: &'a str) -> impl Iterator<Item = ForeignKeyEdge<'a>> {
        self.edges().filter(move |e| e.to_model == model)
    }

    /// Non-nullable edges pointing at `model`: the ones a delete cascades through.
    pub fn dependency_edges_to<'a>(
        &'a self,
        model: &'a str,
    ) -> impl Iterator<Item = ForeignKeyEdge<'a>> {
        self.edges_to(model).filter(|e| e.is_cascading())
    }
}

impl TryFrom<Vec<ModelDef>> for Schema {
    type Error = Error;

    fn try_from(models: Vec<ModelDef>) -> Result<Self, Self::Error> {
        Schema::new(models)
    }
}

impl From<Schema> for Vec<ModelDef> {
    fn from(schema: Schema) -> Self {
        schema.models
    }
}
