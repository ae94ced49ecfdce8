//! Admin layer: per-model options and operations, and the registry tying them together.

mod model_admin;
mod options;
mod registry;

pub use model_admin::{
    DeletePreview, Export, ExportRequest, ListPage, ListRequest, LookupItem, LookupPage,
    ModelAdmin,
};
pub use options::{AdminOptions, DEFAULT_GROUP};
pub use registry::AdminRegistry;

/// Lowercase `name` and collapse every run of other characters into one `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
