//! Output formatters for command results.

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use serde_json::json;

use ormadmin_core::admin::{DeletePreview, ListPage, LookupPage, ModelAdmin};
use ormadmin_core::query::RelatedModel;
use ormadmin_core::Value;

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter {
    /// Format the registered admins.
    fn format_models(&self, admins: &[&ModelAdmin]) -> String;

    /// Format the exportable field tree of a model.
    fn format_fields(&self, related: &[RelatedModel]) -> String;

    /// Format one list page.
    fn format_list(&self, admin: &ModelAdmin, page: &ListPage) -> String;

    /// Format delete previews.
    fn format_delete_preview(&self, admin: &ModelAdmin, previews: &[DeletePreview]) -> String;

    /// Format a lookup page.
    fn format_lookup(&self, page: &LookupPage) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_models(&self, admins: &[&ModelAdmin]) -> String {
        let mut table = Table::new();
        table.set_header(vec!["Admin", "Model", "Group"]);
        for admin in admins {
            table.add_row(vec![admin.admin_name(), admin.display_name(), admin.group().to_string()]);
        }
        table.to_string()
    }

    fn format_fields(&self, related: &[RelatedModel]) -> String {
        let mut table = Table::new();
        table.set_header(vec!["Prefix", "Model", "Fields"]);
        for r in related {
            let prefix = if r.prefix.is_empty() { "-" } else { &r.prefix };
            table.add_row(vec![prefix.to_string(), r.model.clone(), r.fields.join("\n")]);
        }
        table.to_string()
    }

    fn format_list(&self, admin: &ModelAdmin, page: &ListPage) -> String {
        let mut table = Table::new();
        table.set_header(
            page.columns
                .iter()
                .map(|c| Cell::new(admin.column_label(c)))
                .collect::<Vec<_>>(),
        );
        for row in &page.rows {
            table.add_row(
                page.columns
                    .iter()
                    .map(|c| Cell::new(format_value(row.get(c))))
                    .collect::<Vec<_>>(),
            );
        }

        let mut output = format!(
            "{}\npage {} of {} ({} row(s))",
            table, page.page, page.pages, page.total
        );
        if !page.active_filters.is_empty() {
            let filters: Vec<String> = page
                .active_filters
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            output.push_str(&format!("\nfilters: {}", filters.join(", ")));
        }
        output
    }

    fn format_delete_preview(&self, admin: &ModelAdmin, previews: &[DeletePreview]) -> String {
        if previews.is_empty() {
            return "No matching rows".to_string();
        }

        let mut output = String::new();
        for preview in previews {
            if !output.is_empty() {
                output.push_str("\n\n");
            }
            output.push_str(&format!(
                "{} {}",
                admin.display_name(),
                format_value(Some(&preview.pk))
            ));

            if preview.dependencies.is_empty() {
                output.push_str("\nno dependent rows");
                continue;
            }

            let mut table = Table::new();
            table.set_header(vec!["Depth", "Model", "Rows"]);
            for group in &preview.dependencies {
                table.add_row(vec![
                    group.depth.to_string(),
                    group.model.clone(),
                    group.len().to_string(),
                ]);
            }
            output.push('\n');
            output.push_str(&table.to_string());
        }
        output
    }

    fn format_lookup(&self, page: &LookupPage) -> String {
        let mut table = Table::new();
        table.set_header(vec!["Id", "Value"]);
        for item in &page.object_list {
            table.add_row(vec![format_value(Some(&item.id)), item.repr.clone()]);
        }
        format!(
            "{}\nprevious: {}, next: {}",
            table, page.prev_page, page.next_page
        )
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_models(&self, admins: &[&ModelAdmin]) -> String {
        let items: Vec<serde_json::Value> = admins
            .iter()
            .map(|a| {
                json!({
                    "admin": a.admin_name(),
                    "model": a.model().name,
                    "display_name": a.display_name(),
                    "group": a.group(),
                })
            })
            .collect();
        to_pretty(&items)
    }

    fn format_fields(&self, related: &[RelatedModel]) -> String {
        let items: Vec<serde_json::Value> = related
            .iter()
            .map(|r| json!({"prefix": r.prefix, "model": r.model, "fields": r.fields}))
            .collect();
        to_pretty(&items)
    }

    fn format_list(&self, _admin: &ModelAdmin, page: &ListPage) -> String {
        to_pretty(page)
    }

    fn format_delete_preview(&self, _admin: &ModelAdmin, previews: &[DeletePreview]) -> String {
        let items: Vec<serde_json::Value> = previews
            .iter()
            .map(|p| {
                let groups: Vec<serde_json::Value> = p
                    .dependencies
                    .iter()
                    .map(|g| json!({"model": g.model, "depth": g.depth, "rows": g.rows}))
                    .collect();
                json!({"pk": p.pk, "row": p.row, "dependencies": groups})
            })
            .collect();
        to_pretty(&items)
    }

    fn format_lookup(&self, page: &LookupPage) -> String {
        to_pretty(page)
    }
}

fn to_pretty<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}

/// Format a cell value; missing columns and nulls print as `NULL`.
fn format_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "NULL".to_string(),
        Some(v) => v.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ormadmin_core::{AdminOptions, FieldDef, ModelDef, Row, ScalarType, Schema};

    use super::*;

    fn admin() -> ModelAdmin {
        let user = ModelDef::new("User", "id")
            .with_field(FieldDef::scalar("id", ScalarType::Int))
            .with_field(FieldDef::optional_scalar("full_name", ScalarType::String));
        let schema = Arc::new(Schema::new(vec![user]).unwrap());
        ModelAdmin::new(schema, "User", AdminOptions::default()).unwrap()
    }

    fn page() -> ListPage {
        ListPage {
            columns: vec!["id".into(), "full_name".into()],
            rows: vec![Row::new().with("id", 1).with("full_name", Value::Null)],
            page: 1,
            pages: 1,
            total: 1,
            active_filters: Default::default(),
        }
    }

    #[test]
    fn test_table_list() {
        let output = TableFormatter.format_list(&admin(), &page());
        assert!(output.contains("Full Name"));
        assert!(output.contains("NULL"));
        assert!(output.ends_with("page 1 of 1 (1 row(s))"));
    }

    #[test]
    fn test_json_list() {
        let output = JsonFormatter.format_list(&admin(), &page());
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["total"], 1);
        assert_eq!(parsed["rows"][0]["id"], 1);
    }

    #[test]
    fn test_lookup_navigation_line() {
        let page = LookupPage {
            prev_page: 0,
            next_page: 2,
            object_list: Vec::new(),
        };
        assert!(TableFormatter.format_lookup(&page).ends_with("previous: 0, next: 2"));
    }

    #[test]
    fn test_format_display() {
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }
}
