//! Subcommands and their dispatch.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use clap::Subcommand;
use tracing::info;

use ormadmin_core::admin::{ExportRequest, ListRequest, ModelAdmin};
use ormadmin_core::query::related_fields;
use ormadmin_core::{write_json, AdminRegistry, MemoryStore};

use crate::error::{Error, Result};
use crate::formatter::Formatter;

/// Admin commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List registered models
    Models,

    /// Show the exportable field paths of a model
    Fields {
        /// Model name or admin name
        model: String,
    },

    /// List rows of a model
    List {
        /// Model name or admin name
        model: String,
        /// Page number (1-indexed)
        #[arg(long, default_value_t = 1)]
        page: u64,
        /// Sort column; prefix with '-' for descending
        #[arg(long, allow_hyphen_values = true)]
        ordering: Option<String>,
        /// Filter as key=value, e.g. author__username__icontains=ann
        #[arg(long = "filter", value_name = "KEY=VALUE")]
        filters: Vec<String>,
    },

    /// Export field paths of matching rows as a JSON array
    Export {
        /// Model name or admin name
        model: String,
        /// Field path to export; repeat for more columns
        #[arg(long = "field", required = true)]
        fields: Vec<String>,
        /// Restrict to these primary keys
        #[arg(long = "id")]
        ids: Vec<String>,
        /// Sort column; prefix with '-' for descending
        #[arg(long, allow_hyphen_values = true)]
        ordering: Option<String>,
        /// Filter as key=value
        #[arg(long = "filter", value_name = "KEY=VALUE")]
        filters: Vec<String>,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show what deleting rows would cascade to
    DeletePreview {
        /// Model name or admin name
        model: String,
        /// Primary keys of the rows to delete
        #[arg(long = "id", required = true)]
        ids: Vec<String>,
    },

    /// Search candidates for a foreign-key field
    Lookup {
        /// Model name or admin name
        model: String,
        /// Foreign-key field
        field: String,
        /// Case-insensitive search term
        #[arg(short, long)]
        query: Option<String>,
        /// Page number (1-indexed)
        #[arg(long, default_value_t = 1)]
        page: u64,
    },
}

/// Everything a command runs against.
pub struct Context<'a> {
    /// Registered admins.
    pub registry: &'a AdminRegistry,
    /// Loaded rows.
    pub store: &'a MemoryStore,
    /// Output formatter.
    pub formatter: &'a dyn Formatter,
}

impl<'a> Context<'a> {
    /// Resolve a model argument by model name, then by admin name.
    fn admin(&self, model: &str) -> Result<&'a ModelAdmin> {
        self.registry
            .get_admin_for(model)
            .or_else(|| self.registry.by_admin_name(model))
            .ok_or_else(|| Error::UnknownAdmin(model.to_string()))
    }
}

/// Split `key=value` filter arguments.
pub fn parse_filters(raw: &[String]) -> Result<Vec<(String, String)>> {
    raw.iter()
        .map(|f| {
            f.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                .filter(|(k, _)| !k.is_empty())
                .ok_or_else(|| Error::InvalidFilter(f.clone()))
        })
        .collect()
}

/// Run a command and return its printable output.
pub fn execute(ctx: &Context<'_>, command: Command) -> Result<String> {
    match command {
        Command::Models => Ok(ctx.formatter.format_models(&ctx.registry.model_admins())),

        Command::Fields { model } => {
            let admin = ctx.admin(&model)?;
            let related = related_fields(admin.schema(), &admin.model().name)?;
            Ok(ctx.formatter.format_fields(&related))
        }

        Command::List {
            model,
            page,
            ordering,
            filters,
        } => {
            let admin = ctx.admin(&model)?;
            let request = ListRequest {
                page,
                ordering,
                filters: parse_filters(&filters)?,
            };
            let page = admin.list(ctx.store, &request)?;
            Ok(ctx.formatter.format_list(admin, &page))
        }

        Command::Export {
            model,
            fields,
            ids,
            ordering,
            filters,
            output,
        } => {
            let admin = ctx.admin(&model)?;
            let request = ExportRequest {
                fields,
                ids,
                ordering,
                filters: parse_filters(&filters)?,
            };
            let export = admin.export(ctx.store, &request)?;

            match output {
                Some(path) => {
                    let file = File::create(&path).map_err(|source| Error::File {
                        path: path.clone(),
                        source,
                    })?;
                    let rows = write_json(BufWriter::new(file), &export.projection, &export.rows)?;
                    info!(path = %path.display(), rows, "wrote export");
                    Ok(format!("exported {rows} row(s) to {}", path.display()))
                }
                None => {
                    let mut buf = Vec::new();
                    write_json(&mut buf, &export.projection, &export.rows)?;
                    String::from_utf8(buf)
                        .map_err(|e| Error::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
                }
            }
        }

        Command::DeletePreview { model, ids } => {
            let admin = ctx.admin(&model)?;
            let previews = admin.delete_preview(ctx.store, &ids)?;
            Ok(ctx.formatter.format_delete_preview(admin, &previews))
        }

        Command::Lookup {
            model,
            field,
            query,
            page,
        } => {
            let admin = ctx.admin(&model)?;
            let page = admin.lookup(ctx.store, &field, query.as_deref(), page)?;
            Ok(ctx.formatter.format_lookup(&page))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filters() {
        let parsed = parse_filters(&["name=ann".into(), "tags__in=a,b=c".into()]).unwrap();
        assert_eq!(parsed[0], ("name".to_string(), "ann".to_string()));
        assert_eq!(parsed[1].1, "a,b=c");

        assert!(matches!(
            parse_filters(&["nonsense".into()]),
            Err(Error::InvalidFilter(_))
        ));
        assert!(parse_filters(&["=x".into()]).is_err());
    }
}
