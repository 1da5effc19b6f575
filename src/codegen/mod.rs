//! Record type generation: one Rust module per table, written once and never overwritten.

mod render;

use std::fs;
use std::path::{Path, PathBuf};

use heck::ToSnakeCase;
use tracing::{debug, info, warn};

pub use render::render_definition;

use crate::error::SqlRecordsError;
use crate::executor::Executor;
use crate::schema::{Introspector, TableDefinition, class_name_for};

/// Crate path generated code uses when none is configured.
pub const DEFAULT_CRATE_PATH: &str = "sql_records";

/// Where and how the generator writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub out_dir: PathBuf,
    /// Path generated code uses to name this crate (`sql_records`, `crate::db`, ...).
    pub crate_path: String,
    /// Restrict the run to these tables; empty means every table.
    pub tables: Vec<String>,
}

impl GeneratorOptions {
    #[must_use]
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            crate_path: DEFAULT_CRATE_PATH.to_string(),
            tables: Vec::new(),
        }
    }

    #[must_use]
    pub fn crate_path(mut self, crate_path: impl Into<String>) -> Self {
        self.crate_path = crate_path.into();
        self
    }

    #[must_use]
    pub fn tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables = tables.into_iter().map(Into::into).collect();
        self
    }
}

/// Outcome of one [`Generator::run`].
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub written: Vec<PathBuf>,
    /// Files that already existed and were left alone.
    pub skipped: Vec<PathBuf>,
    /// Tables that could not be generated, with the reason.
    pub failed: Vec<(String, SqlRecordsError)>,
}

impl GenerationReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Generator {
    options: GeneratorOptions,
}

impl Generator {
    #[must_use]
    pub fn new(options: GeneratorOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Generate every selected table of the database behind `db`.
    ///
    /// A table whose file already exists is skipped without querying it. A table that fails
    /// to introspect, classify or render is recorded in [`GenerationReport::failed`] and
    /// nothing is written for it; the run continues with the next table.
    ///
    /// # Errors
    /// Listing tables or creating the output directory failed.
    pub fn run(&self, db: &Executor) -> Result<GenerationReport, SqlRecordsError> {
        let introspector = Introspector::new(db);
        let tables: Vec<String> = introspector
            .tables()?
            .into_iter()
            .filter(|t| self.options.tables.is_empty() || self.options.tables.contains(t))
            .collect();
        for wanted in &self.options.tables {
            if !tables.contains(wanted) {
                warn!(table = wanted.as_str(), "requested table not found");
            }
        }

        fs::create_dir_all(&self.options.out_dir)?;

        let mut report = GenerationReport::default();
        for table in tables {
            let path = self.output_path(&table);
            if path.exists() {
                info!(table = table.as_str(), path = %path.display(), "file exists, skipped");
                report.skipped.push(path);
                continue;
            }

            match introspector
                .definition(&table)
                .and_then(|def| self.write_definition(&def, &path))
            {
                Ok(()) => {
                    info!(table = table.as_str(), path = %path.display(), "generated");
                    report.written.push(path);
                }
                Err(err) => {
                    warn!(table = table.as_str(), error = %err, "generation failed");
                    report.failed.push((table, err));
                }
            }
        }
        Ok(report)
    }

    /// Write one already built definition. Returns `Ok(None)` when the file already exists.
    ///
    /// # Errors
    /// Rendering or writing the file failed.
    pub fn generate_table(
        &self,
        definition: &TableDefinition,
    ) -> Result<Option<PathBuf>, SqlRecordsError> {
        fs::create_dir_all(&self.options.out_dir)?;
        let path = self.output_path(&definition.table_name);
        if path.exists() {
            return Ok(None);
        }
        self.write_definition(definition, &path)?;
        Ok(Some(path))
    }

    /// `user_profile` → `<out_dir>/user_profile.rs`.
    #[must_use]
    pub fn output_path(&self, table: &str) -> PathBuf {
        self.options
            .out_dir
            .join(format!("{}.rs", class_name_for(table).to_snake_case()))
    }

    fn write_definition(
        &self,
        definition: &TableDefinition,
        path: &Path,
    ) -> Result<(), SqlRecordsError> {
        let source = render_definition(definition, &self.options.crate_path)?;
        // a half-written file would be skipped forever on the next run
        let tmp = path.with_extension("rs.tmp");
        fs::write(&tmp, source)?;
        fs::rename(&tmp, path)?;
        debug!(path = %path.display(), "wrote record module");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDescriptor, KeyRole};

    fn definition() -> TableDefinition {
        TableDefinition::from_columns("UserProfile", &[
            ColumnDescriptor::new("id", "int")
                .key_role(KeyRole::Primary)
                .extra("auto_increment"),
            ColumnDescriptor::new("name", "varchar(10)"),
        ])
        .unwrap()
    }

    #[test]
    fn file_name_is_snake_case_class() {
        let generator = Generator::new(GeneratorOptions::new("out"));
        assert_eq!(
            generator.output_path("UserProfile"),
            PathBuf::from("out/user_profile.rs")
        );
        assert_eq!(
            generator.output_path("order-items"),
            PathBuf::from("out/order_items.rs")
        );
    }

    #[test]
    fn existing_file_is_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Generator::new(GeneratorOptions::new(dir.path().join("records")));
        let def = definition();

        let path = generator.generate_table(&def).unwrap().unwrap();
        fs::write(&path, "// edited by hand\n").unwrap();

        assert_eq!(generator.generate_table(&def).unwrap(), None);
        assert_eq!(fs::read_to_string(&path).unwrap(), "// edited by hand\n");
        assert!(!path.with_extension("rs.tmp").exists());
    }
}
