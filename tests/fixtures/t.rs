//! Record type for the `t` table.
//!
//! Generated once by sql-records; it is never overwritten, so local edits are kept.
/// Definition of the `t` table.
pub static T: ::std::sync::LazyLock<sql_records::schema::TableDefinition> = ::std::sync::LazyLock::new(||
sql_records::schema::TableDefinition::assemble(
    "t",
    ::std::option::Option::Some("id".to_string()),
    vec![
        sql_records::schema::FieldDef::new("id", "id", sql_records::schema::FieldClassification {
            semantic_type: sql_records::schema::SemanticType::Int,
            nullable: false,
            lazy: false,
            insertable: true,
            updatable: false,
            default: sql_records::schema::FieldDefault::None,
            accessor: sql_records::schema::FieldAccessor::AutoIncrement,
        }),
        sql_records::schema::FieldDef::new("name", "name", sql_records::schema::FieldClassification {
            semantic_type: sql_records::schema::SemanticType::String,
            nullable: false,
            lazy: false,
            insertable: true,
            updatable: true,
            default: sql_records::schema::FieldDefault::None,
            accessor: sql_records::schema::FieldAccessor::Plain,
        }),
        sql_records::schema::FieldDef::new("bio", "bio", sql_records::schema::FieldClassification {
            semantic_type: sql_records::schema::SemanticType::String,
            nullable: true,
            lazy: true,
            insertable: true,
            updatable: true,
            default: sql_records::schema::FieldDefault::None,
            accessor: sql_records::schema::FieldAccessor::Plain,
        }),
        sql_records::schema::FieldDef::new("status", "status", sql_records::schema::FieldClassification {
            semantic_type: sql_records::schema::SemanticType::Enum,
            nullable: false,
            lazy: false,
            insertable: true,
            updatable: true,
            default: sql_records::schema::FieldDefault::Str("new".to_string()),
            accessor: sql_records::schema::FieldAccessor::Enum {
                values: vec!["new".to_string(), "done".to_string()],
                multiple: false,
            },
        }),
        sql_records::schema::FieldDef::new("created", "created", sql_records::schema::FieldClassification {
            semantic_type: sql_records::schema::SemanticType::Timestamp,
            nullable: true,
            lazy: false,
            insertable: false,
            updatable: false,
            default: sql_records::schema::FieldDefault::DbGenerated("CURRENT_TIMESTAMP".to_string()),
            accessor: sql_records::schema::FieldAccessor::Timestamp,
        }),
    ],
    vec![
        sql_records::schema::ColumnDescriptor {
            name: "id".to_string(),
            sql_type: "INTEGER".to_string(),
            nullable: false,
            default: ::std::option::Option::None,
            key_role: sql_records::schema::KeyRole::Primary,
            extra: "auto_increment".to_string(),
            is_enum_or_set: false,
            enum_values: vec![],
        },
        sql_records::schema::ColumnDescriptor {
            name: "name".to_string(),
            sql_type: "varchar(10)".to_string(),
            nullable: false,
            default: ::std::option::Option::None,
            key_role: sql_records::schema::KeyRole::None,
            extra: "".to_string(),
            is_enum_or_set: false,
            enum_values: vec![],
        },
        sql_records::schema::ColumnDescriptor {
            name: "bio".to_string(),
            sql_type: "text".to_string(),
            nullable: true,
            default: ::std::option::Option::None,
            key_role: sql_records::schema::KeyRole::None,
            extra: "".to_string(),
            is_enum_or_set: false,
            enum_values: vec![],
        },
        sql_records::schema::ColumnDescriptor {
            name: "status".to_string(),
            sql_type: "enum('new','done')".to_string(),
            nullable: false,
            default: ::std::option::Option::Some("new".to_string()),
            key_role: sql_records::schema::KeyRole::None,
            extra: "".to_string(),
            is_enum_or_set: true,
            enum_values: vec!["new".to_string(), "done".to_string()],
        },
        sql_records::schema::ColumnDescriptor {
            name: "created".to_string(),
            sql_type: "timestamp".to_string(),
            nullable: true,
            default: ::std::option::Option::Some("CURRENT_TIMESTAMP".to_string()),
            key_role: sql_records::schema::KeyRole::None,
            extra: "".to_string(),
            is_enum_or_set: false,
            enum_values: vec![],
        },
    ],
));
/// One row of `t`.
#[derive(Debug)]
pub struct T<'db> {
    record: sql_records::Record<'db>,
}
impl<'db> T<'db> {
    pub const STATUS_NEW: &'static str = "new";
    pub const STATUS_DONE: &'static str = "done";
    /// `id` (INTEGER, primary key).
    #[must_use]
    pub fn id(&self) -> ::std::option::Option<i64> {
        self.record.peek("id").and_then(sql_records::RowValues::as_int).copied()
    }
    /// Set `id`; ignored once the record is loaded.
    ///
    /// # Errors
    /// `ValidationError` when the value is rejected; nothing is stored then.
    pub fn set_id(
        &mut self,
        value: i64,
    ) -> ::std::result::Result<(), sql_records::SqlRecordsError> {
        self.record.set("id", value)
    }
    /// `name` (varchar(10)).
    #[must_use]
    pub fn name(&self) -> ::std::option::Option<&str> {
        self.record.peek("name").and_then(sql_records::RowValues::as_text)
    }
    /// Set `name`.
    ///
    /// # Errors
    /// `ValidationError` when the value is rejected; nothing is stored then.
    pub fn set_name(
        &mut self,
        value: &str,
    ) -> ::std::result::Result<(), sql_records::SqlRecordsError> {
        self.record.set("name", value)
    }
    /// `bio` (text).
    ///
    /// Loaded from the database on first access.
    pub fn bio(
        &mut self,
    ) -> ::std::result::Result<
        ::std::option::Option<String>,
        sql_records::SqlRecordsError,
    > {
        Ok(self.record.get("bio")?.as_text().map(str::to_string))
    }
    /// Set `bio`.
    ///
    /// # Errors
    /// `ValidationError` when the value is rejected; nothing is stored then.
    pub fn set_bio(
        &mut self,
        value: ::std::option::Option<&str>,
    ) -> ::std::result::Result<(), sql_records::SqlRecordsError> {
        self.record.set("bio", value)
    }
    /// `status` (enum('new','done')).
    #[must_use]
    pub fn status(&self) -> ::std::option::Option<&str> {
        self.record.peek("status").and_then(sql_records::RowValues::as_text)
    }
    /// Set `status`; accepted values: new, done.
    ///
    /// # Errors
    /// `ValidationError` when the value is rejected; nothing is stored then.
    pub fn set_status(
        &mut self,
        value: &str,
    ) -> ::std::result::Result<(), sql_records::SqlRecordsError> {
        self.record.set("status", value)
    }
    /// `created` (timestamp).
    #[must_use]
    pub fn created(&self) -> ::std::option::Option<sql_records::chrono::NaiveDateTime> {
        self.record.peek("created").and_then(sql_records::RowValues::as_timestamp)
    }
}
impl<'db> sql_records::TableRecord<'db> for T<'db> {
    fn definition() -> &'static sql_records::schema::TableDefinition {
        &T
    }
    fn from_record(record: sql_records::Record<'db>) -> Self {
        Self { record }
    }
    fn record(&self) -> &sql_records::Record<'db> {
        &self.record
    }
    fn record_mut(&mut self) -> &mut sql_records::Record<'db> {
        &mut self.record
    }
}
