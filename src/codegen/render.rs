//! `TableDefinition` → Rust source for one record module.

use std::collections::HashSet;

use proc_macro2::{Ident, Literal, Span, TokenStream};
use quote::{format_ident, quote};

use crate::error::SqlRecordsError;
use crate::schema::{
    ColumnDescriptor, FieldAccessor, FieldDef, FieldDefault, KeyRole, SemanticType, SqlType,
    TableDefinition,
};

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "final", "fn", "for", "gen", "if", "impl", "in", "let",
    "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref", "return",
    "static", "struct", "trait", "try", "type", "typeof", "unsafe", "unsized", "use", "virtual",
    "where", "while", "yield",
];

/// Names that cannot be raw identifiers.
const NOT_RAW: &[&str] = &["self", "super", "crate", "true", "false", "_"];

/// Methods a generated type already has through `TableRecord`.
const RESERVED_METHODS: &[&str] = &[
    "new", "create", "load", "save", "insert", "update", "definition", "from_record", "record",
    "record_mut",
];

/// Render the module for `definition`. `crate_path` is how the generated code names this
/// crate, e.g. `sql_records`.
///
/// # Errors
/// `ConfigError` for an invalid `crate_path`, `SchemaError` if the produced tokens do not
/// form a valid file.
pub fn render_definition(
    definition: &TableDefinition,
    crate_path: &str,
) -> Result<String, SqlRecordsError> {
    let krate: syn::Path = syn::parse_str(crate_path).map_err(|e| {
        SqlRecordsError::ConfigError(format!("invalid crate path `{crate_path}`: {e}"))
    })?;
    let tokens = Renderer::new(definition, &krate).file();
    let file: syn::File = syn::parse2(tokens).map_err(|e| {
        SqlRecordsError::SchemaError(format!(
            "generated code for `{}` does not parse: {e}",
            definition.table_name
        ))
    })?;
    Ok(prettyplease::unparse(&file))
}

struct Renderer<'a> {
    def: &'a TableDefinition,
    krate: &'a syn::Path,
}

impl<'a> Renderer<'a> {
    fn new(def: &'a TableDefinition, krate: &'a syn::Path) -> Self {
        Self { def, krate }
    }

    fn file(&self) -> TokenStream {
        let krate = self.krate;
        let table = &self.def.table_name;
        let class = format_ident!("{}", self.def.class_name());
        let definition_static = format_ident!("{}", self.def.static_name());
        let header = format!(" Record type for the `{table}` table.");
        let provenance =
            " Generated once by sql-records; it is never overwritten, so local edits are kept.";
        let struct_doc = format!(" One row of `{table}`.");
        let static_doc = format!(" Definition of the `{table}` table.");

        let definition = self.definition_expr();
        let constants = self.enum_constants();
        let accessors = self.accessors();

        quote! {
            #![doc = #header]
            #![doc = ""]
            #![doc = #provenance]

            #[doc = #static_doc]
            pub static #definition_static: ::std::sync::LazyLock<#krate::schema::TableDefinition> =
                ::std::sync::LazyLock::new(|| #definition);

            #[doc = #struct_doc]
            #[derive(Debug)]
            pub struct #class<'db> {
                record: #krate::Record<'db>,
            }

            impl<'db> #class<'db> {
                #(#constants)*
                #(#accessors)*
            }

            impl<'db> #krate::TableRecord<'db> for #class<'db> {
                fn definition() -> &'static #krate::schema::TableDefinition {
                    &#definition_static
                }

                fn from_record(record: #krate::Record<'db>) -> Self {
                    Self { record }
                }

                fn record(&self) -> &#krate::Record<'db> {
                    &self.record
                }

                fn record_mut(&mut self) -> &mut #krate::Record<'db> {
                    &mut self.record
                }
            }
        }
    }

    fn definition_expr(&self) -> TokenStream {
        let krate = self.krate;
        let table = &self.def.table_name;
        let primary_key = match &self.def.primary_key {
            Some(pk) => quote! { ::std::option::Option::Some(#pk.to_string()) },
            None => quote! { ::std::option::Option::None },
        };
        let fields = self.def.fields.iter().map(|f| self.field_def(f));
        let columns = self
            .def
            .column_descriptors
            .values()
            .map(|c| self.column_descriptor(c));
        quote! {
            #krate::schema::TableDefinition::assemble(
                #table,
                #primary_key,
                vec![#(#fields),*],
                vec![#(#columns),*],
            )
        }
    }

    fn field_def(&self, field: &FieldDef) -> TokenStream {
        let krate = self.krate;
        let column = &field.column;
        let ident = &field.ident;
        let class = &field.classification;
        let semantic = format_ident!("{}", semantic_variant(class.semantic_type));
        let nullable = class.nullable;
        let lazy = class.lazy;
        let insertable = class.insertable;
        let updatable = class.updatable;
        let default = self.field_default(&class.default);
        let accessor = self.field_accessor(&class.accessor);
        quote! {
            #krate::schema::FieldDef::new(#column, #ident, #krate::schema::FieldClassification {
                semantic_type: #krate::schema::SemanticType::#semantic,
                nullable: #nullable,
                lazy: #lazy,
                insertable: #insertable,
                updatable: #updatable,
                default: #default,
                accessor: #accessor,
            })
        }
    }

    fn field_default(&self, default: &FieldDefault) -> TokenStream {
        let krate = self.krate;
        match default {
            FieldDefault::None => quote! { #krate::schema::FieldDefault::None },
            FieldDefault::Null => quote! { #krate::schema::FieldDefault::Null },
            FieldDefault::Str(s) => quote! { #krate::schema::FieldDefault::Str(#s.to_string()) },
            FieldDefault::Int(i) => {
                let lit = Literal::i64_suffixed(*i);
                quote! { #krate::schema::FieldDefault::Int(#lit) }
            }
            FieldDefault::Float(f) => {
                let lit = Literal::f64_suffixed(*f);
                quote! { #krate::schema::FieldDefault::Float(#lit) }
            }
            FieldDefault::Bool(b) => quote! { #krate::schema::FieldDefault::Bool(#b) },
            FieldDefault::DbGenerated(s) => {
                quote! { #krate::schema::FieldDefault::DbGenerated(#s.to_string()) }
            }
        }
    }

    fn field_accessor(&self, accessor: &FieldAccessor) -> TokenStream {
        let krate = self.krate;
        match accessor {
            FieldAccessor::Plain => quote! { #krate::schema::FieldAccessor::Plain },
            FieldAccessor::Enum { values, multiple } => quote! {
                #krate::schema::FieldAccessor::Enum {
                    values: vec![#(#values.to_string()),*],
                    multiple: #multiple,
                }
            },
            FieldAccessor::Timestamp => quote! { #krate::schema::FieldAccessor::Timestamp },
            FieldAccessor::AutoIncrement => quote! { #krate::schema::FieldAccessor::AutoIncrement },
        }
    }

    fn column_descriptor(&self, column: &ColumnDescriptor) -> TokenStream {
        let krate = self.krate;
        let name = &column.name;
        let sql_type = &column.sql_type;
        let nullable = column.nullable;
        let default = match &column.default {
            Some(d) => quote! { ::std::option::Option::Some(#d.to_string()) },
            None => quote! { ::std::option::Option::None },
        };
        let key_role = format_ident!(
            "{}",
            match column.key_role {
                KeyRole::None => "None",
                KeyRole::Primary => "Primary",
                KeyRole::Unique => "Unique",
                KeyRole::Multiple => "Multiple",
            }
        );
        let extra = &column.extra;
        let is_enum_or_set = column.is_enum_or_set;
        let enum_values = &column.enum_values;
        quote! {
            #krate::schema::ColumnDescriptor {
                name: #name.to_string(),
                sql_type: #sql_type.to_string(),
                nullable: #nullable,
                default: #default,
                key_role: #krate::schema::KeyRole::#key_role,
                extra: #extra.to_string(),
                is_enum_or_set: #is_enum_or_set,
                enum_values: vec![#(#enum_values.to_string()),*],
            }
        }
    }

    fn enum_constants(&self) -> Vec<TokenStream> {
        self.def
            .enum_constants
            .iter()
            .map(|(name, value)| {
                let ident = format_ident!("{}", name);
                quote! { pub const #ident: &'static str = #value; }
            })
            .collect()
    }

    fn accessors(&self) -> Vec<TokenStream> {
        let mut used = HashSet::new();
        let mut out = Vec::new();
        for field in &self.def.fields {
            let getter = unique_method(&field.ident, &mut used);
            out.push(self.getter(field, &getter));
            let class = &field.classification;
            if class.insertable || class.updatable {
                let setter = unique_method(&format!("set_{}", field.ident), &mut used);
                out.push(self.setter(field, &setter));
            }
        }
        out
    }

    fn is_binary(&self, field: &FieldDef) -> bool {
        self.def
            .column_descriptors
            .get(&field.column)
            .is_some_and(|c| {
                let base = SqlType::parse(&c.sql_type).base;
                base.contains("blob") || base.contains("binary")
            })
    }

    fn getter(&self, field: &FieldDef, name: &Ident) -> TokenStream {
        let krate = self.krate;
        let column = &field.column;
        let class = &field.classification;
        let doc = self.field_doc(field);

        if class.lazy {
            let (ty, convert) = if self.is_binary(field) {
                (quote! { Vec<u8> }, quote! { .as_blob().map(<[u8]>::to_vec) })
            } else {
                (quote! { String }, quote! { .as_text().map(str::to_string) })
            };
            return quote! {
                #[doc = #doc]
                ///
                /// Loaded from the database on first access.
                pub fn #name(&mut self) -> ::std::result::Result<::std::option::Option<#ty>, #krate::SqlRecordsError> {
                    Ok(self.record.get(#column)? #convert)
                }
            };
        }

        let (ty, convert) = match class.semantic_type {
            SemanticType::String if self.is_binary(field) => (
                quote! { &[u8] },
                quote! { .and_then(#krate::RowValues::as_blob) },
            ),
            SemanticType::String | SemanticType::Date | SemanticType::Enum => (
                quote! { &str },
                quote! { .and_then(#krate::RowValues::as_text) },
            ),
            SemanticType::Int => (
                quote! { i64 },
                quote! { .and_then(#krate::RowValues::as_int).copied() },
            ),
            SemanticType::Float => (
                quote! { f64 },
                quote! { .and_then(#krate::RowValues::as_float) },
            ),
            SemanticType::Bool => (
                quote! { bool },
                quote! { .and_then(#krate::RowValues::as_bool).copied() },
            ),
            SemanticType::Timestamp => (
                quote! { #krate::chrono::NaiveDateTime },
                quote! { .and_then(#krate::RowValues::as_timestamp) },
            ),
        };
        quote! {
            #[doc = #doc]
            #[must_use]
            pub fn #name(&self) -> ::std::option::Option<#ty> {
                self.record.peek(#column) #convert
            }
        }
    }

    fn setter(&self, field: &FieldDef, name: &Ident) -> TokenStream {
        let krate = self.krate;
        let column = &field.column;
        let class = &field.classification;
        let base = match class.semantic_type {
            SemanticType::Timestamp => None,
            SemanticType::String if self.is_binary(field) => Some(quote! { Vec<u8> }),
            SemanticType::String | SemanticType::Date | SemanticType::Enum => Some(quote! { &str }),
            SemanticType::Int => Some(quote! { i64 }),
            SemanticType::Float => Some(quote! { f64 }),
            SemanticType::Bool => Some(quote! { bool }),
        };
        let ty = match base {
            None => quote! { impl ::std::convert::Into<#krate::RowValues> },
            Some(ty) if class.nullable => quote! { ::std::option::Option<#ty> },
            Some(ty) => ty,
        };
        let doc = match &class.accessor {
            FieldAccessor::Enum { values, .. } => {
                format!(" Set `{column}`; accepted values: {}.", values.join(", "))
            }
            FieldAccessor::Timestamp => {
                format!(" Set `{column}` from a date/time or its text form.")
            }
            FieldAccessor::AutoIncrement => {
                format!(" Set `{column}`; ignored once the record is loaded.")
            }
            FieldAccessor::Plain => format!(" Set `{column}`."),
        };
        quote! {
            #[doc = #doc]
            ///
            /// # Errors
            /// `ValidationError` when the value is rejected; nothing is stored then.
            pub fn #name(&mut self, value: #ty) -> ::std::result::Result<(), #krate::SqlRecordsError> {
                self.record.set(#column, value)
            }
        }
    }

    fn field_doc(&self, field: &FieldDef) -> String {
        let sql_type = self
            .def
            .column_descriptors
            .get(&field.column)
            .map_or("", |c| c.sql_type.as_str());
        let key = if self.def.primary_key.as_deref() == Some(field.column.as_str()) {
            ", primary key"
        } else {
            ""
        };
        format!(" `{}` ({sql_type}{key}).", field.column)
    }
}

fn semantic_variant(semantic: SemanticType) -> &'static str {
    match semantic {
        SemanticType::String => "String",
        SemanticType::Int => "Int",
        SemanticType::Float => "Float",
        SemanticType::Bool => "Bool",
        SemanticType::Timestamp => "Timestamp",
        SemanticType::Date => "Date",
        SemanticType::Enum => "Enum",
    }
}

/// Method identifier for `name`, suffixed with `_field` when it would shadow a record method
/// or repeat an earlier one.
fn unique_method(name: &str, used: &mut HashSet<String>) -> Ident {
    let mut candidate = name.to_string();
    while RESERVED_METHODS.contains(&candidate.as_str())
        || NOT_RAW.contains(&candidate.as_str())
        || used.contains(&candidate)
    {
        candidate.push_str("_field");
    }
    used.insert(candidate.clone());
    rust_ident(&candidate)
}

fn rust_ident(name: &str) -> Ident {
    if KEYWORDS.contains(&name) {
        Ident::new_raw(name, Span::call_site())
    } else {
        Ident::new(name, Span::call_site())
    }
}
