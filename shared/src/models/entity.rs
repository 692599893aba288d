//! Entity schema registry
//!
//! Every warehouse table is described by a static [`EntitySchema`]. The
//! resource engine uses it to build SQL and check required fields, the date
//! migration uses it to find text date columns.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::flex_date::FlexDate;

/// Semantic type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Integer,
    Date,
}

/// One column of an entity table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Must be non-empty when a row is written through the resource engine
    pub required: bool,
    /// Substituted for an empty text value on insert
    pub default: Option<&'static str>,
}

/// Static description of an entity table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitySchema {
    /// Display name used in messages and logs (e.g. `Arrival`)
    pub name: &'static str,
    pub table: &'static str,
    /// URL segment under `/api/`
    pub resource: &'static str,
    /// Data columns in insert order, excluding id and timestamps
    pub fields: &'static [FieldSpec],
}

impl EntitySchema {
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    /// Columns persisted as text dates
    pub fn date_columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields
            .iter()
            .filter(|f| f.kind == FieldKind::Date)
            .map(|f| f.name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().filter(|f| f.required).map(|f| f.name)
    }
}

/// A single column value ready to bind into a statement
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Text(String),
    Integer(i64),
    Date(FlexDate),
}

impl ColumnValue {
    /// Empty text or absent date. Integers are never blank.
    pub fn is_blank(&self) -> bool {
        match self {
            ColumnValue::Text(s) => s.trim().is_empty(),
            ColumnValue::Integer(_) => false,
            ColumnValue::Date(d) => !d.is_present(),
        }
    }
}

impl From<String> for ColumnValue {
    fn from(value: String) -> Self {
        ColumnValue::Text(value)
    }
}

impl From<i64> for ColumnValue {
    fn from(value: i64) -> Self {
        ColumnValue::Integer(value)
    }
}

impl From<FlexDate> for ColumnValue {
    fn from(value: FlexDate) -> Self {
        ColumnValue::Date(value)
    }
}

/// Row bookkeeping assigned by the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowMeta {
    pub id: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A warehouse record type with a static schema
///
/// Implemented by the `warehouse_entity!` macro; each implementation supplies
/// its own encode, decode and required-field list.
pub trait Entity:
    Serialize + DeserializeOwned + Default + Clone + Send + Sync + Unpin + 'static
{
    const SCHEMA: EntitySchema;

    fn meta(&self) -> RowMeta;

    /// Overwrite store-assigned bookkeeping
    fn set_meta(&mut self, meta: RowMeta);

    /// Data column values in [`EntitySchema::fields`] order
    fn column_values(&self) -> Vec<ColumnValue>;

    /// Replace empty text with the schema default, where one is declared
    fn apply_defaults(&mut self);

    /// Names of required fields that are blank
    fn missing_fields(&self) -> Vec<&'static str> {
        Self::SCHEMA
            .fields
            .iter()
            .zip(self.column_values())
            .filter(|(spec, value)| spec.required && value.is_blank())
            .map(|(spec, _)| spec.name)
            .collect()
    }

    /// Fail with the list of blank required fields
    fn validate(&self) -> Result<(), MissingFields> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(MissingFields(missing))
        }
    }
}

/// Required fields left blank
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing required fields: {}", .0.join(", "))]
pub struct MissingFields(pub Vec<&'static str>);

/// `null` decodes to the field default instead of failing
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Rust types behind each [`FieldKind`], named after the variants
pub mod kinds {
    pub type Text = String;
    pub type Integer = i64;
    pub type Date = crate::flex_date::FlexDate;
}

macro_rules! field_default {
    (Text, $default:literal) => {
        String::from($default)
    };
    ($kind:ident) => {
        <$crate::models::entity::kinds::$kind as Default>::default()
    };
}

macro_rules! is_required {
    () => {
        false
    };
    (required) => {
        true
    };
}

macro_rules! default_text {
    () => {
        None
    };
    ($default:literal) => {
        Some($default)
    };
}

macro_rules! fill_default {
    ($slot:expr, Text, $default:literal) => {
        if $slot.trim().is_empty() {
            $slot = String::from($default);
        }
    };
    ($slot:expr, $kind:ident) => {};
}

/// Declare an entity record type together with its schema
///
/// ```ignore
/// warehouse_entity! {
///     /// Inbound arrival
///     Arrival => table "arrivals", resource "arrivals" {
///         date: Date required,
///         item_type: Text = "Barang Jual",
///     }
/// }
/// ```
macro_rules! warehouse_entity {
    (
        $(#[$meta:meta])*
        $name:ident => table $table:literal, resource $resource:literal {
            $( $field:ident : $kind:ident $($req:ident)? $(= $default:literal)? ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        #[cfg_attr(feature = "db", derive(sqlx::FromRow))]
        #[serde(default)]
        pub struct $name {
            #[serde(skip_deserializing)]
            pub id: i64,
            $(
                #[serde(deserialize_with = "crate::models::entity::null_as_default")]
                pub $field: $crate::models::entity::kinds::$kind,
            )*
            #[serde(skip_deserializing)]
            pub created_at: i64,
            #[serde(skip_deserializing)]
            pub updated_at: i64,
            #[serde(skip)]
            pub deleted_at: Option<i64>,
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    id: 0,
                    $( $field: field_default!($kind $(, $default)?), )*
                    created_at: 0,
                    updated_at: 0,
                    deleted_at: None,
                }
            }
        }

        impl $crate::models::entity::Entity for $name {
            const SCHEMA: $crate::models::entity::EntitySchema =
                $crate::models::entity::EntitySchema {
                    name: stringify!($name),
                    table: $table,
                    resource: $resource,
                    fields: &[
                        $(
                            $crate::models::entity::FieldSpec {
                                name: stringify!($field),
                                kind: $crate::models::entity::FieldKind::$kind,
                                required: is_required!($($req)?),
                                default: default_text!($($default)?),
                            },
                        )*
                    ],
                };

            fn meta(&self) -> $crate::models::entity::RowMeta {
                $crate::models::entity::RowMeta {
                    id: self.id,
                    created_at: self.created_at,
                    updated_at: self.updated_at,
                }
            }

            fn set_meta(&mut self, meta: $crate::models::entity::RowMeta) {
                self.id = meta.id;
                self.created_at = meta.created_at;
                self.updated_at = meta.updated_at;
            }

            fn column_values(&self) -> Vec<$crate::models::entity::ColumnValue> {
                vec![ $( $crate::models::entity::ColumnValue::from(self.$field.clone()), )* ]
            }

            fn apply_defaults(&mut self) {
                $( fill_default!(self.$field, $kind $(, $default)?); )*
            }
        }
    };
}

#[cfg(feature = "db")]
mod store {
    use super::ColumnValue;
    use crate::flex_date::FlexDate;
    use sqlx::encode::IsNull;
    use sqlx::error::BoxDynError;
    use sqlx::sqlite::{Sqlite, SqliteTypeInfo};
    use sqlx::{Database, Encode, Type};

    impl Type<Sqlite> for ColumnValue {
        fn type_info() -> SqliteTypeInfo {
            <str as Type<Sqlite>>::type_info()
        }
    }

    impl<'q> Encode<'q, Sqlite> for ColumnValue {
        fn encode_by_ref(
            &self,
            buf: &mut <Sqlite as Database>::ArgumentBuffer<'q>,
        ) -> Result<IsNull, BoxDynError> {
            match self {
                ColumnValue::Text(s) => <String as Encode<'q, Sqlite>>::encode_by_ref(s, buf),
                ColumnValue::Integer(i) => <i64 as Encode<'q, Sqlite>>::encode_by_ref(i, buf),
                ColumnValue::Date(d) => <FlexDate as Encode<'q, Sqlite>>::encode_by_ref(d, buf),
            }
        }

        fn produces(&self) -> Option<SqliteTypeInfo> {
            match self {
                ColumnValue::Integer(_) => Some(<i64 as Type<Sqlite>>::type_info()),
                _ => Some(<str as Type<Sqlite>>::type_info()),
            }
        }
    }
}
