use std::collections::HashMap;
use std::fmt;

use crate::Error;

/// Value of a partition or sort key, opaque to this crate.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct KeyValue(String);

impl KeyValue {
    /// Returns the raw key value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` when the value holds no characters; empty key values never
    /// compile into requests.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        KeyValue(value)
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue(value.to_string())
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of a secondary index (LSI or GSI).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IndexName(String);

impl IndexName {
    /// Returns the raw index name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for IndexName {
    fn from(value: String) -> Self {
        IndexName(value)
    }
}

impl From<&str> for IndexName {
    fn from(value: &str) -> Self {
        IndexName(value.to_string())
    }
}

impl fmt::Display for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Attribute names of a table's or index's partition and sort keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyNames {
    /// Partition key attribute name; must be non-empty for a valid config
    pub partition_key: String,
    /// Sort key attribute name when the table or index declares one
    pub sort_key: Option<String>,
}

impl KeyNames {
    /// Key names with a partition key and an optional sort key.
    pub fn new(partition_key: impl Into<String>, sort_key: Option<&str>) -> Self {
        KeyNames {
            partition_key: partition_key.into(),
            sort_key: sort_key.map(str::to_string),
        }
    }
}

/// Table name plus its primary key attribute names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableInfo {
    /// Table name
    pub table_name: String,
    /// Primary key attribute names
    pub keys: KeyNames,
}

impl TableInfo {
    /// Table info with a partition key and an optional sort key.
    pub fn new(
        table_name: impl Into<String>,
        partition_key: impl Into<String>,
        sort_key: Option<&str>,
    ) -> Self {
        TableInfo {
            table_name: table_name.into(),
            keys: KeyNames::new(partition_key, sort_key),
        }
    }
}

/// Key layout for a table and its secondary indexes.
///
/// Read-only after construction and cheap to share across concurrent
/// operations; the handler validates it once and never at runtime.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DbConfig {
    /// Main table info
    pub table: TableInfo,
    /// Key names per secondary index
    pub indexes: HashMap<IndexName, KeyNames>,
}

impl Default for TableInfo {
    fn default() -> Self {
        TableInfo {
            table_name: String::new(),
            keys: KeyNames {
                partition_key: String::new(),
                sort_key: None,
            },
        }
    }
}

impl DbConfig {
    /// Config for a table without secondary indexes.
    pub fn new(table: TableInfo) -> Self {
        DbConfig {
            table,
            indexes: HashMap::new(),
        }
    }

    /// Registers the key names of a secondary index.
    pub fn with_index(mut self, name: impl Into<IndexName>, keys: KeyNames) -> Self {
        let _ = self.indexes.insert(name.into(), keys);
        self
    }

    /// Key names for the named index, falling back to the main table when the
    /// index is unknown or not given.
    pub fn key_names(&self, index: Option<&IndexName>) -> &KeyNames {
        index
            .and_then(|name| self.indexes.get(name))
            .unwrap_or(&self.table.keys)
    }

    /// Checks that the table name, the table partition key name and every
    /// index partition key name are non-empty.
    pub fn validate(&self) -> Result<(), Error> {
        if self.table.table_name.is_empty() || self.table.keys.partition_key.is_empty() {
            return Err(Error::InvalidConfig);
        }
        if self.indexes.values().any(|keys| keys.partition_key.is_empty()) {
            return Err(Error::InvalidConfig);
        }
        Ok(())
    }
}

/// Resolved partition and sort key values of one record instance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PsKeyValues {
    partition_key: KeyValue,
    sort_key: Option<KeyValue>,
}

impl PsKeyValues {
    /// Key values with a partition key and an optional sort key.
    pub fn new(partition_key: KeyValue, sort_key: Option<KeyValue>) -> Self {
        PsKeyValues {
            partition_key,
            sort_key,
        }
    }

    /// The partition key value.
    pub fn partition_key(&self) -> &KeyValue {
        &self.partition_key
    }

    /// The sort key value, when present.
    pub fn sort_key(&self) -> Option<&KeyValue> {
        self.sort_key.as_ref()
    }
}
