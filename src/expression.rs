use aws_sdk_dynamodb::operation::delete_item::DeleteItemInput;
use aws_sdk_dynamodb::operation::get_item::GetItemInput;
use aws_sdk_dynamodb::operation::query::QueryInput;
use aws_sdk_dynamodb::operation::scan::ScanInput;
use aws_sdk_dynamodb::operation::update_item::UpdateItemInput;
use aws_sdk_dynamodb::types::AttributeValue;
use serde::Serialize;
use std::collections::HashMap;

use crate::record::Item;
use crate::Error;

/// Comparison operators for filter and key conditions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    /// `=`
    Equal,
    /// `<`
    LessThan,
    /// `<=`
    LessOrEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterOrEqual,
    /// Two-sided bound; valid with [`ExpressionWrapper::with_range_condition`]
    Between,
}

impl Operator {
    fn symbol(self) -> &'static str {
        match self {
            // A plain value offers no upper bound, so BETWEEN narrows to equality.
            Operator::Equal | Operator::Between => "=",
            Operator::LessThan => "<",
            Operator::LessOrEqual => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterOrEqual => ">=",
        }
    }
}

/// Epoch bounds for date-range conditions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FromToDate {
    /// Inclusive lower bound
    pub from: u64,
    /// Inclusive upper bound
    pub to: u64,
}

/// One accumulated expression slot with its own name/value bindings, so each
/// compile target attaches only the bindings it actually references.
#[derive(Clone, Debug, Default)]
struct Slot {
    expr: Option<String>,
    names: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
}

impl Slot {
    fn bind_name(&mut self, counter: &mut usize, field: &str) -> String {
        let placeholder = format!("#n{}", *counter);
        *counter += 1;
        let _ = self.names.insert(placeholder.clone(), field.to_string());
        placeholder
    }

    fn bind_value(&mut self, counter: &mut usize, value: AttributeValue) -> String {
        let placeholder = format!(":v{}", *counter);
        *counter += 1;
        let _ = self.values.insert(placeholder.clone(), value);
        placeholder
    }

    fn compare(
        &mut self,
        counter: &mut usize,
        field: &str,
        value: AttributeValue,
        operator: Operator,
    ) -> String {
        let name = self.bind_name(counter, field);
        let value = self.bind_value(counter, value);
        format!("{name} {} {value}", operator.symbol())
    }

    fn range(
        &mut self,
        counter: &mut usize,
        field: &str,
        range: FromToDate,
        operator: Operator,
    ) -> String {
        let name = self.bind_name(counter, field);
        let from = self.bind_value(counter, AttributeValue::N(range.from.to_string()));

        match operator {
            Operator::Between => {
                let to = self.bind_value(counter, AttributeValue::N(range.to.to_string()));
                format!("{name} BETWEEN {from} AND {to}")
            }
            // Epoch values are never below zero, so any other operator
            // degrades to the lower bound.
            _ => format!("{name} >= {from}"),
        }
    }

    fn establish(&mut self, fragment: String) {
        self.expr = Some(fragment);
    }

    /// Combines with the existing expression, or establishes the fragment as
    /// the first condition when none is set yet.
    fn combine(&mut self, join: &str, fragment: String) {
        self.expr = Some(match self.expr.take() {
            Some(existing) => format!("({existing}) {join} ({fragment})"),
            None => fragment,
        });
    }

    fn is_set(&self) -> bool {
        self.expr.is_some()
    }
}

fn non_empty<K, V>(map: HashMap<K, V>) -> Option<HashMap<K, V>> {
    if map.is_empty() {
        None
    } else {
        Some(map)
    }
}

/// Accumulates query, update, scan and delete intent and compiles it into
/// provider-native request inputs.
///
/// Construct one wrapper per logical operation, chain the `with_*` calls and
/// finish with exactly one `build_*` method; compilation consumes the
/// wrapper. Attribute names and values are always bound through `#`/`:`
/// placeholders, so reserved words need no special handling. A
/// serialization failure inside a chained call is deferred and reported by
/// whichever compile method runs.
#[derive(Debug, Default)]
pub struct ExpressionWrapper {
    table_name: String,
    index_name: Option<String>,
    partition_key_name: Option<String>,
    partition_key_value: Option<AttributeValue>,
    sort_key_name: Option<String>,
    sort_key_value: Option<AttributeValue>,
    condition: Slot,
    key_condition: Slot,
    update: Slot,
    update_sets: Vec<String>,
    projection: Slot,
    projection_fields: Vec<String>,
    limit: Option<i64>,
    exclusive_start_key: Option<Item>,
    scan_index_forward: Option<bool>,
    counter: usize,
    deferred: Option<Error>,
}

impl ExpressionWrapper {
    /// An empty wrapper targeting `table_name`.
    pub fn new(table_name: impl Into<String>) -> Self {
        ExpressionWrapper {
            table_name: table_name.into(),
            ..Default::default()
        }
    }

    /// Targets a secondary index instead of the main table; only queries use
    /// the index name.
    pub fn with_index_name(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = Some(index_name.into());
        self
    }

    /// Records the partition key name and, when non-empty, its value.
    pub fn with_partition_key(mut self, name: &str, value: &str) -> Self {
        self.partition_key_name = Some(name.to_string());
        if !value.is_empty() {
            self.partition_key_value = Some(AttributeValue::S(value.to_string()));
        }
        self
    }

    /// Records the sort key name and, when non-empty, its value.
    pub fn with_sort_key(mut self, name: &str, value: &str) -> Self {
        self.sort_key_name = Some(name.to_string());
        if !value.is_empty() {
            self.sort_key_value = Some(AttributeValue::S(value.to_string()));
        }
        self
    }

    /// Restricts retrieved attributes to the named fields; blank names are
    /// dropped.
    pub fn with_projection(mut self, fields: &[&str]) -> Self {
        for field in fields {
            if field.is_empty() {
                continue;
            }
            let placeholder = self.projection.bind_name(&mut self.counter, field);
            self.projection_fields.push(placeholder);
        }
        self
    }

    /// Adds one `SET field = value` assignment; repeated calls accumulate
    /// fields into a single update clause.
    pub fn with_update_field<V: Serialize>(mut self, name: &str, value: V) -> Self {
        if let Some(value) = self.attribute_value(value) {
            let field = self.update.bind_name(&mut self.counter, name);
            let value = self.update.bind_value(&mut self.counter, value);
            self.update_sets.push(format!("{field} = {value}"));
        }
        self
    }

    /// Adds one `SET field = value` assignment from an already encoded
    /// attribute value.
    pub fn with_update_attribute(mut self, name: &str, value: AttributeValue) -> Self {
        let field = self.update.bind_name(&mut self.counter, name);
        let value = self.update.bind_value(&mut self.counter, value);
        self.update_sets.push(format!("{field} = {value}"));
        self
    }

    /// Caps the number of items to evaluate; values below 1 are ignored.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Continuation token from a previous page's `last_evaluated_key`.
    pub fn with_exclusive_start_key(mut self, start_key: Item) -> Self {
        self.exclusive_start_key = Some(start_key);
        self
    }

    /// Continuation token assembled from raw key values.
    pub fn with_last_evaluated_key(
        mut self,
        partition_key_name: &str,
        partition_key_value: &str,
        sort_key: Option<(&str, &str)>,
    ) -> Self {
        let mut start_key = Item::new();
        let _ = start_key.insert(
            partition_key_name.to_string(),
            AttributeValue::S(partition_key_value.to_string()),
        );
        if let Some((name, value)) = sort_key {
            let _ = start_key.insert(name.to_string(), AttributeValue::S(value.to_string()));
        }
        self.exclusive_start_key = Some(start_key);
        self
    }

    /// Sort direction over the sort key: `true` ascending, `false` descending.
    pub fn with_scan_index_forward(mut self, ascending: bool) -> Self {
        self.scan_index_forward = Some(ascending);
        self
    }

    /// Sets the filter condition, replacing any previously set one.
    pub fn with_condition<V: Serialize>(mut self, name: &str, value: V, operator: Operator) -> Self {
        if let Some(value) = self.attribute_value(value) {
            let fragment = self
                .condition
                .compare(&mut self.counter, name, value, operator);
            self.condition.establish(fragment);
        }
        self
    }

    /// ANDs a condition onto the filter slot, or establishes it as the first
    /// condition when none is set.
    pub fn and_condition<V: Serialize>(mut self, name: &str, value: V, operator: Operator) -> Self {
        if let Some(value) = self.attribute_value(value) {
            let fragment = self
                .condition
                .compare(&mut self.counter, name, value, operator);
            self.condition.combine("AND", fragment);
        }
        self
    }

    /// ORs a condition onto the filter slot, or establishes it as the first
    /// condition when none is set.
    pub fn or_condition<V: Serialize>(mut self, name: &str, value: V, operator: Operator) -> Self {
        if let Some(value) = self.attribute_value(value) {
            let fragment = self
                .condition
                .compare(&mut self.counter, name, value, operator);
            self.condition.combine("OR", fragment);
        }
        self
    }

    /// Sets a date-range filter condition. `Between` compiles a two-sided
    /// bound; any other operator falls back to `>= from`.
    pub fn with_range_condition(mut self, name: &str, range: FromToDate, operator: Operator) -> Self {
        let fragment = self.condition.range(&mut self.counter, name, range, operator);
        self.condition.establish(fragment);
        self
    }

    /// ANDs a date-range condition onto the filter slot.
    pub fn and_range_condition(mut self, name: &str, range: FromToDate, operator: Operator) -> Self {
        let fragment = self.condition.range(&mut self.counter, name, range, operator);
        self.condition.combine("AND", fragment);
        self
    }

    /// ORs a date-range condition onto the filter slot.
    pub fn or_range_condition(mut self, name: &str, range: FromToDate, operator: Operator) -> Self {
        let fragment = self.condition.range(&mut self.counter, name, range, operator);
        self.condition.combine("OR", fragment);
        self
    }

    /// Sets the key condition; the first call should constrain the partition
    /// key with `Equal`. `Between` is rejected at compile time.
    pub fn with_key_condition<V: Serialize>(
        mut self,
        name: &str,
        value: V,
        operator: Operator,
    ) -> Self {
        if self.reject_key_between(operator) {
            return self;
        }
        if let Some(value) = self.attribute_value(value) {
            let fragment = self
                .key_condition
                .compare(&mut self.counter, name, value, operator);
            self.key_condition.establish(fragment);
        }
        self
    }

    /// ANDs a key condition, or establishes it as the first one when none is
    /// set.
    pub fn and_key_condition<V: Serialize>(
        mut self,
        name: &str,
        value: V,
        operator: Operator,
    ) -> Self {
        if self.reject_key_between(operator) {
            return self;
        }
        if let Some(value) = self.attribute_value(value) {
            let fragment = self
                .key_condition
                .compare(&mut self.counter, name, value, operator);
            self.key_condition.combine("AND", fragment);
        }
        self
    }

    /// Compiles the key map shared by get, delete, update and the batch
    /// paths. Fails when the partition key name or value is missing; the
    /// sort key is included only when both name and value are set.
    pub fn query_keys(&self) -> Result<Item, Error> {
        let name = self
            .partition_key_name
            .as_deref()
            .filter(|name| !name.is_empty());

        let (name, value) = match (name, &self.partition_key_value) {
            (Some(name), Some(value)) => (name, value),
            _ => return Err(Error::validation("missing partition key")),
        };

        let mut keys = Item::new();
        let _ = keys.insert(name.to_string(), value.clone());

        if let (Some(sort_name), Some(sort_value)) = (&self.sort_key_name, &self.sort_key_value) {
            let _ = keys.insert(sort_name.clone(), sort_value.clone());
        }

        Ok(keys)
    }

    /// Compiles a GetItem request from the table name and key values.
    pub fn build_get_input(mut self) -> Result<GetItemInput, Error> {
        self.take_deferred()?;
        if self.table_name.is_empty() {
            return Err(Error::validation("missing table name"));
        }
        let keys = self.query_keys()?;

        Ok(GetItemInput::builder()
            .table_name(self.table_name)
            .set_key(Some(keys))
            .build()?)
    }

    /// Compiles a DeleteItem request; an accumulated filter condition becomes
    /// a server-side delete precondition.
    pub fn build_delete_input(mut self) -> Result<DeleteItemInput, Error> {
        self.take_deferred()?;
        if self.table_name.is_empty() {
            return Err(Error::validation("missing table name"));
        }
        let keys = self.query_keys()?;

        let mut builder = DeleteItemInput::builder()
            .table_name(self.table_name)
            .set_key(Some(keys));

        if let Some(condition) = self.condition.expr.take() {
            builder = builder
                .condition_expression(condition)
                .set_expression_attribute_names(non_empty(self.condition.names))
                .set_expression_attribute_values(non_empty(self.condition.values));
        }

        Ok(builder.build()?)
    }

    /// Compiles an UpdateItem request from the accumulated `SET` assignments
    /// and key values.
    pub fn build_update_input(mut self) -> Result<UpdateItemInput, Error> {
        self.take_deferred()?;
        if self.update_sets.is_empty() {
            return Err(Error::validation(
                "nothing set to be updated, use with_update_field",
            ));
        }
        let keys = self.query_keys()?;

        Ok(UpdateItemInput::builder()
            .table_name(self.table_name)
            .set_key(Some(keys))
            .update_expression(format!("SET {}", self.update_sets.join(", ")))
            .set_expression_attribute_names(non_empty(self.update.names))
            .set_expression_attribute_values(non_empty(self.update.values))
            .build()?)
    }

    /// Compiles a Query request: key condition plus optional filter,
    /// projection, index name and pagination controls.
    pub fn build_query_input(mut self) -> Result<QueryInput, Error> {
        self.take_deferred()?;

        let key_condition = self
            .key_condition
            .expr
            .take()
            .ok_or_else(|| Error::validation("missing key condition"))?;

        let mut names = self.key_condition.names;
        let mut values = self.key_condition.values;

        let mut builder = QueryInput::builder()
            .table_name(self.table_name)
            .key_condition_expression(key_condition);

        if let Some(filter) = self.condition.expr.take() {
            builder = builder.filter_expression(filter);
            names.extend(self.condition.names);
            values.extend(self.condition.values);
        }

        if !self.projection_fields.is_empty() {
            builder = builder.projection_expression(self.projection_fields.join(", "));
            names.extend(self.projection.names);
        }

        builder = builder
            .set_expression_attribute_names(non_empty(names))
            .set_expression_attribute_values(non_empty(values))
            .set_index_name(self.index_name)
            .set_scan_index_forward(self.scan_index_forward);

        if let Some(limit) = self.limit.filter(|limit| *limit >= 1) {
            builder = builder.limit(limit as i32);
        }
        if let Some(start_key) = self.exclusive_start_key.filter(|key| !key.is_empty()) {
            builder = builder.set_exclusive_start_key(Some(start_key));
        }

        Ok(builder.build()?)
    }

    /// Compiles a Scan request. Scans carry no key-condition concept, so a
    /// non-empty key-condition slot compiles into the filter position and
    /// takes precedence over a condition set via `with_condition`.
    pub fn build_scan_input(mut self) -> Result<ScanInput, Error> {
        self.take_deferred()?;
        if self.table_name.is_empty() {
            return Err(Error::validation("missing table-name"));
        }

        let mut builder = ScanInput::builder().table_name(self.table_name);

        let slot = if self.key_condition.is_set() {
            self.key_condition
        } else {
            self.condition
        };
        let Slot { expr, names, values } = slot;
        let filter = expr.map(|expr| (expr, names, values));

        if let Some((expr, names, values)) = filter {
            builder = builder
                .filter_expression(expr)
                .set_expression_attribute_names(non_empty(names))
                .set_expression_attribute_values(non_empty(values));
        }

        if let Some(limit) = self.limit.filter(|limit| *limit >= 1) {
            builder = builder.limit(limit as i32);
        }
        if let Some(start_key) = self.exclusive_start_key.filter(|key| !key.is_empty()) {
            builder = builder.set_exclusive_start_key(Some(start_key));
        }

        Ok(builder.build()?)
    }

    fn attribute_value<V: Serialize>(&mut self, value: V) -> Option<AttributeValue> {
        match serde_dynamo::to_attribute_value(value) {
            Ok(value) => Some(value),
            Err(e) => {
                if self.deferred.is_none() {
                    self.deferred = Some(e.into());
                }
                None
            }
        }
    }

    fn reject_key_between(&mut self, operator: Operator) -> bool {
        if operator == Operator::Between {
            if self.deferred.is_none() {
                self.deferred = Some(Error::validation(
                    "BETWEEN is not supported in key conditions",
                ));
            }
            return true;
        }
        false
    }

    fn take_deferred(&mut self) -> Result<(), Error> {
        match self.deferred.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
