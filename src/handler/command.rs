use std::collections::HashMap;

use aws_sdk_dynamodb::operation::batch_write_item::BatchWriteItemInput;
use aws_sdk_dynamodb::operation::put_item::PutItemInput;
use aws_sdk_dynamodb::types::{AttributeValue, DeleteRequest, PutRequest, WriteRequest};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use super::DynamoHandler;
use crate::client::DynamoApi;
use crate::config::{KeyNames, KeyValue, PsKeyValues};
use crate::expression::ExpressionWrapper;
use crate::partition::BATCH_ITEM_LIMIT;
use crate::record::{DynamoRecord, Item};
use crate::Error;

impl<C: DynamoApi> DynamoHandler<C> {
    /// Writes a new record and returns its key values.
    ///
    /// An empty partition key value is auto-generated (UUID), letting the
    /// store assign the ID; a schema-required sort key is generated only
    /// when `create_sort_key` is set. The put is conditional on no item
    /// existing under the same partition key, so an overwrite attempt fails
    /// with a conditional-check error (see
    /// [`Error::is_conditional_check_failed`]).
    pub async fn add_record<R: DynamoRecord>(
        &self,
        record: &R,
        create_sort_key: bool,
    ) -> Result<PsKeyValues, Error> {
        let key_names = self.config.key_names(None);
        let (item, keys) = self.create_put_item(record, true, create_sort_key)?;

        let mut names = HashMap::new();
        let _ = names.insert("#pk".to_string(), key_names.partition_key.clone());

        let input = PutItemInput::builder()
            .table_name(self.config.table.table_name.clone())
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(#pk)")
            .set_expression_attribute_names(Some(names))
            .build()?;

        debug!(model = %R::model_name(), "adding record");
        let _ = self.client.put_item(input).await?;
        Ok(keys)
    }

    /// Replaces the item stored under `keys` with `record`; the key
    /// attributes are written into the item, so the record itself need not
    /// carry them.
    pub async fn update_record_by_id<R: DynamoRecord>(
        &self,
        record: &R,
        keys: &PsKeyValues,
    ) -> Result<(), Error> {
        let key_names = self.config.key_names(None);
        if keys.partition_key().is_empty() {
            return Err(Error::validation("missing required partition key"));
        }
        let sort_key = match key_names.sort_key.as_deref() {
            Some(name) => match keys.sort_key().filter(|value| !value.is_empty()) {
                Some(value) => Some((name, value)),
                None => return Err(Error::validation("missing required sort key")),
            },
            None => None,
        };

        let mut item = record.marshal()?;
        let _ = item.insert(
            key_names.partition_key.clone(),
            AttributeValue::S(keys.partition_key().to_string()),
        );
        if let Some((name, value)) = sort_key {
            let _ = item.insert(name.to_string(), AttributeValue::S(value.to_string()));
        }

        let input = PutItemInput::builder()
            .table_name(self.config.table.table_name.clone())
            .set_item(Some(item))
            .build()?;
        let _ = self.client.put_item(input).await?;
        Ok(())
    }

    /// Applies a partial update to the item under `keys`: every top-level
    /// field of `update` becomes one `SET` assignment, leaving other
    /// attributes untouched. Fails when `update` serializes to no fields or
    /// when `keys` is incomplete for the table schema.
    pub async fn update_fields<U: Serialize>(
        &self,
        keys: &PsKeyValues,
        update: &U,
    ) -> Result<(), Error> {
        let key_names = self.config.key_names(None);
        if keys.partition_key().is_empty() {
            return Err(Error::validation("missing required partition key"));
        }
        if key_names.sort_key.is_some()
            && keys.sort_key().filter(|value| !value.is_empty()).is_none()
        {
            return Err(Error::validation("missing required sorting key"));
        }

        let fields: Item = serde_dynamo::to_item(update)?;

        let mut expression = self.key_expression(key_names, keys);
        for (name, value) in fields {
            expression = expression.with_update_attribute(&name, value);
        }

        let input = expression.build_update_input()?;
        let _ = self.client.update_item(input).await?;
        Ok(())
    }

    /// Deletes the item under `keys`. An expression built with
    /// [`DynamoHandler::expression`] carrying filter conditions becomes a
    /// server-side precondition that must hold for the delete to apply.
    pub async fn delete_record_by_id(
        &self,
        keys: &PsKeyValues,
        filters: Option<ExpressionWrapper>,
    ) -> Result<(), Error> {
        let key_names = self.config.key_names(None);
        if keys.partition_key().is_empty() {
            return Err(Error::validation("missing required partition key"));
        }
        if key_names.sort_key.is_some()
            && keys.sort_key().filter(|value| !value.is_empty()).is_none()
        {
            return Err(Error::validation("missing required sort key"));
        }

        let mut expression = filters
            .unwrap_or_else(|| self.expression())
            .with_partition_key(&key_names.partition_key, keys.partition_key().as_str());
        if let (Some(name), Some(value)) = (key_names.sort_key.as_deref(), keys.sort_key()) {
            expression = expression.with_sort_key(name, value.as_str());
        }

        let _ = self.client.delete_item(expression.build_delete_input()?).await?;
        Ok(())
    }

    /// Adds up to [`BATCH_ITEM_LIMIT`] records in one batch call, generating
    /// missing partition keys (and sort keys when `create_sort_key` is set).
    ///
    /// Returns the records that were not written: everything past the batch
    /// limit plus any items the provider declined. Unprocessed records are
    /// data for the caller to resubmit, never an error.
    pub async fn bulk_add_records<R>(
        &self,
        records: &[R],
        create_sort_key: bool,
    ) -> Result<Vec<R>, Error>
    where
        R: DynamoRecord + Clone,
    {
        self.batch_write(records, true, create_sort_key).await
    }

    /// Rewrites up to [`BATCH_ITEM_LIMIT`] existing records in one batch
    /// call. Key auto-generation is disabled: every record must already
    /// carry its key values.
    pub async fn bulk_update_records<R>(&self, records: &[R]) -> Result<Vec<R>, Error>
    where
        R: DynamoRecord + Clone,
    {
        self.batch_write(records, false, false).await
    }

    /// Deletes up to [`BATCH_ITEM_LIMIT`] items by key in one batch call.
    ///
    /// Every key is validated up front; a single invalid key aborts the
    /// whole call before any network traffic. Returns the keys that were
    /// not deleted, including provider-declined entries decoded back into
    /// key values.
    pub async fn bulk_delete_records(
        &self,
        keys: &[PsKeyValues],
    ) -> Result<Vec<PsKeyValues>, Error> {
        let key_names = self.config.key_names(None);

        for key in keys {
            if key.partition_key().is_empty() {
                return Err(Error::validation("missing required partition key"));
            }
            if key_names.sort_key.is_some()
                && key.sort_key().filter(|value| !value.is_empty()).is_none()
            {
                return Err(Error::validation("missing required sort key"));
            }
        }

        let attempted = keys.len().min(BATCH_ITEM_LIMIT);
        let mut unprocessed: Vec<PsKeyValues> = keys[attempted..].to_vec();
        if attempted == 0 {
            return Ok(unprocessed);
        }

        let mut writes = Vec::with_capacity(attempted);
        for key in &keys[..attempted] {
            let key_map = self.key_expression(key_names, key).query_keys()?;
            let delete = DeleteRequest::builder().set_key(Some(key_map)).build()?;
            writes.push(WriteRequest::builder().delete_request(delete).build());
        }

        debug!(attempted, total = keys.len(), "bulk delete");
        let remaining = self.submit_batch(writes).await?;
        for write in remaining {
            if let Some(delete) = write.delete_request {
                unprocessed.push(key_values_from_map(key_names, delete.key)?);
            }
        }
        Ok(unprocessed)
    }

    /// Shared put path of the bulk add and bulk update operations: at most
    /// the first [`BATCH_ITEM_LIMIT`] records are attempted, the remainder
    /// comes back untouched.
    async fn batch_write<R>(
        &self,
        records: &[R],
        create_part_key: bool,
        create_sort_key: bool,
    ) -> Result<Vec<R>, Error>
    where
        R: DynamoRecord + Clone,
    {
        let attempted = records.len().min(BATCH_ITEM_LIMIT);
        let mut unprocessed: Vec<R> = records[attempted..].to_vec();
        if attempted == 0 {
            return Ok(unprocessed);
        }

        let mut writes = Vec::with_capacity(attempted);
        for record in &records[..attempted] {
            let (item, _) = self.create_put_item(record, create_part_key, create_sort_key)?;
            let put = PutRequest::builder().set_item(Some(item)).build()?;
            writes.push(WriteRequest::builder().put_request(put).build());
        }

        debug!(attempted, total = records.len(), model = %R::model_name(), "bulk write");
        let remaining = self.submit_batch(writes).await?;
        for write in remaining {
            if let Some(put) = write.put_request {
                unprocessed.push(R::unmarshal(put.item)?);
            }
        }
        Ok(unprocessed)
    }

    /// Sends one batch-write call and returns the write requests the
    /// provider reported as unprocessed for this table.
    async fn submit_batch(&self, writes: Vec<WriteRequest>) -> Result<Vec<WriteRequest>, Error> {
        let table_name = self.config.table.table_name.clone();

        let mut request_items = HashMap::new();
        let _ = request_items.insert(table_name.clone(), writes);
        let input = BatchWriteItemInput::builder()
            .set_request_items(Some(request_items))
            .build()?;

        let output = self.client.batch_write_item(input).await?;
        Ok(output
            .unprocessed_items
            .and_then(|mut items| items.remove(&table_name))
            .unwrap_or_default())
    }

    /// Marshals `record` and resolves its key values, generating missing
    /// ones where the flags allow; the generated values are written into the
    /// item and returned alongside it.
    fn create_put_item<R: DynamoRecord>(
        &self,
        record: &R,
        create_part_key: bool,
        create_sort_key: bool,
    ) -> Result<(Item, PsKeyValues), Error> {
        let key_names = self.config.key_names(None);
        let mut item = record.marshal()?;
        let keys = record.key_values(None);

        let partition_key = if keys.partition_key().is_empty() {
            if !create_part_key {
                return Err(Error::validation("missing required partition key"));
            }
            let generated = Uuid::new_v4().to_string();
            let _ = item.insert(
                key_names.partition_key.clone(),
                AttributeValue::S(generated.clone()),
            );
            KeyValue::from(generated)
        } else {
            keys.partition_key().clone()
        };

        let sort_key = match key_names.sort_key.as_deref() {
            None => None,
            Some(name) => match keys.sort_key().filter(|value| !value.is_empty()) {
                Some(value) => Some(value.clone()),
                None if create_sort_key => {
                    let generated = Uuid::new_v4().to_string();
                    let _ = item.insert(name.to_string(), AttributeValue::S(generated.clone()));
                    Some(KeyValue::from(generated))
                }
                None => return Err(Error::validation("missing required sorting key")),
            },
        };

        Ok((item, PsKeyValues::new(partition_key, sort_key)))
    }
}

/// Decodes a provider key map back into key values under the given names.
fn key_values_from_map(key_names: &KeyNames, mut key: Item) -> Result<PsKeyValues, Error> {
    let partition_key = match key.remove(&key_names.partition_key) {
        Some(value) => {
            let value: String = serde_dynamo::from_attribute_value(value)?;
            KeyValue::from(value)
        }
        None => KeyValue::default(),
    };

    let sort_key = match key_names.sort_key.as_deref().and_then(|name| key.remove(name)) {
        Some(value) => {
            let value: String = serde_dynamo::from_attribute_value(value)?;
            Some(KeyValue::from(value))
        }
        None => None,
    };

    Ok(PsKeyValues::new(partition_key, sort_key))
}
