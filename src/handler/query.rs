use std::collections::HashMap;

use aws_sdk_dynamodb::operation::batch_get_item::BatchGetItemInput;
use aws_sdk_dynamodb::types::KeysAndAttributes;
use tokio::sync::mpsc;
use tracing::debug;

use super::DynamoHandler;
use crate::client::DynamoApi;
use crate::config::{IndexName, PsKeyValues};
use crate::expression::{ExpressionWrapper, Operator};
use crate::partition::{partition, BATCH_ITEM_LIMIT};
use crate::record::{DynamoRecord, Item};
use crate::Error;

/// One page of query or scan results.
#[derive(Clone, Debug)]
pub struct Page<R> {
    /// Decoded records in provider order
    pub records: Vec<R>,
    /// Continuation token; feed back via
    /// [`ExpressionWrapper::with_exclusive_start_key`] to fetch the next page
    pub last_evaluated_key: Option<Item>,
}

impl<C: DynamoApi> DynamoHandler<C> {
    /// Fetches one record by its key values, or `Ok(None)` when no item
    /// exists.
    ///
    /// With an index the lookup runs as a key-condition query against that
    /// index using its configured key names; without one it is a direct get
    /// on the main table.
    pub async fn get_by_id<R: DynamoRecord>(
        &self,
        index: Option<&IndexName>,
        keys: &PsKeyValues,
    ) -> Result<Option<R>, Error> {
        if keys.partition_key().is_empty() {
            return Err(Error::validation("missing partition key"));
        }
        let key_names = self.config.key_names(index);

        let Some(index) = index else {
            let input = self.key_expression(key_names, keys).build_get_input()?;
            let output = self.client.get_item(input).await?;
            return output.item.map(R::unmarshal).transpose();
        };

        let mut expression = self
            .expression()
            .with_index_name(index.as_str())
            .with_key_condition(
                &key_names.partition_key,
                keys.partition_key().as_str(),
                Operator::Equal,
            );
        if let (Some(name), Some(value)) = (key_names.sort_key.as_deref(), keys.sort_key()) {
            expression = expression.and_key_condition(name, value.as_str(), Operator::Equal);
        }

        let page = self.query_records(expression.with_limit(1)).await?;
        Ok(page.records.into_iter().next())
    }

    /// Fetches many records by key, batching the keys into provider-sized
    /// chunks dispatched concurrently.
    ///
    /// Keys whose partition key value is empty are skipped; a chunk of only
    /// such keys performs no network call. Unprocessed keys reported by the
    /// provider are resubmitted until the chunk drains. The first chunk
    /// error is returned immediately; remaining chunks run to completion in
    /// the background. Record order across chunks is not defined.
    pub async fn get_by_ids<R: DynamoRecord>(
        &self,
        keys: &[PsKeyValues],
    ) -> Result<Vec<R>, Error> {
        let ranges: Vec<_> = partition(keys.len(), BATCH_ITEM_LIMIT).collect();
        if ranges.is_empty() {
            return Ok(Vec::new());
        }
        debug!(keys = keys.len(), chunks = ranges.len(), "dispatching bulk read");

        // Capacity matches the task count, so every task can deliver its one
        // result without blocking even after the receiver is gone.
        let (tx, mut rx) = mpsc::channel(ranges.len());
        for range in ranges {
            let chunk = keys[range.low..range.high].to_vec();
            let handler = self.clone();
            let tx = tx.clone();
            let _ = tokio::spawn(async move {
                let result = handler.load_chunk::<R>(&chunk).await;
                let _ = tx.send(result).await;
            });
        }
        drop(tx);

        let mut records = Vec::with_capacity(keys.len());
        while let Some(result) = rx.recv().await {
            records.extend(result?);
        }
        Ok(records)
    }

    /// Runs one page of a key-condition query built with
    /// [`DynamoHandler::expression`].
    pub async fn query_records<R: DynamoRecord>(
        &self,
        expression: ExpressionWrapper,
    ) -> Result<Page<R>, Error> {
        let output = self.client.query(expression.build_query_input()?).await?;
        Ok(Page {
            records: decode_items(output.items)?,
            last_evaluated_key: output.last_evaluated_key.filter(|key| !key.is_empty()),
        })
    }

    /// Runs one page of a filtered table scan built with
    /// [`DynamoHandler::expression`].
    pub async fn scan_records<R: DynamoRecord>(
        &self,
        expression: ExpressionWrapper,
    ) -> Result<Page<R>, Error> {
        let output = self.client.scan(expression.build_scan_input()?).await?;
        Ok(Page {
            records: decode_items(output.items)?,
            last_evaluated_key: output.last_evaluated_key.filter(|key| !key.is_empty()),
        })
    }

    /// Loads one chunk of keys, resubmitting unprocessed keys until the
    /// provider reports none.
    async fn load_chunk<R: DynamoRecord>(&self, keys: &[PsKeyValues]) -> Result<Vec<R>, Error> {
        let table_name = self.config.table.table_name.as_str();
        let mut request = self.build_get_requests(keys)?;
        let mut records = Vec::with_capacity(keys.len());

        while let Some(input) = request.take() {
            let output = self.client.batch_get_item(input).await?;

            if let Some(mut responses) = output.responses {
                if let Some(items) = responses.remove(table_name) {
                    for item in items {
                        records.push(R::unmarshal(item)?);
                    }
                }
            }

            if let Some(unprocessed) = output.unprocessed_keys.filter(|keys| !keys.is_empty()) {
                request = Some(
                    BatchGetItemInput::builder()
                        .set_request_items(Some(unprocessed))
                        .build()?,
                );
            }
        }

        Ok(records)
    }

    /// Compiles a chunk of keys into one batch-get request; keys that fail
    /// key compilation are dropped. `None` when no key survives.
    fn build_get_requests(
        &self,
        keys: &[PsKeyValues],
    ) -> Result<Option<BatchGetItemInput>, Error> {
        let key_names = self.config.key_names(None);

        let mut key_maps = Vec::with_capacity(keys.len());
        for key in keys {
            if let Ok(map) = self.key_expression(key_names, key).query_keys() {
                key_maps.push(map);
            }
        }
        if key_maps.is_empty() {
            return Ok(None);
        }

        let attributes = KeysAndAttributes::builder().set_keys(Some(key_maps)).build()?;
        let mut request_items = HashMap::new();
        let _ = request_items.insert(self.config.table.table_name.clone(), attributes);

        Ok(Some(
            BatchGetItemInput::builder()
                .set_request_items(Some(request_items))
                .build()?,
        ))
    }
}

fn decode_items<R: DynamoRecord>(items: Option<Vec<Item>>) -> Result<Vec<R>, Error> {
    items
        .unwrap_or_default()
        .into_iter()
        .map(R::unmarshal)
        .collect()
}
