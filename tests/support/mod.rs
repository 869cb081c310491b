#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering::SeqCst;
use std::sync::{Arc, Mutex};

use aws_sdk_dynamodb::operation::batch_get_item::{BatchGetItemInput, BatchGetItemOutput};
use aws_sdk_dynamodb::operation::batch_write_item::{BatchWriteItemInput, BatchWriteItemOutput};
use aws_sdk_dynamodb::operation::delete_item::{DeleteItemInput, DeleteItemOutput};
use aws_sdk_dynamodb::operation::get_item::{GetItemInput, GetItemOutput};
use aws_sdk_dynamodb::operation::put_item::{PutItemInput, PutItemOutput};
use aws_sdk_dynamodb::operation::query::{QueryInput, QueryOutput};
use aws_sdk_dynamodb::operation::scan::{ScanInput, ScanOutput};
use aws_sdk_dynamodb::operation::update_item::{UpdateItemInput, UpdateItemOutput};
use serde::{Deserialize, Serialize};

use dynamo_access::{
    DbConfig, DynamoApi, DynamoRecord, Error, IndexName, Item, KeyNames, PsKeyValues, TableInfo,
};

type Handler<I, O> = Box<dyn Fn(&I) -> Result<O, Error> + Send + Sync>;

/// Observable side of the mock, shared with the test via `Arc` so it stays
/// inspectable after the mock moves into a handler.
#[derive(Default)]
pub struct MockStats {
    pub get_calls: AtomicUsize,
    pub put_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub query_calls: AtomicUsize,
    pub scan_calls: AtomicUsize,
    pub batch_get_calls: AtomicUsize,
    pub batch_write_calls: AtomicUsize,
    pub put_inputs: Mutex<Vec<PutItemInput>>,
    pub update_inputs: Mutex<Vec<UpdateItemInput>>,
    pub delete_inputs: Mutex<Vec<DeleteItemInput>>,
    pub batch_get_inputs: Mutex<Vec<BatchGetItemInput>>,
    pub batch_write_inputs: Mutex<Vec<BatchWriteItemInput>>,
}

/// In-memory transport double. Unconfigured operations answer with an empty
/// success output; every call is counted and its input captured.
#[derive(Default)]
pub struct MockDynamo {
    pub stats: Arc<MockStats>,
    get: Option<Handler<GetItemInput, GetItemOutput>>,
    put: Option<Handler<PutItemInput, PutItemOutput>>,
    update: Option<Handler<UpdateItemInput, UpdateItemOutput>>,
    delete: Option<Handler<DeleteItemInput, DeleteItemOutput>>,
    query: Option<Handler<QueryInput, QueryOutput>>,
    scan: Option<Handler<ScanInput, ScanOutput>>,
    batch_get: Option<Handler<BatchGetItemInput, BatchGetItemOutput>>,
    batch_write: Option<Handler<BatchWriteItemInput, BatchWriteItemOutput>>,
}

impl MockDynamo {
    pub fn on_get(
        mut self,
        f: impl Fn(&GetItemInput) -> Result<GetItemOutput, Error> + Send + Sync + 'static,
    ) -> Self {
        self.get = Some(Box::new(f));
        self
    }

    pub fn on_put(
        mut self,
        f: impl Fn(&PutItemInput) -> Result<PutItemOutput, Error> + Send + Sync + 'static,
    ) -> Self {
        self.put = Some(Box::new(f));
        self
    }

    pub fn on_update(
        mut self,
        f: impl Fn(&UpdateItemInput) -> Result<UpdateItemOutput, Error> + Send + Sync + 'static,
    ) -> Self {
        self.update = Some(Box::new(f));
        self
    }

    pub fn on_delete(
        mut self,
        f: impl Fn(&DeleteItemInput) -> Result<DeleteItemOutput, Error> + Send + Sync + 'static,
    ) -> Self {
        self.delete = Some(Box::new(f));
        self
    }

    pub fn on_query(
        mut self,
        f: impl Fn(&QueryInput) -> Result<QueryOutput, Error> + Send + Sync + 'static,
    ) -> Self {
        self.query = Some(Box::new(f));
        self
    }

    pub fn on_scan(
        mut self,
        f: impl Fn(&ScanInput) -> Result<ScanOutput, Error> + Send + Sync + 'static,
    ) -> Self {
        self.scan = Some(Box::new(f));
        self
    }

    pub fn on_batch_get(
        mut self,
        f: impl Fn(&BatchGetItemInput) -> Result<BatchGetItemOutput, Error> + Send + Sync + 'static,
    ) -> Self {
        self.batch_get = Some(Box::new(f));
        self
    }

    pub fn on_batch_write(
        mut self,
        f: impl Fn(&BatchWriteItemInput) -> Result<BatchWriteItemOutput, Error>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.batch_write = Some(Box::new(f));
        self
    }
}

impl DynamoApi for MockDynamo {
    async fn get_item(&self, input: GetItemInput) -> Result<GetItemOutput, Error> {
        let _ = self.stats.get_calls.fetch_add(1, SeqCst);
        match &self.get {
            Some(f) => f(&input),
            None => Ok(GetItemOutput::builder().build()),
        }
    }

    async fn put_item(&self, input: PutItemInput) -> Result<PutItemOutput, Error> {
        let _ = self.stats.put_calls.fetch_add(1, SeqCst);
        let result = match &self.put {
            Some(f) => f(&input),
            None => Ok(PutItemOutput::builder().build()),
        };
        self.stats.put_inputs.lock().unwrap().push(input);
        result
    }

    async fn update_item(&self, input: UpdateItemInput) -> Result<UpdateItemOutput, Error> {
        let _ = self.stats.update_calls.fetch_add(1, SeqCst);
        let result = match &self.update {
            Some(f) => f(&input),
            None => Ok(UpdateItemOutput::builder().build()),
        };
        self.stats.update_inputs.lock().unwrap().push(input);
        result
    }

    async fn delete_item(&self, input: DeleteItemInput) -> Result<DeleteItemOutput, Error> {
        let _ = self.stats.delete_calls.fetch_add(1, SeqCst);
        let result = match &self.delete {
            Some(f) => f(&input),
            None => Ok(DeleteItemOutput::builder().build()),
        };
        self.stats.delete_inputs.lock().unwrap().push(input);
        result
    }

    async fn query(&self, input: QueryInput) -> Result<QueryOutput, Error> {
        let _ = self.stats.query_calls.fetch_add(1, SeqCst);
        match &self.query {
            Some(f) => f(&input),
            None => Ok(QueryOutput::builder().build()),
        }
    }

    async fn scan(&self, input: ScanInput) -> Result<ScanOutput, Error> {
        let _ = self.stats.scan_calls.fetch_add(1, SeqCst);
        match &self.scan {
            Some(f) => f(&input),
            None => Ok(ScanOutput::builder().build()),
        }
    }

    async fn batch_get_item(&self, input: BatchGetItemInput) -> Result<BatchGetItemOutput, Error> {
        let _ = self.stats.batch_get_calls.fetch_add(1, SeqCst);
        let result = match &self.batch_get {
            Some(f) => f(&input),
            None => Ok(BatchGetItemOutput::builder().build()),
        };
        self.stats.batch_get_inputs.lock().unwrap().push(input);
        result
    }

    async fn batch_write_item(
        &self,
        input: BatchWriteItemInput,
    ) -> Result<BatchWriteItemOutput, Error> {
        let _ = self.stats.batch_write_calls.fetch_add(1, SeqCst);
        let result = match &self.batch_write {
            Some(f) => f(&input),
            None => Ok(BatchWriteItemOutput::builder().build()),
        };
        self.stats.batch_write_inputs.lock().unwrap().push(input);
        result
    }
}

/// Record stored in a partition-key-only table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub customer_id: String,
    pub total: u64,
}

impl DynamoRecord for Order {
    const MODEL_NAME: &'static str = "order";

    fn key_values(&self, index: Option<&IndexName>) -> PsKeyValues {
        match index {
            Some(_) => PsKeyValues::new(self.customer_id.as_str().into(), None),
            None => PsKeyValues::new(self.order_id.as_str().into(), None),
        }
    }
}

/// Record stored in a table with a sort key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub stream_id: String,
    pub occurred_at: String,
    pub payload: String,
}

impl DynamoRecord for Event {
    const MODEL_NAME: &'static str = "event";

    fn key_values(&self, _index: Option<&IndexName>) -> PsKeyValues {
        let sort_key = if self.occurred_at.is_empty() {
            None
        } else {
            Some(self.occurred_at.as_str().into())
        };
        PsKeyValues::new(self.stream_id.as_str().into(), sort_key)
    }
}

pub fn orders_config() -> DbConfig {
    DbConfig::new(TableInfo::new("orders", "order_id", None))
        .with_index("by-customer", KeyNames::new("customer_id", None))
}

pub fn events_config() -> DbConfig {
    DbConfig::new(TableInfo::new("events", "stream_id", Some("occurred_at")))
}

pub fn order(id: &str) -> Order {
    Order {
        order_id: id.to_string(),
        customer_id: format!("c-{id}"),
        total: 10,
    }
}

pub fn orders(count: usize) -> Vec<Order> {
    (0..count).map(|i| order(&format!("o-{i}"))).collect()
}

pub fn order_keys(count: usize) -> Vec<PsKeyValues> {
    (0..count)
        .map(|i| PsKeyValues::new(format!("o-{i}").as_str().into(), None))
        .collect()
}

pub fn order_item(id: &str) -> Item {
    order(id).marshal().unwrap()
}

/// Number of keys requested for `table` in a batch-get input.
pub fn requested_key_count(input: &BatchGetItemInput, table: &str) -> usize {
    input
        .request_items()
        .and_then(|items| items.get(table))
        .map(|attrs| attrs.keys().len())
        .unwrap_or(0)
}

/// Items present in the responses map of a batch-get output builder.
pub fn batch_get_output(table: &str, items: Vec<Item>) -> BatchGetItemOutput {
    let mut responses = HashMap::new();
    let _ = responses.insert(table.to_string(), items);
    BatchGetItemOutput::builder()
        .set_responses(Some(responses))
        .build()
}
