use std::future::Future;

use aws_sdk_dynamodb::operation::batch_get_item::{BatchGetItemInput, BatchGetItemOutput};
use aws_sdk_dynamodb::operation::batch_write_item::{BatchWriteItemInput, BatchWriteItemOutput};
use aws_sdk_dynamodb::operation::delete_item::{DeleteItemInput, DeleteItemOutput};
use aws_sdk_dynamodb::operation::get_item::{GetItemInput, GetItemOutput};
use aws_sdk_dynamodb::operation::put_item::{PutItemInput, PutItemOutput};
use aws_sdk_dynamodb::operation::query::{QueryInput, QueryOutput};
use aws_sdk_dynamodb::operation::scan::{ScanInput, ScanOutput};
use aws_sdk_dynamodb::operation::update_item::{UpdateItemInput, UpdateItemOutput};
use aws_sdk_dynamodb::Client;

use crate::Error;

/// The slice of the DynamoDB surface the handler depends on.
///
/// [`Client`] is the production implementation; tests substitute an
/// in-memory double. Every method takes a fully compiled request input and
/// returns the provider output unchanged.
pub trait DynamoApi: Send + Sync + 'static {
    /// Fetches a single item by primary key.
    fn get_item(
        &self,
        input: GetItemInput,
    ) -> impl Future<Output = Result<GetItemOutput, Error>> + Send;

    /// Writes one item, honoring any condition expression on the input.
    fn put_item(
        &self,
        input: PutItemInput,
    ) -> impl Future<Output = Result<PutItemOutput, Error>> + Send;

    /// Applies an update expression to one item.
    fn update_item(
        &self,
        input: UpdateItemInput,
    ) -> impl Future<Output = Result<UpdateItemOutput, Error>> + Send;

    /// Deletes one item, honoring any condition expression on the input.
    fn delete_item(
        &self,
        input: DeleteItemInput,
    ) -> impl Future<Output = Result<DeleteItemOutput, Error>> + Send;

    /// Runs a key-condition query against the table or an index.
    fn query(&self, input: QueryInput) -> impl Future<Output = Result<QueryOutput, Error>> + Send;

    /// Runs a full table scan with an optional filter.
    fn scan(&self, input: ScanInput) -> impl Future<Output = Result<ScanOutput, Error>> + Send;

    /// Fetches up to one batch-read chunk of items; unprocessed keys come
    /// back on the output.
    fn batch_get_item(
        &self,
        input: BatchGetItemInput,
    ) -> impl Future<Output = Result<BatchGetItemOutput, Error>> + Send;

    /// Writes up to one batch-write chunk of put/delete requests;
    /// unprocessed items come back on the output.
    fn batch_write_item(
        &self,
        input: BatchWriteItemInput,
    ) -> impl Future<Output = Result<BatchWriteItemOutput, Error>> + Send;
}

impl DynamoApi for Client {
    async fn get_item(&self, input: GetItemInput) -> Result<GetItemOutput, Error> {
        Ok(self
            .get_item()
            .set_table_name(input.table_name)
            .set_key(input.key)
            .send()
            .await?)
    }

    async fn put_item(&self, input: PutItemInput) -> Result<PutItemOutput, Error> {
        Ok(self
            .put_item()
            .set_table_name(input.table_name)
            .set_item(input.item)
            .set_condition_expression(input.condition_expression)
            .set_expression_attribute_names(input.expression_attribute_names)
            .set_expression_attribute_values(input.expression_attribute_values)
            .send()
            .await?)
    }

    async fn update_item(&self, input: UpdateItemInput) -> Result<UpdateItemOutput, Error> {
        Ok(self
            .update_item()
            .set_table_name(input.table_name)
            .set_key(input.key)
            .set_update_expression(input.update_expression)
            .set_condition_expression(input.condition_expression)
            .set_expression_attribute_names(input.expression_attribute_names)
            .set_expression_attribute_values(input.expression_attribute_values)
            .send()
            .await?)
    }

    async fn delete_item(&self, input: DeleteItemInput) -> Result<DeleteItemOutput, Error> {
        Ok(self
            .delete_item()
            .set_table_name(input.table_name)
            .set_key(input.key)
            .set_condition_expression(input.condition_expression)
            .set_expression_attribute_names(input.expression_attribute_names)
            .set_expression_attribute_values(input.expression_attribute_values)
            .send()
            .await?)
    }

    async fn query(&self, input: QueryInput) -> Result<QueryOutput, Error> {
        Ok(self
            .query()
            .set_table_name(input.table_name)
            .set_index_name(input.index_name)
            .set_key_condition_expression(input.key_condition_expression)
            .set_filter_expression(input.filter_expression)
            .set_projection_expression(input.projection_expression)
            .set_expression_attribute_names(input.expression_attribute_names)
            .set_expression_attribute_values(input.expression_attribute_values)
            .set_limit(input.limit)
            .set_exclusive_start_key(input.exclusive_start_key)
            .set_scan_index_forward(input.scan_index_forward)
            .send()
            .await?)
    }

    async fn scan(&self, input: ScanInput) -> Result<ScanOutput, Error> {
        Ok(self
            .scan()
            .set_table_name(input.table_name)
            .set_index_name(input.index_name)
            .set_filter_expression(input.filter_expression)
            .set_projection_expression(input.projection_expression)
            .set_expression_attribute_names(input.expression_attribute_names)
            .set_expression_attribute_values(input.expression_attribute_values)
            .set_limit(input.limit)
            .set_exclusive_start_key(input.exclusive_start_key)
            .send()
            .await?)
    }

    async fn batch_get_item(&self, input: BatchGetItemInput) -> Result<BatchGetItemOutput, Error> {
        Ok(self
            .batch_get_item()
            .set_request_items(input.request_items)
            .send()
            .await?)
    }

    async fn batch_write_item(
        &self,
        input: BatchWriteItemInput,
    ) -> Result<BatchWriteItemOutput, Error> {
        Ok(self
            .batch_write_item()
            .set_request_items(input.request_items)
            .send()
            .await?)
    }
}
