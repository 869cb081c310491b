//! Typed table handler: CRUD, queries and batched bulk operations over one
//! table described by a [`DbConfig`].

mod command;
mod query;

pub use query::Page;

use std::sync::Arc;

use aws_sdk_dynamodb::Client;

use crate::client::DynamoApi;
use crate::config::{DbConfig, KeyNames, PsKeyValues};
use crate::expression::ExpressionWrapper;
use crate::{dynamodb_client, Error};

/// Typed access to one DynamoDB table and its secondary indexes.
///
/// Generic over the transport so tests can substitute an in-memory double
/// for [`Client`]. Cloning shares the config and client, so a handler can be
/// moved freely into spawned tasks.
#[derive(Debug)]
pub struct DynamoHandler<C = Client> {
    config: Arc<DbConfig>,
    client: Arc<C>,
}

impl<C> Clone for DynamoHandler<C> {
    fn clone(&self) -> Self {
        DynamoHandler {
            config: Arc::clone(&self.config),
            client: Arc::clone(&self.client),
        }
    }
}

impl DynamoHandler {
    /// Validates `config` and binds the handler to the process-wide client,
    /// initializing it with defaults on first use.
    pub async fn connect(config: DbConfig) -> Result<Self, Error> {
        config.validate()?;
        let client = dynamodb_client().await.clone();
        Ok(DynamoHandler {
            config: Arc::new(config),
            client: Arc::new(client),
        })
    }
}

impl<C: DynamoApi> DynamoHandler<C> {
    /// Validates `config` and binds the handler to the given transport.
    pub fn with_client(config: DbConfig, client: C) -> Result<Self, Error> {
        config.validate()?;
        Ok(DynamoHandler {
            config: Arc::new(config),
            client: Arc::new(client),
        })
    }

    /// The validated table configuration.
    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// An empty expression targeting the handler's table, ready for
    /// conditions, projections and pagination controls.
    pub fn expression(&self) -> ExpressionWrapper {
        ExpressionWrapper::new(self.config.table.table_name.as_str())
    }

    /// An expression carrying the table name plus the partition and sort key
    /// values under the given key names.
    fn key_expression(&self, key_names: &KeyNames, keys: &PsKeyValues) -> ExpressionWrapper {
        let mut expression = self
            .expression()
            .with_partition_key(&key_names.partition_key, keys.partition_key().as_str());
        if let (Some(name), Some(value)) = (key_names.sort_key.as_deref(), keys.sort_key()) {
            expression = expression.with_sort_key(name, value.as_str());
        }
        expression
    }
}
