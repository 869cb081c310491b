//! # DynamoDB Access Layer
//!
//! A thin, typed access layer over `aws-sdk-dynamodb` with:
//! - Single-record CRUD keyed by partition/sort key values
//! - Bulk reads with concurrent chunk dispatch and unprocessed-key recovery
//! - Bulk writes with provider-side unprocessed-item reporting
//! - A chainable expression builder for key conditions, filters, updates,
//!   projections and pagination
//!
//! Records are plain `serde` types implementing [`DynamoRecord`]; table and
//! index key names live in a [`DbConfig`] validated once at handler
//! construction.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dynamo_access::{DbConfig, DynamoHandler, DynamoRecord, Error, PsKeyValues, TableInfo};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct Order {
//!     order_id: String,
//!     total: u64,
//! }
//!
//! impl DynamoRecord for Order {
//!     const MODEL_NAME: &'static str = "order";
//!
//!     fn key_values(&self, _index: Option<&dynamo_access::IndexName>) -> PsKeyValues {
//!         PsKeyValues::new(self.order_id.as_str().into(), None)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let config = DbConfig::new(TableInfo::new("orders", "order_id", None));
//!     let handler = DynamoHandler::connect(config).await?;
//!
//!     let order = Order { order_id: "o-1".into(), total: 42 };
//!     let keys = handler.add_record(&order, false).await?;
//!     let found: Option<Order> = handler.get_by_id(None, &keys).await?;
//!     assert!(found.is_some());
//!     Ok(())
//! }
//! ```
#![deny(
    warnings,
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    unused_allocation,
    unused_comparisons,
    unused_parens,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results,
    deprecated,
    unknown_lints,
    unreachable_code,
    unused_mut
)]

mod error;
pub use error::Error;

/// Table, index and key-value primitives
pub mod config;

/// Index-range partitioning for batch dispatch
pub mod partition;

/// Record codec contract
pub mod record;

/// Expression and request builder
pub mod expression;

/// Transport trait over the native DynamoDB client
pub mod client;

/// Typed CRUD, query and bulk operations
pub mod handler;

pub use client::DynamoApi;
pub use config::{DbConfig, IndexName, KeyNames, KeyValue, PsKeyValues, TableInfo};
pub use expression::{ExpressionWrapper, FromToDate, Operator};
pub use handler::{DynamoHandler, Page};
pub use partition::{partition, IdxRange};
pub use record::{DynamoRecord, Item, ModelName};

// Re-export aws-config types for custom client configuration
pub use aws_config::{defaults, BehaviorVersion, Region, SdkConfig};

use aws_sdk_dynamodb::Client as DynamoDbClient;
use tokio::sync::OnceCell;

/// Global DynamoDB client instance
static GLOBAL_CLIENT: OnceCell<DynamoDbClient> = OnceCell::const_new();

/// Default AWS config used when the client is never initialized explicitly:
/// adaptive retries (3 attempts, 1s initial backoff), 3s connect / 20s read /
/// 60s operation timeouts, LocalStack endpoint when `AWS_PROFILE=localstack`.
async fn aws_config_defaults() -> SdkConfig {
    use aws_types::sdk_config::{RetryConfig, TimeoutConfig};
    use std::time::Duration;

    let timeout_config = TimeoutConfig::builder()
        .connect_timeout(Duration::from_secs(3))
        .read_timeout(Duration::from_secs(20))
        .operation_timeout(Duration::from_secs(60))
        .build();

    let mut loader = defaults(BehaviorVersion::latest())
        .retry_config(
            RetryConfig::adaptive()
                .with_max_attempts(3)
                .with_initial_backoff(Duration::from_secs(1)),
        )
        .timeout_config(timeout_config);

    if std::env::var("AWS_PROFILE").unwrap_or_default() == "localstack" {
        loader = loader.endpoint_url("http://127.0.0.1:4566");
    }

    loader.load().await
}

/// Initialize the global DynamoDB client with a custom AWS config.
///
/// Call before the first handler is constructed via [`DynamoHandler::connect`];
/// later calls are no-ops.
pub async fn init(config: &SdkConfig) {
    let _ = GLOBAL_CLIENT
        .get_or_init(|| async { DynamoDbClient::new(config) })
        .await;
}

/// Initialize the global DynamoDB client with a pre-built client instance.
pub async fn init_with_client(client: DynamoDbClient) {
    let _ = GLOBAL_CLIENT.get_or_init(|| async { client }).await;
}

/// Get a reference to the global DynamoDB client, initializing it with
/// sensible defaults on first use. For custom configuration call [`init`] or
/// [`init_with_client`] beforehand.
pub async fn dynamodb_client() -> &'static DynamoDbClient {
    GLOBAL_CLIENT
        .get_or_init(|| async {
            let config = aws_config_defaults().await;
            DynamoDbClient::new(&config)
        })
        .await
}
