use aws_sdk_dynamodb::error::BuildError;
use aws_sdk_dynamodb::operation::batch_get_item::BatchGetItemError;
use aws_sdk_dynamodb::operation::batch_write_item::BatchWriteItemError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use aws_sdk_dynamodb::operation::scan::ScanError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use aws_smithy_runtime_api::client::result::SdkError;
use aws_smithy_runtime_api::http::Response;
use serde_dynamo::Error as SerdeDynamoError;
use std::error::Error as StdError;
use std::fmt;

type DynamoPutError = SdkError<PutItemError, Response>;
type DynamoGetError = SdkError<GetItemError, Response>;
type DynamoUpdateError = SdkError<UpdateItemError, Response>;
type DynamoDeleteError = SdkError<DeleteItemError, Response>;
type DynamoQueryError = SdkError<QueryError, Response>;
type DynamoScanError = SdkError<ScanError, Response>;
type DynamoBatchGetError = SdkError<BatchGetItemError, Response>;
type DynamoBatchWriteError = SdkError<BatchWriteItemError, Response>;

/// DynamoDB access layer error
#[derive(Debug)]
pub enum Error {
    /// Record (de)serialization failed
    SerdeDynamo(SerdeDynamoError),
    /// A compiled request could not be assembled
    Build(BuildError),
    /// Table or index key names are incomplete; raised at handler construction
    InvalidConfig,
    /// A required key, field or name was missing before any network call
    Validation(String),
    /// PutItem failed
    Put(DynamoPutError),
    /// GetItem failed
    Get(DynamoGetError),
    /// UpdateItem failed
    Update(DynamoUpdateError),
    /// DeleteItem failed
    Delete(DynamoDeleteError),
    /// Query failed
    Query(DynamoQueryError),
    /// Scan failed
    Scan(DynamoScanError),
    /// BatchGetItem failed
    BatchGet(DynamoBatchGetError),
    /// BatchWriteItem failed
    BatchWrite(DynamoBatchWriteError),
}

impl Error {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// `true` when the provider rejected a conditional put or update, e.g. a
    /// no-overwrite create hitting an existing record.
    pub fn is_conditional_check_failed(&self) -> bool {
        match self {
            Error::Put(e) => matches!(
                e.as_service_error(),
                Some(PutItemError::ConditionalCheckFailedException(_))
            ),
            Error::Update(e) => matches!(
                e.as_service_error(),
                Some(UpdateItemError::ConditionalCheckFailedException(_))
            ),
            _ => false,
        }
    }

    /// `true` for record (de)serialization failures.
    pub fn is_serialization_error(&self) -> bool {
        matches!(self, Error::SerdeDynamo(_))
    }

    /// `true` for errors detected before any network call.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::InvalidConfig)
    }
}

macro_rules! impl_from_error {
    ($name:ident, $variant:ident) => {
        impl From<$name> for Error {
            fn from(e: $name) -> Self {
                Error::$variant(e)
            }
        }
    };
}

impl_from_error!(SerdeDynamoError, SerdeDynamo);
impl_from_error!(BuildError, Build);
impl_from_error!(DynamoPutError, Put);
impl_from_error!(DynamoGetError, Get);
impl_from_error!(DynamoUpdateError, Update);
impl_from_error!(DynamoDeleteError, Delete);
impl_from_error!(DynamoQueryError, Query);
impl_from_error!(DynamoScanError, Scan);
impl_from_error!(DynamoBatchGetError, BatchGet);
impl_from_error!(DynamoBatchWriteError, BatchWrite);

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SerdeDynamo(e) => write!(f, "DynamoDB serialization error: {}", e),
            Error::Build(e) => write!(f, "DynamoDB request builder error: {}", e),
            Error::InvalidConfig => {
                write!(f, "invalid db config, missing mandatory keys")
            }
            Error::Validation(msg) => write!(f, "{}", msg),
            Error::Put(e) => write!(f, "DynamoDB PutItem operation failed: {}", e),
            Error::Get(e) => write!(f, "DynamoDB GetItem operation failed: {}", e),
            Error::Update(e) => write!(f, "DynamoDB UpdateItem operation failed: {}", e),
            Error::Delete(e) => write!(f, "DynamoDB DeleteItem operation failed: {}", e),
            Error::Query(e) => write!(f, "DynamoDB Query operation failed: {}", e),
            Error::Scan(e) => write!(f, "DynamoDB Scan operation failed: {}", e),
            Error::BatchGet(e) => write!(f, "DynamoDB BatchGetItem operation failed: {}", e),
            Error::BatchWrite(e) => {
                write!(f, "DynamoDB BatchWriteItem operation failed: {}", e)
            }
        }
    }
}

impl StdError for Error {}
