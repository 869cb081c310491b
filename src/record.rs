use aws_sdk_dynamodb::types::AttributeValue;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::config::{IndexName, PsKeyValues};
use crate::Error;

/// Wire attribute map exchanged with DynamoDB.
pub type Item = HashMap<String, AttributeValue>;

/// Stable name of a record's logical entity type, used for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelName(&'static str);

impl ModelName {
    /// Returns the raw model name.
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Codec contract every stored record type implements.
///
/// Marshal and unmarshal default to `serde_dynamo` and rarely need
/// overriding; [`key_values`](DynamoRecord::key_values) is the one method a
/// record must supply, mapping the instance to its partition/sort key values
/// for the main table (`index` absent) or a named secondary index.
pub trait DynamoRecord: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Logical entity name, e.g. `"order"`
    const MODEL_NAME: &'static str;

    /// This instance's partition and sort key values.
    fn key_values(&self, index: Option<&IndexName>) -> PsKeyValues;

    /// The record's model name.
    fn model_name() -> ModelName {
        ModelName(Self::MODEL_NAME)
    }

    /// Serializes the record to the wire attribute map.
    fn marshal(&self) -> Result<Item, Error> {
        Ok(serde_dynamo::to_item(self)?)
    }

    /// Deserializes a wire attribute map into a new instance.
    fn unmarshal(item: Item) -> Result<Self, Error> {
        Ok(serde_dynamo::from_item(item)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Order {
        order_id: String,
        customer_id: String,
        total: u64,
    }

    impl DynamoRecord for Order {
        const MODEL_NAME: &'static str = "order";

        fn key_values(&self, _index: Option<&IndexName>) -> PsKeyValues {
            PsKeyValues::new(self.order_id.as_str().into(), None)
        }
    }

    #[test]
    fn test_marshal_unmarshal_round_trip() {
        let order = Order {
            order_id: "o-1".into(),
            customer_id: "c-9".into(),
            total: 1250,
        };

        let item = order.marshal().unwrap();
        assert!(matches!(item.get("order_id"), Some(AttributeValue::S(s)) if s == "o-1"));

        let restored = Order::unmarshal(item).unwrap();
        assert_eq!(restored, order);
    }

    #[test]
    fn test_unmarshal_shape_mismatch_errors() {
        let mut item = Item::new();
        let _ = item.insert("order_id".to_string(), AttributeValue::S("o-1".into()));
        // total and customer_id missing
        let result = Order::unmarshal(item);
        assert!(result.unwrap_err().is_serialization_error());
    }

    #[test]
    fn test_model_name() {
        assert_eq!(Order::model_name().as_str(), "order");
        assert_eq!(Order::model_name().to_string(), "order");
    }
}
