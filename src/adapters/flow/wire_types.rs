//! Flow API response shapes.
//!
//! Flow is loose about scalar types: the same field can arrive as a number,
//! a numeric string or a boolean depending on the endpoint. These types
//! accept all of them and normalize at the edge.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// `/customer/create` and `/customer/getByEmail` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowCustomer {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rut: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// `/plans/create` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowPlan {
    pub plan_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub interval: Option<Value>,
    #[serde(default)]
    pub interval_count: Option<Value>,
}

/// Subscription as returned by `/subscription/create` and `/subscription/list`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSubscription {
    pub subscription_id: String,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub plan_id: Option<String>,
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub morose: Option<Value>,
    #[serde(default)]
    pub customer_external_id: Option<String>,
}

/// Paged list envelope: `{ total, hasMore, data }`.
///
/// `data` is sometimes an array and sometimes a JSON-encoded string holding
/// the array.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowList {
    #[serde(default)]
    pub total: Option<Value>,
    #[serde(default)]
    pub has_more: Option<Value>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl FlowList {
    /// Decodes the `data` entries.
    pub fn items<T: DeserializeOwned>(&self) -> Result<Vec<T>, serde_json::Error> {
        match &self.data {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::String(encoded)) if encoded.trim().is_empty() => Ok(Vec::new()),
            Some(Value::String(encoded)) => serde_json::from_str(encoded),
            Some(other) => serde_json::from_value(other.clone()),
        }
    }

    pub fn total(&self) -> Option<u64> {
        self.total.as_ref().and_then(as_u64)
    }

    pub fn has_more(&self) -> Option<bool> {
        self.has_more.as_ref().map(as_flag)
    }
}

/// Renders a scalar as the raw string form used for status codes.
pub fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Interprets `1`, `"1"`, `true`, `"true"` as set.
pub fn as_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64().map(|v| v != 0).unwrap_or(false),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true"),
        _ => false,
    }
}

pub fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_u64(value: &Value) -> Option<u64> {
    as_i64(value).and_then(|v| u64::try_from(v).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_decodes_array_data() {
        let list: FlowList = serde_json::from_value(json!({
            "total": 2,
            "hasMore": 0,
            "data": [
                { "subscriptionId": "sus_1", "status": 1, "morose": 0 },
                { "subscriptionId": "sus_2", "status": "4", "morose": "1" }
            ]
        }))
        .unwrap();

        let items: Vec<FlowSubscription> = list.items().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(list.total(), Some(2));
        assert_eq!(list.has_more(), Some(false));
        assert_eq!(scalar_to_string(items[1].status.as_ref().unwrap()), "4");
        assert!(as_flag(items[1].morose.as_ref().unwrap()));
    }

    #[test]
    fn list_decodes_string_encoded_data() {
        let list: FlowList = serde_json::from_value(json!({
            "total": "1",
            "hasMore": false,
            "data": "[{\"subscriptionId\":\"sus_9\",\"status\":1}]"
        }))
        .unwrap();

        let items: Vec<FlowSubscription> = list.items().unwrap();
        assert_eq!(items[0].subscription_id, "sus_9");
        assert_eq!(list.total(), Some(1));
    }

    #[test]
    fn list_without_data_is_empty() {
        let list: FlowList = serde_json::from_value(json!({ "total": 0 })).unwrap();
        let items: Vec<FlowSubscription> = list.items().unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn flags_accept_loose_forms() {
        assert!(as_flag(&json!(true)));
        assert!(as_flag(&json!(1)));
        assert!(as_flag(&json!("true")));
        assert!(!as_flag(&json!(0)));
        assert!(!as_flag(&json!("no")));
        assert!(!as_flag(&Value::Null));
    }

    #[test]
    fn scalar_to_string_renders_numbers_and_strings() {
        assert_eq!(scalar_to_string(&json!(1)), "1");
        assert_eq!(scalar_to_string(&json!(" canceled ")), "canceled");
        assert_eq!(scalar_to_string(&Value::Null), "");
    }

    #[test]
    fn as_i64_parses_strings() {
        assert_eq!(as_i64(&json!("9990")), Some(9990));
        assert_eq!(as_i64(&json!(3)), Some(3));
        assert_eq!(as_i64(&json!("x")), None);
    }
}
