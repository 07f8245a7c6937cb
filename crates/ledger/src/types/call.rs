// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Decoded call trees as handed over by the chain client.

use serde::Deserialize;
use serde_json::Value;

/// A decoded runtime call.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Call {
    #[serde(rename = "call_module", alias = "module_id")]
    pub module_id: String,

    #[serde(rename = "call_function", alias = "function_id")]
    pub function_id: String,

    #[serde(rename = "call_args", alias = "args", default)]
    pub args: Vec<CallArg>,

    #[serde(default)]
    pub call_hash: Option<String>,
}

/// One named argument of a [`Call`].
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(from = "RawCallArg")]
pub struct CallArg {
    pub name: String,
    pub declared_type: String,
    pub value: ArgValue,
}

#[derive(Deserialize)]
struct RawCallArg {
    name: String,
    #[serde(rename = "type", alias = "declared_type", default)]
    declared_type: String,
    #[serde(default)]
    value: Value,
}

impl From<RawCallArg> for CallArg {
    fn from(raw: RawCallArg) -> Self {
        Self {
            name: raw.name,
            declared_type: raw.declared_type,
            value: ArgValue::from(raw.value),
        }
    }
}

/// Argument payload, with nested calls already lifted out of the raw tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Call(Box<Call>),
    Calls(Vec<Call>),
    Plain(Value),
}

fn looks_like_call(value: &Value) -> bool {
    value.as_object().is_some_and(|map| {
        (map.contains_key("call_module") && map.contains_key("call_function"))
            || (map.contains_key("module_id") && map.contains_key("function_id"))
    })
}

impl From<Value> for ArgValue {
    fn from(value: Value) -> Self {
        if looks_like_call(&value) {
            return match serde_json::from_value::<Call>(value.clone()) {
                Ok(call) => ArgValue::Call(Box::new(call)),
                Err(_) => ArgValue::Plain(value),
            };
        }

        if let Value::Array(items) = &value
            && !items.is_empty()
            && items.iter().all(looks_like_call)
        {
            let calls: Result<Vec<Call>, _> = items
                .iter()
                .cloned()
                .map(serde_json::from_value::<Call>)
                .collect();
            return match calls {
                Ok(calls) => ArgValue::Calls(calls),
                Err(_) => ArgValue::Plain(value),
            };
        }

        ArgValue::Plain(value)
    }
}

impl ArgValue {
    pub fn as_plain(&self) -> Option<&Value> {
        match self {
            ArgValue::Plain(v) => Some(v),
            _ => None,
        }
    }
}

impl Call {
    pub fn is(&self, module_id: &str, function_id: &str) -> bool {
        self.module_id == module_id && self.function_id == function_id
    }

    pub fn arg(&self, name: &str) -> Option<&CallArg> {
        self.args.iter().find(|a| a.name == name)
    }

    /// Plain value of the argument called `name`.
    pub fn plain_arg(&self, name: &str) -> Option<&Value> {
        self.arg(name).and_then(|a| a.value.as_plain())
    }

    /// The single nested call carried by a wrapper, if any.
    pub fn inner_call(&self) -> Option<&Call> {
        self.args.iter().find_map(|a| match &a.value {
            ArgValue::Call(call) => Some(call.as_ref()),
            _ => None,
        })
    }

    /// The nested call list carried by a batch, if any.
    pub fn inner_calls(&self) -> Option<&[Call]> {
        self.args.iter().find_map(|a| match &a.value {
            ArgValue::Calls(calls) => Some(calls.as_slice()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transfer_json() -> Value {
        json!({
            "call_index": "0x0500",
            "call_module": "Balances",
            "call_function": "transfer",
            "call_args": [
                {"name": "dest", "type": "LookupSource", "value": "0x01"},
                {"name": "value", "type": "Balance", "value": 10}
            ],
            "call_hash": "0xabc"
        })
    }

    #[test]
    fn test_plain_call() {
        let call: Call = serde_json::from_value(transfer_json()).unwrap();
        assert!(call.is("Balances", "transfer"));
        assert_eq!(call.args.len(), 2);
        assert_eq!(call.args[0].declared_type, "LookupSource");
        assert_eq!(call.plain_arg("value"), Some(&json!(10)));
        assert_eq!(call.call_hash.as_deref(), Some("0xabc"));
        assert!(call.inner_call().is_none());
        assert!(call.inner_calls().is_none());
    }

    #[test]
    fn test_nested_calls_are_lifted() {
        let batch: Call = serde_json::from_value(json!({
            "call_module": "Utility",
            "call_function": "batch",
            "call_args": [
                {"name": "calls", "type": "Vec<Call>", "value": [transfer_json(), transfer_json()]}
            ]
        }))
        .unwrap();
        assert_eq!(batch.inner_calls().map(|c| c.len()), Some(2));

        let proxy: Call = serde_json::from_value(json!({
            "call_module": "Proxy",
            "call_function": "proxy",
            "call_args": [
                {"name": "real", "type": "AccountId", "value": "0x02"},
                {"name": "call", "type": "Call", "value": transfer_json()}
            ]
        }))
        .unwrap();
        assert!(proxy.inner_call().unwrap().is("Balances", "transfer"));
    }

    #[test]
    fn test_alternate_field_names() {
        let call: Call = serde_json::from_value(json!({
            "module_id": "System",
            "function_id": "remark",
            "args": [{"name": "remark", "declared_type": "Bytes", "value": "0x00"}]
        }))
        .unwrap();
        assert!(call.is("System", "remark"));
        assert_eq!(call.args[0].declared_type, "Bytes");
    }

    #[test]
    fn test_empty_and_mixed_lists_stay_plain() {
        assert_eq!(ArgValue::from(json!([])), ArgValue::Plain(json!([])));
        let mixed = json!([transfer_json(), 1]);
        assert_eq!(ArgValue::from(mixed.clone()), ArgValue::Plain(mixed));
    }

    #[test]
    fn test_malformed_nested_call_stays_plain() {
        let broken = json!({"call_module": "Balances", "call_function": 7});
        assert_eq!(ArgValue::from(broken.clone()), ArgValue::Plain(broken));
    }
}
