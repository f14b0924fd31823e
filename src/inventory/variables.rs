//! Mirror of host-side scalar variables (currency counters and the like).
//! Last write wins; no history and no persistence.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::InventoryError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    Number(f64),
    Text(String),
}

impl VariableValue {
    /// Accept a JSON number or string; anything else is not a scalar.
    pub fn from_json(value: &Value) -> Result<Self, InventoryError> {
        match value {
            Value::Number(n) => n.as_f64().map(VariableValue::Number).ok_or_else(|| {
                InventoryError::InvalidArgument(format!("unrepresentable number {}", n))
            }),
            Value::String(s) => Ok(VariableValue::Text(s.clone())),
            other => Err(InventoryError::InvalidArgument(format!(
                "variable value must be a number or string, got {}",
                other
            ))),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            VariableValue::Number(n) => Some(*n),
            VariableValue::Text(_) => None,
        }
    }
}

impl fmt::Display for VariableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableValue::Number(n) => write!(f, "{}", n),
            VariableValue::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PortalsVariables {
    values: HashMap<String, VariableValue>,
}

impl PortalsVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `name`, returning what it replaced.
    pub fn sync(
        &mut self,
        name: &str,
        value: VariableValue,
    ) -> Result<Option<VariableValue>, InventoryError> {
        if name.trim().is_empty() {
            return Err(InventoryError::InvalidArgument(
                "variable name is required".into(),
            ));
        }
        Ok(self.values.insert(name.to_string(), value))
    }

    pub fn get(&self, name: &str) -> Option<&VariableValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn last_write_wins() {
        let mut vars = PortalsVariables::new();
        assert_eq!(vars.sync("coins", VariableValue::Number(10.0)).unwrap(), None);
        let prev = vars.sync("coins", VariableValue::Text("many".into())).unwrap();
        assert_eq!(prev, Some(VariableValue::Number(10.0)));
        assert_eq!(vars.get("coins"), Some(&VariableValue::Text("many".into())));
        assert_eq!(vars.len(), 1);
    }

    #[test]
    fn only_scalars_are_accepted() {
        assert_eq!(
            VariableValue::from_json(&json!(42)).unwrap().as_f64(),
            Some(42.0)
        );
        assert_eq!(
            VariableValue::from_json(&json!("gold")).unwrap().to_string(),
            "gold"
        );
        for bad in [json!(null), json!(true), json!([1]), json!({"a": 1})] {
            assert!(VariableValue::from_json(&bad).is_err());
        }
    }

    #[test]
    fn empty_name_rejected() {
        let mut vars = PortalsVariables::new();
        assert!(matches!(
            vars.sync(" ", VariableValue::Number(1.0)),
            Err(InventoryError::InvalidArgument(_))
        ));
        assert!(vars.is_empty());
    }
}
