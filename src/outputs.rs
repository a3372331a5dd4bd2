//! Module output parsing and typed access
//!
//! After a successful apply the harness reads the module's declared outputs
//! via the tool's JSON report (`output -json`), where each entry is an object
//! carrying `value`, `type`, and `sensitive` fields. [`OutputSet`] keeps the
//! raw values and exposes the two shapes callers assert on: scalar strings
//! and ordered string lists.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::HarnessError;

/// Named values exposed by a module after a successful apply.
#[derive(Debug, Clone, Default)]
pub struct OutputSet {
    values: BTreeMap<String, Value>,
}

impl OutputSet {
    /// Parse the tool's JSON output report.
    ///
    /// Entries wrapped in the usual `{ "value": ..., "type": ..., ... }`
    /// envelope are unwrapped; bare values are taken as-is.
    pub fn from_report(report: &str) -> Result<Self, HarnessError> {
        let root: Value = serde_json::from_str(report)?;
        let Value::Object(entries) = root else {
            return Err(HarnessError::ToolInvocation {
                command: "output -json".to_string(),
                status: Some(0),
                diagnostic: "output report was not a JSON object".to_string(),
            });
        };
        let mut values = BTreeMap::new();
        for (name, entry) in entries {
            let value = match &entry {
                Value::Object(fields) => fields.get("value").cloned().unwrap_or(entry),
                _ => entry,
            };
            values.insert(name, value);
        }
        Ok(Self { values })
    }

    /// Whether the module declared no outputs.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of declared outputs.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Iterate over output names and raw values, in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Raw value for an output, if declared.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Scalar accessor: strings, numbers, and booleans render as text.
    pub fn output(&self, name: &str) -> Result<String, HarnessError> {
        match self.lookup(name)? {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            _ => Err(HarnessError::TypeMismatch {
                name: name.to_string(),
                expected: "scalar",
            }),
        }
    }

    /// List accessor: an ordered sequence of scalar items rendered as text.
    pub fn output_list(&self, name: &str) -> Result<Vec<String>, HarnessError> {
        let Value::Array(items) = self.lookup(name)? else {
            return Err(HarnessError::TypeMismatch {
                name: name.to_string(),
                expected: "list of strings",
            });
        };
        items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                Value::Number(n) => Ok(n.to_string()),
                Value::Bool(b) => Ok(b.to_string()),
                _ => Err(HarnessError::TypeMismatch {
                    name: name.to_string(),
                    expected: "list of strings",
                }),
            })
            .collect()
    }

    fn lookup(&self, name: &str) -> Result<&Value, HarnessError> {
        self.values.get(name).ok_or_else(|| HarnessError::OutputNotFound {
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"{
        "vpc_id": {"sensitive": false, "type": "string", "value": "vpc-0a1b2c3d"},
        "private_subnet_ids": {"type": ["list", "string"], "value": ["subnet-priv-0", "subnet-priv-1"]},
        "subnet_count": {"type": "number", "value": 2},
        "nat_enabled": {"type": "bool", "value": false},
        "tags": {"type": ["map", "string"], "value": {"env": "dev"}}
    }"#;

    #[test]
    fn scalars_render_as_text() {
        let outputs = OutputSet::from_report(REPORT).unwrap();
        assert_eq!(outputs.output("vpc_id").unwrap(), "vpc-0a1b2c3d");
        assert_eq!(outputs.output("subnet_count").unwrap(), "2");
        assert_eq!(outputs.output("nat_enabled").unwrap(), "false");
    }

    #[test]
    fn lists_keep_order() {
        let outputs = OutputSet::from_report(REPORT).unwrap();
        assert_eq!(
            outputs.output_list("private_subnet_ids").unwrap(),
            vec!["subnet-priv-0", "subnet-priv-1"]
        );
    }

    #[test]
    fn absent_name_is_output_not_found() {
        let outputs = OutputSet::from_report(REPORT).unwrap();
        let err = outputs.output("cluster_arn").unwrap_err();
        assert!(matches!(err, HarnessError::OutputNotFound { name } if name == "cluster_arn"));
    }

    #[test]
    fn wrong_shape_is_type_mismatch() {
        let outputs = OutputSet::from_report(REPORT).unwrap();
        assert!(matches!(
            outputs.output("private_subnet_ids").unwrap_err(),
            HarnessError::TypeMismatch { expected: "scalar", .. }
        ));
        assert!(matches!(
            outputs.output_list("vpc_id").unwrap_err(),
            HarnessError::TypeMismatch { expected: "list of strings", .. }
        ));
        assert!(matches!(
            outputs.output("tags").unwrap_err(),
            HarnessError::TypeMismatch { .. }
        ));
    }

    #[test]
    fn malformed_report_is_rejected() {
        assert!(matches!(
            OutputSet::from_report("not json").unwrap_err(),
            HarnessError::OutputReport(_)
        ));
        assert!(matches!(
            OutputSet::from_report("[1, 2]").unwrap_err(),
            HarnessError::ToolInvocation { .. }
        ));
    }

    #[test]
    fn empty_report_parses() {
        let outputs = OutputSet::from_report("{}").unwrap();
        assert!(outputs.is_empty());
        assert_eq!(outputs.len(), 0);
    }
}
