use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::contract::ResponseData;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StackParameter {
    pub key: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StackOutput {
    pub key: String,
    pub value: Option<String>,
    pub export_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StackTag {
    pub key: String,
    pub value: String,
}

/// Snapshot of a described stack, independent of the SDK types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StackDescription {
    pub stack_id: Option<String>,
    pub stack_name: String,
    pub status: String,
    pub status_reason: Option<String>,
    pub parameters: Vec<StackParameter>,
    pub capabilities: Vec<String>,
    pub tags: Vec<StackTag>,
    pub outputs: Vec<StackOutput>,
}

/// In-place update of an existing stack that keeps its current template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StackUpdate {
    pub stack_name: String,
    pub use_previous_template: bool,
    pub parameters: Vec<StackParameter>,
    pub capabilities: Vec<String>,
    pub tags: Vec<StackTag>,
}

impl StackUpdate {
    pub fn from_description(description: &StackDescription, parameters: Vec<StackParameter>) -> Self {
        Self {
            stack_name: description.stack_name.clone(),
            use_previous_template: true,
            parameters,
            capabilities: description.capabilities.clone(),
            tags: description.tags.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedParameters {
    pub parameters: Vec<StackParameter>,
    pub overwritten_keys: Vec<String>,
}

pub fn environment_stack_name(project: &str, env: &str) -> String {
    format!("{project}-{env}")
}

/// Overwrites the value of every stack parameter whose key has an override.
///
/// Overrides without a matching parameter are ignored; the template decides
/// which parameters exist.
pub fn merge_feature_parameters(
    parameters: &[StackParameter],
    overrides: &BTreeMap<String, String>,
) -> MergedParameters {
    let mut overwritten_keys = Vec::new();
    let parameters = parameters
        .iter()
        .map(|parameter| match overrides.get(&parameter.key) {
            Some(value) => {
                overwritten_keys.push(parameter.key.clone());
                StackParameter {
                    key: parameter.key.clone(),
                    value: Some(value.clone()),
                }
            }
            None => parameter.clone(),
        })
        .collect();

    MergedParameters {
        parameters,
        overwritten_keys,
    }
}

/// Maps exported outputs to `export name without "<stack>-"` => value.
///
/// Outputs without an export name or without a value are left out.
pub fn exported_values(stack_name: &str, outputs: &[StackOutput]) -> ResponseData {
    let stack_prefix = format!("{stack_name}-");
    outputs
        .iter()
        .filter_map(|output| {
            let export_name = output.export_name.as_deref()?;
            let value = output.value.clone()?;
            Some((export_name.replacen(&stack_prefix, "", 1), value))
        })
        .collect()
}
