use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use env_feature_core::stack::{StackDescription, StackOutput, StackParameter, StackUpdate};
use env_feature_lambda::adapters::stack_client::{StackClient, StackClientError};

/// In-memory environment stack that plays back a status sequence after each update.
pub struct FakeEnvironmentStack {
    state: Mutex<FakeStackState>,
}

struct FakeStackState {
    description: StackDescription,
    pending_statuses: VecDeque<String>,
    statuses_after_update: Vec<String>,
    update_error: Option<StackClientError>,
    updates: Vec<StackUpdate>,
}

impl FakeEnvironmentStack {
    pub fn new(stack_name: &str, parameters: &[(&str, &str)]) -> Self {
        let description = StackDescription {
            stack_id: Some(format!(
                "arn:aws:cloudformation:us-west-2:123456789012:stack/{stack_name}/guid"
            )),
            stack_name: stack_name.to_string(),
            status: "CREATE_COMPLETE".to_string(),
            status_reason: None,
            parameters: parameters
                .iter()
                .map(|(key, value)| StackParameter {
                    key: key.to_string(),
                    value: Some(value.to_string()),
                })
                .collect(),
            capabilities: vec!["CAPABILITY_IAM".to_string()],
            tags: Vec::new(),
            outputs: Vec::new(),
        };
        Self {
            state: Mutex::new(FakeStackState {
                description,
                pending_statuses: VecDeque::new(),
                statuses_after_update: vec![
                    "UPDATE_IN_PROGRESS".to_string(),
                    "UPDATE_COMPLETE".to_string(),
                ],
                update_error: None,
                updates: Vec::new(),
            }),
        }
    }

    pub fn with_export(self, output_key: &str, value: &str) -> Self {
        {
            let mut state = self.state.lock().expect("poisoned mutex");
            let export_name = format!("{}-{output_key}", state.description.stack_name);
            state.description.outputs.push(StackOutput {
                key: output_key.to_string(),
                value: Some(value.to_string()),
                export_name: Some(export_name),
            });
        }
        self
    }

    pub fn failing_updates_with(self, message: &str) -> Self {
        self.state.lock().expect("poisoned mutex").update_error =
            Some(StackClientError::with_code("ValidationError", message));
        self
    }

    pub fn updates(&self) -> Vec<StackUpdate> {
        self.state.lock().expect("poisoned mutex").updates.clone()
    }

    pub fn parameter_values(&self) -> BTreeMap<String, Option<String>> {
        self.state
            .lock()
            .expect("poisoned mutex")
            .description
            .parameters
            .iter()
            .map(|parameter| (parameter.key.clone(), parameter.value.clone()))
            .collect()
    }
}

#[async_trait]
impl StackClient for FakeEnvironmentStack {
    async fn describe_stack(&self, stack_name: &str) -> Result<StackDescription, StackClientError> {
        let mut state = self.state.lock().expect("poisoned mutex");
        if state.description.stack_name != stack_name {
            return Err(StackClientError::with_code(
                "ValidationError",
                format!("Stack with id {stack_name} does not exist"),
            ));
        }
        if let Some(status) = state.pending_statuses.pop_front() {
            state.description.status = status;
        }
        Ok(state.description.clone())
    }

    async fn update_stack(&self, update: &StackUpdate) -> Result<(), StackClientError> {
        let mut state = self.state.lock().expect("poisoned mutex");
        state.updates.push(update.clone());
        if let Some(error) = state.update_error.clone() {
            return Err(error);
        }
        if state.description.parameters == update.parameters {
            return Err(StackClientError::with_code(
                "ValidationError",
                "No updates are to be performed.",
            ));
        }
        state.description.parameters = update.parameters.clone();
        state.pending_statuses = state.statuses_after_update.iter().cloned().collect();
        Ok(())
    }
}
