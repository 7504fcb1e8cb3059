use env_feature_core::contract::CustomResourceEvent;
use serde_json::{json, Value};

pub fn feature_event(request_type: &str, response_url: &str, features: Value) -> CustomResourceEvent {
    let mut properties = json!({
        "ServiceToken": "arn:aws:lambda:us-west-2:123456789012:function:env-features",
        "Project": "demo",
        "Env": "test",
        "App": "api",
    });
    if let (Some(target), Some(extra)) = (properties.as_object_mut(), features.as_object()) {
        target.extend(extra.clone());
    }

    serde_json::from_value(json!({
        "RequestType": request_type,
        "ResponseURL": response_url,
        "StackId": "arn:aws:cloudformation:us-west-2:123456789012:stack/demo-test-api/guid",
        "RequestId": "c2d9b5c0-request",
        "LogicalResourceId": "EnvironmentFeatures",
        "ResourceType": "Custom::EnvFeatures",
        "ResourceProperties": properties,
    }))
    .expect("event should parse")
}
