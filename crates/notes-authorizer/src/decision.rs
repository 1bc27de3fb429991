//! Access decisions and their API Gateway wire format.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const POLICY_VERSION: &str = "2012-10-17";
pub const INVOKE_ACTION: &str = "execute-api:Invoke";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// Outcome of authorizing one request against one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDecision {
    pub principal_id: String,
    pub effect: Effect,
    pub resource: String,
    /// Extra values handed to downstream handlers
    pub context: BTreeMap<String, String>,
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        self.effect == Effect::Allow
    }

    /// Render as the response a gateway TOKEN authorizer returns.
    pub fn to_response(&self) -> AuthorizerResponse {
        AuthorizerResponse {
            principal_id: self.principal_id.clone(),
            policy_document: PolicyDocument {
                version: POLICY_VERSION.to_string(),
                statement: vec![Statement {
                    action: INVOKE_ACTION.to_string(),
                    effect: self.effect,
                    resource: self.resource.clone(),
                }],
            },
            context: self.context.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerResponse {
    pub principal_id: String,
    pub policy_document: PolicyDocument,
    pub context: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    pub action: String,
    pub effect: Effect,
    pub resource: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_gateway_policy_document() {
        let decision = AccessDecision {
            principal_id: "user".into(),
            effect: Effect::Deny,
            resource: "arn:aws:execute-api:ap-south-1:123:api/dev/GET/notes".into(),
            context: BTreeMap::from([("sub".to_string(), "abc".to_string())]),
        };

        let value = serde_json::to_value(decision.to_response()).unwrap();
        assert_eq!(
            value,
            json!({
                "principalId": "user",
                "policyDocument": {
                    "Version": "2012-10-17",
                    "Statement": [{
                        "Action": "execute-api:Invoke",
                        "Effect": "Deny",
                        "Resource": "arn:aws:execute-api:ap-south-1:123:api/dev/GET/notes"
                    }]
                },
                "context": {"sub": "abc"}
            })
        );
    }
}
