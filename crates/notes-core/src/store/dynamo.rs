use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::{
    Client,
    error::DisplayErrorContext,
    operation::{
        delete_item::DeleteItemError, put_item::PutItemError, update_item::UpdateItemError,
    },
    types::{AttributeValue, ReturnValue},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{NoteStore, Result, StoreError};
use crate::note::{Note, NoteChanges, NotePage};

const TITLE_ATTR: &str = "title";
const BODY_ATTR: &str = "body";

/// Where the notes table lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamoSettings {
    pub table_name: String,

    /// Name of the partition key attribute
    #[serde(default = "default_partition_key")]
    pub partition_key: String,

    /// AWS region; falls back to the SDK's provider chain when unset
    #[serde(default)]
    pub region: Option<String>,

    /// Endpoint override, e.g. DynamoDB Local
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

pub fn default_partition_key() -> String {
    "notesId".to_string()
}

/// Note store backed by a single DynamoDB table.
#[derive(Clone)]
pub struct DynamoStore {
    client: Client,
    table_name: String,
    partition_key: String,
}

impl DynamoStore {
    /// Build an SDK client from the ambient AWS configuration plus `settings`.
    pub async fn connect(settings: &DynamoSettings) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &settings.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &settings.endpoint_url {
            loader = loader.endpoint_url(endpoint.as_str());
        }
        let config = loader.load().await;

        tracing::info!(
            table = %settings.table_name,
            partition_key = %settings.partition_key,
            "Using DynamoDB note store"
        );
        Self::with_client(Client::new(&config), settings)
    }

    pub fn with_client(client: Client, settings: &DynamoSettings) -> Self {
        Self {
            client,
            table_name: settings.table_name.clone(),
            partition_key: settings.partition_key.clone(),
        }
    }

    fn key(&self, id: &str) -> HashMap<String, AttributeValue> {
        key_item(&self.partition_key, id)
    }

    fn from_item(&self, item: &HashMap<String, AttributeValue>) -> Result<Note> {
        note_from_item(&self.partition_key, item)
    }
}

fn key_item(partition_key: &str, id: &str) -> HashMap<String, AttributeValue> {
    HashMap::from([(partition_key.to_string(), AttributeValue::S(id.to_string()))])
}

pub(crate) fn note_to_item(partition_key: &str, note: &Note) -> HashMap<String, AttributeValue> {
    let mut item = key_item(partition_key, &note.id);
    if let Some(title) = &note.title {
        item.insert(TITLE_ATTR.to_string(), AttributeValue::S(title.clone()));
    }
    if let Some(body) = &note.body {
        item.insert(BODY_ATTR.to_string(), AttributeValue::S(body.clone()));
    }
    item
}

pub(crate) fn note_from_item(
    partition_key: &str,
    item: &HashMap<String, AttributeValue>,
) -> Result<Note> {
    let id = match item.get(partition_key) {
        Some(AttributeValue::S(id)) => id.clone(),
        _ => {
            return Err(StoreError::Backend(format!(
                "item is missing string attribute {}",
                partition_key
            )));
        }
    };
    Ok(Note {
        id,
        title: string_attr(item, TITLE_ATTR)?,
        body: string_attr(item, BODY_ATTR)?,
    })
}

fn string_attr(item: &HashMap<String, AttributeValue>, name: &str) -> Result<Option<String>> {
    match item.get(name) {
        None | Some(AttributeValue::Null(_)) => Ok(None),
        Some(AttributeValue::S(value)) => Ok(Some(value.clone())),
        Some(_) => Err(StoreError::Backend(format!(
            "attribute {} is not a string",
            name
        ))),
    }
}

fn backend<E: std::error::Error>(operation: &str, err: E) -> StoreError {
    let detail = DisplayErrorContext(&err).to_string();
    error!(operation, error = %detail, "DynamoDB request failed");
    StoreError::Backend(detail)
}

/// Placeholder-based update request for the fields named in `changes`.
///
/// Attribute names always go through `#` placeholders so that `title`, `body`
/// or the partition key never collide with DynamoDB reserved words.
pub(crate) struct UpdateRequest {
    pub expression: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
}

pub(crate) fn build_update(partition_key: &str, changes: &NoteChanges) -> UpdateRequest {
    let mut names = HashMap::from([("#pk".to_string(), partition_key.to_string())]);
    let mut values = HashMap::new();
    let mut assignments = Vec::new();

    for (placeholder, attr, value) in [
        ("title", TITLE_ATTR, &changes.title),
        ("body", BODY_ATTR, &changes.body),
    ] {
        if let Some(value) = value {
            names.insert(format!("#{}", placeholder), attr.to_string());
            values.insert(format!(":{}", placeholder), AttributeValue::S(value.clone()));
            assignments.push(format!("#{0} = :{0}", placeholder));
        }
    }

    UpdateRequest {
        expression: format!("SET {}", assignments.join(", ")),
        names,
        values,
    }
}

#[async_trait]
impl NoteStore for DynamoStore {
    async fn create(&self, note: &Note) -> Result<()> {
        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(note_to_item(&self.partition_key, note)))
            .condition_expression("attribute_not_exists(#pk)")
            .expression_attribute_names("#pk", &self.partition_key)
            .send()
            .await;

        match result {
            Ok(_) => {
                debug!(id = %note.id, "Created note");
                Ok(())
            }
            Err(err)
                if matches!(
                    err.as_service_error(),
                    Some(PutItemError::ConditionalCheckFailedException(_))
                ) =>
            {
                Err(StoreError::AlreadyExists(note.id.clone()))
            }
            Err(err) => Err(backend("PutItem", err)),
        }
    }

    async fn update(&self, id: &str, changes: &NoteChanges) -> Result<Note> {
        let request = build_update(&self.partition_key, changes);
        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(self.key(id)))
            .update_expression(request.expression)
            .condition_expression("attribute_exists(#pk)")
            .set_expression_attribute_names(Some(request.names))
            .set_expression_attribute_values(Some(request.values))
            .return_values(ReturnValue::AllNew)
            .send()
            .await;

        match result {
            Ok(output) => match output.attributes() {
                Some(attributes) => self.from_item(attributes),
                None => Err(StoreError::Backend(
                    "UpdateItem returned no attributes".to_string(),
                )),
            },
            Err(err)
                if matches!(
                    err.as_service_error(),
                    Some(UpdateItemError::ConditionalCheckFailedException(_))
                ) =>
            {
                Err(StoreError::NotFound(id.to_string()))
            }
            Err(err) => Err(backend("UpdateItem", err)),
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let result = self
            .client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(self.key(id)))
            .condition_expression("attribute_exists(#pk)")
            .expression_attribute_names("#pk", &self.partition_key)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err)
                if matches!(
                    err.as_service_error(),
                    Some(DeleteItemError::ConditionalCheckFailedException(_))
                ) =>
            {
                Err(StoreError::NotFound(id.to_string()))
            }
            Err(err) => Err(backend("DeleteItem", err)),
        }
    }

    async fn get(&self, id: &str) -> Result<Option<Note>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(self.key(id)))
            .consistent_read(true)
            .send()
            .await
            .map_err(|err| backend("GetItem", err))?;

        output.item().map(|item| self.from_item(item)).transpose()
    }

    async fn list(&self, limit: usize, cursor: Option<&str>) -> Result<NotePage> {
        let output = self
            .client
            .scan()
            .table_name(&self.table_name)
            .limit(i32::try_from(limit).unwrap_or(i32::MAX))
            .set_exclusive_start_key(cursor.map(|id| self.key(id)))
            .send()
            .await
            .map_err(|err| backend("Scan", err))?;

        let notes = output
            .items()
            .iter()
            .map(|item| self.from_item(item))
            .collect::<Result<Vec<_>>>()?;

        let next_cursor = match output
            .last_evaluated_key()
            .and_then(|key| key.get(&self.partition_key))
        {
            Some(AttributeValue::S(id)) => Some(id.clone()),
            _ => None,
        };

        Ok(NotePage { notes, next_cursor })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_use_configured_partition_key() {
        let note = Note::new("n1", Some("Hi".into()), None);

        let item = note_to_item("notesId", &note);
        assert_eq!(item.get("notesId"), Some(&AttributeValue::S("n1".into())));
        assert_eq!(item.get("title"), Some(&AttributeValue::S("Hi".into())));
        assert!(!item.contains_key("body"));

        assert_eq!(note_from_item("notesId", &item).unwrap(), note);
    }

    #[test]
    fn from_item_rejects_missing_key() {
        let item = HashMap::from([("title".to_string(), AttributeValue::S("Hi".into()))]);
        assert!(matches!(
            note_from_item("notesId", &item),
            Err(StoreError::Backend(_))
        ));
    }

    #[test]
    fn from_item_rejects_non_string_fields() {
        let item = HashMap::from([
            ("notesId".to_string(), AttributeValue::S("n1".into())),
            ("title".to_string(), AttributeValue::N("3".into())),
        ]);
        assert!(matches!(
            note_from_item("notesId", &item),
            Err(StoreError::Backend(_))
        ));
    }

    #[test]
    fn update_sets_only_named_fields_through_placeholders() {
        let request = build_update(
            "notesId",
            &NoteChanges {
                title: None,
                body: Some("Hello".into()),
            },
        );

        assert_eq!(request.expression, "SET #body = :body");
        assert_eq!(request.names.get("#pk").map(String::as_str), Some("notesId"));
        assert_eq!(request.names.get("#body").map(String::as_str), Some("body"));
        assert!(!request.names.contains_key("#title"));
        assert_eq!(
            request.values.get(":body"),
            Some(&AttributeValue::S("Hello".into()))
        );
    }

    #[test]
    fn update_with_both_fields() {
        let request = build_update(
            "notesId",
            &NoteChanges {
                title: Some("Hi".into()),
                body: Some("Hello".into()),
            },
        );

        assert_eq!(request.expression, "SET #title = :title, #body = :body");
        assert_eq!(request.values.len(), 2);
    }
}
