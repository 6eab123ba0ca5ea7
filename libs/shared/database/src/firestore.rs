use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Map, Value};
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::document::{Document, DocumentStore, Filter, Precondition, StoreError, Write};

/// REST client for the hosted document store. Collection paths map onto
/// `projects/{project}/databases/(default)/documents/{path}`.
pub struct FirestoreClient {
    client: Client,
    base_url: String,
    project_id: String,
    api_key: String,
}

impl FirestoreClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.firestore_base_url.clone(),
            project_id: config.firestore_project_id.clone(),
            api_key: config.firestore_api_key.clone(),
        }
    }

    fn documents_root(&self) -> String {
        format!(
            "projects/{}/databases/(default)/documents",
            self.project_id
        )
    }

    fn doc_name(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.documents_root(), collection, id)
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, StoreError> {
        let url = format!("{}/{}?key={}", self.base_url, path, self.api_key);
        debug!("Making request to {}", url);

        let mut req = self.client.request(method, &url);
        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Store API error ({}): {}", status, error_text);

            return Err(match status {
                StatusCode::NOT_FOUND => StoreError::NotFound(path.to_string()),
                StatusCode::CONFLICT => {
                    if error_text.contains("ALREADY_EXISTS") {
                        StoreError::AlreadyExists(path.to_string())
                    } else {
                        StoreError::Conflict(error_text)
                    }
                }
                StatusCode::BAD_REQUEST if error_text.contains("FAILED_PRECONDITION") => {
                    StoreError::Conflict(error_text)
                }
                _ => StoreError::Request(format!("API error ({}): {}", status, error_text)),
            });
        }

        let data = response.json::<Value>().await?;
        Ok(data)
    }

    fn encode_write(&self, write: &Write) -> Value {
        match write {
            Write::Create { collection, id, data } => json!({
                "update": {
                    "name": self.doc_name(collection, id),
                    "fields": encode_fields(data),
                },
                "currentDocument": { "exists": false },
            }),
            Write::Update {
                collection,
                id,
                data,
                precondition,
            } => {
                let field_paths: Vec<&String> = data
                    .as_object()
                    .map(|fields| fields.keys().collect())
                    .unwrap_or_default();
                let mut write = json!({
                    "update": {
                        "name": self.doc_name(collection, id),
                        "fields": encode_fields(data),
                    },
                    "updateMask": { "fieldPaths": field_paths },
                    "currentDocument": { "exists": true },
                });
                if let Some(Precondition::Revision(revision)) = precondition {
                    write["currentDocument"] = json!({ "updateTime": revision });
                } else if let Some(Precondition::MustNotExist) = precondition {
                    write["currentDocument"] = json!({ "exists": false });
                }
                write
            }
            Write::Delete { collection, id } => json!({
                "delete": self.doc_name(collection, id),
            }),
        }
    }

    fn decode_document(&self, raw: &Value) -> Result<Document, StoreError> {
        let name = raw["name"].as_str().unwrap_or_default();
        let id = name.rsplit('/').next().unwrap_or_default().to_string();
        let revision = raw["updateTime"].as_str().map(|s| s.to_string());
        let data = decode_fields(&raw["fields"]);
        Ok(Document { id, revision, data })
    }
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let path = format!("{}/{}/{}", self.documents_root(), collection, id);
        match self.request(Method::GET, &path, None).await {
            Ok(raw) => Ok(Some(self.decode_document(&raw)?)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn list(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Document>, StoreError> {
        // runQuery addresses the parent document plus the leaf collection id.
        let (parent, collection_id) = match collection.rsplit_once('/') {
            Some((parent, leaf)) => (format!("{}/{}", self.documents_root(), parent), leaf),
            None => (self.documents_root(), collection),
        };

        let mut query = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection_id }],
            }
        });
        if !filters.is_empty() {
            let field_filters: Vec<Value> = filters
                .iter()
                .map(|f| {
                    json!({
                        "fieldFilter": {
                            "field": { "fieldPath": f.field },
                            "op": "EQUAL",
                            "value": encode_value(&f.value),
                        }
                    })
                })
                .collect();
            query["structuredQuery"]["where"] = json!({
                "compositeFilter": { "op": "AND", "filters": field_filters }
            });
        }

        let raw = self
            .request(Method::POST, &format!("{}:runQuery", parent), Some(query))
            .await?;

        let mut documents = Vec::new();
        if let Some(rows) = raw.as_array() {
            for row in rows {
                if row.get("document").is_some() {
                    documents.push(self.decode_document(&row["document"])?);
                }
            }
        }
        Ok(documents)
    }

    async fn create(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError> {
        self.commit(vec![Write::create(collection, id, data)]).await
    }

    async fn update(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError> {
        self.commit(vec![Write::update(collection, id, data)]).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.commit(vec![Write::delete(collection, id)]).await
    }

    async fn commit(&self, writes: Vec<Write>) -> Result<(), StoreError> {
        let encoded: Vec<Value> = writes.iter().map(|w| self.encode_write(w)).collect();
        let path = format!("{}:commit", self.documents_root());
        self.request(Method::POST, &path, Some(json!({ "writes": encoded })))
            .await?;
        Ok(())
    }
}

// ==============================================================================
// VALUE CODEC
// ==============================================================================

fn encode_fields(data: &Value) -> Value {
    let mut fields = Map::new();
    if let Some(object) = data.as_object() {
        for (key, value) in object {
            fields.insert(key.clone(), encode_value(value));
        }
    }
    Value::Object(fields)
}

fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(_) => json!({ "mapValue": { "fields": encode_fields(value) } }),
    }
}

fn decode_fields(fields: &Value) -> Value {
    let mut data = Map::new();
    if let Some(object) = fields.as_object() {
        for (key, value) in object {
            data.insert(key.clone(), decode_value(value));
        }
    }
    Value::Object(data)
}

fn decode_value(value: &Value) -> Value {
    let Some(object) = value.as_object() else {
        return Value::Null;
    };
    if let Some((kind, inner)) = object.iter().next() {
        match kind.as_str() {
            "nullValue" => Value::Null,
            "booleanValue" => inner.clone(),
            "integerValue" => inner
                .as_str()
                .and_then(|s| s.parse::<i64>().ok())
                .map(|i| json!(i))
                .unwrap_or(Value::Null),
            "doubleValue" => inner.clone(),
            "stringValue" => inner.clone(),
            "timestampValue" => inner.clone(),
            "arrayValue" => {
                let items = inner["values"]
                    .as_array()
                    .map(|values| values.iter().map(decode_value).collect())
                    .unwrap_or_default();
                Value::Array(items)
            }
            "mapValue" => decode_fields(&inner["fields"]),
            _ => Value::Null,
        }
    } else {
        Value::Null
    }
}
