// service/handler.rs

use std::sync::Arc;
use log::{debug, warn};
use serde_json::{Map, Value};

use crate::config::TranslatronConfig;
use crate::error::{Error, Result};
use crate::matcher::MentionMatcher;
use crate::parser::{DocumentTokenizer, MentionTokenizer};
use crate::search::{DocumentSearch, EntitySearch};
use crate::storage::StorageBackend;

/// Request kinds selected by the `qtype` key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Ner,
    DocSearch,
    EntitySearch,
    GetDocuments,
}

impl QueryType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ner" => Some(QueryType::Ner),
            "docsearch" => Some(QueryType::DocSearch),
            "entitysearch" => Some(QueryType::EntitySearch),
            "getdocuments" => Some(QueryType::GetDocuments),
            _ => None,
        }
    }

    /// Request key holding the input; it is removed from the reply
    pub fn input_key(&self) -> &'static str {
        match self {
            QueryType::Ner | QueryType::GetDocuments => "query",
            QueryType::DocSearch | QueryType::EntitySearch => "term",
        }
    }

    /// Reply key the output is written to
    pub fn output_key(&self) -> &'static str {
        match self {
            QueryType::EntitySearch => "entities",
            _ => "results",
        }
    }
}

/// Answers JSON request objects.
///
/// The reply is the request object itself with the input key removed and
/// the output key added, so any extra keys a client sends come back as is.
pub struct RequestHandler<S: ?Sized> {
    matcher: MentionMatcher<S>,
    documents: Arc<DocumentSearch<S>>,
    entities: Arc<EntitySearch<S>>,
}

impl<S> RequestHandler<S>
where
    S: StorageBackend + ?Sized + 'static,
{
    pub fn new(storage: Arc<S>, config: &TranslatronConfig) -> Result<Self> {
        let matcher = MentionMatcher::new(
            Arc::clone(&storage),
            MentionTokenizer::new(&config.parser),
            &config.matcher,
        );
        let documents = DocumentSearch::new(
            Arc::clone(&storage),
            DocumentTokenizer::new(&config.parser)?,
            config.search.clone(),
        );
        Ok(Self {
            matcher,
            documents: Arc::new(documents),
            entities: Arc::new(EntitySearch::new(storage)),
        })
    }

    pub fn matcher(&self) -> &MentionMatcher<S> {
        &self.matcher
    }

    /// Handle one serialized request. `Ok(None)` means no reply is sent.
    pub async fn handle(&self, payload: &str) -> Result<Option<String>> {
        let request: Value = serde_json::from_str(payload)?;
        match self.handle_value(request).await? {
            Some(reply) => Ok(Some(serde_json::to_string(&reply)?)),
            None => Ok(None),
        }
    }

    pub async fn handle_value(&self, request: Value) -> Result<Option<Value>> {
        let Value::Object(mut request) = request else {
            return Err(Error::request("request must be a JSON object"));
        };
        let qtype = request
            .get("qtype")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::request("missing qtype"))?
            .to_string();

        let Some(query_type) = QueryType::from_name(&qtype) else {
            warn!("Unknown request type: {}", qtype);
            return Ok(None);
        };

        let input = request
            .remove(query_type.input_key())
            .ok_or_else(|| Error::request(format!("{} request without {:?}", qtype, query_type.input_key())))?;
        debug!("Handling {} request", qtype);

        let output = self.dispatch(query_type, input).await?;
        request.insert(query_type.output_key().to_string(), output);
        Ok(Some(Value::Object(request)))
    }

    async fn dispatch(&self, query_type: QueryType, input: Value) -> Result<Value> {
        match query_type {
            QueryType::Ner => {
                let text = expect_string(&input, "query")?;
                let result = self.matcher.find_mentions(&text).await?;
                Ok(serde_json::to_value(result)?)
            }
            QueryType::DocSearch => {
                let term = expect_string(&input, "term")?;
                let documents = Arc::clone(&self.documents);
                let hits = tokio::task::spawn_blocking(move || documents.search(&term)).await??;
                Ok(serde_json::to_value(hits)?)
            }
            QueryType::EntitySearch => {
                let term = expect_string(&input, "term")?;
                let entities = Arc::clone(&self.entities);
                let found = tokio::task::spawn_blocking(move || entities.search(&term)).await??;
                Ok(serde_json::to_value(found)?)
            }
            QueryType::GetDocuments => {
                let ids = expect_string_list(&input)?;
                let documents = Arc::clone(&self.documents);
                let docs = tokio::task::spawn_blocking(move || documents.get_documents(&ids)).await??;
                Ok(serde_json::to_value(docs)?)
            }
        }
    }
}

fn expect_string(value: &Value, key: &str) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::request(format!("{:?} must be a string", key)))
}

fn expect_string_list(value: &Value) -> Result<Vec<String>> {
    let items = value
        .as_array()
        .ok_or_else(|| Error::request("\"query\" must be a list of document ids"))?;
    items
        .iter()
        .map(|item| expect_string(item, "query"))
        .collect()
}

/// Error reply for a request that could not be answered
pub fn error_reply(request: Option<&Map<String, Value>>, error: &Error) -> Value {
    let mut reply = request.cloned().unwrap_or_default();
    reply.insert("error".to_string(), Value::String(error.to_string()));
    Value::Object(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use crate::index::IndexEntry;
    use crate::storage::{IndexLevel, MemoryStorage};

    fn handler() -> RequestHandler<MemoryStorage> {
        let storage = MemoryStorage::new();
        storage
            .store_postings_batch(IndexLevel::Aliases, &[("Coxiella".to_string(), IndexEntry::encode_alias("uniprot:entity1", "UniProt"))])
            .unwrap();
        RequestHandler::new(Arc::new(storage), &TranslatronConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn ner_reply_echoes_extra_keys() {
        let reply = handler()
            .handle_value(json!({"qtype": "ner", "query": "Infection with Coxiella", "requestId": 42}))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            reply,
            json!({"qtype": "ner", "requestId": 42, "results": {"Coxiella": ["entity1", "UniProt"]}})
        );
    }

    #[tokio::test]
    async fn unknown_qtype_gets_no_reply() {
        let reply = handler().handle(r#"{"qtype": "metadb"}"#).await.unwrap();
        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn malformed_requests_are_rejected() {
        let handler = handler();
        assert!(matches!(handler.handle_value(json!([1, 2])).await, Err(Error::InvalidRequest(_))));
        assert!(matches!(handler.handle_value(json!({"query": "x"})).await, Err(Error::InvalidRequest(_))));
        assert!(matches!(handler.handle_value(json!({"qtype": "ner"})).await, Err(Error::InvalidRequest(_))));
        assert!(matches!(handler.handle("not json").await, Err(Error::Json(_))));
    }

    #[tokio::test]
    async fn getdocuments_skips_unknown_ids() {
        let reply = handler()
            .handle_value(json!({"qtype": "getdocuments", "query": ["nope"]}))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reply, json!({"qtype": "getdocuments", "results": []}));
    }

    #[test]
    fn error_reply_keeps_request_keys() {
        let request = json!({"qtype": "ner", "requestId": 1});
        let reply = error_reply(request.as_object(), &Error::request("boom"));
        assert_eq!(reply["requestId"], 1);
        assert_eq!(reply["error"], "Invalid request: boom");
    }
}
