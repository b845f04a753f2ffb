//! JSON Lines parsing and batched upload.

use domain_retrieval::{RagClient, Snippet};
use eyre::{Result, WrapErr};
use serde_json::{Map, Value};
use tracing::debug;

/// Type assigned to snippets that do not name one
pub const DEFAULT_KIND: &str = "misc";

/// Parse one corpus line. Blank lines, non-objects and objects without a
/// non-empty `id` and `text` yield `None`.
pub fn parse_line(line: &str) -> Option<Snippet> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(line) else {
        return None;
    };

    let id = match obj.get("id")? {
        Value::String(s) if !s.is_empty() => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let text = match obj.get("text")? {
        Value::String(s) if !s.is_empty() => s.clone(),
        _ => return None,
    };
    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_KIND);
    let meta = obj
        .get("meta")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_else(Map::new);
    let tags: Vec<String> = obj
        .get("tags")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(Snippet::new(id, kind, text).with_meta(meta).with_tags(tags))
}

pub struct Ingest {
    client: RagClient,
    batch_size: usize,
    collection: Option<String>,
}

impl Ingest {
    pub fn new(client: RagClient, batch_size: usize, collection: Option<String>) -> Self {
        Self {
            client,
            batch_size: batch_size.max(1),
            collection,
        }
    }

    /// Upload every valid line of `contents`, returning the number of
    /// snippets sent. Stops at the first failed request.
    pub async fn run(&self, contents: &str) -> Result<usize> {
        let mut batch = Vec::with_capacity(self.batch_size);
        let mut total = 0;
        let mut skipped = 0;

        for line in contents.lines() {
            match parse_line(line) {
                Some(snippet) => batch.push(snippet),
                None => {
                    if !line.trim().is_empty() {
                        skipped += 1;
                    }
                    continue;
                }
            }

            if batch.len() >= self.batch_size {
                total += self.send(std::mem::take(&mut batch), "batch").await?;
            }
        }

        if !batch.is_empty() {
            total += self.send(batch, "final batch").await?;
        }

        debug!(skipped, "Skipped invalid lines");
        Ok(total)
    }

    async fn send(&self, batch: Vec<Snippet>, label: &str) -> Result<usize> {
        let size = batch.len();
        let response = self
            .client
            .upsert(batch, self.collection.clone())
            .await
            .wrap_err_with(|| format!("Upsert of {} snippets failed", size))?;

        println!(
            "Upserted {} of {} snippets into {} ({} ms)",
            label, response.count, response.collection, response.took_ms
        );
        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_retrieval::RagClientConfig;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    #[test]
    fn test_parse_line_applies_defaults() {
        let snippet = parse_line(r#"{"id": "x1", "text": "Revenue grew"}"#).unwrap();
        assert_eq!(snippet.id, "x1");
        assert_eq!(snippet.kind, DEFAULT_KIND);
        assert!(snippet.meta.is_empty());
        assert!(snippet.tags.is_empty());
    }

    #[test]
    fn test_parse_line_keeps_fields() {
        let snippet = parse_line(
            r#"{"id": "m1", "type": "metric", "text": "Net margin", "meta": {"metric_id": 3}, "tags": ["finance"]}"#,
        )
        .unwrap();
        assert_eq!(snippet.kind, "metric");
        assert_eq!(snippet.meta["metric_id"], 3);
        assert_eq!(snippet.tags, vec!["finance".to_string()]);
    }

    #[test]
    fn test_parse_line_skips_invalid() {
        assert!(parse_line("").is_none());
        assert!(parse_line("   ").is_none());
        assert!(parse_line("not json").is_none());
        assert!(parse_line("[1, 2]").is_none());
        assert!(parse_line(r#"{"id": "", "text": "t"}"#).is_none());
        assert!(parse_line(r#"{"id": "a", "text": ""}"#).is_none());
        assert!(parse_line(r#"{"text": "no id"}"#).is_none());
    }

    fn upsert_ok(request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap();
        let count = body["items"].as_array().map(Vec::len).unwrap_or(0);
        ResponseTemplate::new(200).set_body_json(json!({
            "ok": true, "collection": "docs_index", "count": count, "took_ms": 1
        }))
    }

    #[tokio::test]
    async fn test_run_sends_full_and_final_batches() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/upsert"))
            .respond_with(upsert_ok)
            .expect(3)
            .mount(&server)
            .await;

        let contents = (0..5)
            .map(|i| format!(r#"{{"id": "s{i}", "text": "snippet {i}"}}"#))
            .chain(["".to_string(), "garbage".to_string()])
            .collect::<Vec<_>>()
            .join("\n");

        let client = RagClient::new(RagClientConfig::new(server.uri())).unwrap();
        let total = Ingest::new(client, 2, None).run(&contents).await.unwrap();

        assert_eq!(total, 5);
    }

    #[tokio::test]
    async fn test_run_fails_on_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/upsert"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = RagClient::new(RagClientConfig::new(server.uri())).unwrap();
        let result = Ingest::new(client, 10, None)
            .run(r#"{"id": "a", "text": "b"}"#)
            .await;

        assert!(result.is_err());
    }
}
