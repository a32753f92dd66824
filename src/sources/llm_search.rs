//! # LLM Search Source
//!
//! Asks the Anthropic Messages API to search for upcoming UK broadcast
//! listings inside the ingestion window and return them as structured JSON.
//! Model output is treated as untrusted: the reply is mined for a single
//! JSON object, and every candidate event must pass shape checks (title,
//! parseable start time, channel name) before it is returned. Candidates
//! that fail are counted as skipped rather than failing the fetch, so a
//! partially usable reply still contributes events.

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::sources::registry::Registry;
use crate::sources::trait_::parse_retry_after;
use crate::sources::{
    FallbackPolicy, FetchContext, FetchOutcome, RawEvent, SourceAdapter, SourceError,
    SourceMetadata,
};

pub const LLM_SEARCH_SOURCE_SLUG: &str = "llm_search";

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

pub struct LlmSearchSource {
    api_key: String,
    api_base: String,
    model: String,
    client: reqwest::Client,
}

impl LlmSearchSource {
    pub fn new(api_key: String, api_base: String, model: String) -> Self {
        Self {
            api_key,
            api_base,
            model,
            client: reqwest::Client::new(),
        }
    }

    fn build_prompt(&self, ctx: &FetchContext) -> String {
        let channel_names = ctx
            .channels
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "Search current UK TV listings for professional sports events broadcast between \
             {start} and {end}. The viewer receives these channels: {channels}.\n\n\
             Respond with ONLY a JSON object in this exact shape:\n\
             {{\"events\": [{{\"title\": \"...\", \"sport_type\": \"...\", \"league\": \"...\", \
             \"home_team\": \"...\", \"away_team\": \"...\", \"start_time\": \"ISO 8601 with offset\", \
             \"end_time\": \"...\", \"channel_name\": \"...\", \"description\": \"...\"}}], \
             \"sources_searched\": [\"...\"]}}\n\n\
             Use null for optional fields you do not know (league, home_team, away_team, end_time, \
             description). Prefer channel_name values from the viewer's channel list. List the TV \
             guides or listing sites you drew on in sources_searched. Do not add any text outside \
             the JSON object.",
            start = ctx.window.start.format("%Y-%m-%d"),
            end = ctx.window.end.format("%Y-%m-%d"),
            channels = channel_names,
        )
    }
}

fn extract_json_object(text: &str) -> Option<&str> {
    let re = Regex::new(r"\{[\s\S]*\}").ok()?;
    re.find(text).map(|m| m.as_str())
}

fn passes_shape_check(event: &RawEvent) -> bool {
    !event.title.trim().is_empty()
        && !event.channel_name.trim().is_empty()
        && crate::ingest::normalize::parse_event_time(&event.start_time).is_some()
}

#[async_trait]
impl SourceAdapter for LlmSearchSource {
    fn slug(&self) -> &'static str {
        LLM_SEARCH_SOURCE_SLUG
    }

    async fn fetch(&self, ctx: &FetchContext) -> Result<FetchOutcome, SourceError> {
        let prompt = self.build_prompt(ctx);
        let url = format!("{}/v1/messages", self.api_base);

        let request_body = serde_json::json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::from_http_status(status, &body, retry_after));
        }

        #[derive(Debug, serde::Deserialize)]
        struct ContentBlock {
            #[serde(default)]
            text: String,
        }

        #[derive(Debug, serde::Deserialize)]
        struct MessagesResponse {
            #[serde(default)]
            content: Vec<ContentBlock>,
        }

        let message: MessagesResponse = response
            .json()
            .await
            .map_err(|e| SourceError::malformed(format!("messages response: {}", e)))?;

        let text = message
            .content
            .first()
            .map(|block| block.text.as_str())
            .unwrap_or_default();

        let raw_object = extract_json_object(text)
            .ok_or_else(|| SourceError::malformed("model reply contained no JSON object"))?;

        #[derive(Debug, serde::Deserialize)]
        struct SearchPayload {
            #[serde(default)]
            events: Vec<serde_json::Value>,
            #[serde(default)]
            sources_searched: Vec<String>,
        }

        let payload: SearchPayload = serde_json::from_str(raw_object)
            .map_err(|e| SourceError::malformed(format!("search payload: {}", e)))?;

        let mut outcome = FetchOutcome {
            sources_consulted: payload.sources_searched.len().max(1) as u32,
            ..Default::default()
        };

        for candidate in payload.events {
            match serde_json::from_value::<RawEvent>(candidate) {
                Ok(event) if passes_shape_check(&event) => outcome.events.push(event),
                Ok(event) => {
                    debug!(title = %event.title, "llm_search candidate failed shape check");
                    outcome.skipped_at_source += 1;
                }
                Err(err) => {
                    debug!("llm_search candidate rejected: {}", err);
                    outcome.skipped_at_source += 1;
                }
            }
        }

        Ok(outcome)
    }
}

/// Register the LLM search source with the given registry
pub fn register_llm_search_source(registry: &mut Registry, source: Arc<LlmSearchSource>) {
    let metadata = SourceMetadata::new(
        LLM_SEARCH_SOURCE_SLUG,
        "LLM Search",
        FallbackPolicy::FirstActive,
        true,
    );
    registry.register(source, metadata);
}
