//! Question answering on top of a [`Connector`], with optional search grounding.
//!
//! [`SearchAssistant::try_ask`] reports failures as typed errors. [`SearchAssistant::ask`]
//! and [`SearchAssistant::ask_stream`] never fail: any error becomes a reply whose
//! text starts with `"Error: "`, so the conversation can show it inline.

use std::fmt;
use std::sync::Arc;

use async_stream::stream;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;

use crate::ai::{Connector, QueryConfig};
use crate::error::ChatError;
use crate::prompt::build_prompt;
use crate::state::ChatMessage;

pub const SEARCH_NOT_USED: &str = "Web search not used.";

/// Search-results fragment attached to a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchResults {
    /// Web search was off for this request.
    NotRequested,
    /// Nothing to show: partial stream output, failures, or no grounding returned.
    Empty,
    /// Provider-rendered search entry point (an HTML fragment).
    Rendered(String),
}

impl SearchResults {
    fn from_grounding(rendered: Option<String>) -> Self {
        match rendered {
            Some(html) if !html.is_empty() => SearchResults::Rendered(html),
            _ => SearchResults::Empty,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SearchResults::NotRequested => SEARCH_NOT_USED,
            SearchResults::Empty => "",
            SearchResults::Rendered(html) => html,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }
}

impl fmt::Display for SearchResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answer text paired with its search-results fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryReply {
    pub text: String,
    pub search: SearchResults,
}

impl QueryReply {
    pub fn partial(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            search: SearchResults::Empty,
        }
    }

    pub fn failed(err: &ChatError) -> Self {
        Self {
            text: format!("Error: {}", err),
            search: SearchResults::Empty,
        }
    }
}

#[derive(Clone)]
pub struct SearchAssistant {
    connector: Arc<dyn Connector>,
}

impl SearchAssistant {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }

    pub async fn try_ask(
        &self,
        question: &str,
        history: &[ChatMessage],
        config: &QueryConfig,
    ) -> Result<QueryReply, ChatError> {
        let backend = self.connector.connect()?;
        let prompt = build_prompt(question, history);
        let response = backend.generate(&prompt, config).await?;

        let search = if config.web_search {
            SearchResults::from_grounding(response.search_entry_point)
        } else {
            SearchResults::NotRequested
        };

        Ok(QueryReply {
            text: response.text,
            search,
        })
    }

    pub async fn ask(&self, question: &str, history: &[ChatMessage], config: &QueryConfig) -> QueryReply {
        match self.try_ask(question, history, config).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(model = %config.model_id, error = %e, "query failed");
                QueryReply::failed(&e)
            }
        }
    }

    /// Stream accumulated text as it arrives, then a final reply carrying the
    /// search results. Streamed responses have no grounding metadata, so when
    /// search is on the results come from a second, non-streaming call.
    pub fn ask_stream(
        &self,
        question: String,
        history: Vec<ChatMessage>,
        config: QueryConfig,
    ) -> BoxStream<'static, QueryReply> {
        let connector = Arc::clone(&self.connector);

        let replies = stream! {
            let backend = match connector.connect() {
                Ok(backend) => backend,
                Err(e) => {
                    tracing::warn!(error = %e, "cannot create model client");
                    yield QueryReply::failed(&e);
                    return;
                }
            };

            let prompt = build_prompt(&question, &history);
            let mut chunks = match backend.generate_stream(&prompt, &config).await {
                Ok(chunks) => chunks,
                Err(e) => {
                    tracing::warn!(model = %config.model_id, error = %e, "stream request failed");
                    yield QueryReply::failed(&e);
                    return;
                }
            };

            let mut collected = String::new();
            while let Some(chunk) = chunks.next().await {
                match chunk {
                    Ok(text) if text.is_empty() => {}
                    Ok(text) => {
                        collected.push_str(&text);
                        yield QueryReply::partial(collected.clone());
                    }
                    Err(e) => {
                        tracing::warn!(model = %config.model_id, error = %e, "stream interrupted");
                        yield QueryReply::failed(&e);
                        return;
                    }
                }
            }
            tracing::debug!(chars = collected.len(), "stream complete");

            let search = if config.web_search {
                match backend.generate(&prompt, &config).await {
                    Ok(response) => SearchResults::from_grounding(response.search_entry_point),
                    Err(e) => {
                        tracing::warn!(model = %config.model_id, error = %e, "search follow-up failed");
                        yield QueryReply::failed(&e);
                        return;
                    }
                }
            } else {
                SearchResults::NotRequested
            };

            yield QueryReply { text: collected, search };
        };

        Box::pin(replies)
    }
}
