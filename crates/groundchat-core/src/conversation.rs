use async_stream::stream;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;

use crate::ai::QueryConfig;
use crate::config::Temperature;
use crate::query::{SearchAssistant, SearchResults};
use crate::state::{ChatLog, ChatMessage};

const SEARCH_RESULTS_HEADER: &str = "Web Search Results:";

/// One press of "submit" in a front end.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub question: String,
    pub web_search: bool,
    pub model_id: String,
    pub temperature: Temperature,
    pub stream: bool,
}

fn search_annotation(search: &SearchResults) -> String {
    format!("{}\n{}", SEARCH_RESULTS_HEADER, search)
}

/// Applies submissions to a chat log.
#[derive(Clone)]
pub struct ConversationUpdater {
    assistant: SearchAssistant,
    system_instruction: String,
}

impl ConversationUpdater {
    pub fn new(assistant: SearchAssistant, system_instruction: impl Into<String>) -> Self {
        Self {
            assistant,
            system_instruction: system_instruction.into(),
        }
    }

    fn query_config(&self, submission: &Submission) -> QueryConfig {
        QueryConfig {
            model_id: submission.model_id.clone(),
            temperature: submission.temperature,
            system_instruction: self.system_instruction.clone(),
            web_search: submission.web_search,
        }
    }

    /// Dispatch on `submission.stream`. Batch mode emits a single snapshot.
    pub fn submit(&self, submission: Submission, log: Option<ChatLog>) -> BoxStream<'static, ChatLog> {
        if submission.stream {
            return self.update_stream(submission, log);
        }

        let updater = self.clone();
        Box::pin(stream! {
            yield updater.update(&submission, log).await;
        })
    }

    pub async fn update(&self, submission: &Submission, log: Option<ChatLog>) -> ChatLog {
        let mut log = log.unwrap_or_default();
        if submission.question.is_empty() {
            return log;
        }

        log.push_user(submission.question.clone());
        // The prompt history includes the turn just appended.
        let history: Vec<ChatMessage> = log.messages().to_vec();

        let config = self.query_config(submission);
        let reply = self.assistant.ask(&submission.question, &history, &config).await;
        log.push_assistant(reply.text);

        // Appended whenever search was requested, even for the "not used" or empty fragment.
        if submission.web_search {
            log.push_assistant(search_annotation(&reply.search));
        }
        log
    }

    /// Emit a snapshot of the log after every streamed update and once more at the end.
    pub fn update_stream(&self, submission: Submission, log: Option<ChatLog>) -> BoxStream<'static, ChatLog> {
        let mut log = log.unwrap_or_default();
        if submission.question.is_empty() {
            return Box::pin(futures_util::stream::once(async move { log }));
        }

        log.push_user(submission.question.clone());
        let history: Vec<ChatMessage> = log.messages().to_vec();

        let config = self.query_config(&submission);
        let mut replies = self
            .assistant
            .ask_stream(submission.question.clone(), history, config);
        let web_search = submission.web_search;

        Box::pin(stream! {
            let mut search = SearchResults::Empty;
            while let Some(reply) = replies.next().await {
                log.merge_assistant(reply.text);
                search = reply.search;
                yield log.clone();
            }

            if web_search && !search.is_empty() {
                log.push_assistant(search_annotation(&search));
            }
            yield log;
        })
    }
}
