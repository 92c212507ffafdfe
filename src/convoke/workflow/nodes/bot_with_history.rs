//! Concurrent per-item bot invocation, each task seeded with a shared
//! history snapshot before its own question (ground:
//! `node_bot_with_history.go`'s `WFBotWithHistoryNode`).

use super::super::node::NodeExecutor;
use super::super::{ConditionTable, NodeHandle, WorkflowError};
use super::{input_list, single_or_list, AfterFn, IN_HISTORY, IN_QUESTION, OUT_ANSWER};
use crate::convoke::bot::Bot;
use crate::convoke::message::History;
use crate::convoke::retry::{run_with_retry, DEFAULT_BASE_INTERVAL, DEFAULT_MAX_ATTEMPTS};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Semaphore;

pub const DEFAULT_CONCURRENCY: usize = 2;

pub struct BotWithHistoryNode {
    bot: Arc<Bot>,
    after_fn: Option<AfterFn>,
    concurrency: usize,
}

impl BotWithHistoryNode {
    pub fn new(bot: Arc<Bot>) -> Self {
        Self {
            bot,
            after_fn: None,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_after_fn(mut self, after_fn: AfterFn) -> Self {
        self.after_fn = Some(after_fn);
        self
    }
}

async fn ask_with_history(
    bot: &Bot,
    history_text: &str,
    question: &str,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let mut history = History::new();
    history.enqueue_bot_msg("workflow", history_text);
    history.enqueue_user_msg("workflow", question);
    bot.send_chat(&history)
        .await
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
}

#[async_trait]
impl NodeExecutor for BotWithHistoryNode {
    async fn execute(&self, params: ConditionTable, node: NodeHandle) -> Result<String, WorkflowError> {
        let input = params
            .get(IN_QUESTION)
            .ok_or_else(|| WorkflowError::Execution(format!("input param {} is not set", IN_QUESTION)))?;
        let history_value = params
            .get(IN_HISTORY)
            .ok_or_else(|| WorkflowError::Execution(format!("input param {} is not set", IN_HISTORY)))?;
        let inputs = input_list(input)?;
        let history_text = match history_value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut join_set = tokio::task::JoinSet::new();
        for (index, question) in inputs.into_iter().enumerate() {
            let semaphore = semaphore.clone();
            let bot = self.bot.clone();
            let history_text = history_text.clone();
            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore is never closed");
                let result = run_with_retry(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_INTERVAL, || {
                    let bot = bot.clone();
                    let history_text = history_text.clone();
                    let question = question.clone();
                    async move { ask_with_history(&bot, &history_text, &question).await }
                })
                .await;
                (index, result)
            });
        }

        let mut answers: Vec<Option<String>> = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            let (index, result) = joined.map_err(|e| WorkflowError::Execution(e.to_string()))?;
            let answer = result.map_err(|e| WorkflowError::Execution(format!("bot question failed: {}", e)))?;
            if index >= answers.len() {
                answers.resize(index + 1, None);
            }
            answers[index] = Some(answer);
        }

        let mut outputs = Vec::with_capacity(answers.len());
        for answer in answers {
            let answer = answer.expect("every index was populated by its own task");
            let item = match &self.after_fn {
                Some(f) => f(&answer)?,
                None => Value::String(answer),
            };
            outputs.push(item);
        }

        let output = single_or_list(outputs);
        if !node.output(OUT_ANSWER, output).await? {
            return Err(WorkflowError::Execution("signal not finished".to_string()));
        }
        Ok("success".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convoke::driver::{Driver, StreamHandler};
    use crate::convoke::message::Message;
    use crate::convoke::prompt::Prompt;
    use crate::convoke::tool::ToolRegistry;
    use crate::convoke::workflow::node::{connect, Node};
    use std::error::Error as StdError;
    use tokio::sync::RwLock;

    struct RecordingDriver;

    #[async_trait]
    impl Driver for RecordingDriver {
        async fn chat(&self, messages: &[Message]) -> Result<String, Box<dyn StdError + Send + Sync>> {
            let seeded_history = messages.iter().any(|m| m.content.contains("past context"));
            Ok(format!("saw_history={}", seeded_history))
        }

        async fn stream_chat(&self, _messages: &[Message], _handler: StreamHandler) -> Result<(), Box<dyn StdError + Send + Sync>> {
            Ok(())
        }
    }

    struct Noop;

    #[async_trait]
    impl NodeExecutor for Noop {
        async fn execute(&self, _: ConditionTable, _: NodeHandle) -> Result<String, WorkflowError> {
            Ok("ok".to_string())
        }
    }

    fn make_bot() -> Arc<Bot> {
        Arc::new(Bot::new(
            "history-bot",
            "answers with seeded history",
            Arc::new(RecordingDriver),
            Arc::new(RwLock::new(ToolRegistry::empty())),
            Prompt::new("base"),
        ))
    }

    #[tokio::test]
    async fn seeds_every_task_with_the_shared_history() {
        let node = Node::new(
            "with_history",
            Arc::new(BotWithHistoryNode::new(make_bot())),
            Some(vec![IN_QUESTION.to_string(), IN_HISTORY.to_string()]),
            Some(vec![OUT_ANSWER.to_string()]),
        );
        let sink = Node::new("sink", Arc::new(Noop), Some(vec!["in".to_string()]), None);
        connect(&node, OUT_ANSWER, &sink, "in").await.unwrap();

        node.insert_upstream("__init__", "q", IN_QUESTION).await.unwrap();
        node.insert_upstream("__init__", "h", IN_HISTORY).await.unwrap();
        node.input("__init__", "h", Value::String("past context".to_string())).await.unwrap();
        node.input(
            "__init__",
            "q",
            Value::Array(vec![Value::String("a".to_string()), Value::String("b".to_string())]),
        )
        .await
        .unwrap();
        node.execute().await.unwrap();
        assert!(sink.is_all_input_ready().await);
    }
}
