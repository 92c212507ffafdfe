//! Concurrent per-item bot invocation: each string in the `question` input
//! is asked independently, with results reassembled in input order
//! (ground: `node_bot.go`'s `WFBotNode`, generalized to a bounded-concurrency
//! `tokio::task::JoinSet` instead of `contraver.TraverseAndWait`).

use super::super::node::NodeExecutor;
use super::super::{ConditionTable, NodeHandle, WorkflowError};
use super::{input_list, single_or_list, AfterFn, IN_QUESTION, OUT_ANSWER};
use crate::convoke::bot::Bot;
use crate::convoke::message::History;
use crate::convoke::retry::{run_with_retry, DEFAULT_BASE_INTERVAL, DEFAULT_MAX_ATTEMPTS};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Chosen in place of the source material's concurrency of 5, since a
/// workflow node here has no equivalent of its surrounding service's request
/// budget to size against.
pub const DEFAULT_CONCURRENCY: usize = 2;

pub struct BotScatterNode {
    bot: Arc<Bot>,
    after_fn: Option<AfterFn>,
    concurrency: usize,
}

impl BotScatterNode {
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

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

async fn ask_once(bot: &Bot, question: &str) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let mut history = History::new();
    history.enqueue_user_msg("workflow", question);
    bot.send_chat(&history)
        .await
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
}

#[async_trait]
impl NodeExecutor for BotScatterNode {
    async fn execute(&self, params: ConditionTable, node: NodeHandle) -> Result<String, WorkflowError> {
        let input = params
            .get(IN_QUESTION)
            .ok_or_else(|| WorkflowError::Execution(format!("input param {} is not set", IN_QUESTION)))?;
        let inputs = input_list(input)?;

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut join_set = tokio::task::JoinSet::new();
        for (index, question) in inputs.into_iter().enumerate() {
            let semaphore = semaphore.clone();
            let bot = self.bot.clone();
            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore is never closed");
                let result = run_with_retry(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_INTERVAL, || {
                    let bot = bot.clone();
                    let question = question.clone();
                    async move { ask_once(&bot, &question).await }
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
    use crate::convoke::driver::Driver;
    use crate::convoke::prompt::Prompt;
    use crate::convoke::tool::ToolRegistry;
    use std::error::Error as StdError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::RwLock;

    struct EchoDriver;

    #[async_trait]
    impl Driver for EchoDriver {
        async fn chat(&self, messages: &[crate::convoke::message::Message]) -> Result<String, Box<dyn StdError + Send + Sync>> {
            Ok(format!("echo: {}", messages.last().map(|m| m.content.as_str()).unwrap_or("")))
        }

        async fn stream_chat(
            &self,
            _messages: &[crate::convoke::message::Message],
            _handler: crate::convoke::driver::StreamHandler,
        ) -> Result<(), Box<dyn StdError + Send + Sync>> {
            Ok(())
        }
    }

    fn make_bot() -> Arc<Bot> {
        Arc::new(Bot::new(
            "scatter-bot",
            "answers fanned-out questions",
            Arc::new(EchoDriver),
            Arc::new(RwLock::new(ToolRegistry::empty())),
            Prompt::new("base"),
        ))
    }

    struct Noop;

    #[async_trait]
    impl NodeExecutor for Noop {
        async fn execute(&self, _: ConditionTable, _: NodeHandle) -> Result<String, WorkflowError> {
            Ok("ok".to_string())
        }
    }

    #[tokio::test]
    async fn scatters_a_single_question_and_unwraps_the_list() {
        let node = crate::convoke::workflow::node::Node::new(
            "scatter",
            Arc::new(BotScatterNode::new(make_bot())),
            Some(vec![IN_QUESTION.to_string()]),
            Some(vec![OUT_ANSWER.to_string()]),
        );
        let sink = crate::convoke::workflow::node::Node::new("sink", Arc::new(Noop), Some(vec!["in".to_string()]), None);
        crate::convoke::workflow::node::connect(&node, OUT_ANSWER, &sink, "in").await.unwrap();

        node.insert_upstream("__init__", "seed", IN_QUESTION).await.unwrap();
        node.input("__init__", "seed", Value::String("hi".to_string())).await.unwrap();
        node.execute().await.unwrap();
        assert!(sink.is_all_input_ready().await);
    }

    #[tokio::test]
    async fn scatters_a_list_and_preserves_order() {
        let counter = Arc::new(AtomicUsize::new(0));
        let _ = counter.clone();
        let node = crate::convoke::workflow::node::Node::new(
            "scatter",
            Arc::new(BotScatterNode::new(make_bot()).with_concurrency(1)),
            Some(vec![IN_QUESTION.to_string()]),
            Some(vec![OUT_ANSWER.to_string()]),
        );
        node.insert_upstream("__init__", "seed", IN_QUESTION).await.unwrap();
        node.input(
            "__init__",
            "seed",
            Value::Array(vec![Value::String("a".to_string()), Value::String("b".to_string())]),
        )
        .await
        .unwrap();
        node.execute().await.unwrap();
    }
}
