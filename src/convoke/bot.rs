//! The [`Bot`]: one conversational participant owning a prompt, a tool
//! registry handle, and a driver handle, capable of running a single-turn
//! request with recursive tool-call resolution.

use crate::convoke::call::Caller;
use crate::convoke::config::BotConfig;
use crate::convoke::driver::Driver;
use crate::convoke::message::{
    continue_directive, introduce_directive, summarize_directive, History, Message, Role,
};
use crate::convoke::prompt::{ActAs, FunctionCtxPolicy, FunctionModePolicy, Prompt};
use crate::convoke::tool::ToolRegistry;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// The depth ceiling for the function-execution recursion, fixed here well
/// above any legitimate multi-tool-call chain.
pub const MAX_FUNCTION_DEPTH: u32 = 8;

/// The stock reply returned when the driver's response is empty after
/// trimming.
const DISTRACTED_REPLY: &str = "抱歉，我刚才走神了，请再说一次。";

#[derive(Debug)]
pub enum AgentError {
    EmptyReply,
    FunctionDepthExceeded,
    Driver(Box<dyn Error + Send + Sync>),
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::EmptyReply => write!(f, "driver returned an empty reply"),
            AgentError::FunctionDepthExceeded => {
                write!(f, "function-execution recursion exceeded depth {}", MAX_FUNCTION_DEPTH)
            }
            AgentError::Driver(e) => write!(f, "driver error: {}", e),
        }
    }
}

impl Error for AgentError {}

/// One conversational participant.
///
/// Build-messages order is always `[system] ++ global_history ++
/// local_history`; `Bot` never mutates the caller-owned global history
/// itself (the ACL, or a workflow node, owns that).
pub struct Bot {
    pub id: Uuid,
    pub prefab_name: String,
    pub usage: String,
    driver: Arc<dyn Driver>,
    tool_registry: Arc<RwLock<ToolRegistry>>,
    pub prompt: Prompt,
    pub ack_as: Option<ActAs>,
    /// Coordinator-awareness text appended after the prompt's own system
    /// message; populated by `inject_coordinator_prompt` for bots acting as
    /// coordinator.
    pub act_as_context: String,
    /// `{{key}}` substitution map applied while composing the system message.
    pub replacements: HashMap<String, String>,
    /// Reserved: per-bot local history, currently unused by the ACL (which
    /// only ever builds messages with an empty local history), kept so a
    /// future per-bot scratch history has somewhere to live without an API
    /// change.
    pub local_history: History,
    tool_caller: Caller,
}

impl Bot {
    pub fn new(
        prefab_name: impl Into<String>,
        usage: impl Into<String>,
        driver: Arc<dyn Driver>,
        tool_registry: Arc<RwLock<ToolRegistry>>,
        prompt: Prompt,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            prefab_name: prefab_name.into(),
            usage: usage.into(),
            driver,
            tool_registry,
            prompt,
            ack_as: None,
            act_as_context: String::new(),
            replacements: HashMap::new(),
            local_history: History::new(),
            tool_caller: Caller::for_tools(),
        }
    }

    /// Builds a live `Bot` from one on-disk [`BotConfig`] plus a driver
    /// handle and a tool registry handle: the data-only record becomes a
    /// runnable participant the same way [`Bot::new`] plus the builder
    /// chain would, with the prompt assembled from `cfg.prompt`.
    pub fn from_config(
        cfg: BotConfig,
        driver: Arc<dyn Driver>,
        tool_registry: Arc<RwLock<ToolRegistry>>,
    ) -> Self {
        let mut prompt = Prompt::new(cfg.prompt.content)
            .with_functions(cfg.prompt.functions)
            .with_function_mode(cfg.prompt.function_mode.into());
        prompt.function_ctx = cfg.prompt.function_ctx.into();

        let mut bot = Self::new(cfg.prefab_name, cfg.usage, driver, tool_registry, prompt);
        if let Some(ack_as) = cfg.ack_as {
            bot = bot.with_ack_as(ack_as.into());
        }
        if let Some(ctx) = cfg.act_as_context {
            bot = bot.with_act_as_context(ctx);
        }
        bot
    }

    pub fn with_ack_as(mut self, ack_as: ActAs) -> Self {
        self.ack_as = Some(ack_as);
        self
    }

    pub fn with_act_as_context(mut self, ctx: impl Into<String>) -> Self {
        self.act_as_context.push_str(&ctx.into());
        self
    }

    /// Builds this bot's full system message: the prompt's composed
    /// content, followed by the coordinator-awareness block (if any).
    fn system_message(&self, registry: &ToolRegistry) -> Message {
        let mut content = self.prompt.build_system_message(registry, &self.replacements);
        if !self.act_as_context.is_empty() {
            content.push_str("\n\n");
            content.push_str(&self.act_as_context);
        }
        Message::system(&self.prefab_name, content)
    }

    fn build_messages(&self, system: &Message, global_history: &History) -> Vec<Message> {
        let mut messages = vec![system.clone()];
        messages.extend(global_history.all().cloned());
        messages.extend(self.local_history.all().cloned());
        messages
    }

    /// Runs a single conversational turn against `global_history`,
    /// recursively resolving any `func_call::` strings in the reply before
    /// returning the final text. Never mutates `global_history`.
    pub async fn send_chat(&self, global_history: &History) -> Result<String, AgentError> {
        let registry = self.tool_registry.read().await;
        let system = self.system_message(&registry);
        drop(registry);

        let messages = self.build_messages(&system, global_history);
        self.normal_req(&system, messages, 0).await
    }

    /// `NormalReq`: calls the driver once, trims the reply, and either
    /// returns the stock "distracted" string on empty content or enters
    /// function-execution.
    async fn normal_req(
        &self,
        system: &Message,
        messages: Vec<Message>,
        depth: u32,
    ) -> Result<String, AgentError> {
        let reply = self
            .driver
            .chat(&messages)
            .await
            .map_err(AgentError::Driver)?;
        let trimmed = reply.trim().to_string();
        if trimmed.is_empty() {
            return Ok(DISTRACTED_REPLY.to_string());
        }
        self.resolve_function_calls(system, messages, trimmed, depth).await
    }

    /// Function-execution recursion:
    /// 1. no call in `reply` → return it as-is.
    /// 2. parse + dispatch the call, merge the synthesized result into a
    ///    scratch list using the history merge rule.
    /// 3. rebuild the next request per the function-context policy and recurse.
    async fn resolve_function_calls(
        &self,
        system: &Message,
        preceding: Vec<Message>,
        reply: String,
        depth: u32,
    ) -> Result<String, AgentError> {
        if !self.tool_caller.has_call(&reply) {
            return self.finalize(preceding, reply).await;
        }
        if depth >= MAX_FUNCTION_DEPTH {
            return Err(AgentError::FunctionDepthExceeded);
        }

        let mut scratch = History::new();
        scratch.enqueue(Message::bot(&self.prefab_name, reply.clone()));

        let prompt_text = match self.tool_caller.parse_call(&reply) {
            Ok((name, args)) => {
                let registry = self.tool_registry.read().await;
                let result = registry.execute(&name, args).await;
                result.to_prompt(self.tool_caller.prefix)
            }
            Err(_) => {
                crate::convoke::tool::ToolRegistry::no_call_found(&self.tool_caller)
                    .to_prompt(self.tool_caller.prefix)
            }
        };
        scratch.push_function_call_msg(&prompt_text);

        let next_messages = match self.prompt.function_ctx {
            FunctionCtxPolicy::All => {
                let mut all = preceding.clone();
                all.extend(scratch.all().cloned());
                all.push(continue_directive());
                all
            }
            FunctionCtxPolicy::Local => {
                let mut intro_messages = preceding.clone();
                intro_messages.push(introduce_directive());
                let narrative = self
                    .driver
                    .chat(&intro_messages)
                    .await
                    .map_err(AgentError::Driver)?;
                let mut local = vec![
                    system.clone(),
                    Message::bot(&self.prefab_name, narrative.trim().to_string()),
                ];
                local.extend(scratch.all().cloned());
                local.push(continue_directive());
                local
            }
        };

        let next_reply = self
            .driver
            .chat(&next_messages)
            .await
            .map_err(AgentError::Driver)?;
        let trimmed = next_reply.trim().to_string();
        if trimmed.is_empty() {
            return Ok(DISTRACTED_REPLY.to_string());
        }

        Box::pin(self.resolve_function_calls(system, next_messages, trimmed, depth + 1)).await
    }

    /// Applies sample-mode post-processing if any tool was invoked along
    /// the way (`preceding` grew past the base system+history messages
    /// only when at least one function round happened): issues a
    /// summarize turn and reformats as `# 结论 / # 过程`.
    async fn finalize(&self, preceding: Vec<Message>, reply: String) -> Result<String, AgentError> {
        if self.prompt.function_mode != FunctionModePolicy::Sample {
            return Ok(reply);
        }
        // Whether a tool ran this turn is recorded by the caller appending a
        // synthetic function-call-identity message onto `preceding`.
        let tool_was_invoked = preceding
            .iter()
            .any(|m| m.identity == crate::convoke::message::FUNCTION_CALL_IDENTITY);
        if !tool_was_invoked {
            return Ok(reply);
        }

        let mut summarize_messages = preceding;
        summarize_messages.push(Message::bot(&self.prefab_name, reply.clone()));
        summarize_messages.push(summarize_directive());
        let summary = self
            .driver
            .chat(&summarize_messages)
            .await
            .map_err(AgentError::Driver)?;

        Ok(format!("# 结论\n{}\n\n# 过程\n{}", reply, summary.trim()))
    }

    /// `InjectCoordinatorPrompt`: appends a peer listing + constraints
    /// footer to `act_as_context`. Should only be called on bots whose
    /// `ack_as == Some(ActAs::Coordinator)`.
    pub fn inject_coordinator_prompt(
        &mut self,
        peers: &[crate::convoke::prompt::PeerSummary],
    ) {
        let block = crate::convoke::prompt::inject_coordinator_prompt(peers);
        self.act_as_context.push_str(&block);
    }
}

/// Initializes `ActAs` wiring across a set of bots: every coordinator gets
/// the other bots' `(prefab_name, usage)` injected into its prompt.
pub fn init_all_act_as(bots: &mut [Bot]) {
    let peers: Vec<(String, String, Option<ActAs>)> = bots
        .iter()
        .map(|b| (b.prefab_name.clone(), b.usage.clone(), b.ack_as))
        .collect();

    for bot in bots.iter_mut() {
        if bot.ack_as != Some(ActAs::Coordinator) {
            continue;
        }
        let others: Vec<crate::convoke::prompt::PeerSummary> = peers
            .iter()
            .filter(|(name, _, _)| name != &bot.prefab_name)
            .map(|(name, usage, _)| crate::convoke::prompt::PeerSummary {
                prefab_name: name.clone(),
                usage: usage.clone(),
            })
            .collect();
        bot.inject_coordinator_prompt(&others);
    }
}
