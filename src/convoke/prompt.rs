//! Builds the system message for a [`crate::convoke::bot::Bot`] from base
//! content, declared tool names, and a coordinator-awareness block.

use crate::convoke::tool::ToolRegistry;
use std::collections::HashMap;

const FUNC_TELL_START: &str = "# 现在支持了以下 functions\n";
const FUNC_TELL_TAIL: &str = "\n当且仅当要使用 function 时，回复 func_call::name(params)，比如：\nfunc_call::search(\"用户的问题\")\n注意:\n- 要调用函数时不要回复除调用函数以外的内容\n- 如果不需要调用 function, 你的回复一定不要包含这种格式\n";

const ACT_AS_TELL_START: &str = "# 现在支持了以下 Agents\n";
const ACT_AS_TELL_TAIL: &str = "\n当且仅当要使用 agents 时，回复 agent_call::name(question)，比如：\nagent_call::worker(\"帮我查一下 X\")\n注意:\n- 要调用 agent 时不要回复除调用 agent 以外的内容\n- 如果不需要调用 agent, 你的回复一定不要包含这种格式\n";

const SAMPLE_MODE_HINT: &str = "\n完成任务后，请额外给出一份简要的过程说明，便于复盘。\n";

const SELF_INTRODUCTION: &str = "# Initialization\n在首次回复时，请先用一句话自我介绍你的职责范围。\n";

/// Governs how much prior context a [`crate::convoke::bot::Bot`] rebuilds
/// when resuming a function-execution recursion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionCtxPolicy {
    /// Rebuild the full preceding history plus the scratch list.
    All,
    /// Rebuild only [system, introduce-message, scratch…] — a narrative
    /// summary stands in for the full history.
    Local,
}

/// Governs post-processing of the bot's final reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionModePolicy {
    /// No post-processing beyond the raw final reply.
    Normal,
    /// Issue an extra driver turn to produce a `# 结论 / # 过程` formatted reply.
    Sample,
}

/// The role hint attached to a bot, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActAs {
    Coordinator,
    Evaluator,
}

/// Base content, declared tool names, and the two function policies that
/// together shape one bot's system message.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub content: String,
    pub functions: Vec<String>,
    pub function_ctx: FunctionCtxPolicy,
    pub function_mode: FunctionModePolicy,
}

impl Prompt {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            functions: Vec::new(),
            function_ctx: FunctionCtxPolicy::All,
            function_mode: FunctionModePolicy::Normal,
        }
    }

    pub fn with_functions(mut self, functions: Vec<String>) -> Self {
        self.functions = functions;
        self
    }

    pub fn with_function_mode(mut self, mode: FunctionModePolicy) -> Self {
        self.function_mode = mode;
        self
    }

    fn make_functions(&self, registry: &ToolRegistry) -> String {
        if self.functions.is_empty() {
            return String::new();
        }
        let mut info = String::from(FUNC_TELL_START);
        for (i, fn_name) in self.functions.iter().enumerate() {
            match registry.get(fn_name) {
                Some(tool) => {
                    info.push_str(&format!(
                        "{}. {} ; usage: {} ;\n  example: {:?};\n",
                        i + 1,
                        tool.name(),
                        tool.usage(),
                        tool.examples()
                    ));
                }
                None => return format!("Error: function {} not found", fn_name),
            }
        }
        info.push_str(FUNC_TELL_TAIL);
        info
    }

    /// Builds the full system message content: base content, tool block
    /// (if any), sample-mode hint (if applicable), self-introduction
    /// directive (unless already present), then `{{key}}` substitution from
    /// `replacements`. The coordinator-awareness block, if any, is appended
    /// separately by the caller after this returns (see `Bot::system_message`).
    pub fn build_system_message(
        &self,
        registry: &ToolRegistry,
        replacements: &HashMap<String, String>,
    ) -> String {
        let mut all = self.content.clone();

        let function_info = self.make_functions(registry);
        if !function_info.is_empty() {
            all.push_str("\n\n");
            all.push_str(&function_info);
        }

        if self.function_mode == FunctionModePolicy::Sample {
            all.push_str(SAMPLE_MODE_HINT);
        }

        if !all.contains("# Initialization") {
            all.push_str("\n\n");
            all.push_str(SELF_INTRODUCTION);
        }

        for (key, value) in replacements {
            all = all.replace(&format!("{{{{{}}}}}", key), value);
        }

        all
    }
}

/// One peer's identity as seen by a coordinator when building the
/// coordinator-awareness block: just enough to let the coordinator route
/// to it (`name`, `usage`).
pub struct PeerSummary {
    pub prefab_name: String,
    pub usage: String,
}

/// Builds the coordinator-awareness block appended to a coordinator bot's
/// prompt: a numbered `name / usage` listing of every peer, plus the fixed
/// constraints footer describing the `agent_call::name(question)` syntax.
pub fn inject_coordinator_prompt(peers: &[PeerSummary]) -> String {
    let mut info = String::from(ACT_AS_TELL_START);
    for (i, peer) in peers.iter().enumerate() {
        info.push_str(&format!("{}. {}\n    Usage: {}\n", i + 1, peer.prefab_name, peer.usage));
    }
    info.push_str(ACT_AS_TELL_TAIL);
    info
}
