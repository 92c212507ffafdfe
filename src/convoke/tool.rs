//! Tool registry: named, stateless capabilities agents invoke via
//! `func_call::name(args)`.

use crate::convoke::call::Caller;
use async_trait::async_trait;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// A named callable exposed to agents.
///
/// Tools are stateless with respect to the registry: the registry only
/// dispatches by name, it never mutates tool state itself.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn usage(&self) -> &str;
    fn examples(&self) -> Vec<String>;
    fn param_names(&self) -> Vec<String>;

    /// Executes the tool against a name→value parameter map built by the
    /// registry. Errors cross this boundary as `Box<dyn Error + Send + Sync>`
    /// since tool bodies are an external collaborator.
    async fn execute(
        &self,
        params: HashMap<String, String>,
    ) -> Result<serde_json::Value, Box<dyn Error + Send + Sync>>;
}

/// Distinguishes the ways a tool invocation can fail, each rendered to a
/// distinct, deterministic prompt string by [`CallResult::to_prompt`] so the
/// model can self-correct.
#[derive(Debug, Clone)]
pub enum ToolError {
    NoCallFound,
    ToolNotFound(String),
    ArityMismatch { expected: usize, got: usize },
    Execution(String),
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::NoCallFound => write!(f, "has no function call"),
            ToolError::ToolNotFound(name) => write!(f, "tool not found: {}", name),
            ToolError::ArityMismatch { expected, got } => {
                write!(f, "params length not met: expected {}, got {}", expected, got)
            }
            ToolError::Execution(msg) => write!(f, "execution failed: {}", msg),
        }
    }
}

impl Error for ToolError {}

/// The outcome of one tool invocation attempt, carrying enough context
/// (function name, the values given, the names expected) to render a
/// self-correcting prompt regardless of what went wrong.
#[derive(Debug, Clone)]
pub struct CallResult {
    pub function_name: String,
    pub param_values: Vec<String>,
    pub expected_param_names: Vec<String>,
    pub response: Option<serde_json::Value>,
    pub error: Option<ToolError>,
}

impl CallResult {
    /// Renders a deterministic prompt-shaped string keyed by error kind, or
    /// a success message carrying the tool's response.
    pub fn to_prompt(&self, prefix: &str) -> String {
        let args = self.param_values.join(",");
        match &self.error {
            Some(ToolError::NoCallFound) => {
                format!("对话中没有找到 {}, 因此没有进行调用", prefix)
            }
            Some(ToolError::ToolNotFound(name)) => format!(
                "{}{}({}) 调用错误!\n因为没有找到名字是 {} 的调用，请检查输入是否正确.",
                prefix, self.function_name, args, name
            ),
            Some(ToolError::ArityMismatch { .. }) => format!(
                "{}{}({}) 调用错误!\n调用 {} 的参数应该是 {}，请检查输入是否正确.",
                prefix,
                self.function_name,
                args,
                self.function_name,
                self.expected_param_names.join(",")
            ),
            Some(other) => format!(
                "{}{}({}) 调用错误!\n具体错误是: {}",
                prefix, self.function_name, args, other
            ),
            None => {
                let resp = match &self.response {
                    Some(serde_json::Value::String(s)) => s.clone(),
                    Some(v) => v.to_string(),
                    None => String::new(),
                };
                format!(
                    "{}{}({}) 调用成功!\n结果为: {}",
                    prefix, self.function_name, args, resp
                )
            }
        }
    }
}

/// Registers tools by name; lookup is exact.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn empty() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn count(&self) -> usize {
        self.tools.len()
    }

    /// Dispatches a parsed call:
    /// 1. tool-not-found if `name` is unregistered,
    /// 2. arity-mismatch if `param_values.len() != tool.param_names().len()`,
    /// 3. builds a name→value map (trimmed, JSON-unquoted leading-quote
    ///    values, tolerant of unmarshal failure),
    /// 4. calls the tool and wraps its outcome in a [`CallResult`].
    pub async fn execute(&self, name: &str, param_values: Vec<String>) -> CallResult {
        let tool = match self.get(name) {
            Some(t) => t,
            None => {
                return CallResult {
                    function_name: name.to_string(),
                    param_values,
                    expected_param_names: Vec::new(),
                    response: None,
                    error: Some(ToolError::ToolNotFound(name.to_string())),
                }
            }
        };

        let expected = tool.param_names();
        if expected.len() != param_values.len() {
            return CallResult {
                function_name: name.to_string(),
                param_values,
                expected_param_names: expected,
                response: None,
                error: Some(ToolError::ArityMismatch {
                    expected: expected.len(),
                    got: param_values.len(),
                }),
            };
        }

        let mut params = HashMap::new();
        for (param_name, raw) in expected.iter().zip(param_values.iter()) {
            let trimmed = raw.trim();
            let val = if trimmed.starts_with('"') {
                match serde_json::from_str::<serde_json::Value>(trimmed) {
                    Ok(serde_json::Value::String(s)) => s,
                    _ => trimmed.to_string(),
                }
            } else {
                trimmed.to_string()
            };
            params.insert(param_name.clone(), val);
        }

        match tool.execute(params).await {
            Ok(response) => CallResult {
                function_name: name.to_string(),
                param_values,
                expected_param_names: expected,
                response: Some(response),
                error: None,
            },
            Err(e) => CallResult {
                function_name: name.to_string(),
                param_values,
                expected_param_names: expected,
                response: None,
                error: Some(ToolError::Execution(e.to_string())),
            },
        }
    }

    /// The not-found/no-call result used when the agent's reply did not
    /// contain a recognizable `func_call::` string at all.
    pub fn no_call_found(caller: &Caller) -> CallResult {
        let _ = caller;
        CallResult {
            function_name: String::new(),
            param_values: Vec::new(),
            expected_param_names: Vec::new(),
            response: None,
            error: Some(ToolError::NoCallFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }
        fn usage(&self) -> &str {
            "echoes its single argument"
        }
        fn examples(&self) -> Vec<String> {
            vec!["func_call::echo(hi)".to_string()]
        }
        fn param_names(&self) -> Vec<String> {
            vec!["text".to_string()]
        }
        async fn execute(
            &self,
            params: HashMap<String, String>,
        ) -> Result<serde_json::Value, Box<dyn Error + Send + Sync>> {
            Ok(serde_json::Value::String(params["text"].clone()))
        }
    }

    fn registry() -> ToolRegistry {
        let mut r = ToolRegistry::empty();
        r.register(Arc::new(Echo));
        r
    }

    #[tokio::test]
    async fn execute_unknown_tool_is_tool_not_found() {
        let r = registry();
        let res = r.execute("nope", vec!["1".into()]).await;
        assert!(matches!(res.error, Some(ToolError::ToolNotFound(_))));
        let prompt = res.to_prompt("func_call::");
        assert!(prompt.contains("没有找到名字是 nope"));
    }

    #[tokio::test]
    async fn execute_arity_mismatch() {
        let r = registry();
        let res = r.execute("echo", vec!["a".into(), "b".into()]).await;
        assert!(matches!(res.error, Some(ToolError::ArityMismatch { .. })));
    }

    #[tokio::test]
    async fn execute_trims_and_unquotes_values() {
        let r = registry();
        let res = r.execute("echo", vec![r#" "hi there" "#.into()]).await;
        assert_eq!(res.response, Some(serde_json::Value::String("hi there".into())));
        assert!(res.to_prompt("func_call::").contains("调用成功"));
    }

    #[tokio::test]
    async fn execute_keeps_raw_value_on_malformed_quote() {
        let r = registry();
        let res = r.execute("echo", vec![r#""unterminated"#.into()]).await;
        assert_eq!(
            res.response,
            Some(serde_json::Value::String(r#""unterminated"#.into()))
        );
    }
}
