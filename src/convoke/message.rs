//! The shared message and history model used by both the agent coordination
//! loop and, indirectly, the bot-invoking workflow nodes.
//!
//! A [`History`] is an ordered double-ended sequence of [`Message`]s. The
//! container itself is not synchronized: callers (the ACL's single loop
//! thread, or one workflow node's executor) own exclusive access for the
//! duration of a run.

use std::collections::VecDeque;

/// Byte length beyond which an assistant (bot) message is truncated when
/// appended to a [`History`] via [`History::enqueue_bot_msg`].
pub const TRUNCATE_BYTES: usize = 8_192;

/// The stable identity tag used to recognize function-call result messages
/// inside a history, so the merge rule in [`History::push_function_call_msg`]
/// can find them again.
pub const FUNCTION_CALL_IDENTITY: &str = "func_call::";

/// Role of the speaker that produced a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Bot,
    System,
}

/// An immutable-after-construction history entry.
///
/// `identity` is an in-band marker distinct from `role`: it is used to
/// recognize coordinator turns (by prefab name) and function-call turns (by
/// [`FUNCTION_CALL_IDENTITY`]) without needing a richer message-kind enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub identity: String,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, identity: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role,
            identity: identity.into(),
            content: content.into(),
        }
    }

    pub fn user(identity: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(Role::User, identity, content)
    }

    pub fn bot(identity: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(Role::Bot, identity, content)
    }

    pub fn system(identity: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(Role::System, identity, content)
    }

    /// Appends `more` to this message's content, separated by a blank line.
    /// A no-op when `more` is empty or whitespace-only.
    pub fn append_content(&mut self, more: &str) {
        if more.trim().is_empty() {
            return;
        }
        self.content.push_str("\n\n");
        self.content.push_str(more);
    }

    fn truncated(role: Role, identity: impl Into<String>, content: &str) -> Self {
        if content.len() <= TRUNCATE_BYTES {
            return Self::new(role, identity, content.to_string());
        }
        let mut truncated = content
            .char_indices()
            .take_while(|(i, _)| *i < TRUNCATE_BYTES)
            .map(|(_, c)| c)
            .collect::<String>();
        truncated.push_str("... (truncated)");
        Self::new(role, identity, truncated)
    }
}

/// The fixed "continue" driver directive pushed between coordinator turns.
///
/// Its content and identity are stable so the ACL can detect and elide it
/// during the history-rewrite step (see [`History::push_function_call_msg`]
/// and the coordination loop's routing-turn handling).
pub fn continue_directive() -> Message {
    Message::user(
        "convoke",
        "如果达到目标了请回答 \"任务完成\"，并对整个聊天进行总结后，对用户的原始问题进行正式答复; 否则, 进一步分析接下来该做什么，并说明步骤",
    )
}

/// The fixed "summarize" driver directive used for sample-mode post-processing.
pub fn summarize_directive() -> Message {
    Message::user(
        "convoke",
        "请总结以上过程，用简练的语言描述你是如何一步步解决问题的",
    )
}

/// The fixed "introduce" driver directive used to produce a narrative summary
/// of progress when the function-context policy is `Local`.
pub fn introduce_directive() -> Message {
    Message::user(
        "convoke",
        "请用一段简短的叙述性文字概括到目前为止已经完成的工作，以便后续步骤无需重读完整历史",
    )
}

/// Ordered double-ended sequence of [`Message`]s.
///
/// Supports enqueue-tail, pop-head, peek-tail, pop-tail, matching the
/// generic deque shape shown across the source material's several history
/// container revisions.
#[derive(Debug, Clone, Default)]
pub struct History {
    items: VecDeque<Message>,
}

impl History {
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn all(&self) -> impl Iterator<Item = &Message> {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Appends a message to the tail, unconditionally.
    pub fn enqueue(&mut self, msg: Message) {
        self.items.push_back(msg);
    }

    pub fn enqueue_user_msg(&mut self, identity: impl Into<String>, content: impl Into<String>) {
        self.enqueue(Message::user(identity, content));
    }

    /// Appends a bot (assistant) message, truncating content beyond
    /// [`TRUNCATE_BYTES`].
    pub fn enqueue_bot_msg(&mut self, identity: impl Into<String>, content: &str) {
        let identity = identity.into();
        self.enqueue(Message::truncated(Role::Bot, identity, content));
    }

    /// Removes and returns the head message, if any.
    pub fn pop_head(&mut self) -> Option<Message> {
        self.items.pop_front()
    }

    /// Returns a reference to the tail message without removing it.
    pub fn peek_tail(&self) -> Option<&Message> {
        self.items.back()
    }

    /// Removes and returns the tail message, if any.
    pub fn pop_tail(&mut self) -> Option<Message> {
        self.items.pop_back()
    }

    /// Pushes a synthetic function-call result message using the
    /// function-call merge rule:
    ///
    /// 1. Drop any trailing `continue` directive first (the result
    ///    supersedes it).
    /// 2. Repeatedly merge with the tail while the tail's identity equals
    ///    [`FUNCTION_CALL_IDENTITY`], concatenating contents with a blank
    ///    line, so consecutive tool exchanges collapse into one message.
    pub fn push_function_call_msg(&mut self, call_result: &str) {
        let continue_msg = continue_directive();
        while let Some(tail) = self.items.back() {
            if tail.role == continue_msg.role && tail.content == continue_msg.content {
                self.items.pop_back();
            } else {
                break;
            }
        }

        let mut merged = call_result.to_string();
        while let Some(tail) = self.items.back() {
            if tail.identity == FUNCTION_CALL_IDENTITY {
                let tail = self.items.pop_back().expect("just peeked");
                merged = format!("{}\n\n{}", tail.content, merged);
            } else {
                break;
            }
        }
        self.enqueue(Message::bot(FUNCTION_CALL_IDENTITY, merged));
    }
}
