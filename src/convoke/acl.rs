//! The Agent Coordination Loop (ACL): a multi-agent round-robin controller
//! with coordinator pivoting and history rewriting.

use crate::convoke::bot::Bot;
use crate::convoke::call::Caller;
use crate::convoke::message::{continue_directive, History, Role};
use std::collections::HashMap;
use std::error::Error;
use std::fmt;

/// The marker the coordinator must emit, verbatim, to signal that the
/// conversation has reached its goal.
pub const TASK_COMPLETE_MARKER: &str = "任务完成";

/// Hard ceiling on rounds so an adversarial or confused coordinator cannot
/// loop forever.
pub const MAX_ROUND: u32 = 100_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AclTermination {
    /// The final reply contained the `任务完成` marker.
    TaskComplete,
    /// The coordinator produced no agent-call and is not a leaf (it *is*
    /// the coordinator) — nothing left to route to.
    CoordinatorStall,
    /// An `agent_call::name(...)` referenced a prefab name not present
    /// among the configured agents.
    MissingPeer(String),
    /// `MAX_ROUND` was reached without termination.
    MaxRoundsReached,
    /// The agent-call pattern matched but the call string itself failed to parse.
    ParseFailure,
    /// No coordinator was configured and the current (leaf) agent produced
    /// no agent-call: nothing left to route to.
    LeafNoCall,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AclError {
    NoAgents,
}

impl fmt::Display for AclError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AclError::NoAgents => write!(f, "no agents configured"),
        }
    }
}

impl Error for AclError {}

/// The result of one full coordination run.
#[derive(Debug, Clone)]
pub struct AclOutcome {
    pub final_reply: String,
    pub rounds_executed: u32,
    pub terminated_by: AclTermination,
}

/// Runs the multi-agent round-robin loop, mutating `history` in place.
///
/// `agents` must be non-empty. The coordinator, if any, is the first agent
/// whose `ack_as == Some(ActAs::Coordinator)`; otherwise `agents[0]` plays
/// both roles (current agent and, implicitly, "no coordinator" path).
pub async fn run(
    history: &mut History,
    question: &str,
    agents: &[Bot],
) -> Result<AclOutcome, AclError> {
    if agents.is_empty() {
        return Err(AclError::NoAgents);
    }

    let agent_caller = Caller::for_agents();
    let by_prefab: HashMap<&str, &Bot> = agents.iter().map(|b| (b.prefab_name.as_str(), b)).collect();

    let coordinator = agents
        .iter()
        .find(|b| b.ack_as == Some(crate::convoke::prompt::ActAs::Coordinator));
    let mut current = coordinator.unwrap_or(&agents[0]);

    history.enqueue_user_msg("user", question);

    for round in 0..MAX_ROUND {
        let content = match current.send_chat(history).await {
            Ok(text) => text,
            Err(e) => {
                history.enqueue_bot_msg(&current.prefab_name, &format!("chat failed, err: {}", e));
                continue;
            }
        };
        history.enqueue_bot_msg(&current.prefab_name, &content);

        if content.contains(TASK_COMPLETE_MARKER) {
            return Ok(AclOutcome {
                final_reply: content,
                rounds_executed: round + 1,
                terminated_by: AclTermination::TaskComplete,
            });
        }

        if agent_caller.has_call(&content) {
            let (agent_name, args) = match agent_caller.parse_call(&content) {
                Ok(parsed) => parsed,
                Err(_) => {
                    return Ok(AclOutcome {
                        final_reply: content,
                        rounds_executed: round + 1,
                        terminated_by: AclTermination::ParseFailure,
                    })
                }
            };
            let q = args.join("; ");

            let peer = match by_prefab.get(agent_name.as_str()) {
                Some(p) => *p,
                None => {
                    return Ok(AclOutcome {
                        final_reply: content,
                        rounds_executed: round + 1,
                        terminated_by: AclTermination::MissingPeer(agent_name),
                    })
                }
            };

            // History rewrite: elide the coordinator's pure routing turn
            // (and the continue-directive it answered) so downstream agents
            // see only the decision, not the machinery.
            if let Some(coord) = coordinator {
                let was_routing_turn = history
                    .peek_tail()
                    .map(|m| m.identity == coord.prefab_name)
                    .unwrap_or(false);
                if was_routing_turn {
                    history.pop_tail();
                    let continue_msg = continue_directive();
                    let was_continue = history
                        .peek_tail()
                        .map(|m| m.role == Role::User && m.content == continue_msg.content)
                        .unwrap_or(false);
                    if was_continue {
                        history.pop_tail();
                    }
                    history.enqueue_bot_msg(
                        &coord.prefab_name,
                        &format!(
                            "{} 经过思考，决定接下来 agent::{} 来做:\n {}",
                            coord.prefab_name, peer.prefab_name, q
                        ),
                    );
                } else {
                    history.enqueue_user_msg("acl", &q);
                }
            } else {
                history.enqueue_user_msg("acl", &q);
            }

            current = peer;
            continue;
        }

        // No agent-call in the reply.
        let coord = match coordinator {
            None => {
                return Ok(AclOutcome {
                    final_reply: content,
                    rounds_executed: round + 1,
                    terminated_by: AclTermination::LeafNoCall,
                })
            }
            Some(c) => c,
        };

        if std::ptr::eq(coord, current) {
            return Ok(AclOutcome {
                final_reply: content,
                rounds_executed: round + 1,
                terminated_by: AclTermination::CoordinatorStall,
            });
        }

        history.enqueue_user_msg("acl", &continue_directive().content);
        current = coord;
    }

    Ok(AclOutcome {
        final_reply: history
            .peek_tail()
            .map(|m| m.content.clone())
            .unwrap_or_default(),
        rounds_executed: MAX_ROUND,
        terminated_by: AclTermination::MaxRoundsReached,
    })
}
