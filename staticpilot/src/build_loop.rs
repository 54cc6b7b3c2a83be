//! The bounded command-proposal / execute / observe loop.
//!
//! Each step asks the oracle for the next command, executes it in the project
//! root and appends the command and its summarized output to the
//! conversation. Steps are strictly sequential: every observation is input to
//! the next request.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, instrument, warn};

use crate::core::conversation::Conversation;
use crate::core::sanitize::{Reply, interpret};
use crate::core::summary::summarize_with_limit;
use crate::io::oracle::Oracle;
use crate::io::shell::Shell;

/// Parameters of one loop run.
#[derive(Debug, Clone)]
pub struct LoopConfig<'a> {
    /// Working directory of every executed command.
    pub workdir: &'a Path,
    /// Oracle round-trips allowed before the run fails.
    pub max_steps: u32,
    pub completion_token: &'a str,
    pub observation_limit_chars: usize,
}

/// One executed command, reported to the step callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    /// 1-based step number.
    pub step: u32,
    pub command: String,
    pub exit_code: i32,
    pub observation_truncated: bool,
}

/// Summary of a loop run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOutcome {
    /// True only when the oracle replied with the completion token.
    pub completed: bool,
    /// Oracle calls made.
    pub steps: u32,
    pub conversation: Conversation,
}

/// Drive the oracle until it signals completion or `max_steps` calls elapse.
///
/// Returns `completed: false` when the budget runs out; callers must treat
/// that as a failed build. Oracle failures, empty replies and execution-port
/// failures abort with an error. Commands exiting non-zero do not: their
/// output is fed back to the oracle like any other observation.
#[instrument(skip_all, fields(max_steps = config.max_steps, workdir = %config.workdir.display()))]
pub fn run_build_loop<O: Oracle, S: Shell, F: FnMut(&StepRecord)>(
    oracle: &O,
    shell: &S,
    mut conversation: Conversation,
    config: &LoopConfig<'_>,
    mut on_step: F,
) -> Result<LoopOutcome> {
    for step in 1..=config.max_steps {
        let raw = oracle
            .complete(conversation.messages())
            .with_context(|| format!("query oracle at step {step}"))?;
        let command = match interpret(&raw, config.completion_token)
            .with_context(|| format!("interpret oracle reply at step {step}"))?
        {
            Reply::Complete => {
                info!(step, "oracle signalled completion");
                return Ok(LoopOutcome {
                    completed: true,
                    steps: step,
                    conversation,
                });
            }
            Reply::Command(command) => command,
        };

        info!(step, command = %command, "executing oracle command");
        let result = shell
            .run(&command, config.workdir)
            .with_context(|| format!("execute step {step} command `{command}`"))?;
        if !result.success() {
            warn!(step, exit_code = result.exit_code, "command exited non-zero");
        }

        let observation = summarize_with_limit(&result, config.observation_limit_chars);
        let record = StepRecord {
            step,
            command: command.clone(),
            exit_code: result.exit_code,
            observation_truncated: observation.truncated,
        };
        on_step(&record);
        conversation.record_exchange(command, observation.text);
    }

    warn!(max_steps = config.max_steps, "step budget exhausted without completion");
    Ok(LoopOutcome {
        completed: false,
        steps: config.max_steps,
        conversation,
    })
}
