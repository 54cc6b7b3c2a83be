//! End-to-end run: archive to release bundle.
//!
//! 1. Find and extract the task archive into the source directory.
//! 2. Survey the project and render the opening conversation.
//! 3. Drive the build loop to completion.
//! 4. Locate the static output and publish it to the release directory.
//! 5. Ask the oracle for rewrite rules and write them next to the release.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, instrument, warn};

use crate::build_loop::{LoopConfig, run_build_loop};
use crate::core::rewrite::select_rewrite_rules;
use crate::error::{NoArtifactFound, StepBudgetExhausted};
use crate::io::archive::{extract_archive, find_task_archive};
use crate::io::config::{BuildConfig, Layout};
use crate::io::locator::locate;
use crate::io::oracle::Oracle;
use crate::io::prompt::{BuildPromptInputs, PromptEngine};
use crate::io::publish::publish;
use crate::io::release::write_rewrite_rules;
use crate::io::shell::Shell;
use crate::io::survey;

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutcome {
    /// Oracle calls made by the build loop.
    pub steps: u32,
    pub release_path: PathBuf,
    pub rewrite_path: PathBuf,
    /// True when the oracle's rewrite rules were rejected for the default.
    pub rewrite_fallback: bool,
}

/// Run the whole pipeline. Any error is fatal for the run.
#[instrument(skip_all, fields(root = %layout.root.display()))]
pub fn run_pipeline<O: Oracle, S: Shell>(
    cfg: &BuildConfig,
    layout: &Layout,
    oracle: &O,
    shell: &S,
) -> Result<PipelineOutcome> {
    let archive = find_task_archive(&layout.task_dir)?;
    info!(archive = %archive.display(), "found task archive");
    extract_archive(shell, &archive, &layout.source_dir)?;

    info!("collecting project info");
    let listing = survey::list_dir(&layout.source_dir, 1)?;
    let manifests = survey::package_manifests(&layout.source_dir, &layout.root)?;
    let prompts = PromptEngine::new();
    let conversation = prompts
        .build_conversation(&BuildPromptInputs {
            workdir: &layout.source_dir,
            listing: &listing,
            manifests: &manifests,
            completion_token: &cfg.completion_token,
        })
        .context("render build prompt")?;

    info!(max_steps = cfg.max_steps, "starting oracle-driven build loop");
    let outcome = run_build_loop(
        oracle,
        shell,
        conversation,
        &LoopConfig {
            workdir: &layout.source_dir,
            max_steps: cfg.max_steps,
            completion_token: &cfg.completion_token,
            observation_limit_chars: cfg.observation_limit_chars,
        },
        |record| {
            info!(
                step = record.step,
                exit_code = record.exit_code,
                truncated = record.observation_truncated,
                "step finished"
            );
        },
    )?;
    if !outcome.completed {
        return Err(StepBudgetExhausted {
            max_steps: cfg.max_steps,
        }
        .into());
    }

    info!("locating build output");
    let output_dir = locate(&layout.source_dir, &layout.working_dir_names())?.ok_or_else(|| {
        NoArtifactFound {
            root: layout.source_dir.clone(),
        }
    })?;
    info!(output_dir = %output_dir.display(), "moving build output to release");
    let release_path = publish(&output_dir, &layout.release_dir)?;

    info!("requesting rewrite rules");
    let request = prompts
        .rewrite_conversation(&cfg.completion_token)
        .context("render rewrite prompt")?;
    let reply = oracle
        .complete(request.messages())
        .context("query oracle for rewrite rules")?;
    let selection = select_rewrite_rules(&reply);
    if selection.used_default {
        warn!("oracle rewrite rules rejected, using default");
    }
    let rewrite_path = write_rewrite_rules(&layout.release_dir, &selection.rules)?;
    info!(path = %rewrite_path.display(), "rewrite rules saved");

    Ok(PipelineOutcome {
        steps: outcome.steps,
        release_path,
        rewrite_path,
        rewrite_fallback: selection.used_default,
    })
}
