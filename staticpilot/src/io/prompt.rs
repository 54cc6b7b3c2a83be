//! Prompt rendering for the build loop and the rewrite-rule request.

use std::path::Path;

use anyhow::Result;
use minijinja::{Environment, context};

use crate::core::conversation::Conversation;

const SYSTEM_TEMPLATE: &str = include_str!("prompts/system.md");
const BUILD_TEMPLATE: &str = include_str!("prompts/build.md");
const REWRITE_TEMPLATE: &str = include_str!("prompts/rewrite.md");

/// Project facts rendered into the initial build prompt.
#[derive(Debug, Clone)]
pub struct BuildPromptInputs<'a> {
    pub workdir: &'a Path,
    pub listing: &'a str,
    pub manifests: &'a str,
    pub completion_token: &'a str,
}

/// Template engine wrapper around minijinja.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl Default for PromptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("system", SYSTEM_TEMPLATE)
            .expect("system template should be valid");
        env.add_template("build", BUILD_TEMPLATE)
            .expect("build template should be valid");
        env.add_template("rewrite", REWRITE_TEMPLATE)
            .expect("rewrite template should be valid");
        Self { env }
    }

    fn render_system(&self, completion_token: &str) -> Result<String> {
        let rendered = self
            .env
            .get_template("system")?
            .render(context! { completion_token => completion_token })?;
        Ok(rendered.trim().to_string())
    }

    /// Opening conversation of the build loop.
    pub fn build_conversation(&self, input: &BuildPromptInputs<'_>) -> Result<Conversation> {
        let prompt = self.env.get_template("build")?.render(context! {
            completion_token => input.completion_token,
            environment => format!("{} ({})", std::env::consts::OS, std::env::consts::ARCH),
            workdir => input.workdir.display().to_string(),
            listing => input.listing.trim(),
            manifests => input.manifests.trim(),
        })?;
        Ok(Conversation::new(
            self.render_system(input.completion_token)?,
            prompt.trim(),
        ))
    }

    /// Standalone conversation asking for web-server rewrite rules.
    pub fn rewrite_conversation(&self, completion_token: &str) -> Result<Conversation> {
        let prompt = self.env.get_template("rewrite")?.render(context! {})?;
        Ok(Conversation::new(
            self.render_system(completion_token)?,
            prompt.trim(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::conversation::Role;

    #[test]
    fn build_conversation_embeds_project_facts() {
        let engine = PromptEngine::new();
        let conversation = engine
            .build_conversation(&BuildPromptInputs {
                workdir: Path::new("/jobs/1/source"),
                listing: "source/: 1 items\n- package.json\n",
                manifests: "source/package.json:\n{\"name\":\"shop\"}",
                completion_token: "BUILD-DONE",
            })
            .expect("render");

        let messages = conversation.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("BUILD-DONE"));
        assert_eq!(messages[1].role, Role::User);
        assert!(messages[1].content.contains("Working directory: /jobs/1/source"));
        assert!(messages[1].content.contains("- package.json"));
        assert!(messages[1].content.contains("{\"name\":\"shop\"}"));
        assert!(messages[1].content.ends_with("output only: BUILD-DONE"));
    }

    #[test]
    fn rewrite_conversation_offers_both_snippets() {
        let conversation = PromptEngine::new()
            .rewrite_conversation("BUILD-DONE")
            .expect("render");
        let prompt = &conversation.messages()[1].content;
        assert!(prompt.contains("try_files $uri /index.html;"));
        assert!(prompt.contains("rewrite ^(.*)$ /$1.html last;"));
    }
}
