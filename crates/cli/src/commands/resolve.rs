//! Resolve command handler.
//!
//! Routes a query to the configured sources and prints the fused context.

use crate::services;
use clap::Args;
use wayfinder_context::{FusedContext, RoutingRequest, SourceRouter};
use wayfinder_core::{config::AppConfig, AppResult};
use wayfinder_prompt::PromptRenderer;

/// Resolve retrieval context for a query
#[derive(Args, Debug)]
pub struct ResolveCommand {
    /// The user query
    pub query: String,

    /// Retrieval mode (internal, web, hybrid); defaults to routing.defaultMode
    #[arg(short, long)]
    pub mode: Option<String>,

    /// Workspace identifier passed to the internal provider
    #[arg(long)]
    pub workspace_id: Option<String>,

    /// Explicitly allow web search in hybrid mode
    #[arg(long, conflicts_with = "no_web")]
    pub allow_web: bool,

    /// Disable web search in hybrid mode
    #[arg(long)]
    pub no_web: bool,

    /// Print the augmented prompt instead of the bare context
    #[arg(long)]
    pub prompt: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ResolveCommand {
    fn user_allows_web(&self) -> Option<bool> {
        match (self.allow_web, self.no_web) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    fn request(&self, config: &AppConfig) -> AppResult<RoutingRequest> {
        let mode = self.mode.as_deref().unwrap_or(&config.routing.default_mode);
        let mut request = RoutingRequest::parse(self.query.clone(), mode)?;

        if let Some(workspace_id) = &self.workspace_id {
            request = request.with_workspace_id(workspace_id.clone());
        }
        if let Some(allowed) = self.user_allows_web() {
            request = request.with_user_allows_web(allowed);
        }

        Ok(request)
    }

    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing resolve command");

        let request = self.request(config)?;
        let decision = SourceRouter::decide(&request);
        let service = services::fusion_service(config)?;

        let context = match service.resolve(&request).await {
            Ok(context) => context,
            Err(failure) => {
                eprintln!("Warning: {}", failure);
                failure.context
            }
        };

        let prompt = if self.prompt {
            let built = PromptRenderer::for_workspace(&config.workspace)?.render(&self.query, &context)?;
            if !built.is_augmented() {
                eprintln!("Warning: no context retrieved, prompt left unchanged");
            }
            Some(built)
        } else {
            None
        };

        if self.json {
            let output = serde_json::json!({
                "query": self.query,
                "mode": request.mode(),
                "decision": decision,
                "context": context,
                "prompt": prompt,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else if let Some(prompt) = prompt {
            println!("{}", prompt.text);
        } else {
            print_context(&decision.reason, &context);
        }

        Ok(())
    }
}

fn print_context(reason: &str, context: &FusedContext) {
    eprintln!("Routing: {}", reason);
    if context.degraded {
        eprintln!("Warning: some sources failed, context is partial");
    }
    println!("{}", context.combined);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use wayfinder_context::RetrievalMode;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        cmd: ResolveCommand,
    }

    fn parse(args: &[&str]) -> ResolveCommand {
        let mut argv = vec!["test"];
        argv.extend_from_slice(args);
        TestCli::parse_from(argv).cmd
    }

    #[test]
    fn test_web_preference_flags() {
        assert_eq!(parse(&["q"]).user_allows_web(), None);
        assert_eq!(parse(&["q", "--allow-web"]).user_allows_web(), Some(true));
        assert_eq!(parse(&["q", "--no-web"]).user_allows_web(), Some(false));
        assert!(TestCli::try_parse_from(["test", "q", "--allow-web", "--no-web"]).is_err());
    }

    #[test]
    fn test_request_uses_default_mode() {
        let mut config = AppConfig::default();
        config.routing.default_mode = "hybrid".to_string();

        let request = parse(&["weather today", "--mode", "web"]).request(&config).unwrap();
        assert_eq!(request.mode(), RetrievalMode::Web);

        let request = parse(&["weather today", "--no-web"]).request(&config).unwrap();
        assert_eq!(request.mode(), RetrievalMode::Hybrid);
        assert_eq!(request.user_allows_web(), Some(false));
    }

    #[test]
    fn test_invalid_mode_rejected() {
        let mut cmd = parse(&["q"]);
        cmd.mode = Some("everything".to_string());
        assert!(cmd.request(&AppConfig::default()).is_err());
    }
}
