use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use pr_reviewer::cli::{Cli, CliCommand};
use pr_reviewer::config::{Config, Credentials};
use pr_reviewer::error::{Error, Result};
use pr_reviewer::http::UreqTransport;
use pr_reviewer::model::GeminiClient;
use pr_reviewer::orchestrator::ReviewOrchestrator;
use pr_reviewer::prompts::PromptEngine;
use pr_reviewer::providers::{AnyProvider, ProviderKind};
use pr_reviewer::report;
use pr_reviewer::review::ReviewEngine;
use pr_reviewer::web::{self, AppState};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_provider(
    kind: ProviderKind,
    config: &Config,
    credentials: &Credentials,
) -> Result<AnyProvider> {
    AnyProvider::build(
        kind,
        credentials.provider(kind)?,
        config.api_url_for(kind),
        Box::new(UreqTransport::new(Duration::from_secs(
            config.provider_timeout_secs,
        ))),
    )
}

fn build_orchestrator(config: &Config, credentials: &Credentials) -> Result<ReviewOrchestrator> {
    let api_key = credentials.model_api_key()?;
    let prompts = PromptEngine::new(config.prompt_template.as_deref())?;
    let model = GeminiClient::new(
        api_key,
        config.model.clone(),
        config.api_base.clone(),
        Box::new(UreqTransport::new(Duration::from_secs(
            config.model_timeout_secs,
        ))),
    );
    Ok(
        ReviewOrchestrator::new(ReviewEngine::new(Box::new(model), prompts))
            .with_max_diff_chars(config.max_diff_chars),
    )
}

fn review_from_cli(
    repo: &str,
    pr_number: u64,
    config: &Config,
    credentials: &Credentials,
) -> Result<()> {
    // Provider credentials are checked before the model key.
    let provider = build_provider(config.provider, config, credentials)?;
    let orchestrator = build_orchestrator(config, credentials)?;

    let (files, results) = orchestrator.fetch_and_review(&provider, repo, pr_number)?;

    print!("{}", report::render_text(pr_number, &files, &results));
    Ok(())
}

async fn serve(config: Config, credentials: Credentials) -> Result<()> {
    let mut providers = HashMap::new();
    for kind in ProviderKind::ALL {
        match build_provider(kind, &config, &credentials) {
            Ok(provider) => {
                providers.insert(kind, provider);
            }
            Err(e) => debug!(provider = %kind, error = %e, "provider not configured"),
        }
    }
    if providers.is_empty() {
        return Err(Error::Configuration(
            "no provider credentials set (GITHUB_TOKEN, GITLAB_TOKEN, or BITBUCKET_USERNAME/BITBUCKET_APP_PASSWORD)"
                .to_string(),
        ));
    }
    info!(
        providers = ?providers.keys().map(|k| k.as_str()).collect::<Vec<_>>(),
        "providers configured"
    );

    let state = Arc::new(AppState {
        providers,
        orchestrator: build_orchestrator(&config, &credentials)?,
    });
    web::serve(&config.listen_addr, state).await
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        eprintln!("warning: failed to load .env: {e}");
    }

    let cli = Cli::parse();
    init_logging();

    let config = match Config::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    debug!(?config, "config loaded");

    let credentials = Credentials::from_env();

    let result = match cli.command {
        Some(CliCommand::Serve { .. }) => serve(config, credentials).await,
        None => {
            let (Some(repo), Some(pr)) = (cli.repo, cli.pr) else {
                eprintln!("error: --repo and --pr are required");
                std::process::exit(2);
            };
            tokio::task::spawn_blocking(move || review_from_cli(&repo, pr, &config, &credentials))
                .await
                .unwrap_or_else(|e| Err(Error::Server(format!("review task failed: {e}"))))
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
