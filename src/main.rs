mod telemetry;

use std::process::ExitCode;

use ai_llm_service::HealthService;
use pr_reviewer::{ReviewerConfig, run_batch};
use tracing::{error, info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // A missing .env is fine: the environment may already be populated.
    let dotenv = dotenvy::dotenv();

    telemetry::init();

    if let Err(e) = &dotenv {
        if !e.not_found() {
            warn!("failed to load .env: {e}");
        }
    }

    let cfg = match ReviewerConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("config: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        project = %cfg.provider.project,
        repo = %cfg.provider.repo,
        window_hours = cfg.window.num_hours(),
        model = %cfg.llm.model,
        dry_run = cfg.dry_run,
        "pr-review-bot starting"
    );

    preflight(&cfg).await;

    match run_batch(&cfg).await {
        Ok(report) => {
            info!(
                reviewed = report.reviewed(),
                commented = report.commented(),
                failed = report.failed(),
                "pr-review-bot done"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("batch aborted: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Warns early when the model endpoint is down or the model is not pulled.
async fn preflight(cfg: &ReviewerConfig) {
    let health = match HealthService::new(Some(cfg.provider.timeout_secs)) {
        Ok(h) => h,
        Err(e) => {
            warn!("llm: health client unavailable: {e}");
            return;
        }
    };

    let status = health.check(&cfg.llm).await;
    if !status.ok {
        warn!("llm: preflight failed, reviews will likely fail: {}", status.message);
    }
}
