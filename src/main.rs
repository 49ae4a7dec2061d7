use clap::Parser;
use sales_predictor::core::ConfigProvider;
use sales_predictor::utils::error::{ErrorSeverity, PredictorError};
use sales_predictor::utils::monitor::SystemMonitor;
use sales_predictor::utils::{logger, validation::Validate};
use sales_predictor::{server, CliConfig, LocalArtifactStore, ServingContext};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(exit_code(&e));
        }
    };

    // 初始化日誌
    if config.logging.json {
        logger::init_json_logger(config.logging.verbose);
    } else {
        logger::init_cli_logger(config.logging.verbose);
    }

    tracing::info!("Starting sales-predictor v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!("Resolved config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        std::process::exit(exit_code(&e));
    }

    // 載入失敗時不開始服務
    let store = LocalArtifactStore::new(config.artifacts_dir());
    let monitor = SystemMonitor::new(config.monitoring_enabled());
    let context = match ServingContext::load(&store, &config).await {
        Ok(context) => context.with_monitor(monitor),
        Err(e) => {
            tracing::error!(
                "❌ Startup failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            std::process::exit(exit_code(&e));
        }
    };
    context.monitor().log_stats("Artifacts loaded");

    if let Err(e) = server::serve(context, &config).await {
        tracing::error!("❌ Server error: {}", e);
        std::process::exit(exit_code(&e));
    }
}

/// 根據錯誤嚴重程度決定退出碼
fn exit_code(e: &PredictorError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}
