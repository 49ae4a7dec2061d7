use crate::config::ServerConfig;
use crate::utils::error::Result;
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Parser)]
#[command(name = "sales-predictor")]
#[command(about = "Serve the sales amount regression model over HTTP")]
pub struct CliConfig {
    #[arg(short, long, help = "Path to a TOML configuration file")]
    pub config: Option<String>,

    #[arg(long, help = "Directory holding the model and encoder artifacts")]
    pub artifacts_dir: Option<String>,

    #[arg(long, help = "Socket address to listen on, e.g. 0.0.0.0:5000")]
    pub listen: Option<String>,

    #[arg(long, help = "Sales CSV used for GET /insights")]
    pub sales_data: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[arg(long, help = "Log process CPU/memory and report it in /health")]
    pub monitor: bool,
}

impl CliConfig {
    /// 載入設定檔 (如有)，再以命令列參數覆蓋
    pub fn resolve(&self) -> Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_file(path)?,
            None => ServerConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut ServerConfig) {
        if let Some(dir) = &self.artifacts_dir {
            config.artifacts.dir = dir.clone();
        }
        if let Some(listen) = &self.listen {
            config.server.listen = listen.clone();
        }
        if let Some(path) = &self.sales_data {
            config.data.sales_csv = Some(path.clone());
        }
        config.logging.verbose |= self.verbose;
        config.logging.json |= self.json_logs;
        config.monitoring.enabled |= self.monitor;
    }
}
