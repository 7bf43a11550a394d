use clap::Parser;

use crate::config::{AppConfig, StoreBackend};

#[derive(Debug, Parser)]
#[command(name = "devhub-api")]
#[command(about = "DevHub API server - projects, tasks and documentation with per-project roles")]
#[command(version)]
pub struct Cli {
    #[arg(long, short, help = "Port to listen on")]
    pub port: Option<u16>,

    #[arg(long, value_enum, help = "Entity store backend")]
    pub store: Option<StoreBackend>,

    #[arg(long, default_value = "0.0.0.0", help = "Address to bind")]
    pub host: String,
}

impl Cli {
    /// Command-line flags win over the environment
    pub fn apply(&self, mut config: AppConfig) -> AppConfig {
        if let Some(port) = self.port {
            config.api.port = port;
        }
        if let Some(store) = self.store {
            config.database.store = store;
        }
        config
    }
}
