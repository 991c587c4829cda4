//! Scout Web Server

use clap::Parser;
use scout_core::{init_logging, ScoutConfig};
use scout_web::ScoutServerBuilder;
use std::path::PathBuf;

/// Scout Web Server - JSON front end for search and deep search
#[derive(Parser)]
#[command(name = "scout-web")]
#[command(about = "HTTP front end for Scout")]
#[command(version)]
struct Args {
    /// Server host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "5000")]
    port: u16,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config_path = args.config.unwrap_or_else(ScoutConfig::default_path);
    let config = match ScoutConfig::load_or_default(&config_path) {
        Ok(mut config) => {
            config.apply_env_overrides();
            config
        }
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("❌ Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    println!("🚀 Starting Scout Web Server");
    println!("📍 Server: http://{}:{}", args.host, args.port);

    let server = ScoutServerBuilder::new()
        .host(args.host)
        .port(args.port)
        .scout_config(config)
        .build();

    if let Err(e) = server.start().await {
        eprintln!("❌ Server failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["scout-web"]);
        assert_eq!(args.host, "127.0.0.1");
        assert_eq!(args.port, 5000);
        assert!(args.config.is_none());

        let args = Args::parse_from(["scout-web", "--host", "0.0.0.0", "--port", "3000"]);
        assert_eq!(args.host, "0.0.0.0");
        assert_eq!(args.port, 3000);
    }
}
