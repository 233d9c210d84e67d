use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Address the HTTP API binds to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port the HTTP API listens on
    #[arg(long, default_value_t = 8001)]
    pub port: u16,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Append-only log file, written alongside stdout
    #[arg(long, default_value = "stockharmony.log")]
    pub log_file: PathBuf,
}
