use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Default TCP listen address
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:2956";

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "syntax-lsp", version, about = "Language server reporting syntax errors")]
pub struct Cli {
    /// Serve a single client over stdin/stdout
    #[arg(long, conflicts_with = "listen")]
    pub stdio: bool,

    /// Address to accept TCP connections on
    #[arg(long, value_name = "ADDR")]
    pub listen: Option<SocketAddr>,

    /// Log file path (defaults to the data directory)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, value_name = "LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    Stdio,
    Tcp(SocketAddr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub transport: Transport,
    pub log_file: PathBuf,
    pub log_level: String,
}

impl From<Cli> for ServerConfig {
    fn from(cli: Cli) -> Self {
        let transport = if cli.stdio {
            Transport::Stdio
        } else {
            Transport::Tcp(cli.listen.unwrap_or_else(default_listen_addr))
        };

        Self {
            transport,
            log_file: cli.log_file.unwrap_or_else(log_path),
            log_level: cli.log_level,
        }
    }
}

pub fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 2956))
}

/// Returns the path to the data directory for syntax-lsp.
/// Uses $XDG_DATA_HOME/syntax-lsp if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/syntax-lsp,
/// or ./syntax-lsp if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("syntax-lsp.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("syntax-lsp")
}
