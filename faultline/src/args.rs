use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Command line of the `faultline` server
#[derive(Debug, Parser)]
#[command(name = "faultline", version, about = "HTTP server with classified error responses and a supervised fatal path")]
pub struct Args {
    /// TOML configuration file
    #[arg(short, long, default_value = "faultline.toml", env = "FAULTLINE_CONFIG")]
    pub config: PathBuf,

    /// Bind here instead of `server.listen_address`
    #[arg(long, env = "FAULTLINE_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Validate the configuration and exit without serving
    #[arg(long)]
    pub check: bool,
}
