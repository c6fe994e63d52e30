use std::process::ExitCode;

use clap::Parser;
use tracing::Level;

use rawntp::core::{DEFAULT_IDENTIFICATION, DEFAULT_NTP_VERSION, DEFAULT_SOURCE_PORT, DEFAULT_TTL};
use rawntp::{Client, Config, TimeFormat};

#[derive(Parser)]
#[command(version, about = "Ask an NTP server for the time using a hand-built raw IP packet")]
#[command(after_help = "Example: rawntp eth0 pool.ntp.org\nThe raw socket needs root or CAP_NET_RAW.")]
struct Cli {
    /// Network interface whose IPv4 address is used as the source
    interface: String,

    /// NTP server hostname or IPv4 address
    server: String,

    /// UDP source port; the reply is received on it
    #[arg(short, long, default_value_t = DEFAULT_SOURCE_PORT)]
    port: u16,

    /// Seconds to wait for the reply
    #[arg(short, long, default_value_t = 5.0)]
    timeout: f64,

    /// NTP version announced in the request
    #[arg(long, default_value_t = DEFAULT_NTP_VERSION)]
    ntp_version: u8,

    /// IP time-to-live
    #[arg(long, default_value_t = DEFAULT_TTL)]
    ttl: u8,

    /// Output format: ctime, rfc3339 or unix
    #[arg(short, long, default_value_t = TimeFormat::Ctime)]
    format: TimeFormat,

    /// More logging on stderr (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn config(&self) -> rawntp::Result<Config> {
        Ok(Config {
            interface: self.interface.clone(),
            server: self.server.clone(),
            source_port: self.port,
            ntp_version: self.ntp_version,
            ttl: self.ttl,
            identification: DEFAULT_IDENTIFICATION,
            timeout: Config::timeout_from_secs(self.timeout)?,
        })
    }

    fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

async fn run(cli: &Cli) -> rawntp::Result<String> {
    let config = cli.config()?;
    match serde_json::to_string(&config) {
        Ok(json) => tracing::debug!("Effective configuration: {}", json),
        Err(e) => tracing::debug!("Cannot serialize configuration: {}", e),
    }

    let client = Client::new(config)?;
    let response = client.query().await?;
    response.render(cli.format)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .init();

    match run(&cli).await {
        Ok(line) => {
            println!("{}", line);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("rawntp").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_defaults() {
        let config = parse(&["eth0", "pool.ntp.org"]).config().unwrap();
        assert_eq!(config, Config::new("eth0", "pool.ntp.org"));
    }

    #[test]
    fn test_cli_oversized_timeout() {
        let cli = parse(&["--timeout", "1e20", "eth0", "pool.ntp.org"]);
        assert!(matches!(cli.config(), Err(rawntp::Error::Config(_))));
    }

    #[test]
    fn test_cli_negative_timeout() {
        let cli = parse(&["--timeout=-1", "eth0", "pool.ntp.org"]);
        assert!(matches!(cli.config(), Err(rawntp::Error::Config(_))));
    }
}
