use std::process::ExitCode;

use clap::Parser;

/// Print the IPv4 address of a network interface
#[derive(Parser)]
#[command(version)]
struct Cli {
    /// Interface name, e.g. eth0 or wlan0
    interface: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    match rawntp::network::interface_addr(&cli.interface) {
        Ok(addr) => {
            println!("{}\tinet addr:{}", cli.interface, addr);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
