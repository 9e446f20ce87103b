use std::io::Write;
use std::net::SocketAddr;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use dnsmasq_leases::{
    Config, Json, LeaseServer, ParseMode, Render, Result, TextTable, parse_file,
};

#[derive(Parser)]
#[command(name = "dnsmasq-leases")]
#[command(author, version, about = "Show dnsmasq DHCP leases", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the leases as a table (the default)
    Show {
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        parse: ParseArgs,
    },
    /// Serve the leases as a web page
    Serve {
        #[arg(long)]
        listen: Option<SocketAddr>,

        #[command(flatten)]
        parse: ParseArgs,
    },
    ShowConfig,
}

#[derive(Args, Default)]
struct ParseArgs {
    /// Require exactly five fields per line
    #[arg(long)]
    strict: bool,
}

impl ParseArgs {
    fn apply(&self, config: &mut Config) {
        if self.strict {
            config.parse_mode = ParseMode::Strict;
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!("{}", error);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::from_env();

    let command = cli.command.unwrap_or(Commands::Show {
        json: false,
        parse: ParseArgs::default(),
    });

    match command {
        Commands::Show { json, parse } => {
            parse.apply(&mut config);
            config.validate()?;

            let parsed = parse_file(&config.leases_file, config.parse_mode)?;
            if parsed.skipped > 0 {
                warn!("Skipped {} malformed line(s)", parsed.skipped);
            }

            let renderer: &dyn Render = if json { &Json } else { &TextTable };
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            renderer.render(&parsed.records, &mut out)?;
            out.flush()?;
            Ok(())
        }
        Commands::Serve { listen, parse } => {
            parse.apply(&mut config);
            if let Some(listen) = listen {
                config.listen_address = listen;
            }
            config.validate()?;
            serve(config)
        }
        Commands::ShowConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

#[tokio::main]
async fn serve(config: Config) -> Result<()> {
    let server = LeaseServer::new(config).await?;

    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal, stopping server...");
            Ok(())
        }
    }
}
