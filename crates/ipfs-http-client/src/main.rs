use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ipfs_http_client::common::endpoint::parse_multiaddr;
use ipfs_http_client::section::pin::PinKind;
use ipfs_http_client::{AddOptions, ClientConfig, connect};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Talk to a running IPFS daemon over its HTTP API")]
struct Args {
    /// Daemon API address (defaults to $IPFS_HTTP_CLIENT_DEFAULT_ADDR or
    /// /dns/localhost/tcp/5001/http)
    #[arg(long)]
    api: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the daemon version
    Version,
    /// Print the identity of the daemon
    Id,
    /// Write the contents of a file to stdout
    Cat { cid: String },
    /// Add files or directories
    Add {
        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,
        paths: Vec<PathBuf>,
    },
    /// List recursive pins
    PinLs,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_env_filter(EnvFilter::from_env("IPFS_HTTP_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(api) = args.api {
        config.addr = parse_multiaddr(&api)?;
    }

    let client = connect(config).await?;
    let session = client.session()?;

    match args.command {
        Command::Version => {
            let info = session.version().await?;
            println!("{} ({})", info.version, info.commit);
        }
        Command::Id => {
            let id = session.id(None).await?;
            println!("{}", id.id);
            println!("{}", id.agent_version);
            for addr in id.addresses {
                println!("  {addr}");
            }
        }
        Command::Cat { cid } => {
            let data = session.cat(&cid).await?;
            std::io::stdout().write_all(&data).into_diagnostic()?;
        }
        Command::Add { recursive, paths } => {
            let options = AddOptions::builder().recursive(recursive).build();
            for added in session.add(&paths, &options).await? {
                println!("added {} {}", added.hash, added.name);
            }
        }
        Command::PinLs => {
            for (cid, pin) in session.pin().ls(PinKind::Recursive).await? {
                println!("{cid} {}", pin.kind);
            }
        }
    }

    session.close();
    Ok(())
}
