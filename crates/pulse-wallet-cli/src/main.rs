// Pulse Wallet CLI — drive the wallet core from the terminal.
//
// Every command builds a fresh client from the config file, so commands
// that touch the chain connect first. Logging goes to stderr via env_logger
// (RUST_LOG=info for the engine's [wallet]/[network]/[spend] lines).

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use log::info;
use pulse_wallet::{ConnectionStatus, WalletClient, WalletConfig, WalletDiscovery, WalletError, WalletKind, WalletView};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "pulse")]
#[command(about = "Pulse Wallet CLI", version)]
struct Cli {
    /// Config file (defaults to ~/.pulse-wallet/config.toml)
    #[arg(long, global = true, env = "PULSE_CONFIG")]
    config: Option<PathBuf>,

    /// Wallet to use: auto, metamask, coinbase, brave
    #[arg(long, global = true, default_value = "auto", env = "PULSE_WALLET")]
    wallet: WalletKind,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect and print the session state
    Connect,
    /// Print the token balance of the connected account
    Balance,
    /// Send tokens and wait for confirmation
    Send {
        #[arg(long)]
        to: String,
        /// Amount in whole-token units, e.g. 5 or 0.25
        #[arg(long)]
        amount: String,
    },
    /// Connect and follow spend events and advice until Ctrl-C
    Watch,
    /// Ask the advisory service about a spend total
    Advise {
        #[arg(long)]
        total: f64,
    },
    /// Print shell completions
    Completions { shell: Shell },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), WalletError> {
    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "pulse", &mut std::io::stdout());
        return Ok(());
    }

    let config = WalletConfig::load(cli.config.as_deref())?;
    let watch_wallets = matches!(cli.command, Commands::Watch);
    let discovery: Arc<dyn WalletDiscovery> = Arc::new(config.injected_environment(watch_wallets)?);
    let client = WalletClient::new(config, discovery)?;

    match cli.command {
        Commands::Connect => {
            client.connect(cli.wallet).await?;
            print_view(&client.view(), cli.json)?;
        }
        Commands::Balance => {
            client.connect(cli.wallet).await?;
            let view = client.view();
            if cli.json {
                println!("{}", serde_json::json!({ "account": view.account, "balance": view.balance }));
            } else {
                println!(
                    "{} {}",
                    view.balance.as_deref().unwrap_or("?"),
                    client.config().token_symbol
                );
            }
        }
        Commands::Send { to, amount } => {
            client.connect(cli.wallet).await?;
            let record = client.send(&to, &amount).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                println!("{}", record.display_line(&client.config().token_symbol));
                println!("tx: {}", record.tx_hash);
            }
        }
        Commands::Watch => {
            client.connect(cli.wallet).await?;
            let mut view = client.subscribe_view();
            print_view(&view.borrow_and_update().clone(), cli.json)?;
            info!("[wallet] Watching for spend events, Ctrl-C to stop");
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    changed = view.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let snapshot = view.borrow_and_update().clone();
                        print_view(&snapshot, cli.json)?;
                        if snapshot.connection == ConnectionStatus::Invalidated {
                            break;
                        }
                    }
                }
            }
            client.disconnect();
        }
        Commands::Advise { total } => {
            let suggestion = client.request_advice(total).await;
            if cli.json {
                println!("{}", serde_json::json!({ "totalSpent": total, "suggestion": suggestion }));
            } else {
                println!("{}", suggestion);
            }
        }
        Commands::Completions { .. } => {}
    }
    Ok(())
}

fn print_view(view: &WalletView, json: bool) -> Result<(), WalletError> {
    if json {
        println!("{}", serde_json::to_string(view)?);
        return Ok(());
    }
    println!("status:  {:?}: {}", view.connection, view.status_message);
    if let Some(account) = &view.account {
        println!("account: {}", account);
    }
    if let Some(balance) = &view.balance {
        println!("balance: {}", balance);
    }
    if let Some(signal) = view.spend_signal {
        println!("spent:   {} ({:?})", view.spend_total, signal);
    }
    if let Some(suggestion) = &view.suggestion {
        println!("advice:  {}", suggestion);
    }
    for line in &view.history {
        println!("  {}", line);
    }
    Ok(())
}
