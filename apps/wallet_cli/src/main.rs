use std::{
    io::{self, BufRead},
    path::PathBuf,
    sync::Arc,
    thread,
};

mod backend_bridge;
mod config;
mod controller;
mod view;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use crossbeam_channel::bounded;
use session_core::{OpenedWallet, SessionController, SessionIntent, WalletGateway};
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

use backend_bridge::commands::BackendCommand;
use controller::{events::UiEvent, orchestration::dispatch_backend_command};
use view::ShellCommand;

#[derive(Parser, Debug)]
#[command(name = "wallet_cli", about = "HD wallet session client", version)]
struct Cli {
    /// TOML settings file; missing files fall back to defaults.
    #[arg(long, default_value = "wallet.toml")]
    config: PathBuf,
    /// Overrides `backend_url` from the settings file and environment.
    #[arg(long)]
    backend_url: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List wallets known to the backend.
    Wallets,
    /// Create a wallet and print its recovery phrase once.
    Create { name: String },
    /// Import a wallet from a recovery phrase.
    Import {
        name: String,
        #[arg(required = true, num_args = 1..)]
        mnemonic: Vec<String>,
    },
    Accounts {
        #[arg(long)]
        wallet: String,
    },
    Info {
        #[arg(long)]
        wallet: String,
    },
    Selected {
        #[arg(long)]
        wallet: String,
    },
    Select {
        #[arg(long)]
        wallet: String,
        index: usize,
    },
    AddAccount {
        #[arg(long)]
        wallet: String,
        #[arg(required = true, num_args = 1..)]
        mnemonic: Vec<String>,
    },
    CreateAccount {
        #[arg(long)]
        wallet: String,
    },
    Sign {
        #[arg(long)]
        wallet: String,
        data: String,
    },
    /// Interactive session (the default).
    Shell,
}

fn init_tracing(log_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = config::load_settings(&cli.config)?.with_backend_override(cli.backend_url);
    init_tracing(&settings.log_filter);

    let gateway = settings.gateway()?;
    match cli.command.unwrap_or(Command::Shell) {
        Command::Shell => run_shell(gateway),
        command => run_once(gateway, command),
    }
}

fn run_once(gateway: Arc<dyn WalletGateway>, command: Command) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build async runtime")?;
    let controller = SessionController::new(gateway);
    runtime.block_on(one_shot(&controller, command))
}

async fn open(controller: &SessionController, wallet: &str) -> Result<OpenedWallet> {
    let opened = controller.open_wallet(wallet).await?;
    for failure in opened.refresh.failures() {
        tracing::warn!(wallet, error = %failure, "wallet view is incomplete");
    }
    Ok(opened)
}

async fn one_shot(controller: &SessionController, command: Command) -> Result<()> {
    match command {
        Command::Wallets => {
            let wallets = controller.refresh_wallet_list().await?;
            println!("{}", view::render_wallet_list(&wallets));
        }
        Command::Create { name } => {
            let created = controller.create_wallet(&name).await?;
            println!("{}", view::render_created(&created));
        }
        Command::Import { name, mnemonic } => {
            let phrase = Zeroizing::new(mnemonic.join(" "));
            let imported = controller.import_wallet(&name, &phrase).await?;
            println!(
                "Wallet '{}' imported with {} account(s); first address {}",
                imported.name, imported.total_accounts, imported.address
            );
        }
        Command::Accounts { wallet } => {
            let opened = open(controller, &wallet).await?;
            opened.refresh.accounts?;
            println!("{}", view::render_accounts(&controller.snapshot().accounts));
        }
        Command::Info { wallet } => {
            open(controller, &wallet).await?;
            println!(
                "{}",
                view::render_summary(controller.snapshot().summary.as_ref())
            );
        }
        Command::Selected { wallet } => {
            open(controller, &wallet).await?;
            match controller.selected_account().await? {
                Some(account) => println!("{}", view::render_account(&account)),
                None => println!("No account selected"),
            }
        }
        Command::Select { wallet, index } => {
            open(controller, &wallet).await?;
            controller.select_account(index).await?;
            println!("{}", view::render_accounts(&controller.snapshot().accounts));
        }
        Command::AddAccount { wallet, mnemonic } => {
            let phrase = Zeroizing::new(mnemonic.join(" "));
            open(controller, &wallet).await?;
            controller.add_account_from_mnemonic(&phrase).await?;
            println!("{}", view::render_accounts(&controller.snapshot().accounts));
        }
        Command::CreateAccount { wallet } => {
            open(controller, &wallet).await?;
            controller.create_next_account().await?;
            println!("{}", view::render_accounts(&controller.snapshot().accounts));
        }
        Command::Sign { wallet, data } => {
            open(controller, &wallet).await?;
            let signature = controller.sign_transaction(&data).await?;
            println!("{signature}");
        }
        // Interactive; main hands it to `run_shell`.
        Command::Shell => {}
    }
    Ok(())
}

fn run_shell(gateway: Arc<dyn WalletGateway>) -> Result<()> {
    // Capacity 1: one command may wait behind the running one; more are dropped.
    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(1);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(64);
    let worker = backend_bridge::runtime::launch(gateway, cmd_rx, ui_tx);
    let printer = thread::spawn(move || {
        for event in ui_rx {
            println!("{}", view::render_event(&event));
        }
    });

    println!("{}", view::help_text());
    let mut status = String::new();
    dispatch_backend_command(
        &cmd_tx,
        BackendCommand::Run(SessionIntent::RefreshWalletList),
        &mut status,
    );

    for line in io::stdin().lock().lines() {
        let line = line.context("failed to read shell input")?;
        match view::parse_shell_line(&line) {
            Ok(ShellCommand::Quit) => break,
            Ok(ShellCommand::Help) => println!("{}", view::help_text()),
            Ok(ShellCommand::Empty) => {}
            Ok(ShellCommand::Backend(cmd)) => {
                dispatch_backend_command(&cmd_tx, cmd, &mut status);
            }
            Err(usage) => eprintln!("{usage}"),
        }

        if !status.is_empty() {
            eprintln!("{}", std::mem::take(&mut status));
        }
    }

    drop(cmd_tx);
    worker
        .join()
        .map_err(|_| anyhow!("backend worker panicked"))?;
    printer
        .join()
        .map_err(|_| anyhow!("output thread panicked"))?;
    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
