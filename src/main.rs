use clap::Parser;
use colored::Colorize;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use wikishelf::{
    AmazonClient, FileConfig, Ledger, Locale, Overrides, Session, SessionOptions, Settings,
};

#[derive(Parser, Debug)]
#[command(name = "wikishelf")]
#[command(version = "0.1.0")]
#[command(about = "Look up books by ISBN and append them to a DokuWiki table", long_about = None)]
struct Args {
    /// Enable debug output
    #[arg(long, short)]
    debug: bool,

    /// Don't save to file
    #[arg(long, short = 'n')]
    no_save: bool,

    /// Don't read the ledger file (skips duplicate detection)
    #[arg(long, short)]
    blind: bool,

    /// Ledger file to append to
    #[arg(long)]
    ledger: Option<PathBuf>,

    /// Locales to try, in order
    #[arg(long = "locale", value_enum, value_delimiter = ',')]
    locales: Vec<Locale>,

    /// Config file (defaults to <config dir>/wikishelf/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Product Advertising API access key
    #[arg(long, env = "WIKISHELF_ACCESS_KEY_ID", hide_env_values = true)]
    access_key_id: Option<String>,

    /// Product Advertising API secret key
    #[arg(long, env = "WIKISHELF_SECRET_ACCESS_KEY", hide_env_values = true)]
    secret_access_key: Option<String>,

    /// Associate (affiliate) tag
    #[arg(long, env = "WIKISHELF_AFFILIATE_TAG")]
    affiliate_tag: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let filter = if args.debug {
        "wikishelf=debug"
    } else {
        "wikishelf=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let file_config = match FileConfig::load(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    let overrides = Overrides {
        access_key_id: args.access_key_id,
        secret_access_key: args.secret_access_key,
        affiliate_tag: args.affiliate_tag,
        locales: args.locales,
        ledger: args.ledger,
    };

    let settings = match Settings::resolve(file_config, overrides) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    let ledger = Ledger::new(settings.ledger);
    let seen = match ledger.initial_seen(args.blind) {
        Ok(seen) => seen,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    let client = match AmazonClient::new(settings.credentials) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{} Failed to initialize catalog client: {}", "Error:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    let options = SessionOptions {
        save: !args.no_save,
    };
    let mut session = Session::new(
        client,
        settings.locales,
        ledger,
        seen,
        options,
        io::stdout(),
    );

    match session.run(io::stdin().lock()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
