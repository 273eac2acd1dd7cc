//! Servicos CLI - Command-line front end for the service-request store

mod commands;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "servicos")]
#[command(version)]
#[command(about = "Service-request tickets for waste collection - record, search, export")]
#[command(long_about = r#"
Servicos keeps waste-collection service requests in a local SQLite file:
  • Register and edit tickets with CPF validation and formatting
  • Detect duplicate requests for the same address
  • Search, page through and export the ticket list
  • Print a service order for the crew

Example usage:
  servicos init
  servicos add --cpf 52998224725 --nome "Ana" --telefone 62999887766 --bairro Centro --rua "Rua A" --numero 10
  servicos list --status Pendente --page 2
  servicos export --output servicos.csv
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the database file (overrides the config file)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Path to the config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file and create the database
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Register a new service request
    Add {
        #[command(flatten)]
        fields: RecordArgs,

        /// Save even if the address is already registered
        #[arg(short, long)]
        force: bool,
    },

    /// Change fields of an existing service request
    Update {
        /// Protocol number
        id: i64,

        #[command(flatten)]
        fields: RecordArgs,

        /// Save even if the new address is already registered
        #[arg(short, long)]
        force: bool,
    },

    /// Permanently remove a service request
    Delete {
        /// Protocol number
        id: i64,
    },

    /// Show every field of one service request
    Show {
        /// Protocol number
        id: i64,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// List service requests, filtered and paginated
    List {
        #[command(flatten)]
        filters: FilterArgs,

        /// Sort as "<column> [ASC|DESC]"
        #[arg(short, long, default_value = "data_solicitacao DESC")]
        sort: String,

        /// Page number (1-based)
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Rows per page (defaults to the config value)
        #[arg(long)]
        page_size: Option<u32>,

        /// Return every matching row on one page
        #[arg(long, conflicts_with_all = ["page", "page_size"])]
        all: bool,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Find every request made under a CPF
    FindCpf {
        /// CPF, with or without punctuation
        cpf: String,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Check whether an address already has a request
    CheckAddress {
        #[arg(long)]
        bairro: String,
        #[arg(long)]
        rua: String,
        #[arg(long)]
        numero: String,
        #[arg(long)]
        quadra: Option<String>,
        #[arg(long)]
        lote: Option<String>,

        /// Ignore this protocol number (the record being edited)
        #[arg(long)]
        exclude: Option<i64>,
    },

    /// Validate and format a CPF
    ValidateCpf {
        cpf: String,
    },

    /// Export matching requests to a CSV spreadsheet
    Export {
        /// Output file
        #[arg(short, long, default_value = "servicos.csv")]
        output: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Print the service order for one request
    Print {
        /// Protocol number
        id: i64,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Column values as typed by the operator; unset flags are left alone
#[derive(Args, Debug, Clone, Default)]
pub struct RecordArgs {
    #[arg(long)]
    pub cpf: Option<String>,
    #[arg(long)]
    pub nome: Option<String>,
    #[arg(long = "inscricao")]
    pub inscricao_municipal: Option<String>,
    #[arg(long)]
    pub telefone: Option<String>,
    #[arg(long)]
    pub bairro: Option<String>,
    #[arg(long)]
    pub rua: Option<String>,
    #[arg(long)]
    pub numero: Option<String>,
    #[arg(long)]
    pub referencia: Option<String>,
    #[arg(long)]
    pub quadra: Option<String>,
    #[arg(long)]
    pub lote: Option<String>,
    /// Number of septic tanks (empty to clear)
    #[arg(long = "fossas")]
    pub numero_fossas: Option<String>,
    /// Pendente, Concluído or Cancelado
    #[arg(long)]
    pub status: Option<String>,
    /// Request timestamp, YYYY-MM-DD HH:MM:SS (defaults to now)
    #[arg(long = "data")]
    pub data_solicitacao: Option<String>,
    /// Arrival time (HHMM or HH:MM)
    #[arg(long = "chegada")]
    pub data_chegada: Option<String>,
    /// Departure time (HHMM or HH:MM)
    #[arg(long = "saida")]
    pub data_saida: Option<String>,
    /// Completion date (DDMMYYYY or DD/MM/YYYY)
    #[arg(long = "conclusao")]
    pub data_conclusao: Option<String>,
    #[arg(long = "placa")]
    pub placa_veiculo: Option<String>,
    #[arg(long)]
    pub motorista: Option<String>,
    #[arg(long)]
    pub ajudante: Option<String>,
    #[arg(long = "observacao")]
    pub observacao_empresa: Option<String>,
}

/// Substring filters for list/export
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    #[arg(long)]
    pub id: Option<String>,
    #[arg(long)]
    pub cpf: Option<String>,
    #[arg(long)]
    pub nome: Option<String>,
    #[arg(long)]
    pub telefone: Option<String>,
    #[arg(long)]
    pub bairro: Option<String>,
    #[arg(long)]
    pub rua: Option<String>,
    #[arg(long)]
    pub numero: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    /// Extra filters as column=value (unknown columns are ignored)
    #[arg(long = "filter", value_name = "COLUMN=VALUE")]
    pub extra: Vec<String>,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Err(err) = run(cli) {
        servicos::ui::error(&format!("{err:#}"));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = commands::Context::load(cli.config, cli.database)?;
    match cli.command {
        Commands::Init { force } => commands::run_init(&ctx, force),
        Commands::Add { fields, force } => commands::run_add(&ctx, fields, force),
        Commands::Update { id, fields, force } => commands::run_update(&ctx, id, fields, force),
        Commands::Delete { id } => commands::run_delete(&ctx, id),
        Commands::Show { id, format } => commands::run_show(&ctx, id, format),
        Commands::List {
            filters,
            sort,
            page,
            page_size,
            all,
            format,
        } => commands::run_list(&ctx, filters, &sort, page, page_size, all, format),
        Commands::FindCpf { cpf, format } => commands::run_find_cpf(&ctx, &cpf, format),
        Commands::CheckAddress {
            bairro,
            rua,
            numero,
            quadra,
            lote,
            exclude,
        } => commands::run_check_address(&ctx, bairro, rua, numero, quadra, lote, exclude),
        Commands::ValidateCpf { cpf } => commands::run_validate_cpf(&cpf),
        Commands::Export { output, filters } => commands::run_export(&ctx, output, filters),
        Commands::Print { id, output } => commands::run_print(&ctx, id, output),
    }
}
