use crate::{FilterArgs, OutputFormat, RecordArgs};
use anyhow::{bail, Context as _};
use servicos::config::{self, ServicosConfig};
use servicos::document::{is_valid_document, normalize_document};
use servicos::export::{self, spawn_export};
use servicos::format::{format_date, format_phone, format_time};
use servicos::record::non_blank;
use servicos::storage::{AddressQuery, Database, Filters, ListQuery, ServiceStore, SortKey};
use servicos::ui::{self, Icons, Spinner};
use servicos::{ServiceFields, ServiceRecord, ServiceStatus};
use std::path::PathBuf;

/// Resolved configuration shared by every command
pub struct Context {
    config_path: PathBuf,
    config: ServicosConfig,
    database: PathBuf,
}

impl Context {
    /// `--database` wins over the config file, which wins over the default path
    pub fn load(config_path: Option<PathBuf>, database: Option<PathBuf>) -> anyhow::Result<Self> {
        let config = config::load_config(config_path.as_deref())?.unwrap_or_default();
        let database = database.unwrap_or_else(|| config.database_path());
        Ok(Self {
            config_path: config_path.unwrap_or_else(config::default_config_path),
            config,
            database,
        })
    }

    /// Open the store, creating the schema on first use
    pub fn store(&self) -> anyhow::Result<ServiceStore> {
        let db = Database::initialize(&self.database)
            .with_context(|| format!("cannot open database {}", self.database.display()))?;
        Ok(ServiceStore::new(db))
    }
}

pub fn run_init(ctx: &Context, force: bool) -> anyhow::Result<()> {
    let config = ServicosConfig {
        database: Some(ctx.database.display().to_string()),
        page_size: Some(ctx.config.page_size()),
        company: ctx.config.company.clone(),
    };
    config::write_config(&ctx.config_path, &config, force)?;
    ctx.store()?;

    ui::success("Servicos initialized");
    ui::info("Config", &ctx.config_path.display().to_string());
    ui::info("Database", &ctx.database.display().to_string());
    Ok(())
}

pub fn run_add(ctx: &Context, args: RecordArgs, force: bool) -> anyhow::Result<()> {
    let mut fields = to_fields(args)?;
    fields.validate_required()?;
    let cpf = fields.cpf.clone().unwrap_or_default();
    if !is_valid_document(&cpf) {
        bail!("invalid CPF: {cpf}");
    }
    let status = fields.status.get_or_insert(ServiceStatus::Pending).clone();
    fields.strip_execution_unless_completed(status);

    let store = ctx.store()?;
    check_duplicate(&store, &merged_address(&fields, None), force)?;
    let id = store.insert(&fields)?;

    ui::success(&format!("Service saved. Protocol: {id}"));
    Ok(())
}

pub fn run_update(ctx: &Context, id: i64, args: RecordArgs, force: bool) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let Some(existing) = store.get(id)? else {
        bail!("service {id} not found");
    };

    let mut fields = to_fields(args)?;
    if fields.is_empty() {
        bail!("nothing to update: pass at least one field");
    }
    for (name, value) in [
        ("cpf", &fields.cpf),
        ("nome", &fields.nome),
        ("telefone", &fields.telefone),
        ("bairro", &fields.bairro),
        ("rua", &fields.rua),
        ("numero", &fields.numero),
    ] {
        if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
            bail!("{name} cannot be blank");
        }
    }
    if let Some(cpf) = &fields.cpf {
        if !is_valid_document(cpf) {
            bail!("invalid CPF: {cpf}");
        }
    }
    let status = fields.status.clone().unwrap_or_else(|| existing.status.clone());
    fields.strip_execution_unless_completed(status);

    if fields.touches_address() {
        let address = merged_address(&fields, Some(&existing)).excluding(id);
        check_duplicate(&store, &address, force)?;
    }

    if store.update(id, &fields)? {
        ui::success(&format!("Service {id} updated"));
    } else {
        ui::warn(&format!(
            "Nothing written to service {id} (execution fields are only kept for {})",
            ServiceStatus::Completed
        ));
    }
    Ok(())
}

pub fn run_delete(ctx: &Context, id: i64) -> anyhow::Result<()> {
    let store = ctx.store()?;
    if !store.delete(id)? {
        bail!("service {id} not found");
    }
    ui::success(&format!("{} Service {id} deleted", Icons::DEL));
    Ok(())
}

pub fn run_show(ctx: &Context, id: i64, format: OutputFormat) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let Some(record) = store.get(id)? else {
        bail!("service {id} not found");
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
        OutputFormat::Text => {
            ui::header(&format!("Serviço {id}"));
            println!("{}", ui::detail_table(&record));
        }
    }
    Ok(())
}

pub fn run_list(
    ctx: &Context,
    filters: FilterArgs,
    sort: &str,
    page: u32,
    page_size: Option<u32>,
    all: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let sort: SortKey = sort.parse()?;
    // `--page-size 0` lists everything, like `--all`
    let page_size = if all {
        None
    } else {
        Some(page_size.unwrap_or_else(|| ctx.config.page_size())).filter(|size| *size > 0)
    };
    let query = ListQuery {
        filters: build_filters(filters),
        sort,
        page,
        page_size,
    };

    let store = ctx.store()?;
    let result = store.list(&query)?;

    match format {
        OutputFormat::Json => {
            let data = serde_json::json!({
                "total": result.total,
                "page": page,
                "page_size": page_size,
                "records": result.records,
            });
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        OutputFormat::Text => {
            print_records(&result.records);
            match page_size {
                Some(size) => ui::summary_row(
                    &format!("Página {page} de {}", result.total_pages(size)),
                    &format!("(Total: {} registros)", result.total),
                ),
                None => ui::summary_row("Total:", &format!("{} registros", result.total)),
            }
        }
    }
    Ok(())
}

pub fn run_find_cpf(ctx: &Context, cpf: &str, format: OutputFormat) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let records = store.find_by_document(cpf)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Text => {
            ui::header(&format!("{} {}", Icons::PERSON, normalize_document(cpf)));
            print_records(&records);
        }
    }
    Ok(())
}

pub fn run_check_address(
    ctx: &Context,
    bairro: String,
    rua: String,
    numero: String,
    quadra: Option<String>,
    lote: Option<String>,
    exclude: Option<i64>,
) -> anyhow::Result<()> {
    let address = AddressQuery {
        bairro,
        rua,
        numero,
        quadra,
        lote,
        excluding_id: exclude,
    };
    let store = ctx.store()?;
    match store.find_duplicate_address(&address)? {
        Some(id) => ui::warn(&format!("{} Address already registered (protocol {id})", Icons::HOUSE)),
        None => ui::success("No request registered at this address"),
    }
    Ok(())
}

pub fn run_validate_cpf(cpf: &str) -> anyhow::Result<()> {
    if !is_valid_document(cpf) {
        bail!("{cpf} is not a valid CPF");
    }
    ui::success(&format!("{} is valid", normalize_document(cpf)));
    Ok(())
}

pub fn run_export(ctx: &Context, output: PathBuf, filters: FilterArgs) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let filters = build_filters(filters);

    let spinner = Spinner::new("Exporting services...");
    let job_output = output.clone();
    let job = spawn_export(move || export::export_spreadsheet(&store, &job_output, filters));

    match job.wait() {
        Ok(0) => {
            spinner.abandon();
            ui::warn("No services match the filters; nothing exported");
        }
        Ok(count) => {
            spinner.finish_with_message(&format!("Exported {count} service(s)"));
            ui::info(&format!("{} File", Icons::FILE), &output.display().to_string());
        }
        Err(err) => {
            spinner.abandon();
            return Err(err).context("export failed");
        }
    }
    Ok(())
}

pub fn run_print(ctx: &Context, id: i64, output: Option<PathBuf>) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let Some(text) = export::service_order(&store, id, &ctx.config.company)? else {
        bail!("service {id} not found");
    };

    match output {
        Some(path) => {
            std::fs::write(&path, text)
                .with_context(|| format!("cannot write {}", path.display()))?;
            ui::success(&format!("Service order written to {}", path.display()));
        }
        None => print!("{text}"),
    }
    Ok(())
}

fn print_records(records: &[ServiceRecord]) {
    if records.is_empty() {
        println!("{}", ui::muted("No services found."));
    } else {
        println!("{}", ui::service_table(records));
    }
}

/// Operator input to column values, applying the same formatting as the entry form
fn to_fields(args: RecordArgs) -> anyhow::Result<ServiceFields> {
    let trimmed = |v: String| v.trim().to_string();
    let nullable = |v: Option<String>| v.map(|v| non_blank(Some(trimmed(v))));

    let numero_fossas = match args.numero_fossas {
        None => None,
        Some(v) if v.trim().is_empty() => Some(None),
        Some(v) => Some(Some(
            v.trim()
                .parse::<i64>()
                .with_context(|| format!("number of septic tanks must be a whole number, got {v:?}"))?,
        )),
    };
    let status = args.status.map(|s| s.parse::<ServiceStatus>()).transpose()?;

    Ok(ServiceFields {
        data_solicitacao: args.data_solicitacao.map(trimmed),
        cpf: args.cpf.map(trimmed),
        nome: args.nome.map(trimmed),
        inscricao_municipal: nullable(args.inscricao_municipal),
        telefone: args.telefone.map(|v| format_phone(v.trim())),
        bairro: args.bairro.map(trimmed),
        rua: args.rua.map(trimmed),
        numero: args.numero.map(trimmed),
        referencia: nullable(args.referencia),
        quadra: nullable(args.quadra),
        lote: nullable(args.lote),
        numero_fossas,
        status,
        data_chegada: nullable(args.data_chegada).map(|v| v.map(|t| format_time(&t))),
        data_saida: nullable(args.data_saida).map(|v| v.map(|t| format_time(&t))),
        data_conclusao: nullable(args.data_conclusao).map(|v| v.map(|d| format_date(&d))),
        placa_veiculo: nullable(args.placa_veiculo),
        motorista: nullable(args.motorista),
        ajudante: nullable(args.ajudante),
        observacao_empresa: nullable(args.observacao_empresa),
    })
}

/// Address key after applying `fields` on top of `base`
fn merged_address(fields: &ServiceFields, base: Option<&ServiceRecord>) -> AddressQuery {
    let mut address = base.map(AddressQuery::of).unwrap_or_default();
    if let Some(bairro) = &fields.bairro {
        address.bairro = bairro.clone();
    }
    if let Some(rua) = &fields.rua {
        address.rua = rua.clone();
    }
    if let Some(numero) = &fields.numero {
        address.numero = numero.clone();
    }
    if let Some(quadra) = &fields.quadra {
        address.quadra = quadra.clone();
    }
    if let Some(lote) = &fields.lote {
        address.lote = lote.clone();
    }
    address
}

/// Refuse to save onto an address that already has a request, unless forced
fn check_duplicate(store: &ServiceStore, address: &AddressQuery, force: bool) -> anyhow::Result<()> {
    if let Some(existing) = store.find_duplicate_address(address)? {
        if !force {
            bail!("address already registered (protocol {existing}); use --force to save anyway");
        }
        ui::warn(&format!("Address already registered (protocol {existing}); saving anyway"));
    }
    Ok(())
}

fn build_filters(args: FilterArgs) -> Filters {
    let mut pairs: Vec<(String, String)> = [
        ("id", args.id),
        ("cpf", args.cpf),
        ("nome", args.nome),
        ("telefone", args.telefone),
        ("bairro", args.bairro),
        ("rua", args.rua),
        ("numero", args.numero),
        ("status", args.status),
    ]
    .into_iter()
    .filter_map(|(key, value)| value.map(|v| (key.to_string(), v.trim().to_string())))
    .collect();

    for raw in args.extra {
        match raw.split_once('=') {
            Some((key, value)) => pairs.push((key.trim().to_string(), value.trim().to_string())),
            None => ui::warn(&format!("Ignoring filter {raw:?}: expected COLUMN=VALUE")),
        }
    }
    Filters::from_pairs(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use servicos::storage::SearchField;

    #[test]
    fn test_to_fields_formats_and_clears() {
        let args = RecordArgs {
            telefone: Some("62999887766".to_string()),
            quadra: Some("  ".to_string()),
            numero_fossas: Some("3".to_string()),
            data_chegada: Some("0830".to_string()),
            status: Some("concluido".to_string()),
            ..RecordArgs::default()
        };
        let fields = to_fields(args).unwrap();
        assert_eq!(fields.telefone.as_deref(), Some("(62) 99988-7766"));
        assert_eq!(fields.quadra, Some(None));
        assert_eq!(fields.numero_fossas, Some(Some(3)));
        assert_eq!(fields.data_chegada, Some(Some("08:30".to_string())));
        assert_eq!(fields.status, Some(ServiceStatus::Completed));
        assert_eq!(fields.nome, None);
    }

    #[test]
    fn test_to_fields_rejects_bad_numbers_and_status() {
        let fossas = RecordArgs {
            numero_fossas: Some("duas".to_string()),
            ..RecordArgs::default()
        };
        assert!(to_fields(fossas).is_err());

        let status = RecordArgs {
            status: Some("Arquivado".to_string()),
            ..RecordArgs::default()
        };
        assert!(to_fields(status).is_err());
    }

    #[test]
    fn test_merged_address_overlays_supplied_columns() {
        let base = ServiceRecord {
            id: 4,
            data_solicitacao: "2024-01-01 10:00:00".to_string(),
            cpf: "529.982.247-25".to_string(),
            nome: "Ana".to_string(),
            inscricao_municipal: None,
            telefone: "1".to_string(),
            bairro: "Centro".to_string(),
            rua: "Rua A".to_string(),
            numero: "10".to_string(),
            referencia: None,
            quadra: Some("Q1".to_string()),
            lote: Some("L2".to_string()),
            numero_fossas: None,
            status: ServiceStatus::Pending,
            data_chegada: None,
            data_saida: None,
            data_conclusao: None,
            placa_veiculo: None,
            motorista: None,
            ajudante: None,
            observacao_empresa: None,
        };
        let fields = ServiceFields {
            numero: Some("12".to_string()),
            lote: Some(None),
            ..ServiceFields::default()
        };
        let address = merged_address(&fields, Some(&base));
        assert_eq!(address.bairro, "Centro");
        assert_eq!(address.numero, "12");
        assert_eq!(address.quadra.as_deref(), Some("Q1"));
        assert_eq!(address.lote, None);
    }

    #[test]
    fn test_build_filters_merges_flags_and_pairs() {
        let args = FilterArgs {
            status: Some("Pendente".to_string()),
            extra: vec![
                "bairro=Centro".to_string(),
                "observacao_empresa=x".to_string(),
                "malformed".to_string(),
            ],
            ..FilterArgs::default()
        };
        let filters = build_filters(args);
        let expected = Filters::new()
            .with(SearchField::Status, "Pendente")
            .with(SearchField::Bairro, "Centro");
        assert_eq!(filters, expected);
    }
}
