//! Export collaborators: spreadsheet (CSV) and printable service order
//!
//! Both only read from the store: the spreadsheet uses an unpaginated
//! `list`, the service order uses `get`. Long exports can be pushed onto a
//! worker thread with [`spawn_export`].

use crate::config::CompanyInfo;
use crate::document::mask_document;
use crate::format::display_date;
use crate::record::ServiceRecord;
use crate::storage::{Filters, ListQuery, ServiceStore};
use crate::{Error, Result};
use crossbeam::channel::{self, Receiver};
use std::io::Write;
use std::path::Path;
use std::thread;

/// Spreadsheet header for each column, in output order
pub const SPREADSHEET_HEADERS: [&str; 21] = [
    "Protocolo",
    "Data Solicitação",
    "CPF",
    "Nome",
    "Inscrição Municipal",
    "Telefone",
    "Bairro",
    "Rua",
    "Número",
    "Referência",
    "Quadra",
    "Lote",
    "Número de Fossas",
    "Status",
    "Hora Chegada",
    "Hora Saída",
    "Data Conclusão",
    "Placa Veículo",
    "Motorista",
    "Ajudante",
    "Observações",
];

/// Write `records` as CSV with the spreadsheet headers
pub fn write_spreadsheet<W: Write>(records: &[ServiceRecord], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(SPREADSHEET_HEADERS)?;
    for r in records {
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();
        csv.write_record([
            r.id.to_string(),
            r.data_solicitacao.clone(),
            r.cpf.clone(),
            r.nome.clone(),
            opt(&r.inscricao_municipal),
            r.telefone.clone(),
            r.bairro.clone(),
            r.rua.clone(),
            r.numero.clone(),
            opt(&r.referencia),
            opt(&r.quadra),
            opt(&r.lote),
            r.numero_fossas.map(|n| n.to_string()).unwrap_or_default(),
            r.status.as_str().to_string(),
            opt(&r.data_chegada),
            opt(&r.data_saida),
            opt(&r.data_conclusao),
            opt(&r.placa_veiculo),
            opt(&r.motorista),
            opt(&r.ajudante),
            opt(&r.observacao_empresa),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

/// Export every record matching `filters` to a CSV file.
///
/// Returns the number of rows written. When nothing matches, no file is
/// created and 0 is returned.
pub fn export_spreadsheet(store: &ServiceStore, path: &Path, filters: Filters) -> Result<usize> {
    let page = store.list(&ListQuery::all(filters))?;
    if page.records.is_empty() {
        tracing::info!("Nothing to export to {}", path.display());
        return Ok(0);
    }

    let file = std::fs::File::create(path)?;
    write_spreadsheet(&page.records, file)?;
    tracing::info!("Exported {} service(s) to {}", page.records.len(), path.display());
    Ok(page.records.len())
}

/// Printable service order for one ticket.
///
/// Unset execution fields are left as blanks to be filled in by hand on site.
pub fn render_service_order(record: &ServiceRecord, company: &CompanyInfo) -> String {
    let or_blank = |v: &Option<String>, blank: &str| {
        v.as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(blank)
            .to_string()
    };
    let or_empty = |v: &Option<String>| v.clone().unwrap_or_default();
    let observation_blank = vec!["_".repeat(76); 5].join("\n");

    let lines = vec![
        format!("SOLICITAÇÃO DE SERVIÇO DE VACOL - Protocolo nº {}", record.id),
        format!("Serviço Solicitado em {}", display_date(&record.data_solicitacao)),
        String::new(),
        format!("CPF: {}", mask_document(&record.cpf)),
        format!("Nome: {}", record.nome),
        format!("Tel/Cel: {}", record.telefone),
        format!("Bairro: {}", record.bairro),
        format!("Endereço: {}, Nº: {}", record.rua, record.numero),
        format!("QD: {}   LT: {}", or_empty(&record.quadra), or_empty(&record.lote)),
        format!("Referência: {}", or_empty(&record.referencia)),
        format!(
            "Nº de Fossas: {}",
            record.numero_fossas.map(|n| n.to_string()).unwrap_or_default()
        ),
        String::new(),
        "Execução de Serviço".to_string(),
        format!(
            "Chegada: {}     Saída: {}     (Concluída em: {})",
            or_blank(&record.data_chegada, "____:____"),
            or_blank(&record.data_saida, "____:____"),
            or_blank(&record.data_conclusao, "__/__/____"),
        ),
        String::new(),
        "Dados da Empresa".to_string(),
        format!(
            "Placa: {}   Motorista: {}   Ajudante: {}",
            or_blank(&record.placa_veiculo, "_____________"),
            or_blank(&record.motorista, "_____________________"),
            or_blank(&record.ajudante, "_________________"),
        ),
        String::new(),
        format!(
            "Observação: {}",
            or_blank(&record.observacao_empresa, observation_blank.as_str())
        ),
        String::new(),
        "Situação da Residência:".to_string(),
        "(_) Situação 1".to_string(),
        "(_) Situação 2".to_string(),
        "(_) Situação 3".to_string(),
        "(_) Outro Situação 4: ________________________________".to_string(),
        String::new(),
        "Atesto a conclusão do serviço:".to_string(),
        "___________________________________".to_string(),
        "Solicitante".to_string(),
        company.name.clone(),
        company.address.clone(),
        format!("Email: {}", company.email),
    ];
    lines.join("\n") + "\n"
}

/// Look up a ticket and render its service order; `None` when it does not exist
pub fn service_order(store: &ServiceStore, id: i64, company: &CompanyInfo) -> Result<Option<String>> {
    Ok(store.get(id)?.map(|record| render_service_order(&record, company)))
}

/// An export running on a worker thread
pub struct ExportJob<T> {
    rx: Receiver<Result<T>>,
    handle: thread::JoinHandle<()>,
}

impl<T> ExportJob<T> {
    /// Block until the worker delivers its result
    pub fn wait(self) -> Result<T> {
        let outcome = self.rx.recv();
        if self.handle.join().is_err() {
            return Err(Error::ExportWorker("worker panicked".to_string()));
        }
        outcome.map_err(|_| Error::ExportWorker("worker exited without a result".to_string()))?
    }
}

/// Run `job` on a worker thread; the result comes back over a channel.
///
/// The store is synchronous and knows nothing about threads; this is how a
/// front end keeps itself responsive during a long export.
pub fn spawn_export<T, F>(job: F) -> ExportJob<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let (tx, rx) = channel::bounded(1);
    let handle = thread::spawn(move || {
        let result = job();
        if tx.send(result).is_err() {
            tracing::debug!("Export finished after its receiver was dropped");
        }
    });
    ExportJob { rx, handle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ServiceFields, ServiceStatus};
    use crate::storage::{Database, SearchField};

    fn record() -> ServiceRecord {
        ServiceRecord {
            id: 7,
            data_solicitacao: "2024-03-05 14:22:01".to_string(),
            cpf: "529.982.247-25".to_string(),
            nome: "Ana, \"a\" Souza".to_string(),
            inscricao_municipal: None,
            telefone: "(62) 99988-7766".to_string(),
            bairro: "Centro".to_string(),
            rua: "Rua A".to_string(),
            numero: "10".to_string(),
            referencia: Some("Perto da praça".to_string()),
            quadra: Some("Q1".to_string()),
            lote: None,
            numero_fossas: Some(2),
            status: ServiceStatus::Completed,
            data_chegada: Some("08:30".to_string()),
            data_saida: None,
            data_conclusao: None,
            placa_veiculo: None,
            motorista: Some("João".to_string()),
            ajudante: None,
            observacao_empresa: None,
        }
    }

    #[test]
    fn test_write_spreadsheet() {
        let mut buf = Vec::new();
        write_spreadsheet(&[record()], &mut buf).unwrap();

        let mut reader = csv::Reader::from_reader(buf.as_slice());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), SPREADSHEET_HEADERS.len());
        assert_eq!(&headers[0], "Protocolo");

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "7");
        assert_eq!(&rows[0][3], "Ana, \"a\" Souza");
        assert_eq!(&rows[0][11], "");
        assert_eq!(&rows[0][12], "2");
        assert_eq!(&rows[0][13], "Concluído");
    }

    #[test]
    fn test_render_service_order() {
        let text = render_service_order(&record(), &CompanyInfo::default());
        assert!(text.starts_with("SOLICITAÇÃO DE SERVIÇO DE VACOL - Protocolo nº 7\n"));
        assert!(text.contains("Serviço Solicitado em 05/03/2024"));
        assert!(text.contains("CPF: 529.***.***-25"));
        assert!(!text.contains("982.247"));
        assert!(text.contains("QD: Q1   LT: "));
        assert!(text.contains("Chegada: 08:30     Saída: ____:____     (Concluída em: __/__/____)"));
        assert!(text.contains("Motorista: João"));
        assert!(text.contains("Situação da Residência:\n(_) Situação 1\n(_) Situação 2\n(_) Situação 3\n(_) Outro Situação 4: "));
        assert!(text.contains("[NOME DA EMPRESA]"));
    }

    #[test]
    fn test_export_spreadsheet_and_background_job() {
        let dir = tempfile::tempdir().unwrap();
        let store = ServiceStore::new(Database::initialize(dir.path().join("servicos.db")).unwrap());
        store
            .insert(&ServiceFields::new("52998224725", "Ana", "1", "Centro", "Rua A", "10"))
            .unwrap();
        store
            .insert(&ServiceFields::new("52998224725", "Bia", "1", "Vila", "Rua B", "2"))
            .unwrap();

        let out = dir.path().join("servicos.csv");
        let job_store = store.clone();
        let job_out = out.clone();
        let job = spawn_export(move || {
            export_spreadsheet(&job_store, &job_out, Filters::new().with(SearchField::Bairro, "Centro"))
        });
        assert_eq!(job.wait().unwrap(), 1);
        assert!(std::fs::read_to_string(&out).unwrap().contains("Ana"));

        let none = dir.path().join("empty.csv");
        let written = export_spreadsheet(&store, &none, Filters::new().with(SearchField::Nome, "Zé")).unwrap();
        assert_eq!(written, 0);
        assert!(!none.exists());
    }

    #[test]
    fn test_service_order_for_missing_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = ServiceStore::new(Database::initialize(dir.path().join("servicos.db")).unwrap());
        assert_eq!(service_order(&store, 1, &CompanyInfo::default()).unwrap(), None);
    }

    #[test]
    fn test_failed_job_reports_error() {
        let job: ExportJob<usize> = spawn_export(|| Err(Error::MissingField("cpf")));
        assert!(matches!(job.wait(), Err(Error::MissingField("cpf"))));
    }
}
