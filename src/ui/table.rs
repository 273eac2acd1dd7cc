use crate::format::display_date;
use crate::record::ServiceRecord;
use crate::ui::theme;
use owo_colors::OwoColorize;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Campo")]
    pub field: String,
    #[tabled(rename = "Valor")]
    pub value: String,
}

pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            field: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// One line of the service listing
#[derive(Tabled)]
struct ServiceRow {
    #[tabled(rename = "Protocolo")]
    id: i64,
    #[tabled(rename = "Data")]
    date: String,
    #[tabled(rename = "Nome")]
    nome: String,
    #[tabled(rename = "CPF")]
    cpf: String,
    #[tabled(rename = "Telefone")]
    telefone: String,
    #[tabled(rename = "Endereço")]
    address: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// Listing table: protocol, date, name, CPF, phone, address, status
pub fn service_table(records: &[ServiceRecord]) -> String {
    let rows: Vec<ServiceRow> = records
        .iter()
        .map(|r| ServiceRow {
            id: r.id,
            date: display_date(&r.data_solicitacao),
            nome: r.nome.clone(),
            cpf: r.cpf.clone(),
            telefone: r.telefone.clone(),
            address: r.address_line(),
            status: r.status.as_str().style(theme().status(&r.status)).to_string(),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Every column of one record, blank where unset
pub fn detail_table(record: &ServiceRecord) -> String {
    let opt = |v: &Option<String>| v.clone().unwrap_or_default();
    let mut builder = TableBuilder::new();
    builder.add_row("Protocolo", &record.id.to_string());
    builder.add_row("Data Solicitação", &record.data_solicitacao);
    builder.add_row("CPF", &record.cpf);
    builder.add_row("Nome", &record.nome);
    builder.add_row("Inscrição Municipal", &opt(&record.inscricao_municipal));
    builder.add_row("Telefone", &record.telefone);
    builder.add_row("Bairro", &record.bairro);
    builder.add_row("Rua", &record.rua);
    builder.add_row("Número", &record.numero);
    builder.add_row("Quadra", &opt(&record.quadra));
    builder.add_row("Lote", &opt(&record.lote));
    builder.add_row("Referência", &opt(&record.referencia));
    builder.add_row(
        "Número de Fossas",
        &record.numero_fossas.map(|n| n.to_string()).unwrap_or_default(),
    );
    builder.add_row("Status", record.status.as_str());
    builder.add_row("Hora Chegada", &opt(&record.data_chegada));
    builder.add_row("Hora Saída", &opt(&record.data_saida));
    builder.add_row("Data Conclusão", &opt(&record.data_conclusao));
    builder.add_row("Placa Veículo", &opt(&record.placa_veiculo));
    builder.add_row("Motorista", &opt(&record.motorista));
    builder.add_row("Ajudante", &opt(&record.ajudante));
    builder.add_row("Observações", &opt(&record.observacao_empresa));
    builder.build()
}
