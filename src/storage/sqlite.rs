//! SQLite storage implementation

use super::connection::Database;
use super::query::{AddressQuery, ListQuery, ServicePage};
use super::schema::SERVICE_COLUMNS;
use crate::document::normalize_document;
use crate::format::now_timestamp;
use crate::record::{ServiceFields, ServiceRecord, ServiceStatus};
use crate::Result;
use rusqlite::types::{Value, ValueRef};
use rusqlite::{OptionalExtension, params_from_iter};

/// Record store over the `servicos` table.
///
/// Every method is one scoped transaction on its own connection.
#[derive(Debug, Clone)]
pub struct ServiceStore {
    db: Database,
}

impl ServiceStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    // ========== Write Operations ==========

    /// Insert a new service request and return its protocol number.
    ///
    /// The CPF is re-formatted (never validated) and `data_solicitacao`
    /// defaults to now. Missing NOT NULL columns fail with a storage error.
    pub fn insert(&self, fields: &ServiceFields) -> Result<i64> {
        let mut fields = normalized(fields);
        if fields.data_solicitacao.as_deref().is_none_or(str::is_empty) {
            fields.data_solicitacao = Some(now_timestamp());
        }

        let (columns, values): (Vec<&str>, Vec<Value>) = assignments(&fields).into_iter().unzip();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO servicos ({}) VALUES ({})",
            columns.join(", "),
            placeholders
        );

        let id = self.db.acquire(|tx| {
            tx.execute(&sql, params_from_iter(values.iter()))?;
            Ok(tx.last_insert_rowid())
        })?;
        tracing::info!("Inserted service {}", id);
        Ok(id)
    }

    /// Write only the supplied columns of record `id`.
    ///
    /// Returns `false` when no row has that id, or when nothing was supplied.
    pub fn update(&self, id: i64, fields: &ServiceFields) -> Result<bool> {
        let fields = normalized(fields);
        let assignments = assignments(&fields);
        if assignments.is_empty() {
            tracing::debug!("Update of service {} supplied no columns", id);
            return Ok(false);
        }

        let (columns, mut values): (Vec<&str>, Vec<Value>) = assignments.into_iter().unzip();
        let set_clause: Vec<String> = columns.iter().map(|c| format!("{c} = ?")).collect();
        let sql = format!("UPDATE servicos SET {} WHERE id = ?", set_clause.join(", "));
        values.push(Value::Integer(id));

        let changed = self
            .db
            .acquire(|tx| Ok(tx.execute(&sql, params_from_iter(values.iter()))?))?;
        tracing::info!("Updated service {} ({} row(s))", id, changed);
        Ok(changed > 0)
    }

    /// Permanently remove record `id`; `false` when it did not exist
    pub fn delete(&self, id: i64) -> Result<bool> {
        let changed = self
            .db
            .acquire(|tx| Ok(tx.execute("DELETE FROM servicos WHERE id = ?1", [id])?))?;
        tracing::info!("Deleted service {} ({} row(s))", id, changed);
        Ok(changed > 0)
    }

    // ========== Read Operations ==========

    /// Get a record by protocol number
    pub fn get(&self, id: i64) -> Result<Option<ServiceRecord>> {
        let sql = format!("SELECT {SERVICE_COLUMNS} FROM servicos WHERE id = ?1");
        self.db.acquire(|tx| {
            Ok(tx
                .query_row(&sql, [id], row_to_record)
                .optional()?)
        })
    }

    /// Find another record at the same address.
    ///
    /// `bairro`, `rua` and `numero` must match exactly. A non-empty
    /// `quadra`/`lote` must match exactly; an absent or empty one only matches
    /// rows where the column is NULL or empty. Returns the lowest matching id.
    pub fn find_duplicate_address(&self, address: &AddressQuery) -> Result<Option<i64>> {
        let mut sql = String::from("SELECT id FROM servicos WHERE bairro = ? AND rua = ? AND numero = ?");
        let mut values: Vec<Value> = vec![
            Value::Text(address.bairro.clone()),
            Value::Text(address.rua.clone()),
            Value::Text(address.numero.clone()),
        ];

        for (column, value) in [("quadra", &address.quadra), ("lote", &address.lote)] {
            match value.as_deref().filter(|v| !v.is_empty()) {
                Some(v) => {
                    sql.push_str(&format!(" AND {column} = ?"));
                    values.push(Value::Text(v.to_string()));
                }
                None => sql.push_str(&format!(" AND ({column} IS NULL OR {column} = '')")),
            }
        }

        if let Some(id) = address.excluding_id {
            sql.push_str(" AND id != ?");
            values.push(Value::Integer(id));
        }
        sql.push_str(" ORDER BY id LIMIT 1");

        self.db.acquire(|tx| {
            Ok(tx
                .query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))
                .optional()?)
        })
    }

    /// Filtered listing with an optional page window.
    ///
    /// The total and the rows are read in the same transaction, so they
    /// always describe the same snapshot.
    pub fn list(&self, query: &ListQuery) -> Result<ServicePage> {
        let (where_clause, values) = query.filters.where_clause();
        let count_sql = format!("SELECT COUNT(*) FROM servicos{where_clause}");
        let mut select_sql = format!(
            "SELECT {SERVICE_COLUMNS} FROM servicos{where_clause} ORDER BY {}",
            query.sort.as_sql()
        );
        if let Some((limit, offset)) = query.window() {
            select_sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}"));
        }

        self.db.acquire(|tx| {
            let total: i64 = tx.query_row(&count_sql, params_from_iter(values.iter()), |row| row.get(0))?;

            let mut stmt = tx.prepare(&select_sql)?;
            let records = stmt
                .query_map(params_from_iter(values.iter()), row_to_record)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(ServicePage {
                records,
                total: total as u64,
            })
        })
    }

    /// Records whose stored CPF equals the normalized form of `cpf`
    pub fn find_by_document(&self, cpf: &str) -> Result<Vec<ServiceRecord>> {
        let formatted = normalize_document(cpf);
        let sql = format!("SELECT {SERVICE_COLUMNS} FROM servicos WHERE cpf = ?1 ORDER BY id");
        self.db.acquire(|tx| {
            let mut stmt = tx.prepare(&sql)?;
            let records = stmt
                .query_map([&formatted], row_to_record)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(records)
        })
    }
}

/// Copy of `fields` with a supplied, non-empty CPF in canonical form
fn normalized(fields: &ServiceFields) -> ServiceFields {
    let mut fields = fields.clone();
    if let Some(cpf) = fields.cpf.as_mut().filter(|c| !c.is_empty()) {
        *cpf = normalize_document(cpf);
    }
    fields
}

/// Supplied columns and the values to bind for them
fn assignments(fields: &ServiceFields) -> Vec<(&'static str, Value)> {
    fn text(v: &Option<String>) -> Value {
        v.clone().map(Value::Text).unwrap_or(Value::Null)
    }

    let mut out = Vec::new();
    let mut required = |column: &'static str, value: &Option<String>| {
        if let Some(v) = value {
            out.push((column, Value::Text(v.clone())));
        }
    };
    required("data_solicitacao", &fields.data_solicitacao);
    required("cpf", &fields.cpf);
    required("nome", &fields.nome);
    required("telefone", &fields.telefone);
    required("bairro", &fields.bairro);
    required("rua", &fields.rua);
    required("numero", &fields.numero);

    let nullable: [(&'static str, &Option<Option<String>>); 11] = [
        ("inscricao_municipal", &fields.inscricao_municipal),
        ("referencia", &fields.referencia),
        ("quadra", &fields.quadra),
        ("lote", &fields.lote),
        ("data_chegada", &fields.data_chegada),
        ("data_saida", &fields.data_saida),
        ("data_conclusao", &fields.data_conclusao),
        ("placa_veiculo", &fields.placa_veiculo),
        ("motorista", &fields.motorista),
        ("ajudante", &fields.ajudante),
        ("observacao_empresa", &fields.observacao_empresa),
    ];
    for (column, value) in nullable {
        if let Some(v) = value {
            out.push((column, text(v)));
        }
    }

    if let Some(fossas) = fields.numero_fossas {
        out.push(("numero_fossas", fossas.map(Value::Integer).unwrap_or(Value::Null)));
    }
    if let Some(status) = &fields.status {
        out.push(("status", Value::Text(status.as_str().to_string())));
    }
    out
}

/// Helper to convert a row (selected with `SERVICE_COLUMNS`) to a ServiceRecord
///
/// Databases written by earlier front ends may hold free text in `numero_fossas`
/// and `status`; such values are read leniently rather than failing the row.
fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<ServiceRecord> {
    // A NULL status takes the column default.
    let status = row
        .get::<_, Option<String>>(13)?
        .map(|s| ServiceStatus::from_stored(&s))
        .unwrap_or_default();

    let numero_fossas = match row.get_ref(12)? {
        ValueRef::Integer(n) => Some(n),
        ValueRef::Text(raw) => {
            let text = String::from_utf8_lossy(raw);
            let parsed = text.trim().parse().ok();
            if parsed.is_none() {
                tracing::debug!("Ignoring non-numeric numero_fossas {:?}", text);
            }
            parsed
        }
        _ => None,
    };

    Ok(ServiceRecord {
        id: row.get(0)?,
        data_solicitacao: row.get(1)?,
        cpf: row.get(2)?,
        nome: row.get(3)?,
        inscricao_municipal: row.get(4)?,
        telefone: row.get(5)?,
        bairro: row.get(6)?,
        rua: row.get(7)?,
        numero: row.get(8)?,
        referencia: row.get(9)?,
        quadra: row.get(10)?,
        lote: row.get(11)?,
        numero_fossas,
        status,
        data_chegada: row.get(14)?,
        data_saida: row.get(15)?,
        data_conclusao: row.get(16)?,
        placa_veiculo: row.get(17)?,
        motorista: row.get(18)?,
        ajudante: row.get(19)?,
        observacao_empresa: row.get(20)?,
    })
}
