//! Service record types
//!
//! A service record is one waste-collection ticket: who asked for it, where
//! the work is, and how it was executed. Column names are the persisted
//! contract of the `servicos` table and are kept as field names.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lifecycle status of a service request.
///
/// The store does not enforce transitions; any status may be written at any time.
/// Older databases may hold free text typed into the status box; that text is
/// kept as [`ServiceStatus::Other`] so such rows stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ServiceStatus {
    #[default]
    #[serde(rename = "Pendente")]
    Pending,
    #[serde(rename = "Concluído")]
    Completed,
    #[serde(rename = "Cancelado")]
    Cancelled,
    #[serde(untagged)]
    Other(String),
}

impl ServiceStatus {
    /// Get the stored representation of the status
    pub fn as_str(&self) -> &str {
        match self {
            ServiceStatus::Pending => "Pendente",
            ServiceStatus::Completed => "Concluído",
            ServiceStatus::Cancelled => "Cancelado",
            ServiceStatus::Other(text) => text,
        }
    }

    /// Status as read back from the `status` column; unknown text is kept verbatim
    pub fn from_stored(text: &str) -> Self {
        text.parse().unwrap_or_else(|_| ServiceStatus::Other(text.to_string()))
    }

    /// Get all statuses
    pub fn all() -> &'static [ServiceStatus] {
        &[
            ServiceStatus::Pending,
            ServiceStatus::Completed,
            ServiceStatus::Cancelled,
        ]
    }
}

impl FromStr for ServiceStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pendente" | "pending" => Ok(ServiceStatus::Pending),
            "concluído" | "concluido" | "completed" | "done" => Ok(ServiceStatus::Completed),
            "cancelado" | "cancelled" | "canceled" => Ok(ServiceStatus::Cancelled),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted service request, one row of `servicos`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    /// Protocol number, assigned by the database
    pub id: i64,
    /// Request timestamp, `YYYY-MM-DD HH:MM:SS`
    pub data_solicitacao: String,
    /// CPF in canonical masked form
    pub cpf: String,
    pub nome: String,
    pub inscricao_municipal: Option<String>,
    pub telefone: String,
    pub bairro: String,
    pub rua: String,
    pub numero: String,
    pub referencia: Option<String>,
    pub quadra: Option<String>,
    pub lote: Option<String>,
    pub numero_fossas: Option<i64>,
    pub status: ServiceStatus,
    /// Arrival time on site
    pub data_chegada: Option<String>,
    /// Departure time from site
    pub data_saida: Option<String>,
    /// Completion date
    pub data_conclusao: Option<String>,
    pub placa_veiculo: Option<String>,
    pub motorista: Option<String>,
    pub ajudante: Option<String>,
    pub observacao_empresa: Option<String>,
}

impl ServiceRecord {
    /// One-line address as shown in listings
    pub fn address_line(&self) -> String {
        format!("{}, {}, {}", self.bairro, self.rua, self.numero)
    }
}

/// Sparse set of column values for insert and update.
///
/// Each member is a presence marker: `None` means "not supplied" and the
/// column is left untouched (update) or takes its default (insert).
/// Nullable columns use `Option<Option<T>>` so that `Some(None)` writes NULL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceFields {
    pub data_solicitacao: Option<String>,
    pub cpf: Option<String>,
    pub nome: Option<String>,
    pub inscricao_municipal: Option<Option<String>>,
    pub telefone: Option<String>,
    pub bairro: Option<String>,
    pub rua: Option<String>,
    pub numero: Option<String>,
    pub referencia: Option<Option<String>>,
    pub quadra: Option<Option<String>>,
    pub lote: Option<Option<String>>,
    pub numero_fossas: Option<Option<i64>>,
    pub status: Option<ServiceStatus>,
    pub data_chegada: Option<Option<String>>,
    pub data_saida: Option<Option<String>>,
    pub data_conclusao: Option<Option<String>>,
    pub placa_veiculo: Option<Option<String>>,
    pub motorista: Option<Option<String>>,
    pub ajudante: Option<Option<String>>,
    pub observacao_empresa: Option<Option<String>>,
}

impl ServiceFields {
    /// Create a field set carrying every NOT NULL column
    pub fn new(
        cpf: impl Into<String>,
        nome: impl Into<String>,
        telefone: impl Into<String>,
        bairro: impl Into<String>,
        rua: impl Into<String>,
        numero: impl Into<String>,
    ) -> Self {
        Self {
            cpf: Some(cpf.into()),
            nome: Some(nome.into()),
            telefone: Some(telefone.into()),
            bairro: Some(bairro.into()),
            rua: Some(rua.into()),
            numero: Some(numero.into()),
            ..Self::default()
        }
    }

    /// True when no column is supplied
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// True when any address-key column is supplied
    pub fn touches_address(&self) -> bool {
        self.bairro.is_some()
            || self.rua.is_some()
            || self.numero.is_some()
            || self.quadra.is_some()
            || self.lote.is_some()
    }

    /// Check that the fields an operator must fill in are present and not blank.
    ///
    /// The store itself only relies on NOT NULL constraints; this is the
    /// stricter check the front end runs before saving a new ticket.
    pub fn validate_required(&self) -> Result<()> {
        let required: [(&'static str, &Option<String>); 6] = [
            ("cpf", &self.cpf),
            ("nome", &self.nome),
            ("telefone", &self.telefone),
            ("bairro", &self.bairro),
            ("rua", &self.rua),
            ("numero", &self.numero),
        ];
        for (name, value) in required {
            match value {
                Some(v) if !v.trim().is_empty() => {}
                _ => return Err(Error::MissingField(name)),
            }
        }
        Ok(())
    }

    /// Drop execution metadata unless the ticket ends up `Concluído`.
    ///
    /// `status` is the status the record will have after the write.
    /// Arrival/departure/completion and crew fields only mean something for a
    /// completed ticket; for any other status they are not written at all.
    pub fn strip_execution_unless_completed(&mut self, status: ServiceStatus) {
        if status == ServiceStatus::Completed {
            return;
        }
        self.data_chegada = None;
        self.data_saida = None;
        self.data_conclusao = None;
        self.placa_veiculo = None;
        self.motorista = None;
        self.ajudante = None;
        self.observacao_empresa = None;
    }
}

/// Turn blank optional input into an absent value.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
