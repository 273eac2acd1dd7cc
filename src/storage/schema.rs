//! Database schema definitions
//!
//! Column names, types and defaults match existing `servicos.db` files, so a
//! database created by earlier releases opens unchanged.

/// SQL to create the servicos table
pub const CREATE_SERVICOS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS servicos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    data_solicitacao TEXT NOT NULL,
    cpf TEXT NOT NULL,
    nome TEXT NOT NULL,
    inscricao_municipal TEXT,
    telefone TEXT NOT NULL,
    bairro TEXT NOT NULL,
    rua TEXT NOT NULL,
    numero TEXT NOT NULL,
    referencia TEXT,
    quadra TEXT,
    lote TEXT,
    numero_fossas INTEGER,
    status TEXT DEFAULT 'Pendente',
    data_chegada TEXT,
    data_saida TEXT,
    data_conclusao TEXT,
    placa_veiculo TEXT,
    motorista TEXT,
    ajudante TEXT,
    observacao_empresa TEXT
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_cpf ON servicos (cpf)",
    "CREATE INDEX IF NOT EXISTS idx_endereco ON servicos (bairro, rua, numero, quadra, lote)",
    "CREATE INDEX IF NOT EXISTS idx_status ON servicos (status)",
    "CREATE INDEX IF NOT EXISTS idx_data ON servicos (data_solicitacao)",
];

/// Column list in table order, used by every SELECT
pub const SERVICE_COLUMNS: &str = "id, data_solicitacao, cpf, nome, inscricao_municipal, telefone, \
     bairro, rua, numero, referencia, quadra, lote, numero_fossas, status, data_chegada, \
     data_saida, data_conclusao, placa_veiculo, motorista, ajudante, observacao_empresa";

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_SERVICOS_TABLE];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
