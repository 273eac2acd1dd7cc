//! Query shapes for listing and duplicate detection
//!
//! Everything that ends up inside SQL text (filter columns, sort columns,
//! directions) comes from a closed enum. User-supplied strings are only ever
//! bound as parameters.

use crate::record::ServiceRecord;
use crate::{Error, Result};
use std::str::FromStr;

/// Columns that can be searched by substring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchField {
    Id,
    Cpf,
    Nome,
    Telefone,
    Bairro,
    Rua,
    Numero,
    Status,
}

impl SearchField {
    /// Column name in `servicos`
    pub fn column(&self) -> &'static str {
        match self {
            SearchField::Id => "id",
            SearchField::Cpf => "cpf",
            SearchField::Nome => "nome",
            SearchField::Telefone => "telefone",
            SearchField::Bairro => "bairro",
            SearchField::Rua => "rua",
            SearchField::Numero => "numero",
            SearchField::Status => "status",
        }
    }

    pub fn all() -> &'static [SearchField] {
        &[
            SearchField::Id,
            SearchField::Cpf,
            SearchField::Nome,
            SearchField::Telefone,
            SearchField::Bairro,
            SearchField::Rua,
            SearchField::Numero,
            SearchField::Status,
        ]
    }
}

impl FromStr for SearchField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_lowercase();
        SearchField::all()
            .iter()
            .copied()
            .find(|field| field.column() == key)
            .ok_or_else(|| Error::InvalidFilter(s.to_string()))
    }
}

/// Conjunctive substring filters over the searchable columns.
///
/// Matching is case-sensitive; an empty value is treated as "no filter".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    conditions: Vec<(SearchField, String)>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter; a later value for the same field replaces the earlier one
    pub fn with(mut self, field: SearchField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: SearchField, value: impl Into<String>) {
        let value = value.into();
        self.conditions.retain(|(f, _)| *f != field);
        if !value.is_empty() {
            self.conditions.push((field, value));
        }
    }

    /// Build filters from loosely-typed `column -> value` pairs.
    ///
    /// Keys are matched case-insensitively against the searchable columns;
    /// anything else is skipped.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut filters = Self::new();
        for (key, value) in pairs {
            match key.as_ref().parse::<SearchField>() {
                Ok(field) => filters.set(field, value),
                Err(_) => tracing::debug!("Ignoring filter on unknown column {:?}", key.as_ref()),
            }
        }
        filters
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[(SearchField, String)] {
        &self.conditions
    }

    /// `WHERE` clause (with leading space) and its bound values
    pub(crate) fn where_clause(&self) -> (String, Vec<String>) {
        if self.conditions.is_empty() {
            return (String::new(), Vec::new());
        }
        let predicates: Vec<String> = self
            .conditions
            .iter()
            .map(|(field, _)| format!("instr({}, ?) > 0", field.column()))
            .collect();
        let values = self.conditions.iter().map(|(_, v)| v.clone()).collect();
        (format!(" WHERE {}", predicates.join(" AND ")), values)
    }
}

/// Columns a listing can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Id,
    RequestDate,
    Nome,
    Cpf,
    Bairro,
    Rua,
    Status,
}

impl SortColumn {
    pub fn column(&self) -> &'static str {
        match self {
            SortColumn::Id => "id",
            SortColumn::RequestDate => "data_solicitacao",
            SortColumn::Nome => "nome",
            SortColumn::Cpf => "cpf",
            SortColumn::Bairro => "bairro",
            SortColumn::Rua => "rua",
            SortColumn::Status => "status",
        }
    }

    pub fn all() -> &'static [SortColumn] {
        &[
            SortColumn::Id,
            SortColumn::RequestDate,
            SortColumn::Nome,
            SortColumn::Cpf,
            SortColumn::Bairro,
            SortColumn::Rua,
            SortColumn::Status,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Validated ORDER BY: a column from the allow-list plus a direction.
///
/// Rows are tie-broken by `id` in the same direction so that the order is
/// total and pages never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn new(column: SortColumn, direction: SortDirection) -> Self {
        Self { column, direction }
    }

    pub fn as_sql(&self) -> String {
        let dir = self.direction.as_sql();
        if self.column == SortColumn::Id {
            format!("id {dir}")
        } else {
            format!("{} {dir}, id {dir}", self.column.column())
        }
    }
}

impl Default for SortKey {
    /// Newest requests first
    fn default() -> Self {
        Self::new(SortColumn::RequestDate, SortDirection::Desc)
    }
}

impl FromStr for SortKey {
    type Err = Error;

    /// Parse `"<column> [ASC|DESC]"`, e.g. `"data_solicitacao DESC"` or `"nome"`
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split_whitespace();
        let column_name = parts
            .next()
            .ok_or_else(|| Error::InvalidSortKey(s.to_string()))?
            .to_lowercase();
        let column = SortColumn::all()
            .iter()
            .copied()
            .find(|c| c.column() == column_name)
            .ok_or_else(|| Error::InvalidSortKey(s.to_string()))?;
        let direction = match parts.next().map(|d| d.to_uppercase()) {
            None => SortDirection::Asc,
            Some(d) if d == "ASC" => SortDirection::Asc,
            Some(d) if d == "DESC" => SortDirection::Desc,
            Some(_) => return Err(Error::InvalidSortKey(s.to_string())),
        };
        if parts.next().is_some() {
            return Err(Error::InvalidSortKey(s.to_string()));
        }
        Ok(Self::new(column, direction))
    }
}

/// Parameters of a listing
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub filters: Filters,
    pub sort: SortKey,
    /// 1-based page number; only used with `page_size`
    pub page: u32,
    /// Rows per page; `None` or `Some(0)` returns every matching row
    pub page_size: Option<u32>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            filters: Filters::default(),
            sort: SortKey::default(),
            page: 1,
            page_size: None,
        }
    }
}

impl ListQuery {
    /// Every row matching `filters`, default order, no pagination
    pub fn all(filters: Filters) -> Self {
        Self {
            filters,
            ..Self::default()
        }
    }

    pub fn paged(filters: Filters, page: u32, page_size: u32) -> Self {
        Self {
            filters,
            page,
            page_size: Some(page_size),
            ..Self::default()
        }
    }

    pub fn sorted(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    /// `(limit, offset)` for the requested window
    pub(crate) fn window(&self) -> Option<(i64, i64)> {
        self.page_size.filter(|size| *size > 0).map(|size| {
            let offset = u64::from(self.page.saturating_sub(1)) * u64::from(size);
            (i64::from(size), offset as i64)
        })
    }
}

/// One window of a listing plus the size of the whole filtered set
#[derive(Debug, Clone, PartialEq)]
pub struct ServicePage {
    pub records: Vec<ServiceRecord>,
    /// Rows matching the filters, ignoring pagination
    pub total: u64,
}

impl ServicePage {
    /// Number of pages for `page_size`; never less than one
    pub fn total_pages(&self, page_size: u32) -> u64 {
        if page_size == 0 {
            return 1;
        }
        self.total.div_ceil(u64::from(page_size)).max(1)
    }
}

/// Address key to test for duplicates.
///
/// Blank `quadra`/`lote` match rows where the column is NULL or empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressQuery {
    pub bairro: String,
    pub rua: String,
    pub numero: String,
    pub quadra: Option<String>,
    pub lote: Option<String>,
    /// Record to leave out of the match, usually the one being edited
    pub excluding_id: Option<i64>,
}

impl AddressQuery {
    pub fn new(bairro: impl Into<String>, rua: impl Into<String>, numero: impl Into<String>) -> Self {
        Self {
            bairro: bairro.into(),
            rua: rua.into(),
            numero: numero.into(),
            ..Self::default()
        }
    }

    pub fn block(mut self, quadra: impl Into<String>) -> Self {
        self.quadra = Some(quadra.into());
        self
    }

    pub fn lot(mut self, lote: impl Into<String>) -> Self {
        self.lote = Some(lote.into());
        self
    }

    pub fn excluding(mut self, id: i64) -> Self {
        self.excluding_id = Some(id);
        self
    }

    /// Address key of an existing record
    pub fn of(record: &ServiceRecord) -> Self {
        Self {
            bairro: record.bairro.clone(),
            rua: record.rua.clone(),
            numero: record.numero.clone(),
            quadra: record.quadra.clone(),
            lote: record.lote.clone(),
            excluding_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_filter_keys_are_ignored() {
        let lenient = Filters::from_pairs([("status", "Pendente"), ("evil_column", "x")]);
        let strict = Filters::new().with(SearchField::Status, "Pendente");
        assert_eq!(lenient, strict);
    }

    #[test]
    fn test_filter_keys_are_case_insensitive() {
        let filters = Filters::from_pairs([("NOME", "Ana")]);
        assert_eq!(filters.conditions(), &[(SearchField::Nome, "Ana".to_string())]);
    }

    #[test]
    fn test_empty_filter_values_are_dropped() {
        let filters = Filters::from_pairs([("nome", ""), ("rua", "Rua A")]);
        assert_eq!(filters.conditions().len(), 1);
        let (clause, values) = filters.where_clause();
        assert_eq!(clause, " WHERE instr(rua, ?) > 0");
        assert_eq!(values, vec!["Rua A".to_string()]);
    }

    #[test]
    fn test_sort_key_parsing() {
        let key: SortKey = "data_solicitacao DESC".parse().unwrap();
        assert_eq!(key, SortKey::default());
        let key: SortKey = "nome".parse().unwrap();
        assert_eq!(key, SortKey::new(SortColumn::Nome, SortDirection::Asc));
        assert!("nome; DROP TABLE servicos".parse::<SortKey>().is_err());
        assert!("observacao_empresa ASC".parse::<SortKey>().is_err());
        assert!("nome sideways".parse::<SortKey>().is_err());
        assert!("".parse::<SortKey>().is_err());
    }

    #[test]
    fn test_sort_key_sql_has_tie_breaker() {
        assert_eq!(SortKey::default().as_sql(), "data_solicitacao DESC, id DESC");
        assert_eq!(SortKey::new(SortColumn::Id, SortDirection::Asc).as_sql(), "id ASC");
    }

    #[test]
    fn test_window() {
        assert_eq!(ListQuery::default().window(), None);
        assert_eq!(ListQuery::paged(Filters::new(), 3, 20).window(), Some((20, 40)));
        assert_eq!(ListQuery::paged(Filters::new(), 0, 20).window(), Some((20, 0)));
        assert_eq!(ListQuery::paged(Filters::new(), 2, 0).window(), None);
    }

    #[test]
    fn test_total_pages() {
        let page = |total| ServicePage { records: Vec::new(), total };
        assert_eq!(page(0).total_pages(20), 1);
        assert_eq!(page(20).total_pages(20), 1);
        assert_eq!(page(21).total_pages(20), 2);
    }
}
