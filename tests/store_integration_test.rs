//! End-to-end checks of the public store API against real database files

use servicos::export::{export_spreadsheet, service_order};
use servicos::storage::{SearchField, SortColumn, SortDirection};
use servicos::{AddressQuery, Database, Filters, ListQuery, ServiceFields, ServiceStatus, ServiceStore, SortKey};
use tempfile::TempDir;

fn open_store() -> (TempDir, ServiceStore) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::initialize(dir.path().join("data").join("servicos.db")).unwrap();
    (dir, ServiceStore::new(db))
}

#[test]
fn test_ticket_lifecycle() {
    let (dir, store) = open_store();

    let id = store
        .insert(&ServiceFields::new(
            "52998224725",
            "Maria Silva",
            "(62) 99988-7766",
            "Centro",
            "Rua A",
            "10",
        ))
        .unwrap();
    assert_eq!(id, 1);

    let record = store.get(id).unwrap().unwrap();
    assert_eq!(record.cpf, "529.982.247-25");
    assert_eq!(record.status, ServiceStatus::Pending);

    assert_eq!(
        store.find_duplicate_address(&AddressQuery::new("Centro", "Rua A", "10")).unwrap(),
        Some(id)
    );
    assert_eq!(
        store
            .find_duplicate_address(&AddressQuery::new("Centro", "Rua A", "10").excluding(id))
            .unwrap(),
        None
    );

    let done = ServiceFields {
        status: Some(ServiceStatus::Completed),
        motorista: Some(Some("João".to_string())),
        ..ServiceFields::default()
    };
    assert!(store.update(id, &done).unwrap());
    let record = store.get(id).unwrap().unwrap();
    assert_eq!(record.status, ServiceStatus::Completed);
    assert_eq!(record.nome, "Maria Silva");

    let order = service_order(&store, id, &Default::default()).unwrap().unwrap();
    assert!(order.contains("Motorista: João"));

    let csv_path = dir.path().join("servicos.csv");
    assert_eq!(export_spreadsheet(&store, &csv_path, Filters::new()).unwrap(), 1);
    assert!(csv_path.exists());

    assert!(store.delete(id).unwrap());
    assert_eq!(store.get(id).unwrap(), None);
    assert!(!store.delete(id).unwrap());
}

#[test]
fn test_reopening_keeps_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("servicos.db");

    let store = ServiceStore::new(Database::initialize(&path).unwrap());
    store
        .insert(&ServiceFields::new("52998224725", "Ana", "1", "Centro", "Rua A", "10"))
        .unwrap();

    let reopened = ServiceStore::new(Database::initialize(&path).unwrap());
    assert_eq!(reopened.find_by_document("529.982.247-25").unwrap().len(), 1);
}

#[test]
fn test_paging_through_filtered_listing() {
    let (_dir, store) = open_store();
    for n in 0..7 {
        let bairro = if n % 2 == 0 { "Centro" } else { "Vila Nova" };
        let fields = ServiceFields {
            data_solicitacao: Some(format!("2024-01-0{} 09:00:00", n + 1)),
            ..ServiceFields::new("52998224725", format!("Cliente {n}"), "1", bairro, "Rua A", n.to_string())
        };
        store.insert(&fields).unwrap();
    }

    let filters = Filters::new().with(SearchField::Bairro, "Centro");
    let sort = SortKey::new(SortColumn::Id, SortDirection::Asc);
    let first = store.list(&ListQuery::paged(filters.clone(), 1, 3).sorted(sort)).unwrap();
    let second = store.list(&ListQuery::paged(filters, 2, 3).sorted(sort)).unwrap();

    assert_eq!(first.total, 4);
    assert_eq!(first.total_pages(3), 2);
    let ids: Vec<i64> = first.records.iter().chain(&second.records).map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 3, 5, 7]);
}

#[test]
fn test_rows_with_free_text_columns_still_export() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::initialize(dir.path().join("servicos.db")).unwrap();
    db.acquire(|tx| {
        tx.execute(
            "INSERT INTO servicos (data_solicitacao, cpf, nome, telefone, bairro, rua, numero, numero_fossas, status)
             VALUES ('2023-06-01 10:00:00', '529.982.247-25', 'Ana', '1', 'Centro', 'Rua A', '10', 'duas', 'Aguardando')",
            [],
        )?;
        Ok(())
    })
    .unwrap();
    let store = ServiceStore::new(db);

    let record = store.get(1).unwrap().unwrap();
    assert_eq!(record.numero_fossas, None);
    assert_eq!(record.status, ServiceStatus::Other("Aguardando".to_string()));

    let csv_path = dir.path().join("servicos.csv");
    assert_eq!(export_spreadsheet(&store, &csv_path, Filters::new()).unwrap(), 1);
    assert!(std::fs::read_to_string(&csv_path).unwrap().contains("Aguardando"));
}
