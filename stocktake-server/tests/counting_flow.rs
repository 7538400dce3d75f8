//! End-to-end counting flow against the in-memory engine: login gate,
//! atomic procedures, session totals bookkeeping, consolidation inputs.

use stocktake_server::core::{Config, ServerState};
use stocktake_server::db::models::{ProductCreate, SESSION_STATUS_COMPLETED};
use stocktake_server::db::repository::{
    CountedItemRepository, ProductRepository, RepoError, SessionRepository, UserRepository,
};

async fn test_state() -> ServerState {
    let config = Config::with_overrides("/tmp/stocktake-test", 0);
    ServerState::initialize_in_memory(&config)
        .await
        .expect("in-memory state")
}

fn product(code: &str, description: &str) -> ProductCreate {
    ProductCreate {
        code: code.to_string(),
        description: description.to_string(),
        barcode: None,
        category: Some("Fertilizantes".to_string()),
        unit: "UN".to_string(),
        is_active: true,
    }
}

async fn seed_product(state: &ServerState, code: &str) -> String {
    let repo = ProductRepository::new(state.get_db());
    let created = repo
        .create(product(code, &format!("Produto {code}")))
        .await
        .expect("create product");
    created.id.expect("product id").to_string()
}

#[tokio::test]
async fn login_resumes_the_active_session() {
    let state = test_state().await;
    let sessions = SessionRepository::new(state.get_db());

    let first = sessions.open_for_user("Ana").await.expect("first login");
    assert!(!first.resumed);
    let first_id = first.session.id.clone().expect("session id");

    let second = sessions.open_for_user("Ana").await.expect("second login");
    assert!(second.resumed);
    assert_eq!(second.session.id.as_ref(), Some(&first_id));

    // Finalizing releases the gate; the next login starts fresh
    let finalized = sessions.finalize(&first_id.to_string()).await.expect("finalize");
    assert_eq!(finalized.status, SESSION_STATUS_COMPLETED);
    assert!(finalized.ended_at.is_some());

    let third = sessions.open_for_user("Ana").await.expect("third login");
    assert!(!third.resumed);
    assert_ne!(third.session.id.as_ref(), Some(&first_id));
}

#[tokio::test]
async fn finalize_twice_reports_not_found() {
    let state = test_state().await;
    let sessions = SessionRepository::new(state.get_db());

    let opened = sessions.open_for_user("Rui").await.expect("login");
    let id = opened.session.id.expect("session id").to_string();

    sessions.finalize(&id).await.expect("first finalize");
    let err = sessions.finalize(&id).await.expect_err("second finalize");
    assert!(matches!(err, RepoError::NotFound(_)));
}

#[tokio::test]
async fn additions_accumulate_atomically() {
    let state = test_state().await;
    let sessions = SessionRepository::new(state.get_db());
    let items = CountedItemRepository::new(state.get_db());

    let product_id = seed_product(&state, "ADUBO001").await;
    let opened = sessions.open_for_user("Ana").await.expect("login");
    let session_id = opened.session.id.expect("session id").to_string();
    let user_id = opened.session.user.to_string();

    let first = items
        .add_quantity(&session_id, &product_id, 3.0, &user_id)
        .await
        .expect("first add");
    assert_eq!(first.quantity, 3.0);
    assert_eq!(first.record_count, 1);

    let second = items
        .add_quantity(&session_id, &product_id, 2.5, &user_id)
        .await
        .expect("second add");
    assert_eq!(second.quantity, 5.5);
    assert_eq!(second.record_count, 2);
    assert_eq!(first.id, second.id);

    // Session totals follow the fold over its items
    let session = sessions
        .find_by_id(&session_id)
        .await
        .expect("find")
        .expect("session");
    assert_eq!(session.total_items_counted, 1);
    assert_eq!(session.total_units_counted, 5.5);
}

#[tokio::test]
async fn add_rejects_nonpositive_and_completed_sessions() {
    let state = test_state().await;
    let sessions = SessionRepository::new(state.get_db());
    let items = CountedItemRepository::new(state.get_db());

    let product_id = seed_product(&state, "SEM001").await;
    let opened = sessions.open_for_user("Rui").await.expect("login");
    let session_id = opened.session.id.expect("id").to_string();
    let user_id = opened.session.user.to_string();

    let err = items
        .add_quantity(&session_id, &product_id, 0.0, &user_id)
        .await
        .expect_err("zero amount");
    assert!(matches!(err, RepoError::Validation(_)));

    sessions.finalize(&session_id).await.expect("finalize");
    let err = items
        .add_quantity(&session_id, &product_id, 1.0, &user_id)
        .await
        .expect_err("completed session");
    assert!(matches!(err, RepoError::Validation(_)));
}

#[tokio::test]
async fn correction_overwrites_instead_of_adding() {
    let state = test_state().await;
    let sessions = SessionRepository::new(state.get_db());
    let items = CountedItemRepository::new(state.get_db());

    let product_id = seed_product(&state, "PESTIC003").await;
    let opened = sessions.open_for_user("Ana").await.expect("login");
    let session_id = opened.session.id.expect("id").to_string();
    let user_id = opened.session.user.to_string();

    let item = items
        .add_quantity(&session_id, &product_id, 10.0, &user_id)
        .await
        .expect("add");
    let item_id = item.id.expect("item id").to_string();

    let corrected = items
        .correct_quantity(&item_id, 4.0, &user_id)
        .await
        .expect("correct");
    assert_eq!(corrected.quantity, 4.0);
    // A correction is not another add
    assert_eq!(corrected.record_count, 1);

    let session = sessions
        .find_by_id(&session_id)
        .await
        .expect("find")
        .expect("session");
    assert_eq!(session.total_units_counted, 4.0);
}

#[tokio::test]
async fn removal_requires_the_session_owner() {
    let state = test_state().await;
    let sessions = SessionRepository::new(state.get_db());
    let items = CountedItemRepository::new(state.get_db());

    let product_id = seed_product(&state, "VITAM004").await;
    let ana = sessions.open_for_user("Ana").await.expect("ana login");
    let ana_session = ana.session.id.expect("id").to_string();
    let ana_user = ana.session.user.to_string();

    let rui = sessions.open_for_user("Rui").await.expect("rui login");
    let rui_user = rui.session.user.to_string();

    let item = items
        .add_quantity(&ana_session, &product_id, 7.0, &ana_user)
        .await
        .expect("add");
    let item_id = item.id.expect("item id").to_string();

    let err = items
        .remove_item(&item_id, &rui_user)
        .await
        .expect_err("foreign user");
    assert!(matches!(err, RepoError::Forbidden(_)));

    items.remove_item(&item_id, &ana_user).await.expect("owner removes");
    assert!(items.find_by_id(&item_id).await.expect("find").is_none());

    let session = sessions
        .find_by_id(&ana_session)
        .await
        .expect("find")
        .expect("session");
    assert_eq!(session.total_items_counted, 0);
    assert_eq!(session.total_units_counted, 0.0);
}

#[tokio::test]
async fn history_records_every_operation() {
    let state = test_state().await;
    let sessions = SessionRepository::new(state.get_db());
    let items = CountedItemRepository::new(state.get_db());

    let product_id = seed_product(&state, "RACAO008").await;
    let opened = sessions.open_for_user("Ana").await.expect("login");
    let session_id = opened.session.id.expect("id").to_string();
    let user_id = opened.session.user.to_string();

    let item = items
        .add_quantity(&session_id, &product_id, 2.0, &user_id)
        .await
        .expect("add");
    let item_id = item.id.expect("item id").to_string();
    items
        .correct_quantity(&item_id, 5.0, &user_id)
        .await
        .expect("correct");
    items.remove_item(&item_id, &user_id).await.expect("remove");

    let history = items
        .history_by_session(&session_id, 100)
        .await
        .expect("history");
    assert_eq!(history.len(), 3);

    let operations: Vec<&str> = history.iter().map(|h| h.operation.as_str()).collect();
    assert!(operations.contains(&"add"));
    assert!(operations.contains(&"correct"));
    assert!(operations.contains(&"remove"));
    assert!(history.iter().all(|h| h.user_name == "Ana"));
    assert!(history.iter().all(|h| h.code == "RACAO008"));
}

#[tokio::test]
async fn consolidation_merges_sessions_by_code() {
    let state = test_state().await;
    let sessions = SessionRepository::new(state.get_db());
    let items = CountedItemRepository::new(state.get_db());

    let adubo = seed_product(&state, "ADUBO001").await;
    let semente = seed_product(&state, "SEMENTE002").await;

    let ana = sessions.open_for_user("Ana").await.expect("ana login");
    let ana_session = ana.session.id.expect("id").to_string();
    let ana_user = ana.session.user.to_string();

    let rui = sessions.open_for_user("Rui").await.expect("rui login");
    let rui_session = rui.session.id.expect("id").to_string();
    let rui_user = rui.session.user.to_string();

    items
        .add_quantity(&ana_session, &adubo, 3.0, &ana_user)
        .await
        .expect("ana adubo");
    items
        .add_quantity(&rui_session, &adubo, 2.0, &rui_user)
        .await
        .expect("rui adubo");
    items
        .add_quantity(&ana_session, &semente, 5.0, &ana_user)
        .await
        .expect("ana semente");

    let session_ids = sessions
        .ids_started_between(None, None)
        .await
        .expect("session ids");
    assert_eq!(session_ids.len(), 2);

    let flat = items
        .flat_rows_by_sessions(&session_ids)
        .await
        .expect("flat rows");
    assert_eq!(flat.len(), 3);

    let report = shared::report::consolidate(&flat);
    assert_eq!(report.len(), 2);
    assert_eq!(report[0].code, "ADUBO001");
    assert_eq!(report[0].quantity, 5.0);
    assert_eq!(report[0].contributors, vec!["Ana", "Rui"]);
    assert_eq!(report[1].code, "SEMENTE002");
    assert_eq!(report[1].contributors, vec!["Ana"]);

    let totals = shared::report::totals(&report, session_ids.len());
    assert_eq!(totals.unique_items, 2);
    assert_eq!(totals.total_units, 10.0);
    assert_eq!(totals.distinct_contributors, 2);
}

#[tokio::test]
async fn catalog_replacement_clears_dependents_first() {
    let state = test_state().await;
    let sessions = SessionRepository::new(state.get_db());
    let items = CountedItemRepository::new(state.get_db());
    let products = ProductRepository::new(state.get_db());

    let product_id = seed_product(&state, "OLD001").await;
    let opened = sessions.open_for_user("Ana").await.expect("login");
    let session_id = opened.session.id.expect("id").to_string();
    let user_id = opened.session.user.to_string();
    items
        .add_quantity(&session_id, &product_id, 1.0, &user_id)
        .await
        .expect("add");

    // The import orchestrator's resync order
    items.delete_all_history().await.expect("clear history");
    items.delete_all().await.expect("clear items");
    products.delete_all().await.expect("clear products");
    assert_eq!(products.count().await.expect("count"), 0);

    let batch = vec![product("NEW001", "Novo produto"), product("NEW002", "Outro produto")];
    let inserted = products.insert_many(batch).await.expect("batch insert");
    assert_eq!(inserted, 2);
    assert_eq!(products.count().await.expect("count"), 2);

    // Duplicate codes fail the whole batch
    let err = products
        .insert_many(vec![product("NEW001", "Duplicado")])
        .await
        .expect_err("duplicate batch");
    assert!(matches!(err, RepoError::Database(_)));
}

#[tokio::test]
async fn barcode_lookup_and_linking() {
    let state = test_state().await;
    let products = ProductRepository::new(state.get_db());

    let mut create = product("FECHO839", "Fecho chato porta cadeado");
    create.barcode = Some("7891000100101".to_string());
    let with_barcode = products.create(create).await.expect("create");

    // Scanned value resolves by barcode, then by internal code
    let by_barcode = products
        .find_by_scanned_code("7891000100101")
        .await
        .expect("lookup")
        .expect("found");
    assert_eq!(by_barcode.code, "FECHO839");
    let by_code = products
        .find_by_scanned_code("FECHO839")
        .await
        .expect("lookup")
        .expect("found");
    assert_eq!(by_code.id, with_barcode.id);

    // Unknown scans are a distinguished empty state, not an error
    assert!(
        products
            .find_by_scanned_code("000000000000")
            .await
            .expect("lookup")
            .is_none()
    );

    // Linking an unknown barcode to an existing product
    let plain = products
        .create(product("SEMENTE010", "Sementes de arroz"))
        .await
        .expect("create");
    let plain_id = plain.id.expect("id").to_string();
    let linked = products
        .link_barcode(&plain_id, "7891000101010")
        .await
        .expect("link");
    assert_eq!(linked.barcode.as_deref(), Some("7891000101010"));

    // A barcode may belong to only one product
    let fecho_id = with_barcode.id.expect("id").to_string();
    let err = products
        .link_barcode(&fecho_id, "7891000101010")
        .await
        .expect_err("stolen barcode");
    assert!(matches!(err, RepoError::Duplicate(_)));
}

#[tokio::test]
async fn rocksdb_store_persists_catalog_rows() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("stocktake.db");

    let db = stocktake_server::db::DbService::open(&db_path.to_string_lossy())
        .await
        .expect("open rocksdb store")
        .db;
    let products = ProductRepository::new(db);

    products
        .create(product("ADUBO001", "Adubo NPK"))
        .await
        .expect("create");
    assert_eq!(products.count().await.expect("count"), 1);

    // The unique code index applies on the durable engine too
    let err = products
        .create(product("ADUBO001", "Duplicado"))
        .await
        .expect_err("duplicate code");
    assert!(matches!(err, RepoError::Duplicate(_)));
}

#[tokio::test]
async fn users_upsert_by_exact_name() {
    let state = test_state().await;
    let users = UserRepository::new(state.get_db());

    let first = users.upsert_by_name("João Silva").await.expect("first");
    let second = users.upsert_by_name("João Silva").await.expect("second");
    assert_eq!(first.id, second.id);

    // Exact match: a different casing is a different user
    let other = users.upsert_by_name("joão silva").await.expect("other");
    assert_ne!(first.id, other.id);
}
