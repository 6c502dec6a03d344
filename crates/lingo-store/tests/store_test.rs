//! Integration tests for the SQLite store.

use futures::future::join_all;
use lingo_common::test_utils::{init_test_logging, text_fields};
use lingo_common::{EntityId, EntityKind, LanguageCode, PrincipalId};
use lingo_i18n::Language;
use lingo_store::{
    AuditContext, ConsentFlags, ConsentMethod, ConsentStore, ConsentUpdate, EntityStore, LanguageStore,
    NewEntity, SqliteStore, StoreError, TranslationStore, UpsertOutcome,
};
use lingo_config::DatabaseConfig;
use serde_json::json;
use tempfile::TempDir;

fn code(tag: &str) -> LanguageCode {
    LanguageCode::parse(tag).unwrap()
}

async fn seeded_store() -> SqliteStore {
    init_test_logging();
    let store = SqliteStore::in_memory().await.expect("in-memory store");
    seed(&store).await;
    store
}

/// A WAL database file with a multi-connection pool.
async fn file_store(dir: &TempDir) -> SqliteStore {
    init_test_logging();
    let config = DatabaseConfig {
        url: format!("sqlite://{}", dir.path().join("lingo.db").display()),
        max_connections: 8,
    };
    let store = SqliteStore::connect(&config).await.expect("file store");
    seed(&store).await;
    store
}

async fn seed(store: &SqliteStore) {
    let languages = vec![
        Language::new(code("en"), "English"),
        Language::new(code("ja"), "日本語"),
        Language::new(code("zh-TW"), "繁體中文"),
    ];
    store.seed_languages(&languages).await.unwrap();
}

async fn create_property(store: &SqliteStore) -> EntityId {
    store
        .create_entity(NewEntity {
            kind: EntityKind::Property,
            owner: PrincipalId::new("agent-7").unwrap(),
            attributes: json!({ "rent": 85000 }),
            source_language: code("en"),
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn upsert_is_idempotent() {
    let store = seeded_store().await;
    let id = create_property(&store).await;
    let fields = text_fields(&[("title", "こんにちは")]);

    let first = store.upsert_translation(id, &code("ja"), &fields, 1).await.unwrap();
    let after_first = store.get_translation(id, &code("ja")).await.unwrap().unwrap();

    let second = store.upsert_translation(id, &code("ja"), &fields, 1).await.unwrap();
    let after_second = store.get_translation(id, &code("ja")).await.unwrap().unwrap();

    assert_eq!(first, UpsertOutcome::Inserted);
    assert_eq!(second, UpsertOutcome::Unchanged);
    assert_eq!(after_first, after_second);
    assert_eq!(store.list_translations(id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn upsert_replaces_content_at_same_or_newer_revision() {
    let store = seeded_store().await;
    let id = create_property(&store).await;

    store
        .upsert_translation(id, &code("ja"), &text_fields(&[("title", "古い")]), 1)
        .await
        .unwrap();
    let outcome = store
        .upsert_translation(id, &code("ja"), &text_fields(&[("title", "新しい")]), 1)
        .await
        .unwrap();
    assert_eq!(outcome, UpsertOutcome::Updated);

    let outcome = store
        .upsert_translation(id, &code("ja"), &text_fields(&[("title", "最新")]), 2)
        .await
        .unwrap();
    assert_eq!(outcome, UpsertOutcome::Updated);

    let row = store.get_translation(id, &code("ja")).await.unwrap().unwrap();
    assert_eq!(row.fields["title"], "最新");
    assert_eq!(row.source_revision, 2);
}

#[tokio::test]
async fn upsert_from_older_revision_is_ignored() {
    let store = seeded_store().await;
    let id = create_property(&store).await;

    store
        .upsert_translation(id, &code("ja"), &text_fields(&[("title", "v3")]), 3)
        .await
        .unwrap();
    let outcome = store
        .upsert_translation(id, &code("ja"), &text_fields(&[("title", "v2")]), 2)
        .await
        .unwrap();

    assert_eq!(outcome, UpsertOutcome::Stale);
    assert!(!outcome.is_current());
    let row = store.get_translation(id, &code("ja")).await.unwrap().unwrap();
    assert_eq!(row.fields["title"], "v3");
}

#[tokio::test]
async fn concurrent_upserts_leave_exactly_one_row() {
    let store = seeded_store().await;
    let id = create_property(&store).await;
    let texts = ["こんにちは", "やあ", "どうも", "もしもし"];

    let writes = texts.iter().map(|text| {
        let store = store.clone();
        let fields = text_fields(&[("title", *text)]);
        tokio::spawn(async move { store.upsert_translation(id, &code("ja"), &fields, 1).await })
    });
    for result in join_all(writes).await {
        result.unwrap().unwrap();
    }

    let rows = store.list_translations(id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert!(texts.contains(&rows[0].fields["title"].as_str()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_upserts_across_connections_leave_exactly_one_row() {
    let dir = TempDir::new().unwrap();
    let store = file_store(&dir).await;
    let id = create_property(&store).await;
    let texts: Vec<String> = (0..24).map(|n| format!("翻訳 {n}")).collect();

    let writes = texts.iter().enumerate().map(|(n, text)| {
        let store = store.clone();
        let fields = text_fields(&[("title", text.as_str())]);
        let language = if n % 2 == 0 { "ja" } else { "zh-TW" };
        tokio::spawn(async move { store.upsert_translation(id, &code(language), &fields, 1).await })
    });
    let outcomes: Vec<UpsertOutcome> = join_all(writes)
        .await
        .into_iter()
        .map(|result| result.unwrap().unwrap())
        .collect();

    let inserted = outcomes.iter().filter(|o| **o == UpsertOutcome::Inserted).count();
    assert_eq!(inserted, 2);

    let rows = store.list_translations(id).await.unwrap();
    assert_eq!(rows.len(), 2);
    for row in &rows {
        assert!(texts.contains(&row.fields["title"]));
    }
    store.close().await;
}

#[tokio::test]
async fn deleting_entity_cascades_to_translations() {
    let store = seeded_store().await;
    let id = create_property(&store).await;
    let other = create_property(&store).await;

    for language in ["en", "ja", "zh-TW"] {
        store
            .upsert_translation(id, &code(language), &text_fields(&[("title", language)]), 1)
            .await
            .unwrap();
    }
    store
        .upsert_translation(other, &code("en"), &text_fields(&[("title", "keep")]), 1)
        .await
        .unwrap();

    assert!(store.delete_entity(id).await.unwrap());
    assert!(store.list_translations(id).await.unwrap().is_empty());
    assert_eq!(store.list_translations(other).await.unwrap().len(), 1);
}

#[tokio::test]
async fn delete_translations_for_entity_reports_count() {
    let store = seeded_store().await;
    let id = create_property(&store).await;
    for language in ["en", "ja"] {
        store
            .upsert_translation(id, &code(language), &text_fields(&[("title", language)]), 1)
            .await
            .unwrap();
    }

    assert_eq!(store.delete_translations_for_entity(id).await.unwrap(), 2);
    assert_eq!(store.delete_translations_for_entity(id).await.unwrap(), 0);
    assert!(store.get_entity(id).await.unwrap().is_some());
}

#[tokio::test]
async fn upsert_for_deleted_entity_reports_entity_missing() {
    let store = seeded_store().await;
    let id = create_property(&store).await;
    store.delete_entity(id).await.unwrap();

    let err = store
        .upsert_translation(id, &code("ja"), &text_fields(&[("title", "遅い")]), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::EntityMissing(missing) if missing == id));
}

#[tokio::test]
async fn upsert_for_unknown_language_is_rejected() {
    let store = seeded_store().await;
    let id = create_property(&store).await;

    let err = store
        .upsert_translation(id, &code("ko"), &text_fields(&[("title", "안녕")]), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::UnknownLanguage(language) if language == "ko"));
}

#[tokio::test]
async fn retire_language_marks_unsupported_and_removes_rows() {
    let store = seeded_store().await;
    let id = create_property(&store).await;
    for language in ["en", "ja"] {
        store
            .upsert_translation(id, &code(language), &text_fields(&[("title", language)]), 1)
            .await
            .unwrap();
    }

    assert_eq!(store.retire_language(&code("ja")).await.unwrap(), 1);

    let languages = store.list_languages().await.unwrap();
    let ja = languages.iter().find(|l| l.code == code("ja")).unwrap();
    assert!(!ja.supported);
    assert!(store.get_translation(id, &code("ja")).await.unwrap().is_none());
    assert!(store.get_translation(id, &code("en")).await.unwrap().is_some());

    assert!(matches!(
        store.retire_language(&code("fr")).await,
        Err(StoreError::UnknownLanguage(_))
    ));
}

#[tokio::test]
async fn upsert_after_retirement_writes_nothing() {
    let store = seeded_store().await;
    let id = create_property(&store).await;
    store.retire_language(&code("ja")).await.unwrap();

    let outcome = store
        .upsert_translation(id, &code("ja"), &text_fields(&[("title", "遅い")]), 1)
        .await
        .unwrap();

    assert_eq!(outcome, UpsertOutcome::LanguageRetired);
    assert!(!outcome.is_current());
    assert!(store.get_translation(id, &code("ja")).await.unwrap().is_none());
    assert!(store.list_translations(id).await.unwrap().is_empty());
}

#[tokio::test]
async fn seeding_twice_refreshes_rows() {
    let store = seeded_store().await;
    let mut arabic = Language::new(code("ar"), "Arabic");
    arabic.rtl = true;
    store.seed_languages(&[arabic.clone()]).await.unwrap();

    arabic.display_name = "العربية".to_string();
    store.seed_languages(&[arabic]).await.unwrap();

    let languages = store.list_languages().await.unwrap();
    assert_eq!(languages.len(), 4);
    let ar = languages.iter().find(|l| l.code == code("ar")).unwrap();
    assert_eq!(ar.display_name, "العربية");
    assert!(ar.rtl);
}

fn consent(marketing: bool, version: &str) -> ConsentUpdate {
    ConsentUpdate {
        flags: ConsentFlags {
            terms_of_service: true,
            privacy_policy: true,
            data_processing: true,
            marketing,
            ..ConsentFlags::default()
        },
        policy_version: version.to_string(),
    }
}

#[tokio::test]
async fn consent_mutations_append_history() {
    let store = seeded_store().await;
    let principal = PrincipalId::new("user-42").unwrap();
    let audit = AuditContext {
        ip_address: Some("203.0.113.9".to_string()),
        user_agent: Some("lingo-test".to_string()),
        method: ConsentMethod::Onboarding,
    };

    let first = store.record_consent(&principal, &consent(true, "2026-01"), &audit).await.unwrap();
    assert_eq!(first.revision, 1);

    let second = store
        .record_consent(
            &principal,
            &consent(false, "2026-02"),
            &AuditContext {
                method: ConsentMethod::Settings,
                ..audit.clone()
            },
        )
        .await
        .unwrap();
    assert_eq!(second.revision, 2);
    assert!(!second.flags.marketing);

    let current = store.get_consent(&principal).await.unwrap().unwrap();
    assert_eq!(current, second);

    let history = store.consent_history(&principal).await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[0].flags.marketing);
    assert_eq!(history[0].method, ConsentMethod::Onboarding);
    assert_eq!(history[1].policy_version, "2026-02");
    assert!(history[0].id < history[1].id);

    let stranger = PrincipalId::new("nobody").unwrap();
    assert!(store.get_consent(&stranger).await.unwrap().is_none());
    assert!(store.consent_history(&stranger).await.unwrap().is_empty());
}

#[tokio::test]
async fn consent_history_rejects_update_and_delete() {
    let store = seeded_store().await;
    let principal = PrincipalId::new("user-43").unwrap();
    store
        .record_consent(&principal, &consent(true, "2026-01"), &AuditContext::default())
        .await
        .unwrap();

    let update = sqlx::query("UPDATE consent_history SET marketing = 0")
        .execute(store.pool())
        .await
        .unwrap_err();
    assert!(update.to_string().contains("append-only"));

    let delete = sqlx::query("DELETE FROM consent_history")
        .execute(store.pool())
        .await
        .unwrap_err();
    assert!(delete.to_string().contains("append-only"));

    assert_eq!(store.consent_history(&principal).await.unwrap().len(), 1);
}
