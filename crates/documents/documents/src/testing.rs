use chrono::{DateTime, Duration, SubsecRound, Utc};
use vellum_core::{
    AuditInfo, Document, DOCUMENT_TYPE_PDF, Identifier, SaveKind, Visibility, pre_save,
};

use crate::error::DocumentStoreError;
use crate::store::DocumentStore;

/// Current time at the microsecond precision every backend can store.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn new_document(title: &str) -> Document {
    let mut document = Document::from_parts(
        Identifier::generate(),
        title.to_owned(),
        format!("{title} description"),
        format!("https://conformance.s3.amazonaws.com/documents/{title}.pdf"),
        DOCUMENT_TYPE_PDF.to_owned(),
        AuditInfo::new(now()),
    );
    pre_save(&mut document, SaveKind::Insert, now());
    document
}

/// Run the full document store conformance test suite.
///
/// Call this from your backend's test module with a fresh store instance.
///
/// # Errors
///
/// Returns an error if a store operation fails unexpectedly.
pub async fn run_store_conformance_tests(store: &dyn DocumentStore) -> Result<(), DocumentStoreError> {
    test_find_missing(store).await?;
    test_insert_is_immediately_readable(store).await?;
    test_insert_duplicate(store).await?;
    test_update(store).await?;
    test_soft_delete_hides_row(store).await?;
    test_soft_delete_is_idempotent(store).await?;
    test_soft_delete_missing(store).await?;
    test_update_deleted_row(store).await?;
    test_list_order_and_visibility(store).await?;
    Ok(())
}

async fn test_find_missing(store: &dyn DocumentStore) -> Result<(), DocumentStoreError> {
    let found = store
        .find(Identifier::generate(), Visibility::IncludeDeleted)
        .await?;
    assert!(found.is_none(), "find on a missing id should return None");
    Ok(())
}

async fn test_insert_is_immediately_readable(
    store: &dyn DocumentStore,
) -> Result<(), DocumentStoreError> {
    let document = new_document("insert-read");
    store.insert(&document).await?;

    let found = store.find(document.id(), Visibility::Active).await?;
    assert_eq!(found.as_ref(), Some(&document), "row should read back as written");
    let found = found.unwrap_or(document);
    assert!(!found.is_deleted());
    assert!(found.last_modification_time().is_none());
    Ok(())
}

async fn test_insert_duplicate(store: &dyn DocumentStore) -> Result<(), DocumentStoreError> {
    let document = new_document("duplicate");
    store.insert(&document).await?;
    let result = store.insert(&document).await;
    assert!(
        matches!(result, Err(DocumentStoreError::Duplicate(id)) if id == document.id()),
        "second insert with the same id should fail as a duplicate, got {result:?}"
    );
    Ok(())
}

async fn test_update(store: &dyn DocumentStore) -> Result<(), DocumentStoreError> {
    let mut document = new_document("update");
    store.insert(&document).await?;

    document.title = "updated title".to_owned();
    document.description = String::new();
    let modified = document.creation_time() + Duration::seconds(1);
    pre_save(&mut document, SaveKind::Update, modified);
    assert!(store.update(&document).await?, "update of a visible row should apply");

    let found = store.find(document.id(), Visibility::Active).await?;
    let found = found.ok_or_else(|| DocumentStoreError::Backend("updated row vanished".into()))?;
    assert_eq!(found.title, "updated title");
    assert_eq!(found.description, "");
    assert_eq!(found.creation_time(), document.creation_time());
    assert_eq!(found.last_modification_time(), Some(modified));
    Ok(())
}

async fn test_soft_delete_hides_row(store: &dyn DocumentStore) -> Result<(), DocumentStoreError> {
    let document = new_document("soft-delete");
    store.insert(&document).await?;

    let at = now();
    let deleted = store.soft_delete(document.id(), at).await?;
    let deleted = deleted.ok_or_else(|| DocumentStoreError::Backend("deleted row missing".into()))?;
    assert!(deleted.is_deleted());
    assert_eq!(deleted.deletion_time(), Some(at));
    assert_eq!(deleted.last_modification_time(), None);

    assert!(
        store.find(document.id(), Visibility::Active).await?.is_none(),
        "soft-deleted row must be hidden from default reads"
    );
    let admin = store.find(document.id(), Visibility::IncludeDeleted).await?;
    let admin = admin.ok_or_else(|| DocumentStoreError::Backend("admin read missed row".into()))?;
    assert!(admin.is_deleted());
    assert_eq!(admin.is_deleted(), admin.deletion_time().is_some());
    Ok(())
}

async fn test_soft_delete_is_idempotent(
    store: &dyn DocumentStore,
) -> Result<(), DocumentStoreError> {
    let document = new_document("soft-delete-twice");
    store.insert(&document).await?;

    let first = now();
    store.soft_delete(document.id(), first).await?;
    let again = store
        .soft_delete(document.id(), first + Duration::seconds(10))
        .await?;
    let again = again.ok_or_else(|| DocumentStoreError::Backend("deleted row missing".into()))?;
    assert_eq!(
        again.deletion_time(),
        Some(first),
        "repeated soft delete must keep the first deletion time"
    );
    Ok(())
}

async fn test_soft_delete_missing(store: &dyn DocumentStore) -> Result<(), DocumentStoreError> {
    let result = store.soft_delete(Identifier::generate(), now()).await?;
    assert!(result.is_none(), "soft delete of a missing id should return None");
    Ok(())
}

async fn test_update_deleted_row(store: &dyn DocumentStore) -> Result<(), DocumentStoreError> {
    let mut document = new_document("update-deleted");
    store.insert(&document).await?;
    store.soft_delete(document.id(), now()).await?;

    document.title = "too late".to_owned();
    pre_save(&mut document, SaveKind::Update, now());
    assert!(
        !store.update(&document).await?,
        "update of a soft-deleted row should not apply"
    );
    let admin = store.find(document.id(), Visibility::IncludeDeleted).await?;
    assert_ne!(admin.map(|d| d.title), Some("too late".to_owned()));
    Ok(())
}

async fn test_list_order_and_visibility(
    store: &dyn DocumentStore,
) -> Result<(), DocumentStoreError> {
    let first = new_document("list-1");
    let second = new_document("list-2");
    let third = new_document("list-3");
    // Insert out of order; listing must still follow identifier order.
    store.insert(&third).await?;
    store.insert(&first).await?;
    store.insert(&second).await?;
    store.soft_delete(second.id(), now()).await?;

    let visible = store.list(Visibility::Active).await?;
    let ids: Vec<_> = visible.iter().map(Document::id).collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]), "list must be ordered by id");
    assert!(visible.iter().all(|d| !d.is_deleted()));
    assert!(ids.contains(&first.id()) && ids.contains(&third.id()));
    assert!(!ids.contains(&second.id()));

    let all = store.list(Visibility::IncludeDeleted).await?;
    let all_ids: Vec<_> = all.iter().map(Document::id).collect();
    assert!(all_ids.windows(2).all(|w| w[0] < w[1]));
    assert!(all_ids.contains(&second.id()));
    Ok(())
}
