//! Note lifecycle through the public service API, backed by the in-memory store.

use std::sync::Arc;

use notes_core::{InMemoryStore, Note, NoteError, NoteService};

fn service() -> NoteService {
    NoteService::new(Arc::new(InMemoryStore::new()))
}

#[tokio::test]
async fn create_then_repeat_keeps_first_write() {
    let service = service();
    let payload = br#"{"id":"n1","title":"Hi","body":"Hello"}"#;

    let created = service.create_note(payload).await.unwrap();
    assert_eq!(created.id, "n1");

    let err = service.create_note(payload).await.unwrap_err();
    assert!(matches!(err, NoteError::Conflict(_)));

    let stored = service.get_note("n1").await.unwrap();
    assert_eq!(stored.title.as_deref(), Some("Hi"));
}

#[tokio::test]
async fn full_lifecycle() {
    let service = service();

    service
        .create_note(br#"{"id":"n1","title":"Hi","body":"Hello"}"#)
        .await
        .unwrap();
    service
        .create_note(br#"{"id":"n2","title":"Second"}"#)
        .await
        .unwrap();

    // Partial update leaves the other field alone
    let updated = service
        .update_note("n2", br#"{"body":"Now with a body"}"#)
        .await
        .unwrap();
    assert_eq!(
        updated,
        Note::new("n2", Some("Second".into()), Some("Now with a body".into()))
    );

    let page = service.list_notes(None, None).await.unwrap();
    let ids: Vec<_> = page.notes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, ["n1", "n2"]);

    service.delete_note("n1").await.unwrap();
    assert!(matches!(
        service.get_note("n1").await.unwrap_err(),
        NoteError::NotFound(_)
    ));
    assert!(matches!(
        service.delete_note("n1").await.unwrap_err(),
        NoteError::NotFound(_)
    ));

    let page = service.list_notes(None, None).await.unwrap();
    assert_eq!(page.notes.len(), 1);
}

#[tokio::test]
async fn racing_creates_through_the_service() {
    let service = service();

    let attempts = (0..8).map(|i| {
        let service = service.clone();
        tokio::spawn(async move {
            let payload = format!(r#"{{"id":"same","title":"attempt {}"}}"#, i);
            service.create_note(payload.as_bytes()).await
        })
    });

    let mut created = 0;
    for attempt in attempts.collect::<Vec<_>>() {
        if attempt.await.unwrap().is_ok() {
            created += 1;
        }
    }
    assert_eq!(created, 1);
}
