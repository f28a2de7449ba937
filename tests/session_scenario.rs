//! Session Integration Tests
//!
//! Drives a session through a full lending cycle and checks both the
//! responses and the events it reports.

use shelfmark::core::{Action, Catalog, CatalogStore, MemorySink, Request, Response, Session};
use shelfmark::domain::{EventKind, ItemStatus};
use tempfile::TempDir;

fn add(title: &str, author: &str, key: &str) -> Request {
    Request::AddItem {
        title: title.to_string(),
        author: author.to_string(),
        key: key.to_string(),
    }
}

fn issue(key: &str) -> Request {
    Request::IssueItem {
        key: key.to_string(),
    }
}

fn give_back(key: &str) -> Request {
    Request::ReturnItem {
        key: key.to_string(),
    }
}

#[tokio::test]
async fn test_lending_cycle() {
    let temp = TempDir::new().unwrap();
    let sink = MemorySink::new();
    let store = CatalogStore::new(temp.path().join("catalog.json"));
    let mut session = Session::new(Catalog::open(store, sink.clone()).await);
    assert!(session.catalog().is_empty());

    let response = session.handle(add("Dune", "Herbert", "ISBN1")).await.unwrap();
    assert!(matches!(response, Response::Added(_)));

    let response = session.handle(add("Dune2", "Herbert", "ISBN1")).await.unwrap();
    assert_eq!(
        response,
        Response::DuplicateKey {
            key: "ISBN1".to_string()
        }
    );
    assert_eq!(session.catalog().len(), 1);
    assert_eq!(session.catalog().find_by_key("ISBN1").unwrap().title(), "Dune");

    let Response::Issued(item) = session.handle(issue("ISBN1")).await.unwrap() else {
        panic!("Expected Issued");
    };
    assert_eq!(item.status(), ItemStatus::Issued);

    let response = session.handle(issue("ISBN1")).await.unwrap();
    assert!(matches!(
        response,
        Response::AlreadyInState {
            action: Action::Issue,
            ..
        }
    ));
    assert_eq!(
        session.catalog().find_by_key("ISBN1").unwrap().status(),
        ItemStatus::Issued
    );

    let Response::Returned(item) = session.handle(give_back("ISBN1")).await.unwrap() else {
        panic!("Expected Returned");
    };
    assert_eq!(item.status(), ItemStatus::Available);

    let Response::Items(found) = session
        .handle(Request::SearchByTitle {
            text: "dune".to_string(),
        })
        .await
        .unwrap()
    else {
        panic!("Expected Items");
    };
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].key(), "ISBN1");

    assert_eq!(session.handle(Request::Exit).await.unwrap(), Response::Closed);

    assert_eq!(
        sink.kinds()
            .into_iter()
            .filter(|k| !matches!(k, EventKind::CatalogSaved))
            .collect::<Vec<_>>(),
        vec![
            EventKind::CatalogMissing,
            EventKind::ItemAdded,
            EventKind::DuplicateKey,
            EventKind::ItemIssued,
            EventKind::AlreadyInState,
            EventKind::ItemReturned,
            EventKind::SessionClosed,
        ]
    );
}

#[tokio::test]
async fn test_adds_grow_catalog_one_at_a_time() {
    let temp = TempDir::new().unwrap();
    let store = CatalogStore::new(temp.path().join("catalog.json"));
    let mut session = Session::new(Catalog::open(store, MemorySink::new()).await);

    for n in 1..=5 {
        let key = format!("KEY{}", n);
        session
            .handle(add(&format!("Title {}", n), "Author", &key))
            .await
            .unwrap();

        assert_eq!(session.catalog().len(), n);
        assert_eq!(session.catalog().find_by_key(&key).unwrap().key(), key);
    }
}
