use series_catalog::{
    MemoryRepository,
    models::{Book, Series, SeriesInput},
    repository::{RepoError, Repository},
};
use uuid::Uuid;

fn input(name: &str, access_level: i32) -> SeriesInput {
    SeriesInput {
        name: name.to_string(),
        access_level,
    }
}

#[tokio::test]
async fn test_listing_sorts_byte_wise() {
    let repo = MemoryRepository::new();
    for name in ["beta", "Alpha", "alpha", "Zeta"] {
        repo.create_series(input(name, 0)).await.unwrap();
    }

    let names: Vec<String> = repo
        .list_series(0, None)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();

    // Uppercase sorts before lowercase, as with the "C" collation.
    assert_eq!(names, vec!["Alpha", "Zeta", "alpha", "beta"]);
}

#[tokio::test]
async fn test_name_filter_is_literal_not_a_pattern() {
    let repo = MemoryRepository::new();
    repo.create_series(input("100% Pure", 0)).await.unwrap();
    repo.create_series(input("Anything", 0)).await.unwrap();

    let hits = repo.list_series(0, Some("0%")).await.unwrap();
    assert_eq!(hits.len(), 1);

    let none = repo.list_series(0, Some(".*")).await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_name_filter_folds_ascii_case_only() {
    let repo = MemoryRepository::new();
    repo.create_series(input("Ångström Tales", 0)).await.unwrap();

    assert_eq!(repo.list_series(0, Some("åNGSTRöM")).await.unwrap().len(), 1);
    assert!(repo.list_series(0, Some("ÅNGSTRÖM")).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_assigns_fresh_ids() {
    let repo = MemoryRepository::new();
    let a = repo.create_series(input("Same", 0)).await.unwrap();
    let b = repo.create_series(input("Same", 0)).await.unwrap();

    // Names are not unique.
    assert_ne!(a.id, b.id);
}

#[tokio::test]
async fn test_blank_name_is_rejected() {
    let repo = MemoryRepository::new();

    let result = repo.create_series(input("  ", 0)).await;

    assert!(matches!(result, Err(RepoError::Rejected(_))));
}

#[tokio::test]
async fn test_update_and_delete_of_missing_series_are_not_found() {
    let repo = MemoryRepository::new();
    let ghost = Series {
        id: Uuid::new_v4(),
        name: "Ghost".to_string(),
        access_level: 0,
    };

    assert!(matches!(repo.update_series(&ghost).await, Err(RepoError::NotFound)));
    assert!(matches!(repo.delete_series(ghost.id).await, Err(RepoError::NotFound)));
    assert!(matches!(repo.get_series(ghost.id).await, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn test_rejecting_store_can_be_switched_back() {
    let repo = MemoryRepository::new_rejecting();
    assert!(repo.create_series(input("Dune", 0)).await.is_err());

    repo.set_reject_writes(false);
    assert!(repo.create_series(input("Dune", 0)).await.is_ok());
}

#[tokio::test]
async fn test_books_filtered_by_series_and_level_in_index_order() {
    let repo = MemoryRepository::new();
    let series = repo.create_series(input("Dune", 0)).await.unwrap();
    let other = repo.create_series(input("Other", 0)).await.unwrap();

    for (title, owner, index, level) in [
        ("Third", series.id, 3, 0),
        ("First", series.id, 1, 1),
        ("Secret", series.id, 2, 5),
        ("Elsewhere", other.id, 0, 0),
    ] {
        repo.create_book(Book {
            id: Uuid::new_v4(),
            title: title.to_string(),
            series_id: Some(owner),
            series_index: index,
            access_level: level,
        })
        .await
        .unwrap();
    }

    let titles: Vec<String> = repo
        .get_books_in_series(series.id, 1)
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.title)
        .collect();

    assert_eq!(titles, vec!["First", "Third"]);
}
