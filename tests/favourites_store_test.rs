//! Integration tests for the SQLite favourites store.

use pokedex_kit::{DatabaseLocation, Error, FavouritesRepository, SqliteFavouritesStore};
use std::path::PathBuf;
use std::time::Duration;

async fn ready_store() -> SqliteFavouritesStore {
    let _ = env_logger::builder().is_test(true).try_init();

    let store = SqliteFavouritesStore::in_memory();
    store.initialize().await.unwrap();
    store
}

fn temp_db_path() -> PathBuf {
    std::env::temp_dir()
        .join(format!("pokedex-kit-{}", uuid::Uuid::now_v7()))
        .join("favourites.db")
}

#[tokio::test]
async fn test_exists_follows_add_and_remove() {
    let store = ready_store().await;

    assert!(!store.exists(1).await.unwrap());
    store.add(1, "bulbasaur", Some("url1")).await.unwrap();
    assert!(store.exists(1).await.unwrap());

    store.remove(1).await.unwrap();
    assert!(!store.exists(1).await.unwrap());

    // Removing an absent id is not an error.
    store.remove(1).await.unwrap();
    assert!(!store.exists(1).await.unwrap());
}

#[tokio::test]
async fn test_repeated_add_keeps_one_record() {
    let store = ready_store().await;

    store.add(1, "bulbasaur", Some("url1")).await.unwrap();
    store.add(1, "bulbasaur", Some("url1")).await.unwrap();

    let all = store.list_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, 1);
}

#[tokio::test]
async fn test_add_is_upsert_with_fresh_timestamp() {
    let store = ready_store().await;

    store.add(25, "pikachu", Some("old.png")).await.unwrap();
    let before = store.list_all().await.unwrap()[0].created_at;

    tokio::time::sleep(Duration::from_millis(5)).await;
    store.add(25, "pikachu-cosplay", Some("new.png")).await.unwrap();

    let all = store.list_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "pikachu-cosplay");
    assert_eq!(all[0].image_url, "new.png");
    assert!(all[0].created_at > before);
}

#[tokio::test]
async fn test_list_all_newest_first() {
    let store = ready_store().await;

    for (id, name) in [(1, "bulbasaur"), (4, "charmander"), (7, "squirtle")] {
        store.add(id, name, None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    // Re-adding moves an entry to the front.
    store.add(1, "bulbasaur", None).await.unwrap();

    let all = store.list_all().await.unwrap();
    let ids: Vec<u32> = all.iter().map(|f| f.id).collect();
    assert_eq!(ids, vec![1, 7, 4]);
    assert!(all.windows(2).all(|w| w[0].created_at >= w[1].created_at));
}

#[tokio::test]
async fn test_favourites_survive_reopen() {
    let path = temp_db_path();

    {
        let store = SqliteFavouritesStore::new(DatabaseLocation::File(path.clone()));
        store.initialize().await.unwrap();
        store.add(133, "eevee", Some("eevee.png")).await.unwrap();
        store.close().await;
    }

    let reopened = SqliteFavouritesStore::new(DatabaseLocation::File(path.clone()));
    reopened.initialize().await.unwrap();

    let all = reopened.list_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "eevee");
    assert_eq!(all[0].image_url, "eevee.png");

    reopened.close().await;
    if let Some(dir) = path.parent() {
        let _ = std::fs::remove_dir_all(dir);
    }
}

#[tokio::test]
async fn test_storage_failures_propagate_on_writes_only() {
    let store = ready_store().await;
    store.add(1, "bulbasaur", None).await.unwrap();

    store.close().await;

    assert!(matches!(store.add(4, "charmander", None).await, Err(Error::Storage(_))));
    assert!(matches!(store.remove(1).await, Err(Error::Storage(_))));
    assert!(!store.exists(1).await.unwrap());
    assert!(store.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_initialize_leaves_store_unready() {
    let blocker = temp_db_path();
    let parent = blocker.parent().unwrap().to_path_buf();
    std::fs::create_dir_all(&parent).unwrap();
    // A regular file where a directory is expected.
    std::fs::write(parent.join("not-a-dir"), b"").unwrap();

    let store = SqliteFavouritesStore::new(DatabaseLocation::File(
        parent.join("not-a-dir").join("favourites.db"),
    ));

    assert!(matches!(store.initialize().await, Err(Error::Storage(_))));
    assert!(!store.is_ready());
    assert!(matches!(store.exists(1).await, Err(Error::NotInitialized)));

    let _ = std::fs::remove_dir_all(parent);
}
