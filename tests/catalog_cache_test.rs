//! Integration tests for the catalog client's response cache.
//!
//! These run on a paused tokio clock so the five minute window can be
//! crossed without sleeping.

use pokedex_kit::{
    CatalogClient, CountingMetrics, Error, InMemoryBackend, InMemoryTransport, RequestKey,
};
use std::sync::Arc;
use std::time::Duration;

const PIKACHU: &str = r#"{
    "id": 25,
    "name": "pikachu",
    "base_experience": 112,
    "height": 4,
    "weight": 60,
    "sprites": { "front_default": "https://img/25.png" },
    "stats": [
        { "base_stat": 35, "effort": 0, "stat": { "name": "hp", "url": "" } },
        { "base_stat": 90, "effort": 2, "stat": { "name": "speed", "url": "" } }
    ],
    "types": [
        { "slot": 1, "type": { "name": "electric", "url": "" } }
    ]
}"#;

fn setup() -> (CatalogClient<InMemoryTransport>, InMemoryTransport) {
    let _ = env_logger::builder().is_test(true).try_init();

    let transport = InMemoryTransport::new().with_catalog_size(1000);
    transport.insert_json("/pokemon/25", PIKACHU);
    let client = CatalogClient::new(transport.clone(), InMemoryBackend::new());
    (client, transport)
}

#[tokio::test(start_paused = true)]
async fn test_repeat_within_window_issues_one_request() {
    let (client, transport) = setup();

    let first = client.get_by_id(25).await.unwrap();
    tokio::time::advance(Duration::from_secs(299)).await;
    let second = client.get_by_id(25).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.primary_type(), "electric");
    assert_eq!(first.base_stat("speed"), Some(90));
    assert_eq!(transport.hits("/pokemon/25"), 1);
}

#[tokio::test]
async fn test_artwork_survives_the_cache() {
    use pokedex_kit::model::{FrontSprites, SpriteVariants};

    let (client, transport) = setup();
    transport.insert_json(
        "/pokemon/6",
        r#"{
            "id": 6,
            "name": "charizard",
            "sprites": {
                "front_default": null,
                "other": {
                    "official-artwork": { "front_default": "https://img/6.png", "front_shiny": null },
                    "home": { "front_default": "https://img/home/6.png" }
                }
            }
        }"#,
    );

    client.get_by_id(6).await.unwrap();
    let cached = client.get_by_id(6).await.unwrap();

    let expected = SpriteVariants {
        dream_world: None,
        home: Some(FrontSprites {
            front_default: Some("https://img/home/6.png".to_string()),
            front_shiny: None,
        }),
        official_artwork: Some(FrontSprites {
            front_default: Some("https://img/6.png".to_string()),
            front_shiny: None,
        }),
    };
    assert_eq!(cached.sprites.other, expected);
    assert_eq!(transport.hits("/pokemon/6"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_call_after_window_refetches_and_overwrites() {
    let (client, transport) = setup();

    let first = client.get_by_id(25).await.unwrap();
    assert_eq!(first.weight, 60);

    transport.insert_json(
        "/pokemon/25",
        PIKACHU.replace(r#""weight": 60"#, r#""weight": 61"#),
    );
    tokio::time::advance(Duration::from_secs(300)).await;

    let refreshed = client.get_by_id(25).await.unwrap();
    assert_eq!(refreshed.weight, 61);
    assert_eq!(transport.hits("/pokemon/25"), 2);

    // The overwrite starts a new window.
    tokio::time::advance(Duration::from_secs(100)).await;
    assert_eq!(client.get_by_id(25).await.unwrap().weight, 61);
    assert_eq!(transport.hits("/pokemon/25"), 2);
}

#[tokio::test]
async fn test_clear_cache_forces_refetch() {
    let (client, transport) = setup();

    client.get_by_id(25).await.unwrap();
    client.list_page(0, 20).await.unwrap();
    assert_eq!(transport.total_requests(), 2);

    client.clear_cache().await;
    assert!(client.backend().is_empty());

    client.get_by_id(25).await.unwrap();
    client.list_page(0, 20).await.unwrap();
    assert_eq!(transport.total_requests(), 4);
}

#[tokio::test]
async fn test_not_found_is_not_cached() {
    let (client, transport) = setup();

    for _ in 0..2 {
        let err = client.get_by_id(99999).await.unwrap_err();
        assert!(err.as_fetch().is_some_and(|f| f.is_not_found()));
    }

    assert_eq!(transport.hits("/pokemon/99999"), 2);
    assert!(client.backend().is_empty());
}

#[tokio::test]
async fn test_transport_failure_is_not_cached() {
    let (client, transport) = setup();
    transport.insert_transport_error("/pokemon-species/25", "connection reset");

    assert!(matches!(
        client.get_species_by_id(25).await,
        Err(Error::Fetch(_))
    ));
    assert!(client.get_pokemon_with_details(25).await.is_err());
    assert_eq!(transport.hits("/pokemon-species/25"), 2);
}

#[tokio::test]
async fn test_id_and_name_lookups_are_cached_separately() {
    let (client, transport) = setup();
    transport.insert_json("/pokemon/pikachu", PIKACHU);

    client.get_by_id(25).await.unwrap();
    client.get_by_name("Pikachu").await.unwrap();
    client.get_by_name("pikachu").await.unwrap();

    assert_eq!(transport.hits("/pokemon/25"), 1);
    assert_eq!(transport.hits("/pokemon/pikachu"), 1);
    assert_eq!(client.backend().len(), 2);
}

#[tokio::test]
async fn test_metrics_see_hits_and_misses() {
    let (client, _transport) = setup();
    let metrics = CountingMetrics::default();
    let client = client.with_metrics(Arc::new(metrics.clone()));

    client.get_by_id(25).await.unwrap();
    client.get_by_id(25).await.unwrap();
    let _ = client.get_by_id(404).await;

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.hits, 1);
    assert_eq!(snapshot.misses, 2);
    assert_eq!(snapshot.fetches, 1);
    assert_eq!(snapshot.errors, 1);
}

#[tokio::test]
async fn test_entries_live_under_request_keys() {
    use pokedex_kit::CacheBackend;

    let (client, _transport) = setup();
    client.get_by_id(25).await.unwrap();
    client.list_page(40, 20).await.unwrap();

    let backend = client.backend();
    assert!(backend
        .get(&RequestKey::PokemonById(25).build())
        .await
        .unwrap()
        .is_some());
    assert!(backend
        .get(&RequestKey::List { offset: 40, limit: 20 }.build())
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_evolution_stages_for_species() {
    let (client, transport) = setup();
    transport.insert_json(
        "/pokemon-species/1",
        r#"{
            "id": 1,
            "name": "bulbasaur",
            "evolution_chain": { "url": "https://pokeapi.co/api/v2/evolution-chain/1/" }
        }"#,
    );
    transport.insert_json(
        "/evolution-chain/1",
        r#"{
            "id": 1,
            "chain": {
                "is_baby": false,
                "species": { "name": "bulbasaur", "url": "https://pokeapi.co/api/v2/pokemon-species/1/" },
                "evolution_details": [],
                "evolves_to": [{
                    "is_baby": false,
                    "species": { "name": "ivysaur", "url": "https://pokeapi.co/api/v2/pokemon-species/2/" },
                    "evolution_details": [{ "min_level": 16, "trigger": { "name": "level-up", "url": "" } }],
                    "evolves_to": [{
                        "is_baby": false,
                        "species": { "name": "venusaur", "url": "https://pokeapi.co/api/v2/pokemon-species/3/" },
                        "evolution_details": [{ "min_level": 32, "trigger": { "name": "level-up", "url": "" } }],
                        "evolves_to": []
                    }]
                }]
            }
        }"#,
    );

    let stages = client.get_evolution_stages_for_species(1).await.unwrap();
    let summary: Vec<(u32, Option<u32>)> = stages.iter().map(|s| (s.id, s.min_level)).collect();
    assert_eq!(summary, vec![(1, None), (2, Some(16)), (3, Some(32))]);

    client.get_evolution_stages(1).await.unwrap();
    assert_eq!(transport.hits("/evolution-chain/1"), 1);
}

#[tokio::test]
async fn test_pokemon_by_ids_drops_failures_in_order() {
    let (client, transport) = setup();
    transport.insert_json("/pokemon/1", r#"{"id":1,"name":"bulbasaur"}"#);
    transport.insert_json("/pokemon/4", r#"{"id":4,"name":"charmander"}"#);

    let found = client.get_pokemon_by_ids(&[4, 77777, 1, 25]).await;
    let ids: Vec<u32> = found.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![4, 1, 25]);
}
