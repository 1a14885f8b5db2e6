use fruitcrushtui::store::{JsonFileStore, MemoryStore, ProgressionStore};
use fruitcrushtui::{EngineConfig, MatchEngine, Player, PowerUpKind, ShopItem};
use std::fs;
use std::path::PathBuf;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("fruitcrushtui-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

#[test]
fn json_store_round_trip() {
    let dir = scratch_dir("round-trip");
    let mut store = JsonFileStore::new(dir.join("nested/player.json"));

    let config = EngineConfig {
        seed: Some(1),
        ..EngineConfig::default()
    };
    let mut engine = MatchEngine::new(config, store.load().unwrap());
    engine.buy(ShopItem::Bomb).unwrap_err();
    engine.buy(ShopItem::Hammer).unwrap();
    store.save(&engine.snapshot()).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded, engine.snapshot());
    assert_eq!(loaded.coins, 0);
    assert_eq!(loaded.power_ups.count(PowerUpKind::Hammer), 4);

    let text = fs::read_to_string(store.path()).unwrap();
    assert!(text.contains("\"totalScore\""));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn corrupt_file_loads_as_new_player() {
    let dir = scratch_dir("corrupt");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("player.json");
    fs::write(&path, "{ not json").unwrap();

    let store = JsonFileStore::new(&path);
    assert!(store.load().is_err());
    assert_eq!(store.load_or_default(), Player::default());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn memory_store_keeps_last_snapshot() {
    let mut player = Player::default();
    player.level = 7;
    let mut store = MemoryStore::with_player(player);
    let engine = MatchEngine::new(EngineConfig::default(), store.load_or_default());
    assert_eq!(engine.session().level, 7);
    assert_eq!(engine.session().target_score, 4000);

    store.save(&engine.snapshot()).unwrap();
    assert_eq!(store.saves(), 1);
    assert_eq!(store.load().unwrap().level, 7);
}
