use particle_engine::{config::DEFAULT_MAX_CONTACTS, LevelBounds, ParticleWorld, Vec2, WorldConfig};

#[test]
fn config_loads_from_partial_json() {
    let json = r#"{
        "pool_size": 10,
        "level_bounds": { "min": [-5.0, -5.0], "max": [5.0, 5.0] },
        "frame_budget_ms": 16.0
    }"#;

    let config: WorldConfig = serde_json::from_str(json).unwrap();

    assert_eq!(config.pool_size, 10);
    assert_eq!(config.max_contacts, DEFAULT_MAX_CONTACTS);
    assert_eq!(config.level_bounds, LevelBounds::from_half_extents(Vec2::splat(5.0)));
    assert_eq!(config.frame_budget_ms, Some(16.0));
    assert!(config.auto_iterations());
}

#[test]
fn config_round_trips_through_json() {
    let config = WorldConfig::default()
        .with_pool_size(42)
        .with_resolver_iterations(7)
        .with_parallel(true);

    let json = serde_json::to_string(&config).unwrap();
    let restored: WorldConfig = serde_json::from_str(&json).unwrap();

    assert_eq!(restored, config);
}

#[test]
fn world_applies_sanitized_config() {
    let world = ParticleWorld::new(
        WorldConfig::default()
            .with_pool_size(0)
            .with_max_contacts(0)
            .with_resolver_iterations(3),
    );

    assert_eq!(world.pool_size(), 1);
    assert_eq!(world.max_contacts(), 1);
    assert_eq!(world.resolver().iterations(), 3);
    assert!(!world.resolver().is_auto());
}
