use drift_ecs::config::{ConfigError, GameConfig};

#[test]
fn defaults_are_valid() {
    let config = GameConfig::default();
    config.validate().unwrap();

    assert_eq!(config.runtime.fixed_step, 0.02);
    assert_eq!(config.runtime.max_fixed_steps, 8);
    assert_eq!(config.asteroid_spawner.count, 4);
    assert_eq!(config.asteroid_spawner.speed, [1.0, 3.0]);
    assert_eq!(config.ship.respawn_time, 5.0);
    assert_eq!(config.debris.amount, 4);
}

#[test]
fn partial_document_keeps_other_defaults() {
    let config = GameConfig::from_toml_str(
        r#"
        [runtime]
        fixed_step = 0.25

        [asteroid_spawner]
        count = 6
        speed = [0.5, 1.5]
        "#,
    )
    .unwrap();

    assert_eq!(config.runtime.fixed_step, 0.25);
    assert_eq!(config.runtime.max_fixed_steps, 8);
    assert_eq!(config.asteroid_spawner.count, 6);
    assert_eq!(config.asteroid_spawner.speed, [0.5, 1.5]);
    assert_eq!(config.asteroid_spawner.cooldown, 2.0);
    assert_eq!(config.ship, GameConfig::default().ship);
}

#[test]
fn empty_document_is_the_default() {
    assert_eq!(GameConfig::from_toml_str("").unwrap(), GameConfig::default());
}

#[test]
fn unknown_keys_are_rejected() {
    let err = GameConfig::from_toml_str("[ship]\nwarp_drive = true\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)), "{err}");
}

#[test]
fn out_of_range_values_are_rejected() {
    for source in [
        "[runtime]\nfixed_step = 0.0\n",
        "[runtime]\nmax_fixed_steps = 0\n",
        "[asteroid_spawner]\nspeed = [3.0, 1.0]\n",
        "[asteroid_spawner]\nsafe_area = [20.0, 2.0]\n",
        "[boundary]\nmin = [1.0, 1.0]\nmax = [1.0, 2.0]\n",
        "[bullet]\nlifetime = -1.0\n",
    ] {
        let err = GameConfig::from_toml_str(source).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "{source}: {err}");
    }
}

#[test]
fn loads_from_file() {
    let path = std::env::temp_dir().join(format!("drift_ecs_config_{}.toml", std::process::id()));
    std::fs::write(&path, "[debris]\namount = 2\n").unwrap();
    let config = GameConfig::load_from_file(&path);
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.unwrap().debris.amount, 2);
}

#[test]
fn missing_file_is_an_io_error() {
    let err = GameConfig::load_from_file("/definitely/not/here.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}
