use super::*;
use pretty_assertions::assert_eq;

#[test]
fn default_config_is_valid() {
    assert_eq!(Config::default().validate(), Ok(()));
}

#[test]
fn builder_rejects_negative_tolerance() {
    let err = Config::builder().tolerances(-1.0, 0.0).build().unwrap_err();
    assert_eq!(
        err,
        ConfigError::NegativeTolerance {
            name: "atol",
            value: -1.0
        }
    );
}

#[test]
fn builder_rejects_nan_tolerance() {
    let err = Config::builder()
        .tolerances(0.0, f64::NAN)
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigError::NonFiniteTolerance { name: "rtol", .. }
    ));
}

#[test]
fn builder_rejects_verbosity_out_of_range() {
    let err = Config::builder().verbosity(3).build().unwrap_err();
    assert_eq!(err, ConfigError::VerbosityOutOfRange(3));
}

#[test]
fn builder_rejects_empty_marker() {
    let err = Config::builder()
        .stopwords(["plt.", "  "])
        .build()
        .unwrap_err();
    assert_eq!(err, ConfigError::EmptyMarker { set: "stopwords" });
}

#[test]
fn skip_is_not_a_default_flag() {
    let err = Config::builder()
        .option_flags(OptionFlags::ELLIPSIS | OptionFlags::SKIP)
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::SkipInDefaults { .. }));
}

#[test]
fn tolerance_bound_scales_with_want() {
    let config = Config::builder().tolerances(0.001, 0.01).build().unwrap();
    let bound = config.tolerance_for(-2.0);
    assert!((bound - 0.021).abs() < 1e-12);
}

#[test]
fn resources_and_skip_list_lookup() {
    let config = Config::builder()
        .skip("pkg.broken")
        .local_resource("pkg.io", "data.csv")
        .build()
        .unwrap();
    assert!(config.is_skipped("pkg.broken"));
    assert!(!config.is_skipped("pkg.fine"));
    assert_eq!(config.resources_for("pkg.io"), &[PathBuf::from("data.csv")]);
    assert!(config.resources_for("pkg.other").is_empty());
}

#[test]
fn strategy_parses_from_cli_names() {
    assert_eq!("all".parse::<Strategy>(), Ok(Strategy::All));
    assert_eq!("api".parse::<Strategy>(), Ok(Strategy::PublicApi));
    assert_eq!(
        "everything".parse::<Strategy>(),
        Err(ConfigError::UnknownStrategy("everything".to_string()))
    );
}
