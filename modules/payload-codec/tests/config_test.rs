//! CodecConfig loading from disk and env.

use std::io::Write;

use payload_codec::{CodecConfig, PayloadInitiator, PayloadTransformer};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Heartbeat {
    node: String,
}

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn loads_dedicated_config_file() {
    let file = write_config("pretty = true\n");

    let config = CodecConfig::load(file.path()).unwrap();

    assert!(config.pretty);
}

#[test]
fn loads_codec_table_from_application_config() {
    let file = write_config(
        r#"
        [codec]
        pretty = false
        "#,
    );

    let config = CodecConfig::load(file.path()).unwrap();

    assert_eq!(config, CodecConfig::default());
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("codec.toml");

    let err = CodecConfig::load(&path).unwrap_err();

    assert!(format!("{err:#}").contains("codec.toml"));
}

#[test]
fn invalid_toml_is_an_error() {
    let file = write_config("pretty = ");

    assert!(CodecConfig::load(file.path()).is_err());
}

#[test]
fn env_flag_controls_pretty_output() {
    std::env::set_var("PAYLOAD_CODEC_PRETTY", "true");
    let config = CodecConfig::from_env().unwrap();
    std::env::remove_var("PAYLOAD_CODEC_PRETTY");
    assert!(config.pretty);

    let mut transformer = PayloadTransformer::with_config(config);
    transformer
        .register_payload("heartbeat", PayloadInitiator::of::<Heartbeat>())
        .unwrap();

    let (_, data) = transformer
        .convert_payload(&Heartbeat {
            node: "n1".into(),
        })
        .unwrap();
    assert!(String::from_utf8(data).unwrap().contains("\n  \"node\""));
}
