//! Integration tests for configuration system

use std::time::Duration;

use framecast_core::config::{
    sample_config, CaptureConfig, ConfigFile, DriveMode, SinkTarget, StreamFormat,
    DEFAULT_UDP_PORT,
};
use tempfile::TempDir;

#[test]
fn test_live_preset() {
    let config = CaptureConfig::live();
    assert_eq!(config.framerate, 15);
    assert_eq!(config.tick_interval(), Duration::from_millis(15));
    assert_eq!(config.drive, DriveMode::SinkDriven);
    assert_eq!(config.format, StreamFormat::Jpeg);
    assert_eq!(config.sink, SinkTarget::Display);
    assert_eq!(config.snapshot_timeout(), Some(Duration::from_secs(1)));
    assert!(config.validate_strict().is_ok());
}

#[test]
fn test_playback_preset() {
    let config = CaptureConfig::playback();
    assert_eq!(config.framerate, 2);
    assert_eq!(config.tick_interval(), Duration::from_millis(500));
    assert_eq!(config.drive, DriveMode::Timer);
    assert_eq!(config.frame_duration(), Duration::from_millis(500));
}

#[test]
fn test_capture_config_builder() {
    let config = CaptureConfig::live()
        .with_sink(SinkTarget::udp())
        .with_format(StreamFormat::Rgb16)
        .with_framerate(4)
        .with_tick_interval(Duration::from_millis(250))
        .with_drive(DriveMode::Timer)
        .with_jpeg_quality(60)
        .with_snapshot_timeout(None);

    assert_eq!(
        config.sink,
        SinkTarget::Udp {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_UDP_PORT,
        }
    );
    assert_eq!(config.format, StreamFormat::Rgb16);
    assert_eq!(config.tick_interval_ms, 250);
    assert_eq!(config.jpeg_quality, 60);
    assert_eq!(config.snapshot_timeout(), None);
    assert_eq!(config.frame_duration(), Duration::from_millis(250));
}

#[test]
fn test_capture_config_validation() {
    assert!(CaptureConfig::live().with_framerate(0).validate_strict().is_err());
    assert!(CaptureConfig::live().with_framerate(500).validate_strict().is_err());
    assert!(CaptureConfig::live()
        .with_tick_interval(Duration::ZERO)
        .validate_strict()
        .is_err());
    assert!(CaptureConfig::live()
        .with_jpeg_quality(0)
        .validate_strict()
        .is_err());
    assert!(CaptureConfig::live()
        .with_snapshot_timeout(Some(Duration::ZERO))
        .validate_strict()
        .is_err());
    assert!(CaptureConfig::live()
        .with_sink(SinkTarget::Udp {
            host: String::new(),
            port: 5007,
        })
        .validate_strict()
        .is_err());
}

#[test]
fn test_capture_config_warnings() {
    let config = CaptureConfig::live()
        .with_drive(DriveMode::Timer)
        .with_snapshot_timeout(None);
    let warnings = config.validate();

    assert!(warnings.iter().any(|w| w.contains("Tick interval")));
    assert!(warnings.iter().any(|w| w.contains("snapshot timeout")));

    // Sink-driven pacing does not care about the tick interval
    assert!(CaptureConfig::live().validate().is_empty());
}

#[test]
fn test_stream_format_parse() {
    assert_eq!("jpeg".parse::<StreamFormat>().ok(), Some(StreamFormat::Jpeg));
    assert_eq!("jpg".parse::<StreamFormat>().ok(), Some(StreamFormat::Jpeg));
    assert_eq!("rgb16".parse::<StreamFormat>().ok(), Some(StreamFormat::Rgb16));
    assert!("png".parse::<StreamFormat>().is_err());
}

#[test]
fn test_config_file_default() {
    let config = ConfigFile::default();
    assert_eq!(config.capture.framerate, 15);
    assert_eq!(config.encoder.format, "jpeg");
    assert_eq!(config.sink.kind, "display");
}

#[test]
fn test_config_file_sample_parses() {
    let config: ConfigFile = toml::from_str(&sample_config()).expect("sample must parse");
    let capture = config.to_capture_config().unwrap();
    assert_eq!(capture, CaptureConfig::live());
}

#[test]
fn test_config_file_udp_sink() {
    let config: ConfigFile = toml::from_str(
        r#"
        [capture]
        framerate = 2
        interval_ms = 500
        drive = "timer"
        snapshot_timeout_ms = 0

        [sink]
        kind = "udp"
        host = "10.0.0.5"
        port = 6000
        "#,
    )
    .unwrap();

    let capture = config.to_capture_config().unwrap();
    assert_eq!(capture.sink, SinkTarget::Udp {
        host: "10.0.0.5".to_string(),
        port: 6000,
    });
    assert_eq!(capture.drive, DriveMode::Timer);
    assert_eq!(capture.snapshot_timeout(), None);
}

#[test]
fn test_config_file_rejects_unknown_values() {
    let mut config = ConfigFile::default();
    config.sink.kind = "rtmp".to_string();
    assert!(config.to_capture_config().is_err());

    let mut config = ConfigFile::default();
    config.capture.drive = "vsync".to_string();
    assert!(config.to_capture_config().is_err());

    let mut config = ConfigFile::default();
    config.encoder.format = "h264".to_string();
    assert!(config.to_capture_config().is_err());
}

#[test]
fn test_config_file_save_load() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("framecast").join("config.toml");

    let mut config = ConfigFile::default();
    config.capture.framerate = 30;
    config.sink.kind = "dir".to_string();
    config.sink.path = Some(temp_dir.path().join("frames"));

    config
        .save_to(config_path.clone())
        .expect("Failed to save config");

    let loaded = ConfigFile::load_from(config_path).expect("Failed to load config");
    assert_eq!(loaded.capture.framerate, 30);

    let capture = loaded.to_capture_config().unwrap();
    assert_eq!(capture.sink, SinkTarget::directory(temp_dir.path().join("frames")));
}

#[test]
fn test_config_file_load_nonexistent() {
    // A missing file falls back to defaults
    let config = ConfigFile::load_from("/nonexistent/path/config.toml".into()).unwrap();
    assert_eq!(config.capture.framerate, 15);
}

#[test]
fn test_config_file_load_malformed() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[capture\nframerate = ").unwrap();
    assert!(ConfigFile::load_from(path).is_err());
}
