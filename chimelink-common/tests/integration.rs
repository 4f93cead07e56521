//! Integration tests for chimelink-common library.

use chimelink_common::{
    DisplayContent, Format, Graphic, LogFormat, LoggingConfig, ZenohConfig, decode, decode_fields,
    encode,
};
use serde::Deserialize;
use serde_json::json;

#[test]
fn test_display_command_workflow() {
    let content = DisplayContent::new("T:20.5C\n  19.8C\n\nFurnace\n  ON   ", Graphic::LargeText);

    let json_bytes = encode(&content, Format::Json).expect("JSON encode failed");
    let text = String::from_utf8(json_bytes.clone()).unwrap();
    assert!(text.contains("\"graphic\":\"LARGE_TEXT\""));

    let decoded: DisplayContent = decode(&json_bytes, Format::Json).expect("JSON decode failed");
    assert_eq!(decoded, content);
}

#[test]
fn test_sensor_payload_fields() {
    let payload = br#"{
        "temperature": 22.1,
        "humidity": 38,
        "frequency_details": { "cpm": 17 }
    }"#;

    let fields = decode_fields(payload).expect("decode failed");
    assert_eq!(fields.len(), 3);
    assert_eq!(fields["frequency_details"]["cpm"], json!(17));
}

#[test]
fn test_bridge_style_config_section() {
    #[derive(Debug, Deserialize)]
    struct Section {
        zenoh: ZenohConfig,
        #[serde(default)]
        logging: LoggingConfig,
        placeholder: DisplayContent,
    }

    let section: Section = json5::from_str(
        r#"{
            zenoh: { mode: "client", connect: ["tcp/10.0.0.2:7447"] },
            logging: { format: "json" },
            placeholder: { text: "Waiting", graphic: "INFO" },
        }"#,
    )
    .expect("parse failed");

    assert_eq!(section.zenoh.connect, vec!["tcp/10.0.0.2:7447"]);
    assert_eq!(section.logging.format, LogFormat::Json);
    assert_eq!(section.placeholder, DisplayContent::new("Waiting", Graphic::Info));
}
