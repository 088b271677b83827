//! Templates loaded through configuration reach both adapters.

mod common;

use std::fs;

use common::Apps;
use http::StatusCode;
use janus::config::ConfigLoader;
use janus::core::Format;
use janus_test::TestRequest;
use serde_json::json;

#[tokio::test]
async fn test_template_dir_from_config() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("recipes")).unwrap();
    fs::write(
        dir.path().join("recipes").join("show.hbs"),
        "<h2>{{name}}</h2>",
    )
    .unwrap();

    let toml = format!(
        "[render]\ndefault_format = \"html\"\ntemplate_dir = {:?}\n",
        dir.path().display().to_string()
    );
    let config = ConfigLoader::new()
        .with_defaults()
        .with_string(&toml, "toml")
        .unwrap()
        .load()
        .unwrap();
    assert_eq!(config.render.default_format, Format::Html);

    let apps = Apps::with_config(config.adapter_config().unwrap());
    let create = TestRequest::post("/recipes")
        .accept("application/json")
        .json(&json!({ "name": "Pho", "minutes": 120 }))
        .build()
        .unwrap();
    apps.both(create).await.assert_status(StatusCode::CREATED);

    // No Accept header: the configured default picks the template.
    let response = apps
        .both(TestRequest::get("/recipes/1").build().unwrap())
        .await;
    response
        .assert_status(StatusCode::OK)
        .assert_header("content-type", "text/html; charset=utf-8");
    assert_eq!(response.text().unwrap(), "<h2>Pho</h2>");
}
