mod common;

use anyhow::Result;
use edge_api::config::KvBackend;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn sqlite_server() -> Result<common::TestServer> {
    let mut config = common::test_config();
    config.kv.backend = KvBackend::Sqlite;
    common::start_server_with(config).await
}

#[tokio::test]
async fn sqlite_backend_put_get_delete() -> Result<()> {
    let server = sqlite_server().await?;

    let res = server
        .put("/api/kv/notes/today")
        .json(&json!({ "value": "buy milk", "ttl": 600 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let body: Value = server.get("/api/kv/notes/today").send().await?.json().await?;
    assert_eq!(body, json!({ "key": "notes/today", "value": "buy milk" }));

    let doc = json!({ "done": false, "tags": ["home"] });
    server
        .put("/api/kv/notes/doc")
        .json(&json!({ "value": doc }))
        .send()
        .await?;
    let body: Value = server.get("/api/kv/notes/doc?type=json").send().await?.json().await?;
    assert_eq!(body["value"], doc);

    let res = server.delete("/api/kv/notes/today").send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let res = server.get("/api/kv/notes/today").send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn sqlite_backend_lists_pages_like_memory() -> Result<()> {
    let server = sqlite_server().await?;
    for key in ["user/3", "user/1", "team/1", "user/2"] {
        let res = server
            .put(&format!("/api/kv/{key}"))
            .json(&json!({ "value": "v" }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let first: Value = server.get("/api/kv?prefix=user/&limit=2").send().await?.json().await?;
    let names: Vec<&str> = first["keys"]
        .as_array()
        .map(|keys| keys.iter().filter_map(|k| k["name"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(names, ["user/1", "user/2"]);
    assert_eq!(first["complete"], false);
    let cursor = first["cursor"].as_str().unwrap_or_default().to_string();
    assert!(!cursor.is_empty(), "incomplete page carries a cursor");

    let second: Value = server
        .get(&format!("/api/kv?prefix=user/&limit=2&cursor={cursor}"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(second["keys"], json!([{ "name": "user/3" }]));
    assert_eq!(second["complete"], true);
    assert!(second.get("cursor").is_none());
    Ok(())
}
