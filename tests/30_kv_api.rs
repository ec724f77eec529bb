mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn put_then_get_text() -> Result<()> {
    let server = common::start_server().await?;

    let res = server
        .put("/api/kv/test-key")
        .json(&json!({ "value": "test-value" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED, "put should create");
    assert_eq!(res.json::<Value>().await?, json!({ "key": "test-key", "success": true }));

    let res = server.get("/api/kv/test-key").send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?, json!({ "key": "test-key", "value": "test-value" }));
    Ok(())
}

#[tokio::test]
async fn json_values_round_trip() -> Result<()> {
    let server = common::start_server().await?;
    let doc = json!({ "theme": "dark", "sizes": [1, 2, 3] });

    let res = server
        .put("/api/kv/users/42/settings.json")
        .json(&json!({ "value": doc, "ttl": 3600 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = server.get("/api/kv/users/42/settings.json?type=json").send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["key"], "users/42/settings.json");
    assert_eq!(body["value"], doc);

    // without ?type=json the serialized text comes back
    let body: Value = server.get("/api/kv/users/42/settings.json").send().await?.json().await?;
    assert!(body["value"].is_string());
    Ok(())
}

#[tokio::test]
async fn reading_text_as_json_is_400() -> Result<()> {
    let server = common::start_server().await?;
    server
        .put("/api/kv/plain")
        .json(&json!({ "value": "not json" }))
        .send()
        .await?;

    let res = server.get("/api/kv/plain?type=json").send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "INVALID_VALUE");
    assert_eq!(body["error"], "Stored value is not valid JSON");
    Ok(())
}

#[tokio::test]
async fn missing_key_is_404() -> Result<()> {
    let server = common::start_server().await?;
    let res = server.get("/api/kv/nothing-here").send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.json::<Value>().await?, json!({ "error": "Key not found" }));
    Ok(())
}

#[tokio::test]
async fn put_requires_value_field() -> Result<()> {
    let server = common::start_server().await?;
    let res = server
        .put("/api/kv/k")
        .json(&json!({ "ttl": 60 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?, json!({ "error": "Body must contain 'value' field" }));
    Ok(())
}

#[tokio::test]
async fn put_rejects_invalid_json_body() -> Result<()> {
    let server = common::start_server().await?;
    let res = server
        .put("/api/kv/k")
        .header("Content-Type", "application/json")
        .body("{ nope")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?["error"], "invalid_json");
    Ok(())
}

#[tokio::test]
async fn put_validates_ttl() -> Result<()> {
    let server = common::start_server().await?;
    for ttl in [json!(0), json!(31_536_001), json!(1.5), json!("60")] {
        let res = server
            .put("/api/kv/k")
            .json(&json!({ "value": "v", "ttl": ttl }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "ttl {ttl}");
        let body: Value = res.json().await?;
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["field"], "ttl");
    }
    Ok(())
}

#[tokio::test]
async fn bad_keys_are_validation_errors() -> Result<()> {
    let server = common::start_server().await?;
    for key in ["has%20space", "a//b", "trailing/", "semi;colon"] {
        let res = server.get(&format!("/api/kv/{key}")).send().await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "key {key}");
        let body: Value = res.json().await?;
        assert_eq!(body["error"], "validation_error", "key {key}");
        assert_eq!(body["field"], "key");
    }
    Ok(())
}

#[tokio::test]
async fn delete_removes_key() -> Result<()> {
    let server = common::start_server().await?;
    server
        .put("/api/kv/doomed")
        .json(&json!({ "value": "x" }))
        .send()
        .await?;

    let res = server.delete("/api/kv/doomed").send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?, json!({ "key": "doomed", "deleted": true }));

    let res = server.get("/api/kv/doomed").send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn list_pages_with_cursor() -> Result<()> {
    let server = common::start_server().await?;
    for key in ["logs/a", "logs/b", "logs/c", "other"] {
        server
            .put(&format!("/api/kv/{key}"))
            .json(&json!({ "value": "v" }))
            .send()
            .await?;
    }

    let res = server.get("/api/kv?prefix=logs/&limit=2").send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let first: Value = res.json().await?;
    assert_eq!(first["complete"], false);
    let names: Vec<&str> = first["keys"]
        .as_array()
        .unwrap()
        .iter()
        .map(|k| k["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["logs/a", "logs/b"]);

    let cursor = first["cursor"].as_str().unwrap();
    let second: Value = server
        .get(&format!("/api/kv?prefix=logs/&limit=2&cursor={cursor}"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(second["complete"], true);
    assert_eq!(second["keys"][0]["name"], "logs/c");
    assert!(second.get("cursor").is_none());
    Ok(())
}

#[tokio::test]
async fn list_validates_limit() -> Result<()> {
    let server = common::start_server().await?;
    for query in ["limit=0", "limit=1001", "limit=abc"] {
        let res = server.get(&format!("/api/kv?{query}")).send().await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{query}");
        assert_eq!(res.json::<Value>().await?["field"], "limit");
    }
    Ok(())
}
