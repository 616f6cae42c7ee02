mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn admin_lists_every_user() -> Result<()> {
    let server = common::spawn_app().await?;
    server.sign_up("Alice").await?;
    server.sign_up("Bob").await?;
    let admin = server.admin_token().await?;

    let res = server.get("/user", &admin).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let users: Vec<Value> = res.json().await?;
    assert_eq!(users.len(), 3);
    assert!(users.iter().any(|u| u["role"] == "admin"));
    assert!(users.iter().all(|u| u.get("passwordHash").is_none()));
    Ok(())
}

#[tokio::test]
async fn regular_users_cannot_reach_admin_routes() -> Result<()> {
    let server = common::spawn_app().await?;
    let alice = server.sign_up("Alice").await?;
    let bob = server.sign_up("Bob").await?;

    let res = server.get("/user", &alice.token).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "FORBIDDEN");

    let res = server
        .delete(&format!("/user/{}", bob.id), &alice.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn admin_delete_removes_the_account_and_its_data() -> Result<()> {
    let server = common::spawn_app().await?;
    let alice = server.sign_up("Alice").await?;
    let todo = server.create_todo(&alice, "Doomed").await?;
    let admin = server.admin_token().await?;

    let res = server
        .delete(&format!("/user/{}", alice.id), &admin)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = server
        .delete(&format!("/user/{}", alice.id), &admin)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server
        .client
        .post(server.url("/auth/login"))
        .json(&json!({ "email": alice.email, "password": common::PASSWORD }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Alice's token still verifies, but the todo went with the account.
    let res = server
        .get(&format!("/todo/{}", todo["id"]), &alice.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
