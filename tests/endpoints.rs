mod common;

use anyhow::{ensure, Result};
use common::{can_bind_localhost, user_json, Harness};
use optika::{
    api::{
        admin,
        logs::{self, LogFilters, LogSortField, SortOrder},
        products, twofa,
        types::{LogStatus, Operation, Role, UpdateUserRequest},
    },
    session::MemoryTokenStore,
};
use secrecy::SecretString;
use serde_json::json;
use wiremock::{
    matchers::{body_json, header, header_exists, method, path, query_param, query_param_is_missing},
    Mock, MockServer, ResponseTemplate,
};

fn product_json(id: i64, category: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": format!("Frame {id}"),
        "description": "Lightweight acetate frame",
        "price": 4990.0,
        "category": category,
        "image_url": null,
        "in_stock": true
    })
}

#[tokio::test]
async fn requests_carry_request_id_and_bearer_token() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products"))
        .and(query_param("category", "Детские"))
        .and(header_exists("X-Request-Id"))
        .and(header("Authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([product_json(1, "Детские")])))
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new(
        &server.uri(),
        MemoryTokenStore::with_tokens("access-1", "refresh-1"),
        "/products",
    )?;

    let items = products::list(&harness.client, Some("  Детские ")).await?;
    ensure!(items.len() == 1);
    ensure!(items[0].category == "Детские");

    server.verify().await;
    Ok(())
}

#[tokio::test]
async fn blank_category_lists_everything() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products"))
        .and(query_param_is_missing("category"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            product_json(1, "Для чтения"),
            product_json(2, "Спортивные")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new(&server.uri(), MemoryTokenStore::new(), "/products")?;
    let items = products::list(&harness.client, Some("   ")).await?;
    ensure!(items.len() == 2);

    server.verify().await;
    Ok(())
}

#[tokio::test]
async fn log_filters_become_query_parameters() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/logs"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "50"))
        .and(query_param("username", "bob"))
        .and(query_param("status", "failed"))
        .and(query_param("ip_address", "10.0.0.7"))
        .and(query_param("sort_by", "operation"))
        .and(query_param("sort_order", "asc"))
        .and(query_param_is_missing("operation"))
        .and(query_param_is_missing("role"))
        .and(query_param_is_missing("from_date"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 51,
            "page": 2,
            "limit": 50,
            "logs": [{
                "id": 77,
                "timestamp": "2024-05-02T08:15:00",
                "user_id": 2,
                "username": "bob",
                "role": "user",
                "operation": "login_failed",
                "target_table": null,
                "target_id": null,
                "status": "failed",
                "ip_address": "10.0.0.7",
                "details": "Invalid password"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new(
        &server.uri(),
        MemoryTokenStore::with_tokens("access-1", "refresh-1"),
        "/admin/logs",
    )?;

    let mut filters = LogFilters {
        page: 2,
        limit: 50,
        username: "bob".to_string(),
        status: "failed".to_string(),
        ip_address: Some("10.0.0.7".to_string()),
        sort_by: LogSortField::Operation,
        sort_order: SortOrder::Asc,
        ..LogFilters::default()
    };

    let page = logs::list(&harness.client, &filters).await?;
    ensure!(page.total == 51);
    ensure!(page.logs[0].operation == Operation::LoginFailed);
    ensure!(page.logs[0].status == LogStatus::Failed);

    ensure!(filters.total_pages(page.total) == 2);
    ensure!(!filters.next_page(page.total));
    ensure!(filters.prev_page());
    ensure!(filters.page == 1);

    server.verify().await;
    Ok(())
}

#[tokio::test]
async fn dashboard_combines_users_and_log_stats() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            user_json(1, "root", "admin"),
            user_json(2, "clerk", "staff"),
            user_json(3, "alice", "user"),
            user_json(4, "bob", "user")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/admin/logs/stats/summary"))
        .and(query_param_is_missing("from_date"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_events": 12,
            "by_status": { "success": 10, "failed": 2 },
            "top_operations": { "login_success": 8 },
            "top_users": { "alice": 5 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new(
        &server.uri(),
        MemoryTokenStore::with_tokens("access-1", "refresh-1"),
        "/admin",
    )?;

    let stats = admin::dashboard(&harness.client).await?;
    ensure!(stats.total_users == 4);
    ensure!(stats.admins == 1);
    ensure!(stats.staff == 1);
    ensure!(stats.regular_users == 2);
    ensure!(stats.logs.total_events == 12);
    ensure!(stats.logs.by_status.get("failed") == Some(&2));

    server.verify().await;
    Ok(())
}

#[tokio::test]
async fn user_management_requests() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    let mut promoted = user_json(3, "alice", "staff");
    Mock::given(method("PUT"))
        .and(path("/admin/users/3/role"))
        .and(body_json(json!({ "role": "staff" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(promoted.clone()))
        .expect(1)
        .mount(&server)
        .await;

    promoted["is_blocked"] = json!(true);
    Mock::given(method("PUT"))
        .and(path("/admin/users/3"))
        .and(body_json(json!({ "is_blocked": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(promoted))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/admin/users/3/reset-2fa"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "message": "2FA reset for alice" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/admin/users/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "User deleted" })))
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new(
        &server.uri(),
        MemoryTokenStore::with_tokens("access-1", "refresh-1"),
        "/admin/users",
    )?;
    let client = &harness.client;

    ensure!(admin::set_role(client, 3, Role::Staff).await?.role == Role::Staff);
    ensure!(admin::set_blocked(client, 3, true).await?.is_blocked);
    ensure!(admin::reset_two_factor(client, 3).await?.message == "2FA reset for alice");
    ensure!(admin::delete_user(client, 3).await?.message == "User deleted");
    ensure!(UpdateUserRequest::default().is_empty());

    server.verify().await;
    Ok(())
}

#[tokio::test]
async fn two_factor_requests() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2fa/enable"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "secret": "JBSWY3DPEHPK3PXP",
            "qr_code": "data:image/png;base64,AAAA",
            "message": "Scan the QR code"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/2fa/verify"))
        .and(body_json(json!({ "totp_token": "123456" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "2FA enabled" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/2fa/disable"))
        .and(body_json(json!({ "password": "Secret123" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "2FA disabled" })))
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new(
        &server.uri(),
        MemoryTokenStore::with_tokens("access-1", "refresh-1"),
        "/profile",
    )?;
    let client = &harness.client;

    let enrollment = twofa::enable(client).await?;
    ensure!(enrollment.secret == "JBSWY3DPEHPK3PXP");
    ensure!(!format!("{enrollment:?}").contains("JBSWY3DPEHPK3PXP"));
    ensure!(twofa::verify(client, "123456").await?.message == "2FA enabled");
    ensure!(
        twofa::disable(client, &SecretString::from("Secret123"))
            .await?
            .message
            == "2FA disabled"
    );

    server.verify().await;
    Ok(())
}
