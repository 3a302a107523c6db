mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use rust_decimal::Decimal;
use serde_json::json;

use restaurant_api::auth::Role;
use restaurant_api::services::{ItemInput, ServiceError};
use restaurant_api::types::Scope;

async fn menu_item(state: &restaurant_api::api::AppState, price: Decimal) -> Result<i64> {
    let item = state
        .items()
        .create(ItemInput {
            name: common::unique("Soup"),
            description: "of the day".to_string(),
            price,
            image_url: String::new(),
            is_available: true,
            tags: vec![],
        })
        .await?;
    Ok(item.id)
}

#[tokio::test]
async fn customer_orders_kitchen_cooks_admin_settles() -> Result<()> {
    let Some(state) = common::database_state().await? else {
        return Ok(());
    };
    common::free_table(&state.pool, 91).await?;

    let customer_id = common::user_with_role(&state, Role::CUSTOMER).await?;
    let chef_id = common::user_with_role(&state, Role::CHEF).await?;
    let admin_id = common::user_with_role(&state, Role::ADMIN).await?;
    let customer = common::bearer(&state, customer_id, Role::CUSTOMER)?;
    let chef = common::bearer(&state, chef_id, Role::CHEF)?;
    let admin = common::bearer(&state, admin_id, Role::ADMIN)?;
    let item_id = menu_item(&state, Decimal::new(1250, 2)).await?;

    let (status, body) = common::send(
        common::app(&state),
        Method::POST,
        "/api/orders",
        Some(&customer),
        Some(json!({"table_number": 91})),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "open");
    let order_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = common::send(
        common::app(&state),
        Method::POST,
        &format!("/api/orders/{order_id}/items"),
        Some(&customer),
        Some(json!({"item_id": item_id, "quantity": 2, "custom_instructions": "no salt"})),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["status"], "preparing");
    let line_id = body["data"]["id"].as_i64().unwrap();

    // Kitchen queue holds preparing lines only; the chef completes ours.
    let (status, body) = common::send(
        common::app(&state),
        Method::GET,
        "/api/orders/items?status=preparing",
        Some(&chef),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let queue = body["data"]["items"].as_array().unwrap();
    assert!(!queue.is_empty());
    assert!(queue.iter().all(|line| line["status"] == "preparing"));

    let (status, body) = common::send(
        common::app(&state),
        Method::PATCH,
        &format!("/api/orders/items/{line_id}"),
        Some(&chef),
        Some(json!({"status": "completed"})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "completed");

    let (status, _) = common::send(
        common::app(&state),
        Method::PATCH,
        &format!("/api/orders/items/{line_id}"),
        Some(&chef),
        Some(json!({"status": "burnt"})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Admin settles: 2 x 12.50 + 3.00 tip.
    let (status, body) = common::send(
        common::app(&state),
        Method::POST,
        "/api/payments",
        Some(&admin),
        Some(json!({"order_id": order_id, "tip": "3.00"})),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let subtotal: Decimal = body["data"]["subtotal"].as_str().unwrap().parse()?;
    let total: Decimal = body["data"]["total"].as_str().unwrap().parse()?;
    assert_eq!(subtotal, Decimal::new(2500, 2));
    assert_eq!(total, Decimal::new(2800, 2));
    assert_eq!(body["data"]["user_id"].as_i64(), Some(customer_id));
    assert_eq!(body["data"]["cashier_id"].as_i64(), Some(admin_id));

    // Admin closes; the customer can no longer add to it or close it again.
    let (status, body) = common::send(
        common::app(&state),
        Method::POST,
        &format!("/api/orders/{order_id}/close"),
        Some(&admin),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "closed");

    let (status, _) = common::send(
        common::app(&state),
        Method::POST,
        &format!("/api/orders/{order_id}/close"),
        Some(&customer),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = common::send(
        common::app(&state),
        Method::POST,
        &format!("/api/orders/{order_id}/items"),
        Some(&customer),
        Some(json!({"item_id": item_id, "quantity": 1})),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let lines = state
        .order_items()
        .list_for_order(order_id, Scope::OwnedBy(customer_id))
        .await?;
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].custom_instructions, "no salt");

    let reopened = state.orders().create(customer_id, 91).await?;
    state.orders().close(reopened.id, Scope::Unrestricted).await?;
    Ok(())
}

#[tokio::test]
async fn only_one_concurrent_order_per_table_wins() -> Result<()> {
    let Some(state) = common::database_state().await? else {
        return Ok(());
    };
    common::free_table(&state.pool, 92).await?;
    let first = common::user_with_role(&state, Role::CUSTOMER).await?;
    let second = common::user_with_role(&state, Role::CUSTOMER).await?;

    let a = state.orders();
    let b = state.orders();
    let (left, right) = tokio::join!(a.create(first, 92), b.create(second, 92));

    let results = [left, right];
    let opened = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(ServiceError::Conflict(_))))
        .count();
    assert_eq!((opened, conflicts), (1, 1));

    common::free_table(&state.pool, 92).await?;
    Ok(())
}

#[tokio::test]
async fn customers_cannot_see_or_touch_each_others_orders() -> Result<()> {
    let Some(state) = common::database_state().await? else {
        return Ok(());
    };
    common::free_table(&state.pool, 93).await?;
    let owner = common::user_with_role(&state, Role::CUSTOMER).await?;
    let stranger = common::user_with_role(&state, Role::CUSTOMER).await?;
    let order = state.orders().create(owner, 93).await?;

    let err = state.orders().get(order.id, Scope::OwnedBy(stranger)).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    let err = state.orders().close(order.id, Scope::OwnedBy(stranger)).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let stranger_token = common::bearer(&state, stranger, Role::CUSTOMER)?;
    let (status, body) = common::send(
        common::app(&state),
        Method::GET,
        &format!("/api/orders?customer_id={owner}"),
        Some(&stranger_token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["items"].as_array().unwrap().is_empty());

    let closed = state.orders().close(order.id, Scope::Unrestricted).await?;
    assert_eq!(closed.id, order.id);
    Ok(())
}

#[tokio::test]
async fn out_of_range_table_is_rejected() -> Result<()> {
    let Some(state) = common::database_state().await? else {
        return Ok(());
    };
    let customer = common::user_with_role(&state, Role::CUSTOMER).await?;
    for table in [0, 101] {
        let err = state.orders().create(customer, table).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }
    Ok(())
}
