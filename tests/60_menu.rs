mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use rust_decimal::Decimal;
use serde_json::json;

use restaurant_api::auth::Role;
use restaurant_api::services::{ItemInput, ServiceError};

fn item(name: &str, tags: Vec<String>) -> ItemInput {
    ItemInput {
        name: name.to_string(),
        description: "house special".to_string(),
        price: Decimal::new(1500, 2),
        image_url: String::new(),
        is_available: true,
        tags,
    }
}

#[tokio::test]
async fn items_carry_their_tags_and_edit_replaces_them() -> Result<()> {
    let Some(state) = common::database_state().await? else {
        return Ok(());
    };
    let vegan = state.tags().create(&common::unique("vegan")).await?;
    let spicy = state.tags().create(&common::unique("spicy")).await?;

    let created = state
        .items()
        .create(item(&common::unique("Dal"), vec![vegan.name.clone(), spicy.name.clone()]))
        .await?;
    assert_eq!(created.tags.len(), 2);

    let edited = state
        .items()
        .edit(created.id, item(&created.name, vec![spicy.name.clone()]))
        .await?;
    assert_eq!(edited.tags.len(), 1);
    assert_eq!(edited.tags[0].id, spicy.id);

    let fetched = state.items().get(created.id).await?;
    assert_eq!(fetched.tags.len(), 1);
    Ok(())
}

#[tokio::test]
async fn unknown_tag_rolls_back_the_whole_item() -> Result<()> {
    let Some(state) = common::database_state().await? else {
        return Ok(());
    };
    let name = common::unique("Ghost Pepper");

    let err = state
        .items()
        .create(item(&name, vec![common::unique("no-such-tag")]))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));

    let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE name = $1")
        .bind(&name)
        .fetch_one(&state.pool)
        .await?;
    assert_eq!(stored, 0);
    Ok(())
}

#[tokio::test]
async fn duplicate_names_conflict() -> Result<()> {
    let Some(state) = common::database_state().await? else {
        return Ok(());
    };
    let tag = common::unique("dessert");
    state.tags().create(&tag).await?;
    let err = state.tags().create(&tag).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    let name = common::unique("Flan");
    state.items().create(item(&name, vec![])).await?;
    let err = state.items().create(item(&name, vec![])).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
    Ok(())
}

#[tokio::test]
async fn customers_browse_admins_edit() -> Result<()> {
    let Some(state) = common::database_state().await? else {
        return Ok(());
    };
    let customer = common::user_with_role(&state, Role::CUSTOMER).await?;
    let admin = common::user_with_role(&state, Role::ADMIN).await?;
    let customer_token = common::bearer(&state, customer, Role::CUSTOMER)?;
    let admin_token = common::bearer(&state, admin, Role::ADMIN)?;

    let tag = common::unique("seasonal");
    let (status, _) = common::send(
        common::app(&state),
        Method::POST,
        "/api/tags",
        Some(&admin_token),
        Some(json!({"name": tag})),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);

    let name = common::unique("Pumpkin Soup");
    let (status, body) = common::send(
        common::app(&state),
        Method::POST,
        "/api/items",
        Some(&admin_token),
        Some(json!({"name": name, "price": "7.25", "tags": [tag]})),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let item_id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = common::send(
        common::app(&state),
        Method::POST,
        "/api/items",
        Some(&customer_token),
        Some(json!({"name": common::unique("Nope"), "price": "1.00"})),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = common::send(
        common::app(&state),
        Method::GET,
        &format!("/api/items?tags={tag}"),
        Some(&customer_token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"].as_i64(), Some(item_id));
    assert_eq!(items[0]["tags"][0]["name"], tag.as_str());

    let (status, _) = common::send(
        common::app(&state),
        Method::GET,
        "/api/items?limit=0",
        Some(&customer_token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn price_outside_the_column_is_invalid_input() -> Result<()> {
    let Some(state) = common::database_state().await? else {
        return Ok(());
    };

    for price in [Decimal::new(1_000_000_000, 0), Decimal::new(4999, 3)] {
        let mut input = item(&common::unique("Caviar"), vec![]);
        input.price = price;
        let err = state.items().create(input).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)), "{price}: {err:?}");
    }

    let admin = common::user_with_role(&state, Role::ADMIN).await?;
    let admin_token = common::bearer(&state, admin, Role::ADMIN)?;
    let (status, body) = common::send(
        common::app(&state),
        Method::POST,
        "/api/items",
        Some(&admin_token),
        Some(json!({"name": common::unique("Truffle"), "price": "1000000000"})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    Ok(())
}
