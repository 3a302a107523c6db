use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, patch, post, put},
    Router,
};
use chrono::Duration;
use jsonwebtoken::Algorithm;
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::auth::{JwtError, JwtService, Role, TokenCache};
use crate::config::AppConfig;
use crate::handlers::{health, items, order_items, orders, payments, requests, tags, token, users};
use crate::middleware::{authenticate, gated};
use crate::services::{
    ItemService, OrderItemService, OrderService, PaymentService, RequestService, ServiceError,
    TagService, UserService,
};
use crate::types::{PageParams, Pagination};

/// Shared handles for every request. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub jwt: Arc<JwtService>,
    pub token_cache: Arc<TokenCache>,
}

impl AppState {
    pub fn new(pool: PgPool, config: AppConfig) -> Result<Self, JwtError> {
        let jwt = JwtService::new(
            &config.security.jwt_secret,
            Algorithm::HS256,
            config.security.jwt_issuer.clone(),
            Duration::minutes(config.security.jwt_expiry_minutes),
        )?;
        let token_cache = TokenCache::new(config.security.token_cache_max_entries);

        Ok(Self {
            pool,
            config: Arc::new(config),
            jwt: Arc::new(jwt),
            token_cache: Arc::new(token_cache),
        })
    }

    pub fn paginate(&self, params: PageParams) -> Result<Pagination, ServiceError> {
        Pagination::new(
            params,
            self.config.api.default_page_limit,
            self.config.api.max_page_limit,
        )
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.pool.clone())
    }

    pub fn tags(&self) -> TagService {
        TagService::new(self.pool.clone())
    }

    pub fn items(&self) -> ItemService {
        ItemService::new(self.pool.clone())
    }

    pub fn orders(&self) -> OrderService {
        OrderService::new(self.pool.clone())
    }

    pub fn order_items(&self) -> OrderItemService {
        OrderItemService::new(self.pool.clone())
    }

    pub fn payments(&self) -> PaymentService {
        PaymentService::new(self.pool.clone())
    }

    pub fn requests(&self) -> RequestService {
        RequestService::new(self.pool.clone())
    }
}

/// Full application router: public, role-gated and operational routes.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(health::health))
        .merge(auth_routes())
        .merge(menu_routes())
        .merge(order_routes())
        .merge(payment_routes())
        .merge(request_routes())
        // Global middleware
        .layer(from_fn_with_state(state.clone(), authenticate))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/token", post(token::create_token))
        .route(
            "/api/users",
            post(users::register).merge(gated(get(users::list_users), Role::ADMIN)),
        )
        .route(
            "/api/users/:id",
            get(users::get_user).patch(users::edit_user),
        )
}

fn menu_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/tags",
            gated(post(tags::create_tag), Role::ADMIN)
                .merge(gated(get(tags::list_tags), Role::CUSTOMER)),
        )
        .route(
            "/api/tags/:id",
            gated(get(tags::get_tag), Role::CUSTOMER)
                .merge(gated(patch(tags::rename_tag), Role::ADMIN)),
        )
        .route(
            "/api/items",
            gated(post(items::create_item), Role::ADMIN)
                .merge(gated(get(items::list_items), Role::CUSTOMER)),
        )
        .route(
            "/api/items/:id",
            gated(get(items::get_item), Role::CUSTOMER)
                .merge(gated(put(items::edit_item), Role::ADMIN)),
        )
}

fn order_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/orders",
            gated(post(orders::create_order).get(orders::list_orders), Role::CUSTOMER),
        )
        .route(
            "/api/orders/items",
            gated(get(order_items::kitchen_queue), Role::CHEF),
        )
        .route(
            "/api/orders/items/:id",
            gated(patch(order_items::edit_order_item_status), Role::CHEF),
        )
        .route(
            "/api/orders/:id",
            gated(get(orders::get_order), Role::CUSTOMER),
        )
        .route(
            "/api/orders/:id/close",
            gated(post(orders::close_order), Role::CUSTOMER),
        )
        .route(
            "/api/orders/:id/items",
            gated(
                post(order_items::create_order_item).get(order_items::list_order_items),
                Role::CUSTOMER,
            ),
        )
}

fn payment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/payments",
            gated(post(payments::create_payment), Role::ADMIN)
                .merge(gated(get(payments::list_payments), Role::CUSTOMER)),
        )
        .route(
            "/api/payments/:id",
            gated(get(payments::get_payment), Role::CUSTOMER)
                .merge(gated(patch(payments::update_payment_status), Role::ADMIN)),
        )
}

fn request_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/requests",
            post(requests::create_request).get(requests::list_requests),
        )
        .route(
            "/api/requests/:id/grant",
            gated(post(requests::grant_request), Role::ADMIN),
        )
        .route(
            "/api/requests/:id/reject",
            gated(post(requests::reject_request), Role::ADMIN),
        )
        .route("/api/requests/:id/seen", post(requests::mark_request_seen))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
