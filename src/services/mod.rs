pub mod error;
pub mod item_service;
pub mod order_item_service;
pub mod order_service;
pub mod payment_service;
pub mod request_service;
pub mod tag_service;
pub mod user_service;

use rust_decimal::Decimal;

pub use error::{DbResultExt, ServiceError};
pub use item_service::{ItemFilter, ItemInput, ItemService};
pub use order_item_service::{NewOrderItem, OrderItemService};
pub use order_service::{OrderFilter, OrderService};
pub use payment_service::{PaymentFilter, PaymentService};
pub use request_service::{Decision, RequestFilter, RequestService};
pub use tag_service::TagService;
pub use user_service::{UserFilter, UserService, UserUpdate};

/// Check that a caller-supplied amount fits a `NUMERIC(p, 2)` column:
/// at most two decimal places and strictly below `limit`.
pub(crate) fn check_money(amount: Decimal, limit: Decimal, field: &str) -> Result<(), ServiceError> {
    if amount.normalize().scale() > 2 {
        return Err(ServiceError::invalid(format!(
            "{field} must have at most two decimal places"
        )));
    }
    if amount >= limit {
        return Err(ServiceError::invalid(format!("{field} must be less than {limit}")));
    }
    Ok(())
}

/// Substring pattern for `ILIKE`, with the caller's wildcards escaped.
/// Blank input means no filter.
pub(crate) fn like_pattern(search: Option<&str>) -> Option<String> {
    let search = search.map(str::trim).filter(|s| !s.is_empty())?;
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    Some(pattern)
}
