use axum::{
    extract::{Request, State},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::MethodRouter,
};
use tracing::debug;

use crate::api::AppState;
use crate::auth::{Identity, Role};
use crate::error::ApiError;

/// Decide whether a caller may use a route gated on `required`.
///
/// `ANY` admits everyone, including anonymous callers. Otherwise a missing
/// identity is 401 and an identity without the required bits is 403.
pub fn authorize(identity: Option<&Identity>, required: Role) -> Result<(), ApiError> {
    if required == Role::ANY {
        return Ok(());
    }
    let Some(identity) = identity else {
        return Err(ApiError::unauthorized("authentication required"));
    };
    if identity.role.has_flag(required) {
        Ok(())
    } else {
        debug!(
            "User {} with role {} denied route requiring {}",
            identity.user_id, identity.role, required
        );
        Err(ApiError::forbidden("insufficient role for this operation"))
    }
}

/// Route middleware enforcing the role passed as its state.
pub async fn require_role(
    State(required): State<Role>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authorize(request.extensions().get::<Identity>(), required)?;
    Ok(next.run(request).await)
}

/// Wrap a method router so every handler in it requires `role`.
pub fn gated(method: MethodRouter<AppState>, role: Role) -> MethodRouter<AppState> {
    method.route_layer(from_fn_with_state(role, require_role))
}
