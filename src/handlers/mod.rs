// handlers/mod.rs - HTTP adapters, one module per resource
//
// Handlers only parse input, pick the caller's scope and map results into the
// response envelope. Role gates are attached to routes in `api::router`.

pub mod extract;
pub mod health;
pub mod items;
pub mod order_items;
pub mod orders;
pub mod payments;
pub mod requests;
pub mod tags;
pub mod token;
pub mod users;
