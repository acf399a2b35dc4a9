pub mod gateway;
pub mod handlers;
pub mod middleware;

pub use gateway::{gateway_router, start_gateway, GatewayState};
