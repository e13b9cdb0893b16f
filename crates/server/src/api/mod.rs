pub mod handlers;
pub mod maps;
pub mod middleware;
pub mod routes;

pub use routes::create_router;
