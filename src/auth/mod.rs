pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod model;
pub mod store;


pub use jwt::*;
pub use middleware::*;
pub use model::*;
pub use store::{AuthStoreError, InMemoryUserStore, UserStore};
