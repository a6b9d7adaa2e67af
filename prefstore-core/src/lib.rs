pub mod errors;
pub mod identity;
pub mod models;
pub mod paths;
pub mod resolver;
pub mod store;

pub use errors::*;
pub use identity::*;
pub use models::*;
pub use paths::*;
pub use resolver::*;
pub use store::*;
