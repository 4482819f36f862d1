pub mod errors;
pub mod guard;
pub mod model;
pub mod query;
pub mod util;

pub use errors::*;
pub use guard::*;
pub use model::*;
pub use query::*;
