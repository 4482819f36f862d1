pub mod mem;
pub mod persistent;
pub mod traits;
pub mod wal;

pub use mem::InMemoryProvider;
pub use persistent::PersistentProvider;
pub use traits::*;
