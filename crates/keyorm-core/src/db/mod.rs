//! Query side and persistence side of the engine.

pub mod connection;
pub mod predicate;
pub mod query;
pub mod session;
pub mod sql;

// re-exports
pub use connection::{Connection, Row};
pub use query::{Query, QuerySpec, SortTerm};
pub use session::{CachePolicy, Session, SessionBuilder, SessionConfig, SessionError, SessionResult};
