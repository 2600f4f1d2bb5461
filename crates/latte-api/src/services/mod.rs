//! Storage services behind async traits.

pub mod lattes;
pub mod projects;

pub use lattes::mock::InMemoryLatteStore;
pub use lattes::{LatteStore, PgLatteStore};
pub use projects::mock::InMemoryProjectStore;
pub use projects::{PgProjectStore, ProjectStore};
