//! PostgreSQL repositories.

mod lattes;
mod projects;

pub use lattes::LattesRepository;
pub use projects::ProjectsRepository;
