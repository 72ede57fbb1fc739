pub mod graph;
pub mod health;
