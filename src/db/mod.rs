pub mod connection;
pub mod migrations;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod seed;

#[cfg(test)]
pub mod memory;

pub use postgres::PgRepository;
