pub mod assignment_store;
pub mod clock;
pub mod command;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod event;
pub mod fulfillment;
pub mod pool_generator;
pub mod recommendation;
pub mod repository;
pub mod rng;
pub mod role;
pub mod snapshot;
pub mod store;
pub mod types;
pub mod worker;
pub mod workload_ledger;
