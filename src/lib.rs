pub mod config;
pub mod generator;
pub mod models;
pub mod processor;
pub mod storage;
