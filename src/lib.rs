//! Library crate for fundmenot-back, exposing modules for binaries and integration tests.

pub mod ai;
mod config;
pub mod dao;
mod dto;
mod error;
pub mod routes;
pub mod services;
pub mod state;
