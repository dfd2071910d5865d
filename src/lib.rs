//! flow-pieces: Kommo and Zagomail connectors for a workflow-automation host, hexagonal layout.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
