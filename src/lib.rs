#![doc = "The `task_manager` library crate."]
#![doc = ""]
#![doc = "Domain models, storage backends, authentication, routing and error handling"]
#![doc = "for the Task Manager service. The binary (`main.rs`) wires them into an HTTP server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod seed;
pub mod store;
