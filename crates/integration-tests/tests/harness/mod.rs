//! Shared test harness: config builder, mock upstreams, test server
#![allow(dead_code)]

pub mod config;
pub mod mock_afdian;
pub mod mock_model;
pub mod server;
