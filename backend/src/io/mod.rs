//! # IO Module
//!
//! HTTP adapter between the dashboard and the domain services. Handlers parse
//! JSON, log the request, call one service method and translate the result
//! (or `ApiError`) into a response.

pub mod rest;

pub use rest::*;
