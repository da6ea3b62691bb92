//! HTTP surface for the book catalog service.

pub mod server;
