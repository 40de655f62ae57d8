//! HTTP surface of the serial issuance engine.

pub mod app;
