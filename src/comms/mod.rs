//! Inbound channels. Only the axum HTTP API exists today.

pub mod axum_channel;
