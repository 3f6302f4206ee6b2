//! HTTP-Handler der API

pub mod auth;
pub mod events;
pub mod kanaele;
