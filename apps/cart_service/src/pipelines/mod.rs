// apps/cart_service/src/pipelines/mod.rs

//! Request flows of the cart service, built on `cartsync::Flow`.

pub mod cart_pipeline;
pub mod contexts;
