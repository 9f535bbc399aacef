// cartsync/src/model/mod.rs

//! Line items, carts and their wire formats.

pub mod cart;
pub mod line_item;
pub mod payload;
pub mod quantity;

pub use cart::{Cart, CartSnapshot};
pub use line_item::{LineItem, ProductRef};
pub use payload::{decode_cart_body, decode_mutation_body, encode_mutation_body, MutationReceipt, PayloadStyle};
pub use quantity::parse_quantity;
