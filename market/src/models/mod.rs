// galleria-market/src/models/mod.rs

//! Rows and views of the cart, order, address and catalog tables.

pub mod address;
pub mod artwork;
pub mod cart;
pub mod order;

pub use address::{Address, AddressSelection, NewAddress};
pub use artwork::ArtworkSummary;
pub use cart::{parse_quantity_form, Cart, CartItem, CartLine, CartView};
pub use order::{Order, OrderDetail, OrderItem, OrderLine, OrderStatus, OrderSummary};
