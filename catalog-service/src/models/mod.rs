//! Domain records

mod product;

pub use product::{
    NewProduct, Price, Product, ProductChanges, StockStatus, PRICE_MAX_DIGITS, PRICE_SCALE,
};
