pub mod order;

pub use order::{Item, OrderRecord, RawRecord, ValidationError};
