pub mod model;

pub use model::{Submitted, Transaction};
