//! Data types shared by the PDF and spreadsheet builders.

mod record;
mod schema;

pub use record::*;
pub use schema::*;
