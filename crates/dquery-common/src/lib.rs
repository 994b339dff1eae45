pub mod error;
pub mod table;
pub mod value;

pub use error::*;
pub use table::*;
pub use value::*;
