pub mod battery;
pub mod inverter;
pub mod request;
pub mod result;
pub mod types;

pub use battery::*;
pub use inverter::*;
pub use request::*;
pub use result::*;
pub use types::*;
