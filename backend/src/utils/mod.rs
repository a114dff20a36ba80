pub mod credentials;
pub mod csv;
pub mod time;

pub use credentials::*;
pub use time::*;
