pub mod bundle;
pub mod component;
pub mod filter;
pub mod request;

pub use bundle::*;
pub use component::*;
pub use filter::*;
pub use request::*;
