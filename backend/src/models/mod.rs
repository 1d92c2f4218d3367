pub mod moon;
pub mod optics;
pub mod plan;
pub mod request;

pub use moon::*;
pub use optics::*;
pub use plan::*;
pub use request::*;
