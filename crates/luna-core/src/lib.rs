pub mod error;
pub mod consts;
pub mod frame;
pub mod intensity;
pub mod detection;
pub mod align;
pub mod stack;
pub mod filters;
pub mod io;
pub mod pipeline;
