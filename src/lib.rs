#![doc = include_str!("../README.md")]

pub use carton_codec as codec;
pub use carton_model as model;
pub use carton_plan as plan;
