pub mod aggregate;
pub mod normalize;
