pub mod compositor;
pub mod layer;
pub mod occupancy;
pub mod policy;
