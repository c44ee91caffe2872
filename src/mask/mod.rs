pub mod group;
pub mod naming;
