pub mod dashboard;
pub mod lifecycle;
pub mod orders;
pub mod sequence;
pub mod visibility;
