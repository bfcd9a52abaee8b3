pub mod arrival_service;
pub mod destinations;
pub mod normalize;
pub mod types;
