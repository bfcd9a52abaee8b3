pub mod arrival_board;
pub mod arrival_service;
pub mod catalog_service;
pub mod location_service;
pub mod proximity;
