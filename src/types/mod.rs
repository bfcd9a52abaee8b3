pub mod app_state;
pub mod arrival_estimate;
pub mod stop;
pub mod user_location;
