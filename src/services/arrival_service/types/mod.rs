pub mod arrival_error;
pub mod bus_arrival_response;
