pub mod client_ip;
pub mod throttle;
pub mod timeout;
