pub mod contract;
pub mod radar;
