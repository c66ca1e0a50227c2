pub mod calibration;
pub mod quota;
