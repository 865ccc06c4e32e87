pub mod battery;
pub mod board;
pub mod buzzer;
pub mod ili9341;
pub mod max30102;
pub mod xpt2046;
