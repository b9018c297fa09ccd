pub mod beeper;
pub mod keypad;
pub mod window;
