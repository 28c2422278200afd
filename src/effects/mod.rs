pub mod scramble;
pub mod transition;
