pub mod anim;
pub mod math;
