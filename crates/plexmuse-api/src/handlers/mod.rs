pub mod artists;
pub mod recommendations;
pub mod system;
