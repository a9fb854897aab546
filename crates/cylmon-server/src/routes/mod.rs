pub mod actuators;
pub mod events;
pub mod status;
