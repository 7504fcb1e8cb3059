pub mod events;
pub mod stack;
