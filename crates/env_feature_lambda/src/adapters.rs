pub mod response_sender;
pub mod stack_client;
