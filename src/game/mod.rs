pub mod chat_buffer;
pub mod command;
pub mod constants;
pub mod map;
pub mod round_result;
pub mod session;
pub mod state;
pub mod systems;
