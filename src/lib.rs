//! Chat Climb core library
//!
//! A chat-driven multiplayer platformer race: viewers steer avatars with
//! `!`-prefixed chat commands, every player shares one fixed-tick physics
//! clock, and the first to reach the goal before the countdown wins.

pub mod config;
pub mod game;
pub mod render;
pub mod util;
