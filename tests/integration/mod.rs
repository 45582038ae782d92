//! End-to-end behaviour of the player scheduler

pub mod controls;
