//! Habits, tasks, time logging, journaling and a handful of smaller productivity tools behind one
//! command line application. Every tool keeps its own JSON document in a shared data directory
//! and every command is a single locked read-modify-write of that document.
//!

pub mod cli;
pub mod error;
pub mod fs;
pub mod storage;
pub mod tools;
pub mod tracker;
pub mod utils;
