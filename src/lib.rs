//! WallMatch: ranks catalog artworks against a visitor's preferences and
//! renders the best matches onto a photo of their wall.

pub mod bootstrap;
pub mod catalog;
pub mod comms;
pub mod compositor;
pub mod core;
pub mod imagegen;
pub mod matcher;
