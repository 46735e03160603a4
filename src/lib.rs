#![ allow (non_snake_case) ]

pub mod config;
pub mod error;
pub mod hotkeys;
pub mod keys;
pub mod switchback;
pub mod tracker;

#[cfg(windows)]
pub mod tray;
#[cfg(windows)]
pub mod win_apis;

#[cfg(test)]
mod test_utils;
