#![allow(dead_code)]

pub mod aircode_env;
pub mod fixtures;
