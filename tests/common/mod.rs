// Each test binary uses its own subset of the fixtures.
#![allow(dead_code)]

pub mod fixtures;
