// Each test binary only uses part of the helpers
#![allow(dead_code)]

pub mod test_utils;
