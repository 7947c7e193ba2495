#![allow(dead_code)]

pub mod events;

/// Route crate logs to the test harness; honors `RUST_LOG`.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
