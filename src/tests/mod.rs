pub use stream::test_stream;

/// Route `log` records to the test output.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
