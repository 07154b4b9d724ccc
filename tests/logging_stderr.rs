//! Logger setup without a log directory

use rolegate::{logging, LogSettings};

#[test]
fn empty_dir_logs_to_stderr() {
    let settings = LogSettings { dir: String::new(), ..LogSettings::default() };
    logging::init(&settings).unwrap();
    assert!(logging::is_initialized());
    log::warn!("rejected permission reload: test line");
    logging::shutdown();
    assert!(!logging::is_initialized());
}
