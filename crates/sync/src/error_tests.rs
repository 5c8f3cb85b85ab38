// SPDX-License-Identifier: MIT

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;

#[test]
fn test_error_messages() {
    assert_eq!(Error::Offline.to_string(), "cannot sync while offline");
    assert_eq!(
        Error::AlreadySyncing.to_string(),
        "sync already in progress"
    );
    assert_eq!(
        Error::SchedulerStopped.to_string(),
        "sync scheduler is not running"
    );
    assert_eq!(
        Error::Config("bad interval".to_string()).to_string(),
        "config error: bad interval"
    );
}

#[test]
fn test_io_error_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let err: Error = io.into();
    assert!(matches!(err, Error::Io(_)));
    assert!(err.to_string().contains("missing"));
}
