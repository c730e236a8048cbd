use super::*;

const QUIET: Duration = Duration::from_millis(5000);

#[test]
fn test_fires_after_quiet_interval() {
    let start = Instant::now();
    let mut debouncer = AutosaveDebouncer::new(QUIET);

    assert!(debouncer.schedule(start).is_none());
    assert!(!debouncer.poll(start + Duration::from_millis(4999)));
    assert!(debouncer.poll(start + QUIET));
    assert!(!debouncer.is_pending());
}

#[test]
fn test_fire_consumes_slot() {
    let start = Instant::now();
    let mut debouncer = AutosaveDebouncer::new(QUIET);

    debouncer.schedule(start);
    assert!(debouncer.poll(start + QUIET));
    assert!(!debouncer.poll(start + QUIET * 2));
}

#[test]
fn test_reschedule_replaces_pending_write() {
    let start = Instant::now();
    let mut debouncer = AutosaveDebouncer::new(QUIET);

    debouncer.schedule(start);
    let replaced = debouncer.schedule(start + Duration::from_millis(3000));

    assert_eq!(replaced.map(|p| p.deadline()), Some(start + QUIET));
    assert_eq!(
        debouncer.deadline(),
        Some(start + Duration::from_millis(8000))
    );
    // The first deadline no longer fires.
    assert!(!debouncer.poll(start + QUIET));
    assert!(debouncer.poll(start + Duration::from_millis(8000)));
}

#[test]
fn test_cancel_abandons_write() {
    let start = Instant::now();
    let mut debouncer = AutosaveDebouncer::new(QUIET);

    assert!(!debouncer.cancel());
    debouncer.schedule(start);
    assert!(debouncer.cancel());
    assert!(!debouncer.poll(start + QUIET * 3));
}

#[test]
fn test_zero_quiet_interval_fires_immediately() {
    let start = Instant::now();
    let mut debouncer = AutosaveDebouncer::new(Duration::ZERO);

    debouncer.schedule(start);
    assert!(debouncer.poll(start));
}
