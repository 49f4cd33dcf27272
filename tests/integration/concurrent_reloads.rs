use hotload::{Registry, RegistryConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Barrier};
use std::thread;
use std::time::Duration;

#[test]
fn reloads_of_one_unit_never_overlap() {
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let loads = Arc::new(AtomicUsize::new(0));

    let (a, p, l) = (Arc::clone(&active), Arc::clone(&peak), Arc::clone(&loads));
    let registry = Arc::new(Registry::new(
        move |name: &str| -> Result<Arc<String>, String> {
            let now = a.fetch_add(1, Ordering::SeqCst) + 1;
            p.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(5));
            a.fetch_sub(1, Ordering::SeqCst);
            let n = l.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(format!("{}-{}", name, n)))
        },
        RegistryConfig::default(),
    ));
    registry.register("auth").unwrap();

    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                (0..5).filter(|_| registry.reload("auth", true).success).count()
            })
        })
        .collect();
    let succeeded: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    assert_eq!(succeeded, 40);
    assert_eq!(peak.load(Ordering::SeqCst), 1);
    assert_eq!(registry.status().units["auth"].reload_count, 40);
    assert_eq!(registry.history().len(), 40);
}

#[test]
fn readers_are_not_blocked_by_a_slow_load() {
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let (started_tx, started_rx) = mpsc::channel::<()>();
    let release_rx = parking_lot::Mutex::new(release_rx);
    let first = AtomicUsize::new(0);

    let registry = Arc::new(Registry::new(
        move |_: &str| -> Result<Arc<String>, String> {
            if first.fetch_add(1, Ordering::SeqCst) == 0 {
                return Ok(Arc::new("H1".to_string()));
            }
            let _ = started_tx.send(());
            let _ = release_rx.lock().recv();
            Ok(Arc::new("H2".to_string()))
        },
        RegistryConfig::default(),
    ));
    registry.register("auth").unwrap();

    let reloader = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || registry.reload("auth", true))
    };
    started_rx.recv().unwrap();

    // Load is in flight: queries still answer with the committed handle
    assert_eq!(registry.get_handle("auth").unwrap().as_str(), "H1");
    assert_eq!(registry.status().units["auth"].reload_count, 0);
    assert!(registry.reload("auth", false).is_debounced());

    release_tx.send(()).unwrap();
    assert!(reloader.join().unwrap().success);
    assert_eq!(registry.get_handle("auth").unwrap().as_str(), "H2");
}

#[test]
fn concurrent_debounced_requests_admit_exactly_one() {
    let registry = Arc::new(Registry::new(
        |_: &str| -> Result<Arc<String>, String> {
            thread::sleep(Duration::from_millis(2));
            Ok(Arc::new("H".to_string()))
        },
        RegistryConfig::default(),
    ));
    registry.register("auth").unwrap();

    let barrier = Arc::new(Barrier::new(10));
    let handles: Vec<_> = (0..10)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.reload("auth", false)
            })
        })
        .collect();
    let records: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(records.iter().filter(|r| r.success).count(), 1);
    assert_eq!(records.iter().filter(|r| r.is_debounced()).count(), 9);
    assert_eq!(registry.history().len(), 1);
}

#[test]
fn register_races_load_once() {
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&loads);
    let registry = Arc::new(Registry::new(
        move |_: &str| -> Result<Arc<String>, String> {
            counter.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(5));
            Ok(Arc::new("H".to_string()))
        },
        RegistryConfig::default(),
    ));

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.register("auth").unwrap())
        })
        .collect();
    let fresh = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|loaded| *loaded)
        .count();

    assert_eq!(fresh, 1);
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[test]
fn unit_unregistered_mid_pass_is_skipped() {
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let (started_tx, started_rx) = mpsc::channel::<()>();
    let release_rx = parking_lot::Mutex::new(release_rx);
    let registered = AtomicUsize::new(0);

    let registry = Arc::new(Registry::new(
        move |name: &str| -> Result<Arc<String>, String> {
            // The first two loads are the registrations
            if registered.fetch_add(1, Ordering::SeqCst) >= 2 && name == "a" {
                let _ = started_tx.send(());
                let _ = release_rx.lock().recv();
            }
            Ok(Arc::new(name.to_string()))
        },
        RegistryConfig::default(),
    ));
    registry.register("a").unwrap();
    registry.register("b").unwrap();

    let notified = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = Arc::clone(&notified);
    registry.on_reload(move |unit: &str, _: bool, _: Option<&str>| {
        sink.lock().push(unit.to_string());
    });

    let pass = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || registry.reload_all(true))
    };
    started_rx.recv().unwrap();
    assert!(registry.unregister("a"));
    release_tx.send(()).unwrap();

    let records = pass.join().unwrap();
    let outcome: Vec<(&str, bool)> = records
        .iter()
        .map(|r| (r.unit_name.as_str(), r.success))
        .collect();
    assert_eq!(outcome, vec![("b", true)]);
    assert_eq!(registry.history().len(), 1);
    assert_eq!(*notified.lock(), vec!["b".to_string()]);
    assert!(!registry.contains("a"));
}

#[test]
fn observers_see_reloads_of_one_unit_in_commit_order() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);
    let registry = Arc::new(Registry::new(
        move |_: &str| -> Result<Arc<String>, String> {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(1));
            if n % 2 == 0 {
                Ok(Arc::new(format!("v{}", n)))
            } else {
                Err(format!("attempt {} failed", n))
            }
        },
        RegistryConfig::default(),
    ));
    registry.register("auth").unwrap();

    let observed = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = Arc::clone(&observed);
    registry.on_reload(move |_: &str, success: bool, error: Option<&str>| {
        sink.lock().push((success, error.map(str::to_string)));
    });

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for _ in 0..10 {
                    registry.reload("auth", true);
                }
            })
        })
        .collect();
    handles.into_iter().for_each(|h| h.join().unwrap());

    let committed: Vec<(bool, Option<String>)> = registry
        .history()
        .into_iter()
        .map(|r| (r.success, r.error))
        .collect();
    assert_eq!(committed.len(), 40);
    assert_eq!(*observed.lock(), committed);
}
