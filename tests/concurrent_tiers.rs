//! Writers racing movers. There is no locking, so these assert the set of
//! acceptable outcomes rather than a single final state.

use dual_tier::{DualFile, DualTierError};
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tempfile::tempdir;

#[test]
fn writer_and_mover_race_leaves_a_known_state() {
    let td = tempdir().unwrap();
    let p = td.path().join("p");
    let s = td.path().join("s");
    let f = DualFile::new(p.join("counter"), s.join("counter")).unwrap();
    f.write(&0_u32).unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let mover = {
        let f = f.clone();
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut rounds = 0;
            while !done.load(Ordering::Relaxed) {
                f.move_to_secondary().unwrap();
                f.move_to_primary().unwrap();
                rounds += 1;
            }
            rounds
        })
    };
    let reader = {
        let f = f.clone();
        let done = Arc::clone(&done);
        thread::spawn(move || {
            while !done.load(Ordering::Relaxed) {
                match f.read::<u32>() {
                    Ok(v) => assert!(v <= 200, "read a value nobody wrote: {v}"),
                    // a racing mover can briefly leave nothing to read
                    Err(DualTierError::NotFound { .. }) => {}
                    Err(e) => panic!("unexpected read error: {e}"),
                }
            }
        })
    };

    for i in 1..=200_u32 {
        f.write(&i).unwrap();
    }
    done.store(true, Ordering::Relaxed);
    mover.join().unwrap();
    reader.join().unwrap();

    // Acceptable: one copy, both copies, or the losing write vanished.
    let in_p = p.join("counter").is_file();
    let in_s = s.join("counter").is_file();
    for (present, path) in [(in_p, p.join("counter")), (in_s, s.join("counter"))] {
        if present {
            let v: u32 = fs::read_to_string(&path).unwrap().parse().unwrap();
            assert!(v <= 200);
        }
    }

    // Once the race is over, a plain write converges to exactly one copy.
    f.write(&999_u32).unwrap();
    assert_eq!(f.read::<u32>().unwrap(), 999);
    assert!(f.is_in_primary() ^ f.is_only_in_secondary());

    for dir in [&p, &s] {
        if let Ok(entries) = fs::read_dir(dir) {
            for e in entries {
                let name = e.unwrap().file_name().to_string_lossy().into_owned();
                assert!(!name.ends_with(".tmp"), "temp file left behind: {name}");
            }
        }
    }
}

#[test]
fn concurrent_demotes_of_one_file_are_idempotent() {
    let td = tempdir().unwrap();
    let f = DualFile::new(td.path().join("p/x.txt"), td.path().join("s/x.txt")).unwrap();
    f.write_text("payload").unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let f = f.clone();
            thread::spawn(move || f.move_to_secondary())
        })
        .collect();
    for h in handles {
        h.join().unwrap().unwrap();
    }

    assert!(f.is_only_in_secondary());
    assert_eq!(f.read_text().unwrap(), "payload");
}
