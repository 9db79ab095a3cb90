mod common;
use crate::common::{TestResult, init_tracing, sample_site};

use std::sync::{Arc, Barrier};
use std::thread;

use bundlekit::build::{BundleBuilder, TransformTable};
use bundlekit::cache::SlotPolicy;
use bundlekit::fs::RealFileSystem;
use bundlekit::service::BundleService;

const THREADS: usize = 8;

fn service() -> Arc<BundleService> {
    let builder =
        BundleBuilder::new(Arc::new(RealFileSystem)).with_transforms(TransformTable::empty());
    Arc::new(BundleService::new(
        builder,
        SlotPolicy {
            watch: false,
            ..SlotPolicy::default()
        },
    ))
}

#[test]
fn simultaneous_first_requests_build_once() -> TestResult {
    init_tracing();
    let site = sample_site();
    let svc = service();
    let handler = svc.register_style("/site.css", true, ["css/*.css"])?;
    let root = site.root().to_path_buf();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let svc = Arc::clone(&svc);
            let root = root.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                svc.handle("/site.css", None, &root)
                    .map(|r| r.and_then(|d| d.etag().map(str::to_string)))
            })
        })
        .collect();

    let mut etags = Vec::new();
    for handle in handles {
        etags.push(handle.join().expect("request thread panicked")?);
    }

    assert_eq!(handler.slot().rebuild_count(), 1);
    assert!(etags.iter().all(|e| e.is_some() && *e == etags[0]));
    Ok(())
}

#[test]
fn dirty_slot_under_load_rebuilds_once() -> TestResult {
    init_tracing();
    let site = sample_site();
    let svc = service();
    let handler = svc.register_script("/app.js", false, ["js/*.js"])?;
    svc.handle("/app.js", None, site.root())?;

    site.write("js/app.js", "var app = { v: 2 };\n");
    handler.slot().mark_dirty();

    let root = site.root().to_path_buf();
    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let svc = Arc::clone(&svc);
            let root = root.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                svc.handle("/app.js", None, &root).map(|r| r.is_some())
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().expect("request thread panicked")?);
    }

    assert_eq!(handler.slot().rebuild_count(), 2);
    assert_eq!(svc.store().len(), 1);
    Ok(())
}

#[test]
fn distinct_bundles_build_in_parallel() -> TestResult {
    init_tracing();
    let site = sample_site();
    let svc = service();
    let paths = ["/a.css", "/b.css", "/c.js", "/d.js"];
    svc.register_style(paths[0], false, ["css/*.css"])?;
    svc.register_style(paths[1], true, ["css/*.css", "!css/print.css"])?;
    svc.register_script(paths[2], false, ["js/*.js"])?;
    svc.register_script(paths[3], true, ["js/*.js"])?;

    let root = site.root().to_path_buf();
    let handles: Vec<_> = paths
        .iter()
        .map(|path| {
            let svc = Arc::clone(&svc);
            let root = root.clone();
            let path = path.to_string();
            thread::spawn(move || {
                svc.handle(&path, None, &root)
                    .map(|r| r.map(|d| (path, d.status, d.body.len())))
            })
        })
        .collect();
    for handle in handles {
        let (path, status, len) = handle
            .join()
            .expect("request thread panicked")?
            .expect("registered path");
        assert_eq!(status, 200, "{path}");
        assert!(len > 0, "{path} built an empty bundle");
    }

    for handler in svc.handlers() {
        assert_eq!(handler.slot().rebuild_count(), 1, "{}", handler.path());
    }
    Ok(())
}
