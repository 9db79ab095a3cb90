use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use bundlekit::build::Digest;
use bundlekit::fs::mock::MockFileSystem;
use bundlekit::resolve::resolve;
use proptest::prelude::*;

fn file_name() -> impl Strategy<Value = String> {
    ("[a-c]{1,3}", prop_oneof![Just("css"), Just("js")]).prop_map(|(stem, ext)| format!("{stem}.{ext}"))
}

proptest! {
    #[test]
    fn digest_is_deterministic(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        prop_assert_eq!(Digest::of(&bytes), Digest::of(&bytes.clone()));
        let parsed: Digest = Digest::of(&bytes).etag().parse().unwrap();
        prop_assert_eq!(parsed, Digest::of(&bytes));
    }

    #[test]
    fn digest_tracks_content(a in proptest::collection::vec(any::<u8>(), 0..256),
                             b in proptest::collection::vec(any::<u8>(), 0..256)) {
        prop_assert_eq!(a == b, Digest::of(&a) == Digest::of(&b));
    }

    /// Resolved set == (union of includes) minus (union of excludes), with
    /// no duplicates.
    #[test]
    fn resolution_is_include_minus_exclude(
        files in proptest::collection::btree_set(file_name(), 1..8),
        excluded in proptest::collection::btree_set(file_name(), 0..4),
    ) {
        let fs = MockFileSystem::new();
        for f in &files {
            fs.add_file(format!("./src/{f}"), "x");
        }

        let mut patterns = vec!["src/*.css".to_string(), "src/*.js".to_string(), "src/*".to_string()];
        patterns.extend(excluded.iter().map(|e| format!("!src/{e}")));

        let set = resolve(&fs, &patterns, Path::new(".")).unwrap();
        let got: Vec<PathBuf> = set.iter().cloned().collect();
        let unique: BTreeSet<PathBuf> = got.iter().cloned().collect();
        prop_assert_eq!(unique.len(), got.len());

        let expected: BTreeSet<PathBuf> = files
            .difference(&excluded)
            .map(|f| PathBuf::from(format!("./src/{f}")))
            .collect();
        prop_assert_eq!(unique, expected);
    }
}
