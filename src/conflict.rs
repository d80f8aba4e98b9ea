//! Name-collision handling at the destination.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Policy applied when the computed destination already holds a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictStrategy {
    /// Leave the source alone and count it as skipped.
    Skip,
    /// Pick the first free `name (N).ext` next to the existing file.
    #[default]
    Rename,
    /// Replace the existing file.
    Overwrite,
}

/// What to do with a file after conflict resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Transfer the file to this path.
    Use(PathBuf),
    /// Do not touch the file.
    Skip,
}

/// Resolves `destination` against existing files using `strategy`.
///
/// `exists` is called once per candidate path, lazily, so the rename scan stops
/// at the first free name. With an unchanged filesystem the same candidate is
/// returned every time.
///
/// # Examples
///
/// ```
/// use std::path::{Path, PathBuf};
/// use treetidy::conflict::{resolve, ConflictStrategy, Resolution};
///
/// let taken = [PathBuf::from("out/a.txt"), PathBuf::from("out/a (1).txt")];
/// let resolution = resolve(Path::new("out/a.txt"), |p| taken.iter().any(|t| t == p), ConflictStrategy::Rename);
/// assert_eq!(resolution, Resolution::Use(PathBuf::from("out/a (2).txt")));
/// ```
pub fn resolve<F>(destination: &Path, exists: F, strategy: ConflictStrategy) -> Resolution
where
    F: Fn(&Path) -> bool,
{
    if !exists(destination) {
        return Resolution::Use(destination.to_path_buf());
    }

    match strategy {
        ConflictStrategy::Skip => Resolution::Skip,
        ConflictStrategy::Overwrite => Resolution::Use(destination.to_path_buf()),
        ConflictStrategy::Rename => {
            let (base, ext) = split_name(destination);
            let parent = destination.parent().unwrap_or_else(|| Path::new(""));
            (1u64..)
                .map(|n| parent.join(format!("{} ({}){}", base, n, ext)))
                .find(|candidate| !exists(candidate))
                .map(Resolution::Use)
                .unwrap_or(Resolution::Skip)
        }
    }
}

/// Splits a path's file name into base and extension (with its dot).
///
/// A dot in first position does not start an extension, so `.env` stays whole.
fn split_name(path: &Path) -> (String, String) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.rfind('.') {
        Some(dot) if dot > 0 => (name[..dot].to_string(), name[dot..].to_string()),
        _ => (name, String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::Cell;
    use std::collections::HashSet;

    fn existing(paths: &[&str]) -> HashSet<PathBuf> {
        paths.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_free_destination_is_returned_unchanged() {
        let taken = existing(&[]);
        for strategy in [
            ConflictStrategy::Skip,
            ConflictStrategy::Rename,
            ConflictStrategy::Overwrite,
        ] {
            assert_eq!(
                resolve(Path::new("t/a.txt"), |p| taken.contains(p), strategy),
                Resolution::Use(PathBuf::from("t/a.txt"))
            );
        }
    }

    #[test]
    fn test_skip_strategy() {
        let taken = existing(&["t/a.txt"]);
        assert_eq!(
            resolve(Path::new("t/a.txt"), |p| taken.contains(p), ConflictStrategy::Skip),
            Resolution::Skip
        );
    }

    #[test]
    fn test_overwrite_strategy() {
        let taken = existing(&["t/a.txt"]);
        assert_eq!(
            resolve(
                Path::new("t/a.txt"),
                |p| taken.contains(p),
                ConflictStrategy::Overwrite
            ),
            Resolution::Use(PathBuf::from("t/a.txt"))
        );
    }

    #[test]
    fn test_rename_picks_lowest_free_number() {
        let taken = existing(&["t/a.txt", "t/a (1).txt"]);
        assert_eq!(
            resolve(Path::new("t/a.txt"), |p| taken.contains(p), ConflictStrategy::Rename),
            Resolution::Use(PathBuf::from("t/a (2).txt"))
        );
    }

    #[test]
    fn test_rename_fills_gaps() {
        let taken = existing(&["t/a.txt", "t/a (2).txt"]);
        assert_eq!(
            resolve(Path::new("t/a.txt"), |p| taken.contains(p), ConflictStrategy::Rename),
            Resolution::Use(PathBuf::from("t/a (1).txt"))
        );
    }

    #[test]
    fn test_rename_without_extension_and_dotfile() {
        let taken = existing(&["t/note", "t/.env"]);
        assert_eq!(
            resolve(Path::new("t/note"), |p| taken.contains(p), ConflictStrategy::Rename),
            Resolution::Use(PathBuf::from("t/note (1)"))
        );
        assert_eq!(
            resolve(Path::new("t/.env"), |p| taken.contains(p), ConflictStrategy::Rename),
            Resolution::Use(PathBuf::from("t/.env (1)"))
        );
    }

    #[test]
    fn test_rename_keeps_only_last_extension() {
        let taken = existing(&["t/backup.tar.gz"]);
        assert_eq!(
            resolve(
                Path::new("t/backup.tar.gz"),
                |p| taken.contains(p),
                ConflictStrategy::Rename
            ),
            Resolution::Use(PathBuf::from("t/backup.tar (1).gz"))
        );
    }

    #[test]
    fn test_rename_probes_lazily() {
        let taken = existing(&["t/a.txt", "t/a (1).txt", "t/a (2).txt"]);
        let calls = Cell::new(0);
        let resolution = resolve(
            Path::new("t/a.txt"),
            |p| {
                calls.set(calls.get() + 1);
                taken.contains(p)
            },
            ConflictStrategy::Rename,
        );
        assert_eq!(resolution, Resolution::Use(PathBuf::from("t/a (3).txt")));
        // original + (1) + (2) + (3)
        assert_eq!(calls.get(), 4);
    }

    proptest! {
        #[test]
        fn prop_rename_is_idempotent_without_mutation(occupied in 0usize..20) {
            let mut taken = existing(&["t/a.txt"]);
            for n in 1..=occupied {
                taken.insert(PathBuf::from(format!("t/a ({}).txt", n)));
            }
            let first = resolve(Path::new("t/a.txt"), |p| taken.contains(p), ConflictStrategy::Rename);
            let second = resolve(Path::new("t/a.txt"), |p| taken.contains(p), ConflictStrategy::Rename);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first, Resolution::Use(PathBuf::from(format!("t/a ({}).txt", occupied + 1))));
        }
    }
}
