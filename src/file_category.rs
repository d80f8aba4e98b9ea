/// File classification: turns a visited file into the name of its destination folder.
///
/// Three schemes are supported: the lowercase extension, the modification month,
/// or a coarse type category looked up in a fixed extension table.
///
/// # Examples
///
/// ```
/// use treetidy::file_category::{Category, TypeTable};
///
/// let table = TypeTable::default();
/// assert_eq!(table.category_for("png"), Category::Image);
/// assert_eq!(table.category_for("mp3"), Category::Audio);
/// assert_eq!(table.category_for("xyz"), Category::Other);
/// ```
use crate::file_organizer::FileEntry;
use chrono::{DateTime, Local};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Folder used for files whose name carries no extension.
pub const NO_EXTENSION_DIR: &str = "_no_ext";

/// The rule used to derive a destination folder from a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassificationMode {
    /// One folder per lowercase extension (`jpg/`, `pdf/`, `_no_ext/`).
    #[default]
    ByExtension,
    /// Nested `YYYY/MM` folders from the local modification time.
    ByDate,
    /// Coarse category folders (`Images/`, `Code/`, `Others/`).
    ByType,
}

/// Represents a coarse file category for the by-type scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Image,
    Video,
    Audio,
    Document,
    Spreadsheet,
    Presentation,
    Archive,
    Code,
    /// Anything the table does not know about.
    Other,
}

impl Category {
    /// Returns the folder name for this category.
    ///
    /// # Examples
    ///
    /// ```
    /// use treetidy::file_category::Category;
    ///
    /// assert_eq!(Category::Image.dir_name(), "Images");
    /// assert_eq!(Category::Other.dir_name(), "Others");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Image => "Images",
            Category::Video => "Videos",
            Category::Audio => "Audio",
            Category::Document => "Documents",
            Category::Spreadsheet => "Spreadsheets",
            Category::Presentation => "Presentations",
            Category::Archive => "Archives",
            Category::Code => "Code",
            Category::Other => "Others",
        }
    }
}

/// Maps lowercase file extensions to categories.
///
/// Built once per organizer and only read afterwards.
#[derive(Debug, Clone)]
pub struct TypeTable {
    extension_map: HashMap<&'static str, Category>,
}

impl TypeTable {
    /// Creates a new `TypeTable` with the standard mappings.
    pub fn new() -> Self {
        let mut table = Self {
            extension_map: HashMap::new(),
        };
        table.populate_standard_mappings();
        table
    }

    fn populate_standard_mappings(&mut self) {
        self.add_mappings(
            Category::Image,
            &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp", "heic", "raw", "svg"],
        );
        self.add_mappings(
            Category::Video,
            &["mp4", "mov", "avi", "mkv", "wmv", "flv", "webm", "m4v"],
        );
        self.add_mappings(
            Category::Audio,
            &["mp3", "wav", "flac", "aac", "ogg", "m4a", "wma"],
        );
        self.add_mappings(
            Category::Document,
            &["pdf", "doc", "docx", "rtf", "txt", "odt", "md"],
        );
        self.add_mappings(Category::Spreadsheet, &["xls", "xlsx", "csv", "ods"]);
        self.add_mappings(Category::Presentation, &["ppt", "pptx", "odp", "key"]);
        self.add_mappings(
            Category::Archive,
            &["zip", "rar", "7z", "tar", "gz", "bz2"],
        );
        self.add_mappings(
            Category::Code,
            &[
                "java", "kt", "kts", "py", "js", "ts", "html", "css", "c", "h", "cpp", "hpp",
                "cc", "cs", "go", "rb", "php", "rs", "swift", "m", "mm", "sh", "bat", "ps1",
                "sql", "json", "xml", "yml", "yaml", "ini", "toml", "gradle",
            ],
        );
    }

    fn add_mappings(&mut self, category: Category, extensions: &[&'static str]) {
        for ext in extensions {
            self.extension_map.insert(ext, category);
        }
    }

    /// Looks up a category by extension (case-insensitive, without the dot).
    pub fn category_for(&self, extension: &str) -> Category {
        self.extension_map
            .get(extension.to_lowercase().as_str())
            .copied()
            .unwrap_or(Category::Other)
    }

    /// Computes the destination folder for `entry` under `mode`.
    ///
    /// The result is never empty. For [`ClassificationMode::ByDate`] it contains a
    /// `/` and is meant to be joined as a nested path.
    pub fn destination_folder(&self, entry: &FileEntry, mode: ClassificationMode) -> String {
        match mode {
            ClassificationMode::ByExtension => {
                let ext = extension_of(&entry.file_name);
                if ext.is_empty() {
                    NO_EXTENSION_DIR.to_string()
                } else {
                    ext
                }
            }
            ClassificationMode::ByDate => {
                let local: DateTime<Local> = entry.modified.into();
                local.format("%Y/%m").to_string()
            }
            ClassificationMode::ByType => self
                .category_for(&extension_of(&entry.file_name))
                .dir_name()
                .to_string(),
        }
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the lowercase text after the last `.` of `name`.
///
/// Empty when there is no dot or the name ends with one. A leading dot counts,
/// so `.bashrc` yields `bashrc`.
pub fn extension_of(name: &str) -> String {
    match name.rfind('.') {
        Some(dot) if dot + 1 < name.len() => name[dot + 1..].to_lowercase(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::path::PathBuf;
    use std::time::SystemTime;

    fn entry(name: &str, modified: SystemTime) -> FileEntry {
        FileEntry {
            path: PathBuf::from("/src").join(name),
            parent: PathBuf::from("/src"),
            file_name: name.to_string(),
            modified,
            is_file: true,
        }
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("photo.JPG"), "jpg");
        assert_eq!(extension_of("archive.tar.gz"), "gz");
        assert_eq!(extension_of("note"), "");
        assert_eq!(extension_of("trailing."), "");
        assert_eq!(extension_of(".bashrc"), "bashrc");
    }

    #[test]
    fn test_by_extension_lowercases() {
        let table = TypeTable::new();
        let e = entry("photo.JPG", SystemTime::now());
        assert_eq!(
            table.destination_folder(&e, ClassificationMode::ByExtension),
            "jpg"
        );
    }

    #[test]
    fn test_by_extension_no_extension_sentinel() {
        let table = TypeTable::new();
        for name in ["note", "README", "weird."] {
            let e = entry(name, SystemTime::now());
            assert_eq!(
                table.destination_folder(&e, ClassificationMode::ByExtension),
                NO_EXTENSION_DIR
            );
        }
    }

    #[test]
    fn test_by_type_known_and_unknown() {
        let table = TypeTable::new();
        let cases = [
            ("a.PNG", "Images"),
            ("a.mkv", "Videos"),
            ("a.flac", "Audio"),
            ("a.md", "Documents"),
            ("a.csv", "Spreadsheets"),
            ("a.key", "Presentations"),
            ("a.7z", "Archives"),
            ("a.rs", "Code"),
            ("a.xyz", "Others"),
            ("noext", "Others"),
        ];
        for (name, expected) in cases {
            let e = entry(name, SystemTime::now());
            assert_eq!(
                table.destination_folder(&e, ClassificationMode::ByType),
                expected,
                "classifying {}",
                name
            );
        }
    }

    #[test]
    fn test_by_date_uses_local_year_and_month() {
        let table = TypeTable::new();
        let now = SystemTime::now();
        let local: DateTime<Local> = now.into();
        let expected = local.format("%Y/%m").to_string();

        let folder = table.destination_folder(&entry("x.txt", now), ClassificationMode::ByDate);
        assert_eq!(folder, expected);
        assert_eq!(folder.len(), 7);
        assert_eq!(&folder[4..5], "/");
    }

    proptest! {
        #[test]
        fn prop_by_extension_is_case_insensitive(stem in "[a-zA-Z0-9_]{1,12}", ext in "[a-zA-Z0-9]{1,6}") {
            let table = TypeTable::new();
            let lower = entry(&format!("{}.{}", stem, ext.to_lowercase()), SystemTime::UNIX_EPOCH);
            let upper = entry(&format!("{}.{}", stem, ext.to_uppercase()), SystemTime::UNIX_EPOCH);

            let a = table.destination_folder(&lower, ClassificationMode::ByExtension);
            let b = table.destination_folder(&upper, ClassificationMode::ByExtension);
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(a, ext.to_lowercase());
        }

        #[test]
        fn prop_names_without_dot_use_sentinel(name in "[a-zA-Z0-9_ -]{1,20}") {
            let table = TypeTable::new();
            let e = entry(&name, SystemTime::UNIX_EPOCH);
            prop_assert_eq!(
                table.destination_folder(&e, ClassificationMode::ByExtension),
                NO_EXTENSION_DIR
            );
        }

        #[test]
        fn prop_classification_is_deterministic(name in "[a-zA-Z0-9._]{1,20}", secs in 0u64..4_000_000_000) {
            let table = TypeTable::new();
            let modified = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(secs);
            let e = entry(&name, modified);
            for mode in [ClassificationMode::ByExtension, ClassificationMode::ByDate, ClassificationMode::ByType] {
                let first = table.destination_folder(&e, mode);
                prop_assert!(!first.is_empty());
                prop_assert_eq!(first, table.destination_folder(&e, mode));
            }
        }
    }
}
