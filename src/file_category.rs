/// File categorization by extension.
///
/// Maps a file name onto one of a fixed set of categories using a static
/// extension table. Lookup only looks at the extension, which is taken from
/// the last `.` in the name and compared case-insensitively.
///
/// # Examples
///
/// ```
/// use sortdir::file_category::{Category, resolve};
///
/// assert_eq!(resolve("holiday.JPG"), Category::Images);
/// assert_eq!(resolve("notes.txt"), Category::Documents);
/// assert_eq!(resolve("Makefile"), Category::Others);
/// ```
use std::fmt;

/// A category folder that files are sorted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Image files (JPG, PNG, GIF, BMP)
    Images,
    /// Document files (PDF, DOCX, TXT, PPTX, XLSX)
    Documents,
    /// Video files (MP4, MKV, AVI, MOV)
    Videos,
    /// Audio files (MP3, WAV, FLAC)
    Music,
    /// Archive files (ZIP, RAR, TAR, GZ)
    Archives,
    /// Fallback for anything the table does not list
    Others,
}

/// Extension table, walked in order. Extensions are lowercase, dot included,
/// and never appear under two categories.
static CATEGORY_TABLE: [(Category, &[&str]); 5] = [
    (Category::Images, &[".jpg", ".jpeg", ".png", ".gif", ".bmp"]),
    (
        Category::Documents,
        &[".pdf", ".docx", ".txt", ".doc", ".pptx", ".xlsx"],
    ),
    (Category::Videos, &[".mp4", ".mkv", ".avi", ".mov"]),
    (Category::Music, &[".mp3", ".wav", ".flac"]),
    (Category::Archives, &[".zip", ".rar", ".tar", ".gz"]),
];

impl Category {
    /// The category used when no extension matches.
    pub const FALLBACK: Category = Category::Others;

    /// Returns the subfolder name for this category.
    ///
    /// ```
    /// use sortdir::file_category::Category;
    ///
    /// assert_eq!(Category::Music.dir_name(), "Music");
    /// assert_eq!(Category::Others.dir_name(), "Others");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Images => "Images",
            Category::Documents => "Documents",
            Category::Videos => "Videos",
            Category::Music => "Music",
            Category::Archives => "Archives",
            Category::Others => "Others",
        }
    }

    /// Returns the extensions owned by this category. Empty for the fallback.
    pub fn extensions(&self) -> &'static [&'static str] {
        CATEGORY_TABLE
            .iter()
            .find(|(category, _)| category == self)
            .map(|(_, extensions)| *extensions)
            .unwrap_or(&[])
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Returns the lowercased extension of `file_name`, from its last `.` to the
/// end, or an empty string if the name has no `.`.
///
/// A leading dot counts, so `.gitignore` has the extension `.gitignore`.
pub fn extension_of(file_name: &str) -> String {
    file_name
        .rfind('.')
        .map(|idx| file_name[idx..].to_lowercase())
        .unwrap_or_default()
}

/// Resolves the category of a file from its name.
///
/// Returns the first category in table order whose extension list contains
/// the file's extension, or [`Category::FALLBACK`].
pub fn resolve(file_name: &str) -> Category {
    let extension = extension_of(file_name);
    if extension.is_empty() {
        return Category::FALLBACK;
    }

    CATEGORY_TABLE
        .iter()
        .find(|(_, extensions)| extensions.contains(&extension.as_str()))
        .map(|(category, _)| *category)
        .unwrap_or(Category::FALLBACK)
}
