//! Media categories and the extension → MIME lookup.
//!
//! A file's category is the primary segment of its MIME type, and the MIME
//! type comes from a static table keyed by extension. Nothing here reads file
//! content.
//!
//! # Examples
//!
//! ```
//! use phototidy::file_category::{Category, FileMapper};
//!
//! let mapper = FileMapper::default();
//! assert_eq!(mapper.mime_for("JPG").as_deref(), Some("image/jpeg"));
//! assert_eq!(mapper.coarse_type_for("mov"), Some(Category::Video));
//! assert_eq!(mapper.coarse_type_for("txt"), Some(Category::Other));
//! assert_eq!(mapper.coarse_type_for("nosuchext"), None);
//! ```
use std::collections::HashMap;

use serde::Serialize;

/// The coarse type of a file, taken from its MIME type's primary segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// `image/*`
    Image,
    /// `video/*`
    Video,
    /// `audio/*`
    Audio,
    /// Any other recognized MIME type (text, application, ...).
    Other,
}

impl Category {
    /// Categories that can decide a group's type.
    pub const MEDIA: [Category; 3] = [Category::Image, Category::Audio, Category::Video];

    /// True for image, audio and video.
    pub fn is_media(&self) -> bool {
        Self::MEDIA.contains(self)
    }

    /// Returns the top-level directory name for this category.
    ///
    /// ```
    /// use phototidy::file_category::Category;
    ///
    /// assert_eq!(Category::Image.dir_name(), "Image");
    /// assert_eq!(Category::Other.dir_name(), "Other");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Image => "Image",
            Category::Video => "Video",
            Category::Audio => "Audio",
            Category::Other => "Other",
        }
    }

    /// Lowercase label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Image => "image",
            Category::Video => "video",
            Category::Audio => "audio",
            Category::Other => "other",
        }
    }

    /// Maps a MIME type to its category by primary segment.
    ///
    /// ```
    /// use phototidy::file_category::Category;
    ///
    /// assert_eq!(Category::from_mime("image/tiff"), Category::Image);
    /// assert_eq!(Category::from_mime("application/pdf"), Category::Other);
    /// ```
    pub fn from_mime(mime_type: &str) -> Category {
        let primary = mime_type.split('/').next().unwrap_or_default();
        match primary.to_ascii_lowercase().as_str() {
            "image" => Category::Image,
            "video" => Category::Video,
            "audio" => Category::Audio,
            _ => Category::Other,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Maps file extensions to MIME types.
///
/// Lookups hit the built-in override table first (camera RAW and sidecar
/// formats the shared MIME database leaves out), then the `mime_guess`
/// database. Extensions are matched case-insensitively.
#[derive(Debug, Clone)]
pub struct FileMapper {
    overrides: HashMap<String, String>,
}

impl FileMapper {
    /// Creates a new `FileMapper` with the standard overrides.
    pub fn new() -> Self {
        let mut mapper = Self {
            overrides: HashMap::new(),
        };
        mapper.populate_standard_overrides();
        mapper
    }

    fn populate_standard_overrides(&mut self) {
        // Camera RAW
        self.add_extension_mapping("dng", "image/x-adobe-dng");
        self.add_extension_mapping("cr2", "image/x-canon-cr2");
        self.add_extension_mapping("cr3", "image/x-canon-cr3");
        self.add_extension_mapping("nef", "image/x-nikon-nef");
        self.add_extension_mapping("arw", "image/x-sony-arw");
        self.add_extension_mapping("orf", "image/x-olympus-orf");
        self.add_extension_mapping("rw2", "image/x-panasonic-rw2");
        self.add_extension_mapping("raf", "image/x-fuji-raf");

        // Phone formats
        self.add_extension_mapping("heic", "image/heic");
        self.add_extension_mapping("heif", "image/heif");
        self.add_extension_mapping("m4v", "video/x-m4v");
        self.add_extension_mapping("3gp", "video/3gpp");
        self.add_extension_mapping("m4a", "audio/mp4");

        // Sidecars
        self.add_extension_mapping("xmp", "application/rdf+xml");
    }

    /// Adds or replaces an extension → MIME mapping.
    pub fn add_extension_mapping(&mut self, ext: &str, mime_type: &str) {
        self.overrides
            .insert(ext.to_lowercase(), mime_type.to_lowercase());
    }

    /// Looks up the MIME type for an extension. Empty or unknown → `None`.
    pub fn mime_for(&self, ext: &str) -> Option<String> {
        if ext.is_empty() {
            return None;
        }
        let ext = ext.to_lowercase();
        if let Some(mime) = self.overrides.get(&ext) {
            return Some(mime.clone());
        }
        mime_guess::from_ext(&ext)
            .first()
            .map(|mime| mime.essence_str().to_string())
    }

    /// Category for an extension, or `None` when the extension is unknown.
    pub fn coarse_type_for(&self, ext: &str) -> Option<Category> {
        self.mime_for(ext).as_deref().map(Category::from_mime)
    }
}

impl Default for FileMapper {
    fn default() -> Self {
        Self::new()
    }
}
