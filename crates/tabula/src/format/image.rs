use crate::html;

use tabula_core::Row;

use std::fmt::Debug;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

/// Answers whether an image path refers to an existing file.
pub trait FileProbe: Debug + Send + Sync {
    fn exists(&self, path: &str) -> bool;
}

/// Probes paths relative to a public root directory on the local disk.
#[derive(Debug, Clone)]
pub struct DiskProbe {
    root: PathBuf,
}

impl DiskProbe {
    pub fn new(root: impl Into<PathBuf>) -> DiskProbe {
        DiskProbe { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileProbe for DiskProbe {
    fn exists(&self, path: &str) -> bool {
        let relative = path.trim_start_matches('/');
        !relative.is_empty() && self.root.join(relative).is_file()
    }
}

/// Where an image cell's picture comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// The row's `{field}_thumb` value.
    Sibling(String),

    /// `{dir}/thumb/tnail_{file}` next to the original.
    Conventional(String),

    Original(String),

    /// No file found; carries the path that was looked for.
    Missing(String),
}

impl ImageSource {
    pub fn render(&self) -> String {
        match self {
            ImageSource::Sibling(path)
            | ImageSource::Conventional(path)
            | ImageSource::Original(path) => format!(
                r#"<img src="{}" class="img-thumbnail" alt="" />"#,
                html::escape(&absolute(path))
            ),
            ImageSource::Missing(path) => format!(
                r#"<span class="text-warning image-missing" title="{}"><i class="fa fa-warning"></i> Image not found</span>"#,
                html::escape(path)
            ),
        }
    }
}

/// Extension heuristic on a raw cell value. Query strings and fragments are
/// ignored.
pub fn is_image(value: &str) -> bool {
    let path = value.split(['?', '#']).next().unwrap_or_default();
    path.rsplit_once('.').is_some_and(|(stem, ext)| {
        !stem.is_empty() && IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
    })
}

/// Name of the optional sibling column holding a thumbnail for `field`.
pub fn sibling_field(field: &str) -> String {
    format!("{field}_thumb")
}

/// `uploads/a/photo.png` becomes `uploads/a/thumb/tnail_photo.png`.
pub fn conventional_thumbnail(path: &str) -> String {
    match path.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/thumb/tnail_{file}"),
        None => format!("thumb/tnail_{path}"),
    }
}

/// Picks the picture to display for `field` in `row`.
///
/// Preference order: the `{field}_thumb` sibling, the conventional thumbnail,
/// then the original. Each candidate counts only when its file exists.
pub fn resolve(field: &str, row: &Row, probe: &dyn FileProbe) -> ImageSource {
    let original = row.value(field).render();

    if let Some(sibling) = row.get(&sibling_field(field)) {
        let sibling = sibling.render();
        if !sibling.is_empty() && probe.exists(&sibling) {
            return ImageSource::Sibling(sibling);
        }
    }

    let conventional = conventional_thumbnail(&original);
    if probe.exists(&conventional) {
        return ImageSource::Conventional(conventional);
    }

    if probe.exists(&original) {
        return ImageSource::Original(original);
    }

    ImageSource::Missing(original)
}

fn absolute(path: &str) -> String {
    if path.starts_with('/') || path.contains("://") {
        path.to_string()
    } else {
        format!("/{path}")
    }
}
