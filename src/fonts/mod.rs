//! Font loading for quiz documents.
//!
//! A family named `Name` is expected as `Name-Regular.ttf`, `Name-Bold.ttf`, `Name-Italic.ttf`
//! and `Name-BoldItalic.ttf` in the first directory that has all four files:
//!
//! 1. `$QUIZ_FORMS_FONTS_DIR`
//! 2. `assets/fonts` next to the running executable
//! 3. `assets/fonts` in the crate root
//!
//! When none of them has the files of the default family, the Windows Arial family is tried as a
//! fallback.  Any other family name must be found, or loading fails.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{self, FontData, FontFamily};
use log::{debug, warn};

use crate::settings::DEFAULT_FONT_FAMILY;

/// Environment variable that points at a directory with the font files.
pub const FONTS_DIR_ENV: &str = "QUIZ_FORMS_FONTS_DIR";

const WINDOWS_FONTS_DIR_ENV: &str = "QUIZ_FORMS_WINDOWS_FONTS_DIR";
const WINDOWS_FALLBACK_FAMILY_NAME: &str = "Arial";

const FONT_STYLES: &[&str] = &["Regular", "Bold", "Italic", "BoldItalic"];

struct WindowsFontFiles {
    regular: &'static str,
    bold: &'static str,
    italic: &'static str,
    bold_italic: &'static str,
}

const WINDOWS_FONT_FILES: WindowsFontFiles = WindowsFontFiles {
    regular: "arial.ttf",
    bold: "arialbd.ttf",
    italic: "ariali.ttf",
    bold_italic: "arialbi.ttf",
};

fn font_file_names(family: &str) -> Vec<String> {
    FONT_STYLES
        .iter()
        .map(|style| format!("{family}-{style}.ttf"))
        .collect()
}

/// Directory the crate looks in last, `assets/fonts` under the crate root.
pub fn bundled_fonts_source_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts")
}

fn font_directory_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(path) = env_path(FONTS_DIR_ENV) {
        candidates.push(path);
    }

    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            let candidate = bin_dir.join("assets/fonts");
            if !candidates.iter().any(|existing| existing == &candidate) {
                candidates.push(candidate);
            }
        }
    }

    let manifest_candidate = bundled_fonts_source_dir();
    if !candidates
        .iter()
        .any(|existing| existing == &manifest_candidate)
    {
        candidates.push(manifest_candidate);
    }

    candidates
}

fn missing_font_files(path: &Path, family: &str) -> Vec<String> {
    font_file_names(family)
        .into_iter()
        .filter(|name| !path.join(name).is_file())
        .collect()
}

fn resolve_font_directory(family: &str) -> Result<PathBuf, Error> {
    let mut attempts = Vec::new();

    for candidate in font_directory_candidates() {
        if !candidate.is_dir() {
            attempts.push(format!("{} (directory missing)", candidate.display()));
            continue;
        }

        let missing = missing_font_files(&candidate, family);
        if missing.is_empty() {
            return Ok(candidate);
        }
        attempts.push(format!(
            "{} (missing files [{}])",
            candidate.display(),
            missing.join(", ")
        ));
    }

    let summary = if attempts.is_empty() {
        "no search paths were available".to_owned()
    } else {
        attempts.join(", ")
    };

    Err(Error::new(
        format!(
            "Unable to locate font family '{}'. Checked: {}. See assets/fonts/README.md or set {}.",
            family, summary, FONTS_DIR_ENV
        ),
        io::Error::new(io::ErrorKind::NotFound, "font directory not found"),
    ))
}

fn load_family_from_directories(family: &str) -> Result<FontFamily<FontData>, Error> {
    let directory = resolve_font_directory(family)?;
    debug!("Loading font family '{}' from {}", family, directory.display());

    fonts::from_files(&directory, family, None).map_err(|err| {
        Error::new(
            format!(
                "Failed to load font family '{}' from {}: {}",
                family,
                directory.display(),
                err
            ),
            io::Error::new(io::ErrorKind::Other, err.to_string()),
        )
    })
}

fn env_path(var: &str) -> Option<PathBuf> {
    env::var_os(var).and_then(|value| {
        let path = PathBuf::from(value);
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    })
}

fn windows_font_directory() -> Option<PathBuf> {
    if let Some(path) = env_path(WINDOWS_FONTS_DIR_ENV) {
        return Some(path);
    }

    #[cfg(windows)]
    {
        for var in ["WINDIR", "SystemRoot"] {
            if let Some(root) = env_path(var) {
                let candidate = root.join("Fonts");
                if candidate.is_dir() {
                    return Some(candidate);
                }
            }
        }
    }

    None
}

fn load_windows_font(directory: &Path, file: &str, style: &str) -> Result<FontData, Error> {
    let path = directory.join(file);
    FontData::load(&path, None).map_err(|err| {
        let io_kind = if path.is_file() {
            io::ErrorKind::Other
        } else {
            io::ErrorKind::NotFound
        };
        Error::new(
            format!(
                "Failed to load Windows fallback {} font at {}: {}",
                style,
                path.display(),
                err
            ),
            io::Error::new(io_kind, err.to_string()),
        )
    })
}

fn windows_fallback_font_family() -> Result<FontFamily<FontData>, Error> {
    let directory = windows_font_directory().ok_or_else(|| {
        Error::new(
            "Windows font directory not found for fallback",
            io::Error::new(io::ErrorKind::NotFound, "windows fonts directory not found"),
        )
    })?;

    Ok(FontFamily {
        regular: load_windows_font(&directory, WINDOWS_FONT_FILES.regular, "regular")?,
        bold: load_windows_font(&directory, WINDOWS_FONT_FILES.bold, "bold")?,
        italic: load_windows_font(&directory, WINDOWS_FONT_FILES.italic, "italic")?,
        bold_italic: load_windows_font(&directory, WINDOWS_FONT_FILES.bold_italic, "bold italic")?,
    })
}

pub(crate) fn fonts_missing(err: &Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::IoError(io_err)
            if io_err.kind() == io::ErrorKind::NotFound
                || io_err.kind() == io::ErrorKind::PermissionDenied
    )
}

/// Loads the named font family.
///
/// Only the default family falls back to Windows Arial when its files cannot be found; a missing
/// family requested by name is reported as not found.  The same family is used for measuring and
/// for rendering, so both documents wrap text identically.
pub fn load_font_family(family: &str) -> Result<FontFamily<FontData>, Error> {
    match load_family_from_directories(family) {
        Ok(loaded) => Ok(loaded),
        Err(err) if fonts_missing(&err) && uses_windows_fallback(family) => {
            match windows_fallback_font_family() {
                Ok(fallback) => {
                    warn!(
                        "Font family '{}' unavailable ({}); falling back to Windows '{}' family.",
                        family, err, WINDOWS_FALLBACK_FAMILY_NAME
                    );
                    Ok(fallback)
                }
                Err(fallback_err) => {
                    warn!(
                        "Font family '{}' unavailable ({}); Windows fallback failed: {}",
                        family, err, fallback_err
                    );
                    Err(err)
                }
            }
        }
        Err(err) => Err(err),
    }
}

fn uses_windows_fallback(family: &str) -> bool {
    family == DEFAULT_FONT_FAMILY
}

/// Indicates whether all four files of the named family can be found.
pub fn fonts_available(family: &str) -> bool {
    resolve_font_directory(family).is_ok()
}
