//! Import name to distribution name mapping.
//!
//! Most packages install under the name they are imported by. The ones
//! that don't are listed here; anything else passes through unchanged.

use std::collections::BTreeMap;

/// Known import names whose distribution on the package index differs.
const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("PIL", "Pillow"),
    ("yaml", "PyYAML"),
    ("cv2", "opencv-python"),
    ("sklearn", "scikit-learn"),
    ("skimage", "scikit-image"),
    ("bs4", "beautifulsoup4"),
    ("dateutil", "python-dateutil"),
    ("dotenv", "python-dotenv"),
    ("jwt", "PyJWT"),
    ("magic", "python-magic"),
    ("serial", "pyserial"),
    ("usb", "pyusb"),
    ("attr", "attrs"),
    ("Crypto", "pycryptodome"),
    ("OpenSSL", "pyOpenSSL"),
    ("win32api", "pywin32"),
    ("win32con", "pywin32"),
    ("win32com", "pywin32"),
    ("docx", "python-docx"),
    ("pptx", "python-pptx"),
    ("fitz", "PyMuPDF"),
];

/// Resolve an import name with the built-in table only.
pub fn resolve(import_name: &str) -> String {
    BUILTIN_ALIASES
        .iter()
        .find(|(import, _)| *import == import_name)
        .map(|(_, dist)| (*dist).to_string())
        .unwrap_or_else(|| import_name.to_string())
}

/// The built-in table overlaid with user-configured aliases.
#[derive(Debug, Clone, Default)]
pub struct PackageAliases {
    overrides: BTreeMap<String, String>,
}

impl PackageAliases {
    /// Aliases with user overrides; an override wins over a built-in entry.
    pub fn with_overrides(overrides: BTreeMap<String, String>) -> Self {
        Self { overrides }
    }

    /// Distribution name for `import_name`. Total: unknown names map to
    /// themselves.
    pub fn resolve(&self, import_name: &str) -> String {
        match self.overrides.get(import_name) {
            Some(dist) => dist.clone(),
            None => resolve(import_name),
        }
    }
}
