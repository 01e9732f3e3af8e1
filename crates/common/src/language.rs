use crate::path::EntryPath;

/// Language tag used when nothing better is known
pub const PLAINTEXT: &str = "plaintext";

/// Derive an editor language tag from a file extension.
///
/// Matching is case-insensitive; unknown or missing extensions map to
/// [`PLAINTEXT`].
pub fn language_for_extension(extension: Option<&str>) -> &'static str {
    let Some(ext) = extension else {
        return PLAINTEXT;
    };

    match ext.to_ascii_lowercase().as_str() {
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "ts" | "tsx" => "typescript",
        "py" => "python",
        "html" | "htm" => "html",
        "css" => "css",
        "json" => "json",
        "md" => "markdown",
        "rs" => "rust",
        "sh" => "shell",
        "toml" => "toml",
        "yaml" | "yml" => "yaml",
        _ => PLAINTEXT,
    }
}

pub fn language_for_path(path: &EntryPath) -> &'static str {
    language_for_extension(path.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        let cases = [
            ("app.js", "javascript"),
            ("view.jsx", "javascript"),
            ("index.ts", "typescript"),
            ("main.py", "python"),
            ("index.html", "html"),
            ("style.css", "css"),
            ("package.json", "json"),
            ("README.md", "markdown"),
            ("lib.rs", "rust"),
            ("Cargo.toml", "toml"),
            ("ci.yml", "yaml"),
        ];
        for (name, expected) in cases {
            let path = EntryPath::parse(name).unwrap();
            assert_eq!(language_for_path(&path), expected, "{name}");
        }
    }

    #[test]
    fn test_fallback_is_plaintext() {
        for name in ["Makefile", "notes.txt", ".env", "src/data.bin"] {
            let path = EntryPath::parse(name).unwrap();
            assert_eq!(language_for_path(&path), PLAINTEXT, "{name}");
        }
    }

    #[test]
    fn test_extension_case_insensitive() {
        assert_eq!(language_for_extension(Some("PY")), "python");
    }
}
