use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Yaml,
}

impl InputFormat {
    /// `.yaml`/`.yml` select YAML; anything else is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => InputFormat::Yaml,
            _ => InputFormat::Json,
        }
    }
}

/// Read a JSON or YAML request file and deserialise into a typed struct.
pub fn read_request<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let source = canonical.display().to_string();
    parse_request(&contents, InputFormat::from_path(&canonical), &source)
}

/// Parse request text. YAML accepts JSON documents too, so it serves piped input.
pub fn parse_request<T: DeserializeOwned>(
    contents: &str,
    format: InputFormat,
    source: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    let parsed = match format {
        InputFormat::Json => serde_json::from_str(contents)
            .map_err(|e| format!("Failed to parse '{}': {}", source, e))?,
        InputFormat::Yaml => serde_yaml::from_str(contents)
            .map_err(|e| format!("Failed to parse '{}': {}", source, e))?,
    };
    Ok(parsed)
}

fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }
    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}
