pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Load a request from `--input` or, when no path is given, from piped stdin.
pub fn load_request<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return file::read_request(path);
    }
    match stdin::read_stdin()? {
        Some(contents) => file::parse_request(&contents, file::InputFormat::Yaml, "stdin"),
        None => Err("No input supplied. Pass --input <file> or pipe a JSON/YAML request".into()),
    }
}
