use thiserror::Error;

#[derive(Error, Debug)]
pub enum VidscribeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transcode error: {0}")]
    Transcode(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Document rendering error: {0}")]
    Document(String),
}

pub type Result<T> = std::result::Result<T, VidscribeError>;

/// Last `max` characters of external tool output, kept on a char boundary.
/// Error payloads must stay bounded no matter how chatty the tool is.
pub fn truncate_diagnostic(output: &str, max: usize) -> &str {
    if output.len() <= max {
        return output;
    }
    let mut cut = output.len() - max;
    while !output.is_char_boundary(cut) {
        cut += 1;
    }
    &output[cut..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_diagnostic_short_input() {
        assert_eq!(truncate_diagnostic("error", 400), "error");
    }

    #[test]
    fn test_truncate_diagnostic_keeps_tail() {
        let long = "x".repeat(500) + "tail";
        let kept = truncate_diagnostic(&long, 400);
        assert_eq!(kept.len(), 400);
        assert!(kept.ends_with("tail"));
    }

    #[test]
    fn test_truncate_diagnostic_char_boundary() {
        let long = "é".repeat(300);
        let kept = truncate_diagnostic(&long, 401);
        assert!(kept.len() <= 401);
        assert!(kept.chars().all(|c| c == 'é'));
    }
}
