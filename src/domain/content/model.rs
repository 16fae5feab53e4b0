use serde::{Deserialize, Serialize};

/// One of the three script input modalities.
#[derive(Debug, Clone)]
pub enum ScriptSource {
    Text(String),
    Url(String),
    File { url: String, mime_type: String },
}

/// How the script text was produced. `Placeholder` means extraction failed
/// and the text is a human-readable stand-in; callers can branch on the tag
/// instead of matching an English prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptOrigin {
    Verbatim,
    Extracted,
    Placeholder,
}

#[derive(Debug, Clone)]
pub struct NormalizedScript {
    pub text: String,
    pub origin: ScriptOrigin,
}
