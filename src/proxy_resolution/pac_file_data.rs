use url::Url;

/// A PAC script, either by reference or as its source text.
///
/// Mirrors Chromium's `PacFileData`. Only `ScriptContents` can be handed to a
/// resolver engine; URLs must be fetched by the caller first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacFileData {
    /// Location of a PAC file that has not been downloaded yet.
    Url(Url),
    /// Source text of a PAC script.
    ScriptContents(String),
}

impl PacFileData {
    pub fn from_utf8(script: impl Into<String>) -> Self {
        PacFileData::ScriptContents(script.into())
    }

    pub fn from_url(url: Url) -> Self {
        PacFileData::Url(url)
    }

    /// Returns the script text if this holds script contents.
    pub fn script_contents(&self) -> Option<&str> {
        match self {
            PacFileData::ScriptContents(script) => Some(script),
            PacFileData::Url(_) => None,
        }
    }

    /// Returns the script text only if it can be sent to an engine as-is.
    pub fn usable_script(&self) -> Option<&str> {
        self.script_contents().filter(|script| !script.is_empty())
    }

    pub fn url(&self) -> Option<&Url> {
        match self {
            PacFileData::Url(url) => Some(url),
            PacFileData::ScriptContents(_) => None,
        }
    }
}
