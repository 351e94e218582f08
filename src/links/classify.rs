//! File-link classification: which links point at files on a hosting service.

use regex::Regex;

use crate::config::LinksConfig;
use crate::error::{Result, ScanError};

/// Link shapes of well-known file-hosting services.
pub const BUILTIN_PATTERNS: &[&str] = &[
    // Google Drive files and folders
    r"^https?://drive\.google\.com/(?:file/(?:u/\d+/)?d/|open\?|uc\?|(?:drive/)?(?:u/\d+/)?folders/)",
    // Google Docs editors
    r"^https?://docs\.google\.com/(?:document|spreadsheets|presentation|forms|drawings)/(?:u/\d+/)?d/",
    // Dropbox shared links
    r"^https?://(?:www\.)?dropbox\.com/(?:s|sh|scl/fi|scl/fo)/",
    r"^https?://dl\.dropboxusercontent\.com/",
    // OneDrive and SharePoint
    r"^https?://1drv\.ms/",
    r"^https?://onedrive\.live\.com/",
    r"^https?://[a-z0-9-]+\.sharepoint\.com/:[a-z]:/",
    // Box
    r"^https?://(?:[a-z0-9-]+\.)?(?:app\.)?box\.com/s/",
    // iCloud Drive
    r"^https?://(?:www\.)?icloud\.com/iclouddrive/",
];

/// Recognizes links that point at hosted files.
#[derive(Debug, Clone)]
pub struct FileLinkClassifier {
    patterns: Vec<Regex>,
}

impl Default for FileLinkClassifier {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FileLinkClassifier {
    /// Classifier for the built-in hosting services only.
    pub fn builtin() -> Self {
        let patterns = BUILTIN_PATTERNS
            .iter()
            .map(|p| compile(p).expect("built-in file-link pattern is valid"))
            .collect();
        Self { patterns }
    }

    /// Classifier for an explicit list of patterns (matched case-insensitively).
    pub fn with_patterns<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| compile(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Built-in patterns (unless disabled) plus the configured extras.
    pub fn from_config(config: &LinksConfig) -> Result<Self> {
        let builtin = if config.builtin_patterns {
            BUILTIN_PATTERNS
        } else {
            &[]
        };
        Self::with_patterns(
            builtin
                .iter()
                .copied()
                .chain(config.extra_file_patterns.iter().map(String::as_str)),
        )
    }

    pub fn is_file_link(&self, url: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(url))
    }

    /// Keep only file links, preserving order (and repeats).
    pub fn filter_file_urls(&self, urls: &[String]) -> Vec<String> {
        urls.iter()
            .filter(|url| self.is_file_link(url))
            .cloned()
            .collect()
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    regex::RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| ScanError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_file_links() {
        let classifier = FileLinkClassifier::builtin();
        for url in [
            "https://drive.google.com/file/d/1AbC/view?usp=sharing",
            "https://drive.google.com/open?id=1AbC",
            "https://drive.google.com/drive/folders/1AbC",
            "https://docs.google.com/document/d/1AbC/edit",
            "https://docs.google.com/spreadsheets/u/0/d/1AbC/edit#gid=0",
            "https://www.dropbox.com/s/abc123/report.pdf?dl=0",
            "https://www.dropbox.com/scl/fi/xyz/plan.docx?rlkey=k",
            "https://1drv.ms/w/s!AbC",
            "https://contoso.sharepoint.com/:x:/g/personal/abc",
            "https://app.box.com/s/abc123",
            "https://www.icloud.com/iclouddrive/0abc#Notes",
            "HTTPS://DRIVE.GOOGLE.COM/file/d/1AbC/view",
        ] {
            assert!(classifier.is_file_link(url), "should match: {url}");
        }
    }

    #[test]
    fn test_non_file_links() {
        let classifier = FileLinkClassifier::builtin();
        for url in [
            "https://google.com/search?q=drive",
            "https://docs.google.com/",
            "https://www.dropbox.com/login",
            "https://example.com/drive.google.com/file/d/x",
            "mailto:someone@example.com",
        ] {
            assert!(!classifier.is_file_link(url), "should not match: {url}");
        }
    }

    #[test]
    fn test_filter_preserves_order_and_repeats() {
        let classifier = FileLinkClassifier::builtin();
        let urls: Vec<String> = [
            "https://1drv.ms/a",
            "https://example.com/",
            "https://app.box.com/s/b",
            "https://1drv.ms/a",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(
            classifier.filter_file_urls(&urls),
            vec!["https://1drv.ms/a", "https://app.box.com/s/b", "https://1drv.ms/a"]
        );
    }

    #[test]
    fn test_from_config_extra_patterns() {
        let config = LinksConfig {
            builtin_patterns: false,
            extra_file_patterns: vec![r"^https://files\.example\.com/".into()],
        };
        let classifier = FileLinkClassifier::from_config(&config).unwrap();
        assert!(classifier.is_file_link("https://files.example.com/report.pdf"));
        assert!(!classifier.is_file_link("https://1drv.ms/a"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = FileLinkClassifier::with_patterns(["(unclosed"]).unwrap_err();
        assert!(matches!(err, ScanError::InvalidPattern { .. }));
    }
}
