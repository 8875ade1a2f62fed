use url::Url;

/// File types worth flagging: spreadsheets, documents, archives, databases,
/// credentials, keys and certificates, executables and installers, logs and
/// configuration dumps.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "xls", "xml", "xlsx", "json", "pdf", "sql", "doc", "docx", "pptx", "txt", "zip", "tar.gz",
    "tgz", "bak", "7z", "rar", "log", "cache", "secret", "db", "backup", "yml", "gz", "config",
    "csv", "yaml", "md", "md5", "exe", "dll", "bin", "ini", "bat", "sh", "tar", "deb", "rpm",
    "iso", "img", "apk", "msi", "dmg", "tmp", "crt", "pem", "key", "pub", "asc",
];

/// A closed set of filename extensions, matched against the end of a URL path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSignatures {
    /// Lowercase suffixes including the leading dot, e.g. `.tar.gz`.
    suffixes: Vec<String>,
}

impl TypeSignatures {
    /// Builds a set from extensions given with or without a leading dot, in any case.
    /// Blank entries and repeats are dropped.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut suffixes: Vec<String> = Vec::new();
        for ext in extensions {
            let ext = ext.as_ref().trim().trim_start_matches('.').to_ascii_lowercase();
            if ext.is_empty() {
                continue;
            }
            let suffix = format!(".{ext}");
            if !suffixes.contains(&suffix) {
                suffixes.push(suffix);
            }
        }
        Self { suffixes }
    }

    /// Extensions in this set, lowercase and without the leading dot.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.suffixes.iter().map(|suffix| &suffix[1..])
    }

    pub fn is_empty(&self) -> bool {
        self.suffixes.is_empty()
    }

    /// True iff the path of `url` ends with one of the extensions, ignoring ASCII case.
    pub fn matches(&self, url: &str) -> bool {
        let path = url_path(url).to_ascii_lowercase();
        self.suffixes.iter().any(|suffix| path.ends_with(suffix.as_str()))
    }

    /// Keeps the URLs that match, in their original order.
    pub fn filter<I, S>(&self, urls: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        urls.into_iter()
            .map(Into::into)
            .filter(|url| self.matches(url))
            .collect()
    }
}

impl Default for TypeSignatures {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS)
    }
}

/// Path component of `url` without query or fragment.
///
/// Archive output is not guaranteed to be absolute, so anything `Url` rejects
/// is cut at the first `?` or `#` instead.
fn url_path(url: &str) -> String {
    let trimmed = url.trim();
    match Url::parse(trimmed) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => {
            let end = trimmed.find(['?', '#']).unwrap_or(trimmed.len());
            let without_query = &trimmed[..end];
            // Scheme-less input: the host ends at the first slash; no slash, no path.
            match without_query.find('/') {
                Some(start) => without_query[start..].to_string(),
                None => String::new(),
            }
        }
    }
}
