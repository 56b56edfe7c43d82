/// The beginning of a file path which anchors subsequent path components
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FilePrefix {
    /// Absolute path
    Absolute,
    /// Path relative to .
    Here,
    /// Path relative to ..
    Parent,
    /// Path relative to ~
    Home,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilePath {
    pub file_path: Vec<String>,
}

/// The location of import (i.e. local vs. remote vs. environment)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImportLocation {
    Local(FilePrefix, FilePath),
    Remote(URL),
    Env(String),
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct URL {
    pub scheme: Scheme,
    pub authority: String,
    pub path: FilePath,
    pub query: Option<String>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Scheme {
    HTTP,
    HTTPS,
}

/// How to interpret the import's contents (i.e. as Dhall code or raw text)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ImportMode {
    Code,
    RawText,
    Location,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Hash {
    SHA256(Vec<u8>),
}

/// Reference to an external resource. This is what an `Embed` node carries until the import
/// resolver replaces it with the expression it denotes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Import {
    pub mode: ImportMode,
    pub location: ImportLocation,
    pub hash: Option<Hash>,
}

impl FilePath {
    fn from_components<'a>(components: impl Iterator<Item = &'a str>) -> Self {
        FilePath {
            file_path: components
                .filter(|c| !c.is_empty())
                .map(str::to_owned)
                .collect(),
        }
    }
}

impl Import {
    pub fn new(location: ImportLocation, mode: ImportMode) -> Self {
        Import {
            mode,
            location,
            hash: None,
        }
    }

    /// `env:NAME`
    pub fn env(var: &str, mode: ImportMode) -> Self {
        Import::new(ImportLocation::Env(var.to_owned()), mode)
    }

    /// A local path such as `./foo/bar.dhall`, `../x`, `~/x` or `/x`.
    pub fn local(path: &str, mode: ImportMode) -> Self {
        use FilePrefix::*;
        let (prefix, rest) = if let Some(rest) = path.strip_prefix("./") {
            (Here, rest)
        } else if let Some(rest) = path.strip_prefix("../") {
            (Parent, rest)
        } else if let Some(rest) = path.strip_prefix("~/") {
            (Home, rest)
        } else {
            (Absolute, path.trim_start_matches('/'))
        };
        let path = FilePath::from_components(rest.split('/'));
        Import::new(ImportLocation::Local(prefix, path), mode)
    }

    /// An `http://` or `https://` url. Returns `None` for any other scheme.
    pub fn remote(url: &str, mode: ImportMode) -> Option<Self> {
        let (scheme, rest) = if let Some(rest) = url.strip_prefix("https://") {
            (Scheme::HTTPS, rest)
        } else if let Some(rest) = url.strip_prefix("http://") {
            (Scheme::HTTP, rest)
        } else {
            return None;
        };
        let (rest, query) = match rest.find('?') {
            Some(i) => (&rest[..i], Some(rest[i + 1..].to_owned())),
            None => (rest, None),
        };
        let mut components = rest.split('/');
        let authority = components.next()?.to_owned();
        if authority.is_empty() {
            return None;
        }
        let url = URL {
            scheme,
            authority,
            path: FilePath::from_components(components),
            query,
        };
        Some(Import::new(ImportLocation::Remote(url), mode))
    }

    pub fn with_sha256(self, hash: Vec<u8>) -> Self {
        Import {
            hash: Some(Hash::SHA256(hash)),
            ..self
        }
    }
}
