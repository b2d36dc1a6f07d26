// Structured resource addressing
//
// BIG-IP resources are addressed as `{collection}~{partition}~{name}`,
// optionally with a sub-path (folder) and a trailing suffix such as
// `/members`. This module composes those parts into one URL string and
// rejects combinations the device would misinterpret.

use url::Url;

use crate::error::Error;

/// Separator the device uses between partition, sub-path, and name.
pub const PART_SEPARATOR: char = '~';

/// Partition used when the caller does not name one.
pub const DEFAULT_PARTITION: &str = "Common";

/// Structured parts of a resource URI.
///
/// `name` is required; everything else is optional. A `/` inside the
/// name is folded to `~` so folder-qualified names such as
/// `folder/vs1` address correctly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UriParts {
    pub name: String,
    pub partition: Option<String>,
    pub sub_path: Option<String>,
    pub suffix: Option<String>,
}

impl UriParts {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = Some(partition.into());
        self
    }

    pub fn sub_path(mut self, sub_path: impl Into<String>) -> Self {
        self.sub_path = Some(sub_path.into());
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }
}

/// Where a request goes: a literal URL or a collection plus structured parts.
///
/// The two addressing modes are exclusive by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Used verbatim. Relative paths are joined onto the session base URL.
    Url(String),
    /// `collection` is the resource collection URL, e.g.
    /// `https://10.0.0.1/mgmt/tm/ltm/nat/`.
    Parts { collection: String, parts: UriParts },
}

impl Target {
    pub fn parts(collection: impl Into<String>, parts: UriParts) -> Self {
        Self::Parts {
            collection: collection.into(),
            parts,
        }
    }
}

impl From<&str> for Target {
    fn from(url: &str) -> Self {
        Self::Url(url.to_owned())
    }
}

impl From<String> for Target {
    fn from(url: String) -> Self {
        Self::Url(url)
    }
}

impl From<&String> for Target {
    fn from(url: &String) -> Self {
        Self::Url(url.clone())
    }
}

impl From<Url> for Target {
    fn from(url: Url) -> Self {
        Self::Url(url.into())
    }
}

impl From<&Url> for Target {
    fn from(url: &Url) -> Self {
        Self::Url(url.as_str().to_owned())
    }
}

/// Resolve a target into an absolute URL.
pub(crate) fn resolve(target: &Target, base_url: &Url, default_partition: &str) -> Result<Url, Error> {
    let raw = match target {
        Target::Url(raw) => raw.clone(),
        Target::Parts { collection, parts } => build_uri(collection, parts, default_partition)?,
    };
    match Url::parse(&raw) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => Ok(base_url.join(&raw)?),
        Err(e) => Err(Error::InvalidUrl(e)),
    }
}

/// Compose `collection` and structured parts into a resource URI string.
///
/// Produces `{collection}~{partition}[~{sub_path}]~{name}{suffix}`.
/// A collection without a trailing `/` gets one appended.
pub fn build_uri(collection: &str, parts: &UriParts, default_partition: &str) -> Result<String, Error> {
    if collection.is_empty() {
        return Err(invalid("collection must not be empty"));
    }
    if collection.contains(PART_SEPARATOR) {
        return Err(invalid(format!(
            "collection must not contain '{PART_SEPARATOR}': {collection}"
        )));
    }
    if parts.name.is_empty() {
        return Err(invalid("name is required when addressing by parts"));
    }

    let partition = parts.partition.as_deref().unwrap_or(default_partition);
    check_component("partition", partition)?;
    if partition.contains('/') {
        return Err(invalid(format!("partition must not contain '/': {partition}")));
    }
    if partition.is_empty() && parts.sub_path.is_some() {
        return Err(invalid("a sub_path requires a partition"));
    }

    check_component("name", &parts.name)?;

    let mut uri = String::with_capacity(collection.len() + parts.name.len() + 16);
    uri.push_str(collection);
    if !collection.ends_with('/') {
        uri.push('/');
    }

    if !partition.is_empty() {
        uri.push(PART_SEPARATOR);
        uri.push_str(partition);
        if let Some(sub_path) = parts.sub_path.as_deref().filter(|s| !s.is_empty()) {
            check_component("sub_path", sub_path)?;
            uri.push(PART_SEPARATOR);
            uri.push_str(sub_path);
        }
        uri.push(PART_SEPARATOR);
    }
    uri.push_str(&parts.name.replace('/', "~"));

    if let Some(suffix) = parts.suffix.as_deref() {
        if !suffix.is_empty() && !suffix.starts_with('/') {
            uri.push('/');
        }
        uri.push_str(suffix);
    }

    Ok(uri)
}

fn check_component(field: &str, value: &str) -> Result<(), Error> {
    if value.contains(PART_SEPARATOR) {
        return Err(invalid(format!(
            "{field} must not contain '{PART_SEPARATOR}': {value}"
        )));
    }
    Ok(())
}

fn invalid(message: impl Into<String>) -> Error {
    Error::InvalidUri {
        message: message.into(),
    }
}
