use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub headers: HeaderConfig,
    pub archive: ArchiveConfig,
}

/// Names of the headers we read, add and hide
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
    /// Header added with Date converted to localtime
    pub local_date: String,
    /// Header added with the archive link
    pub archive_uri: String,
    /// Identifier header used to build the link, removed from the output
    pub message_id: String,
    /// Recipient headers searched for list addresses, in this order
    pub recipients: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Archive root, without trailing slash
    pub base_url: String,
    /// Explicit list address -> archive list name
    pub lists: HashMap<String, String>,
    /// Domains whose list name is the local part (foo@vger.kernel.org -> foo)
    pub domains: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            headers: HeaderConfig::default(),
            archive: ArchiveConfig::default(),
        }
    }
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            local_date: "X-Date".to_string(),
            archive_uri: "X-URI".to_string(),
            message_id: "Message-ID".to_string(),
            recipients: vec!["To".to_string(), "Cc".to_string()],
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        let mut lists = HashMap::new();
        lists.insert(
            "qemu-devel@nongnu.org".to_string(),
            "qemu-devel".to_string(),
        );

        Self {
            base_url: "https://lore.kernel.org".to_string(),
            lists,
            domains: vec!["vger.kernel.org".to_string()],
        }
    }
}

impl ArchiveConfig {
    /// Resolve a recipient address to an archive list name.
    /// The explicit table wins over domain matching.
    pub fn list_for(&self, address: &str) -> Option<String> {
        let address = address.trim().to_ascii_lowercase();
        if address.is_empty() {
            return None;
        }

        if let Some(name) = self
            .lists
            .iter()
            .find(|(addr, _)| addr.eq_ignore_ascii_case(&address))
            .map(|(_, name)| name)
        {
            return Some(name.clone());
        }

        let (local, domain) = address.rsplit_once('@')?;
        if local.is_empty() {
            return None;
        }
        self.domains
            .iter()
            .any(|d| d.trim_start_matches('@').eq_ignore_ascii_case(domain))
            .then(|| local.to_string())
    }

    /// Link for a message in a list: `<base>/<list>/<id>/`
    pub fn link(&self, list: &str, message_id: &str) -> String {
        format!(
            "{}/{}/{}/",
            self.base_url.trim_end_matches('/'),
            list,
            message_id
        )
    }
}

impl Config {
    /// Default location: `<config_dir>/lorifier/config.toml`
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("lorifier/config.toml"))
    }

    /// Load config from the default location, falling back to built-in
    /// defaults. Problems with the file are logged, never fatal.
    pub fn load() -> Self {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    tracing::debug!(path = %path.display(), "loaded config");
                    return config;
                }
                Err(e) => tracing::warn!(path = %path.display(), "config parse error: {}", e),
            },
            Err(e) => tracing::warn!(path = %path.display(), "config read error: {}", e),
        }

        Self::default()
    }
}
