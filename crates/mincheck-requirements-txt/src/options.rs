use serde::Serialize;

/// The global options pip accepts in a requirements file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OptionKind {
    IndexUrl,
    ExtraIndexUrl,
    NoIndex,
    FindLinks,
    TrustedHost,
    Pre,
    PreferBinary,
    OnlyBinary,
    NoBinary,
    RequireHashes,
}

impl OptionKind {
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        match name {
            "-i" | "--index-url" => Some(Self::IndexUrl),
            "--extra-index-url" => Some(Self::ExtraIndexUrl),
            "--no-index" => Some(Self::NoIndex),
            "-f" | "--find-links" => Some(Self::FindLinks),
            "--trusted-host" => Some(Self::TrustedHost),
            "--pre" => Some(Self::Pre),
            "--prefer-binary" => Some(Self::PreferBinary),
            "--only-binary" => Some(Self::OnlyBinary),
            "--no-binary" => Some(Self::NoBinary),
            "--require-hashes" => Some(Self::RequireHashes),
            _ => None,
        }
    }

    pub(crate) fn takes_value(self) -> bool {
        !matches!(
            self,
            Self::NoIndex | Self::Pre | Self::PreferBinary | Self::RequireHashes
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedOption {
    pub(crate) kind: OptionKind,
    pub(crate) value: Option<String>,
}

/// Global options collected from a requirements file and its includes.
///
/// These have no bearing on version checks; they are kept so `show` can report them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ParsedOptions {
    pub index_url: Option<String>,
    pub extra_index_urls: Vec<String>,
    pub no_index: bool,
    pub find_links: Vec<String>,
    pub trusted_hosts: Vec<String>,
    pub pre: bool,
    pub prefer_binary: bool,
    /// `--only-binary` values, e.g. `:all:` or a comma-separated list of packages.
    pub only_binary: Vec<String>,
    pub no_binary: Vec<String>,
    pub require_hashes: bool,
}

impl ParsedOptions {
    pub(crate) fn apply(&mut self, option: ParsedOption) {
        let ParsedOption { kind, value } = option;
        match (kind, value) {
            (OptionKind::IndexUrl, Some(value)) => self.index_url = Some(value),
            (OptionKind::ExtraIndexUrl, Some(value)) => self.extra_index_urls.push(value),
            (OptionKind::FindLinks, Some(value)) => self.find_links.push(value),
            (OptionKind::TrustedHost, Some(value)) => self.trusted_hosts.push(value),
            (OptionKind::OnlyBinary, Some(value)) => self.only_binary.push(value),
            (OptionKind::NoBinary, Some(value)) => self.no_binary.push(value),
            (OptionKind::NoIndex, _) => self.no_index = true,
            (OptionKind::Pre, _) => self.pre = true,
            (OptionKind::PreferBinary, _) => self.prefer_binary = true,
            (OptionKind::RequireHashes, _) => self.require_hashes = true,
            (kind, None) => {
                tracing::trace!("Ignoring option without value: {kind:?}");
            }
        }
    }

    /// Merge the options of an included file; the last `--index-url` wins.
    pub fn update_from(&mut self, other: Self) {
        if other.index_url.is_some() {
            self.index_url = other.index_url;
        }
        self.extra_index_urls.extend(other.extra_index_urls);
        self.no_index |= other.no_index;
        self.find_links.extend(other.find_links);
        self.trusted_hosts.extend(other.trusted_hosts);
        self.pre |= other.pre;
        self.prefer_binary |= other.prefer_binary;
        self.only_binary.extend(other.only_binary);
        self.no_binary.extend(other.no_binary);
        self.require_hashes |= other.require_hashes;
    }

    /// Returns `true` if no option was set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
