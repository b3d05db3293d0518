use std::fmt;
use serde::{Deserialize, Serialize};
use crate::config::ToolCommands;
use crate::util::pad;

/// Transport used to mirror an overlay source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayKind {
    Git,
    #[serde(alias = "subversion")]
    Svn,
    Rsync,
    #[serde(alias = "hg")]
    Mercurial,
    Bzr,
    Cvs,
    Darcs,
    Tar,
}

impl OverlayKind {
    /// Returns `true` if the tool needed for this kind is available.
    ///
    /// Tarballs are unpacked in-process and never need an external program.
    pub fn is_supported(self, commands: &ToolCommands) -> bool {
        match commands.program(self) {
            Some(program) => which::which(program).is_ok(),
            None => true,
        }
    }
}

impl fmt::Display for OverlayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OverlayKind::Git => "Git",
            OverlayKind::Svn => "Subversion",
            OverlayKind::Rsync => "Rsync",
            OverlayKind::Mercurial => "Mercurial",
            OverlayKind::Bzr => "Bzr",
            OverlayKind::Cvs => "cvs",
            OverlayKind::Darcs => "Darcs",
            OverlayKind::Tar => "Tar",
        };
        f.write_str(name)
    }
}

/// One location an overlay can be mirrored from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlaySource {
    #[serde(rename = "type")]
    pub kind: OverlayKind,
    /// URL or path handed to the transport.
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Directory inside the source to use as the overlay root (tar, cvs).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subpath: Option<String>,
}

impl OverlaySource {
    pub fn new(kind: OverlayKind, src: &str) -> Self {
        Self {
            kind,
            src: src.to_string(),
            branch: None,
            subpath: None,
        }
    }
}

fn default_priority() -> u32 {
    50
}

fn default_quality() -> String {
    "experimental".to_string()
}

/// A single overlay as described by a manifest or the installed list.
///
/// The name is the catalog key. Every record carries at least one source;
/// the first one is the primary source used for syncing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default)]
    pub owner_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    pub sources: Vec<OverlaySource>,
    #[serde(default = "default_priority")]
    pub priority: u32,
    #[serde(default = "default_quality")]
    pub quality: String,
    /// Listed by a curated manifest.
    #[serde(default)]
    pub official: bool,
}

impl Overlay {
    /// Creates an official overlay with a single source and default metadata.
    pub fn new(name: &str, kind: OverlayKind, src: &str) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            homepage: None,
            owner_email: String::new(),
            owner_name: None,
            sources: vec![OverlaySource::new(kind, src)],
            priority: default_priority(),
            quality: default_quality(),
            official: true,
        }
    }

    pub fn primary_source(&self) -> Option<&OverlaySource> {
        self.sources.first()
    }

    pub fn kind(&self) -> Option<OverlayKind> {
        self.primary_source().map(|source| source.kind)
    }

    pub fn is_official(&self) -> bool {
        self.official
    }

    /// An overlay is supported when at least one of its sources can be mirrored.
    pub fn is_supported(&self, commands: &ToolCommands) -> bool {
        self.sources.iter().any(|source| source.kind.is_supported(commands))
    }

    /// Renders the single-line listing used by non-verbose `list`.
    ///
    /// The name takes 25 columns, the type 10, and the primary source fills
    /// whatever remains of `width`.
    pub fn short_list(&self, width: usize) -> String {
        let name = pad(&self.name, 25);
        let kind = self.kind().map(|kind| kind.to_string()).unwrap_or_default();
        let kind = format!(" [{}]", pad(&kind, 10));
        let srclen = width.saturating_sub(43);
        let mut source = self
            .primary_source()
            .map(|source| source.src.clone())
            .unwrap_or_default();
        if source.chars().count() > srclen {
            source = source.replace("overlays.gentoo.org", "o.g.o");
        }
        format!("{name}{kind} ({})", pad(&source, srclen))
    }
}

impl fmt::Display for Overlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "{}", "~".repeat(self.name.chars().count()))?;
        for source in &self.sources {
            writeln!(f, "Source  : {}", source.src)?;
        }
        match &self.owner_name {
            Some(owner) => writeln!(f, "Contact : {} <{}>", owner, self.owner_email)?,
            None => writeln!(f, "Contact : {}", self.owner_email)?,
        }
        let kind = self.kind().map(|kind| kind.to_string()).unwrap_or_default();
        writeln!(f, "Type    : {}; Priority: {}", kind, self.priority)?;
        writeln!(f, "Quality : {}", self.quality)?;
        writeln!(f)?;
        writeln!(f, "Description:")?;
        writeln!(f, "  {}", self.description)?;
        writeln!(f)?;
        if let Some(homepage) = &self.homepage {
            writeln!(f, "Link:")?;
            writeln!(f, "  {}", homepage)?;
            writeln!(f)?;
        }
        Ok(())
    }
}
