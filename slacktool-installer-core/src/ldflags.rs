use crate::version::BuildIdentity;

/// One link-time `-X` assignment: a fully-qualified symbol name inside the
/// target source, and the literal the linker writes into it. A symbol name
/// with no matching identifier is dropped by the toolchain without a
/// diagnostic; the post-build scan in `verify` is what catches that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolOverride {
    pub symbol: String,
    pub value: String,
}

/// The three override targets inside the tool's command-line layer, derived
/// from one import path. Restructuring the target source means updating the
/// `version_package` field in the formula manifest, nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTable {
    pub version: String,
    pub commit: String,
    pub date: String,
}

impl SymbolTable {
    /// Table for the package declaring the `version`, `commit` and `date`
    /// variables.
    pub fn for_package(version_package: &str) -> Self {
        Self {
            version: format!("{version_package}.version"),
            commit: format!("{version_package}.commit"),
            date: format!("{version_package}.date"),
        }
    }

    /// Exactly one override per identity field.
    pub fn overrides(&self, identity: &BuildIdentity) -> Vec<SymbolOverride> {
        vec![
            SymbolOverride {
                symbol: self.version.clone(),
                value: identity.version_tag.clone(),
            },
            SymbolOverride {
                symbol: self.commit.clone(),
                value: identity.commit_hash.clone(),
            },
            SymbolOverride {
                symbol: self.date.clone(),
                value: identity.build_timestamp.clone(),
            },
        ]
    }
}

// Fixed policy for every install: omit the symbol table and DWARF data.
const STRIP_FLAGS: [&str; 2] = ["-s", "-w"];

/// Assemble the single `-ldflags` argument value: strip flags plus the three
/// overrides. The toolchain splits this string on whitespace, so override
/// values must not contain spaces (the timestamp format uses `_` between
/// date and time for exactly this reason).
pub fn build_ldflags(table: &SymbolTable, identity: &BuildIdentity) -> String {
    let mut parts: Vec<String> = STRIP_FLAGS.iter().map(|s| s.to_string()).collect();
    for o in table.overrides(identity) {
        parts.push(format!("-X {}={}", o.symbol, o.value));
    }
    parts.join(" ")
}
