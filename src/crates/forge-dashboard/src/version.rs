//! Build metadata injected by `build.rs`

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// CI build number, "0" for local builds
pub const BUILD_NUMBER: &str = env!("BUILD_NUMBER");

pub const GIT_COMMIT: &str = env!("GIT_COMMIT");

/// RFC3339
pub const BUILD_TIMESTAMP: &str = env!("BUILD_TIMESTAMP");

/// `Forge v0.1.0 (build 42, commit abc123, built 2025-01-15T10:30:00Z)`
pub fn full_version() -> String {
    VersionInfo::get().to_string()
}

pub fn short_version() -> String {
    format!("v{}", VERSION)
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct VersionInfo {
    pub version: &'static str,
    pub build_number: &'static str,
    pub git_commit: &'static str,
    pub build_timestamp: &'static str,
}

impl VersionInfo {
    pub fn get() -> Self {
        Self {
            version: VERSION,
            build_number: BUILD_NUMBER,
            git_commit: GIT_COMMIT,
            build_timestamp: BUILD_TIMESTAMP,
        }
    }
}

impl std::fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Forge v{} (build {}, commit {}, built {})",
            self.version, self.build_number, self.git_commit, self.build_timestamp
        )
    }
}
