// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the hgu-opc-client project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Build and version information module
//!
//! Build-time metadata (Git commit, compilation date, target) used for the
//! `User-Agent` header sent to the gateway and for the `--build-info` flag.

/// Build information structure containing all relevant metadata
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// Cargo package version
    pub version: &'static str,
    /// Short Git commit hash (7 characters)
    pub git_commit_short: &'static str,
    /// Full Git commit hash (40 characters)
    pub git_commit_full: &'static str,
    /// Git commit date in ISO format
    pub git_commit_date: &'static str,
    /// Build timestamp (when the binary was compiled)
    pub build_timestamp: &'static str,
    /// Target triple (architecture and OS)
    pub target_triple: &'static str,
    /// Build profile (debug/release)
    pub profile: &'static str,
}

impl BuildInfo {
    /// Get the current build information
    pub fn get() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            git_commit_short: env!("GIT_COMMIT_HASH_SHORT"),
            git_commit_full: env!("GIT_COMMIT_HASH_FULL"),
            git_commit_date: env!("GIT_COMMIT_DATE"),
            build_timestamp: env!("BUILD_TIMESTAMP"),
            target_triple: env!("BUILD_TARGET"),
            profile: if cfg!(debug_assertions) {
                "debug"
            } else {
                "release"
            },
        }
    }

    /// Format build info as a single version string
    /// Example: "0.1.0-a1b2c3d (2025-06-27 14:30:00 +0200)"
    pub fn version_string(&self) -> String {
        format!(
            "{}-{} ({})",
            self.version, self.git_commit_short, self.git_commit_date
        )
    }

    /// Value sent in the `User-Agent` header of every gateway request
    pub fn user_agent(&self) -> String {
        format!("hgu-opc-client/{}-{}", self.version, self.git_commit_short)
    }

    /// Format complete build information for debug output
    pub fn full_info(&self) -> String {
        format!(
            "Version: {}\n\
            Hash: {} ({})\n\
            Build Time: {}\n\
            Target: {}\n\
            Profile: {}",
            self.version,
            self.git_commit_short,
            self.git_commit_date,
            self.build_timestamp,
            self.target_triple,
            self.profile
        )
    }
}

impl std::fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.version_string())
    }
}

/// Print full build information to stdout
pub fn print_build_info() {
    println!("{}", BuildInfo::get().full_info());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_info_creation() {
        let info = BuildInfo::get();

        assert!(!info.version.is_empty());
        assert!(!info.git_commit_short.is_empty());
        assert!(info.user_agent().starts_with("hgu-opc-client/"));
        assert!(info.full_info().contains(info.version));
    }
}
