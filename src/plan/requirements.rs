//! What the user asked to install

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::addons::{Addon, default_addons};
use super::features::{Feature, default_features};
use crate::host::DEFAULT_PYTHON;
use crate::site::SiteOptions;
use crate::version::{SpecifierSet, Version};

/// Name of the application package on the package index
pub const APP_PACKAGE: &str = "ReviewBoard";

/// Installed into the environment before the application
pub const PACKAGING_PACKAGES: &[&str] = &["pip", "setuptools", "wheel"];

/// Always built from source, so they link against the system libxml2 and xmlsec1
pub const SOURCE_BUILT_PACKAGES: &[&str] = &["lxml"];

/// Application version selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppVersion {
    Latest,
    /// A bare version, installed as `==version`
    Exact(Version),
    /// A PEP 440 specifier such as `>=7.0,<8`
    Specifier(SpecifierSet),
}

impl AppVersion {
    /// pip requirement for `package` with optional extras
    pub fn requirement(&self, package: &str, extras: &[&str]) -> String {
        let name = if extras.is_empty() {
            package.to_string()
        } else {
            format!("{}[{}]", package, extras.join(","))
        };

        match self {
            AppVersion::Latest => name,
            AppVersion::Exact(v) => format!("{name}=={v}"),
            AppVersion::Specifier(spec) => format!("{name}{spec}"),
        }
    }

    /// Whether the selected version can be `min` or newer
    pub fn may_reach(&self, min: &Version) -> bool {
        match self {
            AppVersion::Latest => true,
            AppVersion::Exact(v) => v.cmp_release(min).is_ge(),
            AppVersion::Specifier(spec) => spec.may_reach(min),
        }
    }
}

impl FromStr for AppVersion {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("latest") {
            Ok(AppVersion::Latest)
        } else if SpecifierSet::looks_like(s) {
            SpecifierSet::parse(s)
                .map(AppVersion::Specifier)
                .ok_or_else(|| format!("invalid version specifier '{s}'"))
        } else {
            Ok(AppVersion::Exact(Version::parse(s)))
        }
    }
}

impl fmt::Display for AppVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppVersion::Latest => f.write_str("latest"),
            AppVersion::Exact(v) => write!(f, "{v}"),
            AppVersion::Specifier(spec) => write!(f, "{spec}"),
        }
    }
}

/// Everything the plan builder needs besides the host and package manager
#[derive(Debug, Clone)]
pub struct AppRequirements {
    pub package: String,
    pub version: AppVersion,
    pub packaging: Vec<String>,
    pub features: Vec<Feature>,
    /// Extension packages installed after the application
    pub addons: Vec<Addon>,
    /// Optional feature ids the user disabled
    pub without: Vec<String>,
    pub skip_optional: bool,
    pub environment: PathBuf,
    pub python: String,
    pub index_url: Option<String>,
    pub extra_index_url: Option<String>,
    pub system_repo_url: Option<String>,
    pub site: Option<SiteOptions>,
}

impl AppRequirements {
    /// Default requirements: latest release, every feature and add-on, no site
    pub fn new(environment: impl Into<PathBuf>) -> Self {
        Self {
            package: APP_PACKAGE.to_string(),
            version: AppVersion::Latest,
            packaging: packaging_requirements(),
            features: default_features(),
            addons: default_addons(),
            without: Vec::new(),
            skip_optional: false,
            environment: environment.into(),
            python: DEFAULT_PYTHON.to_string(),
            index_url: None,
            extra_index_url: None,
            system_repo_url: None,
            site: None,
        }
    }
}

/// pip arguments for the packaging step, including the forced source builds
fn packaging_requirements() -> Vec<String> {
    let mut args: Vec<String> = PACKAGING_PACKAGES.iter().map(|p| (*p).to_string()).collect();
    for package in SOURCE_BUILT_PACKAGES {
        args.extend(["--no-binary".to_string(), (*package).to_string(), (*package).to_string()]);
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> AppVersion {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_version_selectors() {
        assert_eq!(parse("latest"), AppVersion::Latest);
        assert_eq!(parse(""), AppVersion::Latest);
        assert_eq!(parse("7.0.2"), AppVersion::Exact(Version::parse("7.0.2")));
        assert_eq!(parse(">=7.0, <8").to_string(), ">=7.0,<8");
        assert!(">=".parse::<AppVersion>().is_err());
    }

    #[test]
    fn test_requirement_strings() {
        assert_eq!(AppVersion::Latest.requirement("ReviewBoard", &[]), "ReviewBoard");
        assert_eq!(
            parse("7.0.2").requirement("ReviewBoard", &["mysql"]),
            "ReviewBoard[mysql]==7.0.2"
        );
        assert_eq!(
            parse("~=7.0").requirement("ReviewBoard", &["s3", "swift"]),
            "ReviewBoard[s3,swift]~=7.0"
        );
    }

    #[test]
    fn test_may_reach() {
        let six = Version::parse("6.0");
        assert!(AppVersion::Latest.may_reach(&six));
        assert!(parse("7.0").may_reach(&six));
        assert!(parse("6").may_reach(&six));
        assert!(!parse("5.0.7").may_reach(&six));
        assert!(parse(">=5.0").may_reach(&six));
        assert!(parse("<=6").may_reach(&six));
        assert!(!parse("<6").may_reach(&six));
        assert!(!parse("==5.0.*").may_reach(&six));
        assert!(!parse("~=5.0").may_reach(&six));
        assert!(parse("~=6.0").may_reach(&six));
    }

    #[test]
    fn test_lxml_is_built_from_source() {
        let requirements = AppRequirements::new("/opt/reviewboard");
        assert_eq!(
            requirements.packaging,
            vec!["pip", "setuptools", "wheel", "--no-binary", "lxml", "lxml"]
        );
    }
}
