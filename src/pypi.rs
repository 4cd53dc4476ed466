//! Release lookup on the Python package index
//!
//! Reads the JSON API (`<index>/pypi/<package>/json`) to find the newest
//! release of a package that installs on the host's Python. A release is a
//! candidate when it has files, its first file is not yanked and its
//! `requires_python` accepts the host interpreter.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;

use crate::error::{Result, index as index_error};
use crate::plan::{AppRequirements, AppVersion};
use crate::version::{SpecifierSet, Version};

/// Base URL of the public package index
pub const DEFAULT_INDEX_URL: &str = "https://pypi.org";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The parts of a project's JSON document this tool reads
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectInfo {
    pub info: ProjectSummary,
    #[serde(default)]
    pub releases: BTreeMap<String, Vec<ReleaseFile>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectSummary {
    pub name: String,
    /// Latest stable release
    pub version: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReleaseFile {
    #[serde(default)]
    pub yanked: bool,
    #[serde(default)]
    pub requires_python: Option<String>,
}

/// Source of project metadata
pub trait PackageIndex {
    /// Metadata for `package`, or `None` when the index does not know it
    fn project(&self, package: &str) -> Result<Option<ProjectInfo>>;
}

/// Blocking client for the package index JSON API
pub struct PypiClient {
    base_url: String,
    client: Client,
}

impl PypiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("rbinstall/{}", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| index_error::lookup_failed("", base_url, e))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn project_url(&self, package: &str) -> String {
        format!("{}/pypi/{}/json", self.base_url, package)
    }
}

impl PackageIndex for PypiClient {
    fn project(&self, package: &str) -> Result<Option<ProjectInfo>> {
        let url = self.project_url(package);
        tracing::debug!("Fetching {}", url);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .map_err(|e| index_error::lookup_failed(package, &url, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        response
            .error_for_status()
            .and_then(|r| r.json::<ProjectInfo>())
            .map(Some)
            .map_err(|e| index_error::lookup_failed(package, &url, e))
    }
}

/// The release chosen for a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRelease {
    pub package: String,
    pub version: Version,
    pub latest: Version,
}

impl ResolvedRelease {
    pub fn is_latest(&self) -> bool {
        self.version.cmp_release(&self.latest).is_eq()
    }
}

/// Whether `version` is one `target` asks for
///
/// Only an exact request selects a pre-release or anything newer than the
/// latest stable release.
fn wanted(target: &AppVersion, latest: &Version, version: &Version) -> bool {
    match target {
        AppVersion::Exact(requested) => version.cmp_release(requested).is_le(),
        AppVersion::Latest => version.is_release() && version.cmp_release(latest).is_le(),
        AppVersion::Specifier(spec) => {
            version.is_release() && version.cmp_release(latest).is_le() && spec.contains(version)
        }
    }
}

fn supports_python(requires_python: Option<&str>, python: Option<&Version>) -> bool {
    let (Some(requires), Some(python)) = (requires_python.filter(|r| !r.trim().is_empty()), python)
    else {
        return true;
    };

    match SpecifierSet::parse(requires) {
        Some(spec) => spec.contains(python),
        None => {
            tracing::warn!("Ignoring unreadable requires_python '{}'", requires);
            true
        }
    }
}

/// Newest release of `package` selected by `target` that runs on `python`
///
/// `None` when the index does not know the package or no release qualifies.
/// Without a known Python version, `requires_python` is not checked.
pub fn find_release(
    index: &dyn PackageIndex,
    package: &str,
    target: &AppVersion,
    python: Option<&Version>,
) -> Result<Option<ResolvedRelease>> {
    let Some(project) = index.project(package)? else {
        tracing::debug!("{} is not on the package index", package);
        return Ok(None);
    };

    let latest = Version::parse(&project.info.version);
    let mut releases: Vec<(Version, &Vec<ReleaseFile>)> = project
        .releases
        .iter()
        .map(|(v, files)| (Version::parse(v), files))
        .collect();
    releases.sort_by(|a, b| b.0.cmp_release(&a.0));

    let found = releases.into_iter().find(|(version, files)| {
        let Some(first) = files.first() else {
            return false;
        };
        wanted(target, &latest, version)
            && !first.yanked
            && supports_python(first.requires_python.as_deref(), python)
    });

    Ok(found.map(|(version, _)| ResolvedRelease {
        package: project.info.name.clone(),
        version,
        latest,
    }))
}

fn python_label(python: Option<&Version>) -> String {
    python.map_or_else(|| "unknown".to_string(), ToString::to_string)
}

/// Pin the application and add-ons to releases the host can run
///
/// The application must resolve; an add-on without a usable release is
/// dropped. Returns notes for the plan.
pub fn pin_versions(
    index: &dyn PackageIndex,
    python: Option<&Version>,
    requirements: &mut AppRequirements,
) -> Result<Vec<String>> {
    let mut notes = Vec::new();

    let app = find_release(index, &requirements.package, &requirements.version, python)?
        .ok_or_else(|| index_error::no_compatible_release(&requirements.package, python_label(python)))?;
    if let Some(note) = pin_note(&app, &requirements.version, python) {
        notes.push(note);
    }
    tracing::info!("Selected {} {}", app.package, app.version);
    requirements.version = AppVersion::Exact(app.version);

    let mut kept = Vec::new();
    for mut addon in std::mem::take(&mut requirements.addons) {
        match find_release(index, addon.package, &addon.version, python)? {
            Some(release) => {
                if let Some(note) = pin_note(&release, &addon.version, python) {
                    notes.push(note);
                }
                addon.version = AppVersion::Exact(release.version);
                kept.push(addon);
            }
            None => notes.push(format!(
                "{} will not be installed: no release supports Python {}",
                addon.label,
                python_label(python)
            )),
        }
    }
    requirements.addons = kept;

    Ok(notes)
}

/// A note when the release is older than what was asked for
fn pin_note(release: &ResolvedRelease, target: &AppVersion, python: Option<&Version>) -> Option<String> {
    let requested = match target {
        AppVersion::Exact(v) => release.version.cmp_release(v).is_eq(),
        AppVersion::Latest | AppVersion::Specifier(_) => release.is_latest(),
    };
    (!requested).then(|| {
        format!(
            "Installing {} {}, the newest release for Python {} (latest is {})",
            release.package,
            release.version,
            python_label(python),
            release.latest
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InstallerError;
    use serde_json::json;

    #[derive(Default)]
    struct FakeIndex {
        projects: BTreeMap<String, ProjectInfo>,
    }

    impl FakeIndex {
        fn with(mut self, document: serde_json::Value) -> Self {
            let project: ProjectInfo = serde_json::from_value(document).unwrap();
            self.projects.insert(project.info.name.clone(), project);
            self
        }
    }

    impl PackageIndex for FakeIndex {
        fn project(&self, package: &str) -> Result<Option<ProjectInfo>> {
            Ok(self.projects.get(package).cloned())
        }
    }

    fn reviewboard() -> serde_json::Value {
        json!({
            "info": {"name": "ReviewBoard", "version": "7.0.2"},
            "releases": {
                "5.0.7": [{"requires_python": ">=3.7", "yanked": false}],
                "6.0": [{"requires_python": ">=3.8", "yanked": false}],
                "7.0.1": [{"requires_python": ">=3.8", "yanked": true}],
                "7.0.2": [{"requires_python": ">=3.8", "yanked": false}],
                "7.1b1": [{"requires_python": ">=3.8", "yanked": false}],
                "8.0": []
            }
        })
    }

    fn index() -> FakeIndex {
        FakeIndex::default().with(reviewboard()).with(json!({
            "info": {"name": "ReviewBoardPowerPack", "version": "6.1"},
            "releases": {
                "6.1": [{"requires_python": ">=3.8"}]
            }
        }))
    }

    fn find(target: &str, python: &str) -> Option<String> {
        let python = Version::parse(python);
        find_release(&index(), "ReviewBoard", &target.parse().unwrap(), Some(&python))
            .unwrap()
            .map(|r| r.version.to_string())
    }

    #[test]
    fn test_latest_release() {
        assert_eq!(find("latest", "3.11.4").as_deref(), Some("7.0.2"));
    }

    #[test]
    fn test_falls_back_to_release_for_older_python() {
        assert_eq!(find("latest", "3.7.9").as_deref(), Some("5.0.7"));
        assert_eq!(find("latest", "3.6.8"), None);
    }

    #[test]
    fn test_skips_yanked_releases() {
        assert_eq!(find("7.0.1", "3.11.4").as_deref(), Some("6.0"));
    }

    #[test]
    fn test_exact_request_may_select_prerelease() {
        assert_eq!(find("7.1b1", "3.11.4").as_deref(), Some("7.1b1"));
    }

    #[test]
    fn test_specifier_request() {
        assert_eq!(find("<7", "3.11.4").as_deref(), Some("6.0"));
        assert_eq!(find("~=5.0", "3.11.4").as_deref(), Some("5.0.7"));
    }

    #[test]
    fn test_unknown_package() {
        let found = find_release(&index(), "Nonexistent", &AppVersion::Latest, None).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_pin_versions_pins_and_drops_addons() {
        let mut requirements = AppRequirements::new("/opt/reviewboard");
        let python = Version::parse("3.11.4");
        let notes = pin_versions(&index(), Some(&python), &mut requirements).unwrap();

        assert_eq!(requirements.version, AppVersion::Exact(Version::parse("7.0.2")));
        let addons: Vec<_> = requirements.addons.iter().map(|a| a.requirement()).collect();
        assert_eq!(addons, vec!["ReviewBoardPowerPack==6.1"]);
        assert_eq!(notes.len(), 2, "notes: {notes:?}");
        assert!(notes[0].contains("Review Bot extension will not be installed"));
    }

    #[test]
    fn test_pin_versions_notes_older_release() {
        let mut requirements = AppRequirements::new("/opt/reviewboard");
        requirements.addons.clear();
        let python = Version::parse("3.7.9");
        let notes = pin_versions(&index(), Some(&python), &mut requirements).unwrap();

        assert_eq!(requirements.version, AppVersion::Exact(Version::parse("5.0.7")));
        assert_eq!(
            notes,
            vec!["Installing ReviewBoard 5.0.7, the newest release for Python 3.7.9 (latest is 7.0.2)"]
        );
    }

    #[test]
    fn test_pin_versions_without_compatible_release() {
        let mut requirements = AppRequirements::new("/opt/reviewboard");
        let python = Version::parse("3.6.8");
        let err = pin_versions(&index(), Some(&python), &mut requirements).unwrap_err();
        assert!(matches!(err, InstallerError::NoCompatibleRelease { .. }));
        assert!(err.to_string().contains("3.6.8"));
    }

    #[test]
    fn test_project_url() {
        let client = PypiClient::new("https://pypi.example.com/").unwrap();
        assert_eq!(
            client.project_url("ReviewBoard"),
            "https://pypi.example.com/pypi/ReviewBoard/json"
        );
    }
}
