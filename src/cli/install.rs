use clap::Parser;
use std::path::PathBuf;

use crate::host::DEFAULT_PYTHON;
use crate::plan::AppVersion;
use crate::plan::addons::{POWERPACK, REVIEWBOT_EXTENSION, REVIEWBOT_WORKER};
use crate::pypi::DEFAULT_INDEX_URL;
use crate::site::{DEFAULT_ADMIN_USER, ServerChoice};

/// Default location of the Python environment
pub const DEFAULT_INSTALL_PATH: &str = "/opt/reviewboard";
/// Default location of the site directory
pub const DEFAULT_SITEDIR_PATH: &str = "/var/www/reviewboard";
pub const DEFAULT_DOMAIN: &str = "localhost";

/// Arguments for the install command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Install the latest release:\n    rbinstall install\n\n\
                   Install a specific version without prompting:\n    rbinstall install --app-version 7.0.2 --noinput\n\n\
                   Use a package index mirror:\n    rbinstall install --index-url https://pypi.example.com/simple\n\n\
                   Skip SAML and MySQL support:\n    rbinstall install --without saml,mysql\n\n\
                   Install without Review Bot:\n    rbinstall install --no-install-reviewbot-extension --no-install-reviewbot-worker\n\n\
                   Show the plan only:\n    rbinstall install --dry-run")]
pub struct InstallArgs {
    /// Review Board version: latest, an exact version (7.0.2) or a pip specifier (">=7,<8")
    #[arg(long, visible_alias = "reviewboard-version", value_name = "VERSION", default_value = "latest")]
    pub app_version: AppVersion,

    /// Power Pack version
    #[arg(long, value_name = "VERSION", default_value = "latest")]
    pub powerpack_version: AppVersion,

    /// Review Bot extension version
    #[arg(long, value_name = "VERSION", default_value = "latest")]
    pub reviewbot_extension_version: AppVersion,

    /// Review Bot worker version
    #[arg(long, value_name = "VERSION", default_value = "latest")]
    pub reviewbot_worker_version: AppVersion,

    /// Do not install Power Pack
    #[arg(long)]
    pub no_install_powerpack: bool,

    /// Do not install the Review Bot extension
    #[arg(long)]
    pub no_install_reviewbot_extension: bool,

    /// Do not install the Review Bot worker
    #[arg(long)]
    pub no_install_reviewbot_worker: bool,

    /// Package index queried for releases that support the host Python
    #[arg(long, value_name = "URL", default_value = DEFAULT_INDEX_URL)]
    pub pypi_url: String,

    /// Do not look up compatible releases; pip resolves the versions
    #[arg(long)]
    pub skip_version_check: bool,

    /// Python package index to install from
    #[arg(long, value_name = "URL")]
    pub index_url: Option<String>,

    /// Additional Python package index
    #[arg(long, value_name = "URL")]
    pub extra_index_url: Option<String>,

    /// System package repository to add before installing packages
    #[arg(long, value_name = "URL")]
    pub system_repo_url: Option<String>,

    /// Install only required features
    #[arg(long)]
    pub skip_optional: bool,

    /// Disable optional features (e.g., --without saml,cvs)
    #[arg(long, value_name = "FEATURE", value_delimiter = ',')]
    pub without: Vec<String>,

    /// Do not ask for confirmation
    #[arg(long = "noinput", short = 'y', visible_alias = "yes")]
    pub noinput: bool,

    /// Show what would be done without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Directory for the Python environment
    #[arg(long, value_name = "PATH", default_value = DEFAULT_INSTALL_PATH)]
    pub install_path: PathBuf,

    /// Directory for the Review Board site
    #[arg(long, value_name = "PATH", default_value = DEFAULT_SITEDIR_PATH)]
    pub sitedir_path: PathBuf,

    /// Do not configure a site or web server
    #[arg(long, conflicts_with_all = ["server", "domain", "port", "admin_user", "admin_email", "admin_password"])]
    pub no_site: bool,

    /// Web server to configure
    #[arg(long, value_enum, default_value_t = ServerChoice::Auto)]
    pub server: ServerChoice,

    /// Host name the site is served as
    #[arg(long, value_name = "NAME", default_value = DEFAULT_DOMAIN)]
    pub domain: String,

    /// Port the site listens on (default: 80, or 8080 for standalone gunicorn)
    #[arg(long)]
    pub port: Option<u16>,

    /// User name of the site administrator
    #[arg(long, value_name = "NAME", default_value = DEFAULT_ADMIN_USER)]
    pub admin_user: String,

    /// E-mail address of the site administrator (default: <admin-user>@<domain>)
    #[arg(long, value_name = "EMAIL")]
    pub admin_email: Option<String>,

    /// Password of the site administrator; prompted for when omitted
    #[arg(long, value_name = "PASSWORD")]
    pub admin_password: Option<String>,

    /// Python interpreter used to create the environment
    #[arg(long, value_name = "PYTHON", default_value = DEFAULT_PYTHON)]
    pub python: String,
}

impl InstallArgs {
    /// Requested version of an add-on, or `None` when it is disabled
    pub fn addon_version(&self, id: &str) -> Option<&AppVersion> {
        let (disabled, version) = match id {
            POWERPACK => (self.no_install_powerpack, &self.powerpack_version),
            REVIEWBOT_EXTENSION => (self.no_install_reviewbot_extension, &self.reviewbot_extension_version),
            REVIEWBOT_WORKER => (self.no_install_reviewbot_worker, &self.reviewbot_worker_version),
            _ => return None,
        };
        (!disabled).then_some(version)
    }
}
