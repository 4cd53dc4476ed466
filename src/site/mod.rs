//! Site configuration
//!
//! This module handles:
//! - Choosing a web server from what is installed on the host
//! - Creating the site directory with `rb-site install`
//! - Planning the configuration files for the chosen server
//! - Rendering the embedded templates with Tera
//!
//! Rendering is deterministic. A file whose content would not change is left
//! untouched, so re-running an installation reports the step as unchanged.

pub mod templates;

pub use templates::SiteTemplate;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tera::{Context, Tera};

use crate::error::{Result, exec, fs as fs_error};
use crate::hash;
use crate::plan::{PlannedStep, Step};

/// Written by `rb-site install`; its presence marks an installed site
pub const SETTINGS_LOCAL: &str = "conf/settings_local.py";

/// Default user name of the site administrator
pub const DEFAULT_ADMIN_USER: &str = "admin";

const ADMIN_PASSWORD_OPTION: &str = "--admin-password=";

/// Directories created inside every site
pub const SITE_DIRECTORIES: &[&str] = &["conf", "data", "htdocs/static", "htdocs/media", "logs", "tmp"];

/// Known locations of the Apache `mod_wsgi` module, Debian and Red Hat layouts
pub const APACHE_WSGI_MODULES: &[&str] = &[
    "/etc/apache2/mods-available/wsgi.load",
    "/usr/lib/apache2/modules/mod_wsgi.so",
    "/etc/httpd/conf.modules.d/10-wsgi-python3.conf",
    "/usr/lib64/httpd/modules/mod_wsgi_python3.so",
];

const APACHE_PROGRAMS: &[&str] = &["apache2", "httpd", "apachectl"];

/// gunicorn's listen address when nginx proxies to it
const GUNICORN_UPSTREAM: &str = "127.0.0.1:8080";
const GUNICORN_WORKERS: &str = "4";

/// Web server requested on the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ServerChoice {
    #[default]
    Auto,
    Apache,
    Nginx,
    Standalone,
}

/// Web server the site is configured for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerKind {
    Apache,
    /// nginx proxying to gunicorn
    Nginx,
    /// gunicorn serving directly
    Standalone,
}

impl ServerKind {
    pub fn name(self) -> &'static str {
        match self {
            ServerKind::Apache => "Apache (mod_wsgi)",
            ServerKind::Nginx => "nginx + gunicorn",
            ServerKind::Standalone => "gunicorn",
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            ServerKind::Apache | ServerKind::Nginx => 80,
            ServerKind::Standalone => 8080,
        }
    }

    /// Python packages the server needs inside the runtime environment
    pub fn app_packages(self) -> &'static [&'static str] {
        match self {
            ServerKind::Apache => &[],
            ServerKind::Nginx | ServerKind::Standalone => &["gunicorn"],
        }
    }

    pub fn templates(self) -> &'static [SiteTemplate] {
        match self {
            ServerKind::Apache => &[SiteTemplate::Wsgi, SiteTemplate::Apache],
            ServerKind::Nginx => &[SiteTemplate::Wsgi, SiteTemplate::Gunicorn, SiteTemplate::Nginx],
            ServerKind::Standalone => &[SiteTemplate::Wsgi, SiteTemplate::Gunicorn],
        }
    }
}

/// Read-only view of the host used to pick a web server
pub trait ServerLookup {
    fn path_exists(&self, path: &Path) -> bool;
    fn find_program(&self, name: &str) -> Option<PathBuf>;
}

/// Looks at the real file system and `PATH`
#[derive(Debug, Default)]
pub struct SystemLookup;

impl ServerLookup for SystemLookup {
    fn path_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn find_program(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }
}

fn apache_available(lookup: &dyn ServerLookup) -> bool {
    let module = APACHE_WSGI_MODULES
        .iter()
        .find(|m| lookup.path_exists(Path::new(m)));
    let program = APACHE_PROGRAMS.iter().find_map(|p| lookup.find_program(p));

    tracing::debug!("Apache mod_wsgi: {:?}, server: {:?}", module, program);
    module.is_some() && program.is_some()
}

fn nginx_available(lookup: &dyn ServerLookup) -> bool {
    lookup.find_program("nginx").is_some()
}

/// Pick the web server to configure
///
/// `Auto` prefers Apache with `mod_wsgi`, then nginx, then gunicorn on its own.
/// An explicit choice the host cannot satisfy is an error.
pub fn select_server(choice: ServerChoice, lookup: &dyn ServerLookup) -> Result<ServerKind> {
    let server = match choice {
        ServerChoice::Auto if apache_available(lookup) => ServerKind::Apache,
        ServerChoice::Auto if nginx_available(lookup) => ServerKind::Nginx,
        ServerChoice::Auto | ServerChoice::Standalone => ServerKind::Standalone,
        ServerChoice::Apache => {
            if !apache_available(lookup) {
                return Err(exec::site_configuration(
                    "Apache was requested, but no Apache server with mod_wsgi was found",
                ));
            }
            ServerKind::Apache
        }
        ServerChoice::Nginx => {
            if !nginx_available(lookup) {
                return Err(exec::site_configuration(
                    "nginx was requested, but nginx is not installed",
                ));
            }
            ServerKind::Nginx
        }
    };

    tracing::info!("Configuring the site for {}", server.name());
    Ok(server)
}

/// Where and how the site is configured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteOptions {
    pub path: PathBuf,
    pub domain: String,
    /// Listen port; the server's default when unset
    pub port: Option<u16>,
    pub server: ServerKind,
    pub admin_user: String,
    /// `<admin_user>@<domain>` when unset
    pub admin_email: Option<String>,
    /// Asked for before the site is created when unset
    pub admin_password: Option<String>,
}

impl SiteOptions {
    pub fn new(path: impl Into<PathBuf>, server: ServerKind) -> Self {
        Self {
            path: path.into(),
            domain: "localhost".to_string(),
            port: None,
            server,
            admin_user: DEFAULT_ADMIN_USER.to_string(),
            admin_email: None,
            admin_password: None,
        }
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.server.default_port())
    }

    pub fn admin_email(&self) -> String {
        self.admin_email
            .clone()
            .unwrap_or_else(|| format!("{}@{}", self.admin_user, self.domain))
    }
}

/// `rb-site install` for a site directory that does not exist yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteInstall {
    pub site_root: PathBuf,
    pub command: Vec<String>,
}

impl SiteInstall {
    pub fn new(environment: &Path, options: &SiteOptions) -> Self {
        let path = |rel: &str| options.path.join(rel).display().to_string();
        let command = vec![
            environment.join("bin").join("rb-site").display().to_string(),
            "install".to_string(),
            "--noinput".to_string(),
            format!("--domain-name={}", options.domain),
            "--site-root=/".to_string(),
            "--db-type=sqlite3".to_string(),
            format!("--db-name={}", path("data/reviewboard.db")),
            "--cache-type=file".to_string(),
            format!("--cache-info={}", path("tmp/cache")),
            format!("--admin-user={}", options.admin_user),
            format!(
                "{ADMIN_PASSWORD_OPTION}{}",
                options.admin_password.as_deref().unwrap_or_default()
            ),
            format!("--admin-email={}", options.admin_email()),
            options.path.display().to_string(),
        ];

        Self {
            site_root: options.path.clone(),
            command,
        }
    }

    pub fn settings(&self) -> PathBuf {
        self.site_root.join(SETTINGS_LOCAL)
    }

    pub fn is_installed(&self) -> bool {
        self.settings().is_file()
    }

    /// Whether the command still lacks an administrator password
    pub fn needs_password(&self) -> bool {
        self.command.iter().any(|a| a == ADMIN_PASSWORD_OPTION)
    }

    pub fn set_password(&mut self, password: &str) {
        for arg in &mut self.command {
            if arg.starts_with(ADMIN_PASSWORD_OPTION) {
                *arg = format!("{ADMIN_PASSWORD_OPTION}{password}");
            }
        }
    }
}

/// One configuration file to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRender {
    pub template: SiteTemplate,
    pub site_root: PathBuf,
    pub target: PathBuf,
    pub values: BTreeMap<String, String>,
}

fn template_values(environment: &Path, options: &SiteOptions) -> BTreeMap<String, String> {
    let bind = match options.server {
        ServerKind::Nginx => GUNICORN_UPSTREAM.to_string(),
        _ => format!("0.0.0.0:{}", options.port()),
    };

    [
        ("site_root", options.path.display().to_string()),
        ("environment", environment.display().to_string()),
        ("domain", options.domain.clone()),
        ("port", options.port().to_string()),
        ("bind", bind),
        ("workers", GUNICORN_WORKERS.to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Site creation followed by the render steps for the chosen server
pub fn plan_steps(environment: &Path, options: &SiteOptions) -> Vec<PlannedStep> {
    let values = template_values(environment, options);

    let create = PlannedStep::required(
        "Create site directory",
        Step::CreateSite(SiteInstall::new(environment, options)),
    );

    std::iter::once(create)
        .chain(options.server.templates().iter().map(|&template| {
            PlannedStep::required(
                format!("Write {}", template.target()),
                Step::RenderSiteConfig(SiteRender {
                    template,
                    site_root: options.path.clone(),
                    target: options.path.join(template.target()),
                    values: values.clone(),
                }),
            )
        }))
        .collect()
}

fn ensure_layout(site_root: &Path) -> Result<()> {
    for dir in SITE_DIRECTORIES {
        let path = site_root.join(dir);
        fs::create_dir_all(&path).map_err(|e| fs_error::write_failed(&path, e))?;
    }
    Ok(())
}

fn render_template(template: SiteTemplate, values: &BTreeMap<String, String>) -> Result<String> {
    let mut tera = Tera::default();
    tera.add_raw_template(template.name(), template.source())
        .map_err(|e| exec::site_configuration(format!("invalid template {template}: {e}")))?;

    let context = Context::from_serialize(values)
        .map_err(|e| exec::site_configuration(format!("invalid values for {template}: {e}")))?;

    tera.render(template.name(), &context)
        .map_err(|e| exec::site_configuration(format!("failed to render {template}: {e}")))
}

/// Render one file, creating the site layout first
///
/// Returns whether the file was written.
pub fn render(render: &SiteRender) -> Result<bool> {
    ensure_layout(&render.site_root)?;
    let content = render_template(render.template, &render.values)?;

    if render.target.is_file() && hash::hash_file(&render.target)? == hash::hash_bytes(content.as_bytes()) {
        tracing::debug!("{} is up to date", render.target.display());
        return Ok(false);
    }

    if let Some(parent) = render.target.parent() {
        fs::create_dir_all(parent).map_err(|e| fs_error::write_failed(parent, e))?;
    }
    fs::write(&render.target, content).map_err(|e| fs_error::write_failed(&render.target, e))?;
    tracing::info!("Wrote {}", render.target.display());

    Ok(true)
}
