//! Embedded site configuration templates (Tera syntax)

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteTemplate {
    Wsgi,
    Apache,
    Nginx,
    Gunicorn,
}

impl SiteTemplate {
    #[cfg(test)]
    pub const ALL: [SiteTemplate; 4] = [
        SiteTemplate::Wsgi,
        SiteTemplate::Apache,
        SiteTemplate::Nginx,
        SiteTemplate::Gunicorn,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SiteTemplate::Wsgi => "reviewboard.wsgi",
            SiteTemplate::Apache => "apache.conf",
            SiteTemplate::Nginx => "nginx.conf",
            SiteTemplate::Gunicorn => "gunicorn.conf.py",
        }
    }

    /// Path of the rendered file, relative to the site directory
    pub fn target(self) -> &'static str {
        match self {
            SiteTemplate::Wsgi => "htdocs/reviewboard.wsgi",
            SiteTemplate::Apache => "conf/apache.conf",
            SiteTemplate::Nginx => "conf/nginx.conf",
            SiteTemplate::Gunicorn => "conf/gunicorn.conf.py",
        }
    }

    pub fn source(self) -> &'static str {
        match self {
            SiteTemplate::Wsgi => WSGI,
            SiteTemplate::Apache => APACHE,
            SiteTemplate::Nginx => NGINX,
            SiteTemplate::Gunicorn => GUNICORN,
        }
    }
}

impl fmt::Display for SiteTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const WSGI: &str = r#"# Generated by rbinstall. Changes will be overwritten on the next run.
import os
import sys

os.environ['REVIEWBOARD_SITEDIR'] = '{{ site_root }}'
os.environ.setdefault('DJANGO_SETTINGS_MODULE', 'reviewboard.settings')

sys.path.insert(0, '{{ site_root }}/conf')

from reviewboard.wsgi import application
"#;

const APACHE: &str = r#"# Generated by rbinstall. Changes will be overwritten on the next run.
<VirtualHost *:{{ port }}>
    ServerName {{ domain }}
    DocumentRoot "{{ site_root }}/htdocs"

    WSGIPassAuthorization On
    WSGIDaemonProcess reviewboard python-home={{ environment }} processes=2 threads=15
    WSGIProcessGroup reviewboard
    WSGIScriptAlias "/" "{{ site_root }}/htdocs/reviewboard.wsgi/"

    <Directory "{{ site_root }}/htdocs">
        AllowOverride All
        Options -Indexes +FollowSymLinks
        Require all granted
    </Directory>

    Alias /media "{{ site_root }}/htdocs/media"
    Alias /static "{{ site_root }}/htdocs/static"

    ErrorLog "{{ site_root }}/logs/apache-error.log"
    CustomLog "{{ site_root }}/logs/apache-access.log" combined
</VirtualHost>
"#;

const NGINX: &str = r#"# Generated by rbinstall. Changes will be overwritten on the next run.
server {
    listen {{ port }};
    server_name {{ domain }};
    client_max_body_size 100M;

    access_log {{ site_root }}/logs/nginx-access.log;
    error_log {{ site_root }}/logs/nginx-error.log;

    location /media/ {
        alias {{ site_root }}/htdocs/media/;
    }

    location /static/ {
        alias {{ site_root }}/htdocs/static/;
    }

    location / {
        proxy_pass http://{{ bind }};
        proxy_set_header Host $host;
        proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;
        proxy_set_header X-Forwarded-Proto $scheme;
    }
}
"#;

const GUNICORN: &str = r#"# Generated by rbinstall. Changes will be overwritten on the next run.
wsgi_app = 'reviewboard.wsgi:application'
bind = '{{ bind }}'
workers = {{ workers }}
pythonpath = '{{ site_root }}/conf'
raw_env = [
    'REVIEWBOARD_SITEDIR={{ site_root }}',
    'DJANGO_SETTINGS_MODULE=reviewboard.settings',
]
accesslog = '{{ site_root }}/logs/gunicorn-access.log'
errorlog = '{{ site_root }}/logs/gunicorn-error.log'
"#;
