//! Scripted host for tests
//!
//! `FakeHost` records every command and models just enough host state
//! (installed system packages, added repositories, virtual environments, pip
//! installs and created sites) for a second run over the same plan to observe
//! the first.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::path::Path;

use super::{CommandOutput, CommandRunner, ExitOutcome, join_cmdline};
use crate::error::{Result, exec};

type Rule = (String, CommandOutput);

#[derive(Default)]
pub struct FakeHost {
    calls: RefCell<Vec<Vec<String>>>,
    packages: RefCell<BTreeSet<String>>,
    repositories: RefCell<BTreeSet<String>>,
    pip: RefCell<BTreeSet<String>>,
    overrides: RefCell<Vec<Rule>>,
    missing_programs: RefCell<BTreeSet<String>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark system packages as already installed
    pub fn with_packages(self, names: &[&str]) -> Self {
        self.packages
            .borrow_mut()
            .extend(names.iter().map(|n| (*n).to_string()));
        self
    }

    /// Fail every command whose joined command line contains `needle`
    pub fn fail_when(self, needle: &str, code: i32, output: &str) -> Self {
        self.overrides.borrow_mut().push((
            needle.to_string(),
            CommandOutput {
                status: ExitOutcome::Code(code),
                output: output.to_string(),
            },
        ));
        self
    }

    /// Kill every command whose joined command line contains `needle`
    pub fn interrupt_when(self, needle: &str) -> Self {
        self.overrides.borrow_mut().push((
            needle.to_string(),
            CommandOutput {
                status: ExitOutcome::Signal(2),
                output: String::new(),
            },
        ));
        self
    }

    /// Make spawning `program` fail as if it were not installed
    pub fn without_program(self, program: &str) -> Self {
        self.missing_programs.borrow_mut().insert(program.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }

    pub fn cmdlines(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|c| join_cmdline(c)).collect()
    }

    /// Commands that could change the host (everything but queries and checks)
    pub fn mutating_cmdlines(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| !is_query(c))
            .map(|c| join_cmdline(c))
            .collect()
    }

    pub fn has_package(&self, name: &str) -> bool {
        self.packages.borrow().contains(name)
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn simulate(&self, argv: &[String]) -> CommandOutput {
        let program = argv[0].as_str();
        let args: Vec<&str> = argv[1..].iter().map(String::as_str).collect();

        match (program, args.as_slice()) {
            ("uname", ["-m"]) => ok("x86_64\n"),
            ("sw_vers", _) => ok("14.4\n"),
            (_, ["-c", script]) if script.contains("sys.version_info") => ok("3.11.4\n"),
            ("dpkg-query", [.., name]) => {
                if self.has_package(name) {
                    ok("installed")
                } else {
                    status(1, "dpkg-query: no packages found")
                }
            }
            ("rpm", ["-q", name]) | ("pacman", ["-Q", name]) | ("brew", ["list", "--versions", name]) => {
                if self.has_package(name) {
                    ok(name)
                } else {
                    status(1, &format!("package {name} is not installed"))
                }
            }
            ("grep", ["-rqsF", url, ..]) => {
                if self.repositories.borrow().contains(*url) {
                    ok("")
                } else {
                    status(1, "")
                }
            }
            ("add-apt-repository", [.., url])
            | ("dnf", ["config-manager", "--add-repo", url])
            | ("yum-config-manager", ["--add-repo", url]) => {
                self.repositories.borrow_mut().insert((*url).to_string());
                ok("")
            }
            (_, ["-m", "venv", path]) => {
                let path = Path::new(path);
                let created = std::fs::create_dir_all(path.join("bin"))
                    .and_then(|()| std::fs::write(path.join("pyvenv.cfg"), "home = /usr/bin\n"))
                    .and_then(|()| std::fs::write(path.join("bin/python"), ""));
                match created {
                    Ok(()) => ok(""),
                    Err(e) => status(1, &e.to_string()),
                }
            }
            (pip, ["install", rest @ ..]) if pip.ends_with("/bin/pip") => self.pip_install(rest),
            (rb_site, ["install", .., site]) if rb_site.ends_with("/bin/rb-site") => {
                let conf = Path::new(site).join("conf");
                let created = std::fs::create_dir_all(&conf)
                    .and_then(|()| std::fs::write(conf.join("settings_local.py"), "DEBUG = False\n"));
                match created {
                    Ok(()) => ok("Installing the site...\n"),
                    Err(e) => status(1, &e.to_string()),
                }
            }
            _ if args.contains(&"install") => self.system_install(&args),
            _ => ok(""),
        }
    }

    fn system_install(&self, args: &[&str]) -> CommandOutput {
        let Some(pos) = args.iter().position(|a| *a == "install") else {
            return ok("");
        };
        let mut packages = self.packages.borrow_mut();
        for name in args[pos + 1..].iter().filter(|a| !a.starts_with('-')) {
            packages.insert((*name).to_string());
        }
        ok("Setting up packages\n")
    }

    fn pip_install(&self, args: &[&str]) -> CommandOutput {
        let mut requested = Vec::new();
        let mut skip_value = false;
        for arg in args {
            if skip_value {
                skip_value = false;
            } else if *arg == "--extra-index-url" {
                skip_value = true;
            } else if !arg.starts_with('-') {
                requested.push((*arg).to_string());
            }
        }

        let mut pip = self.pip.borrow_mut();
        let fresh: Vec<String> = requested
            .into_iter()
            .filter(|r| !pip.contains(r))
            .collect();

        if fresh.is_empty() {
            return ok("Requirement already satisfied\n");
        }
        pip.extend(fresh.iter().cloned());
        ok(&format!("Successfully installed {}\n", fresh.join(" ")))
    }
}

impl CommandRunner for FakeHost {
    fn run(&self, argv: &[String]) -> Result<CommandOutput> {
        self.calls.borrow_mut().push(argv.to_vec());
        let cmdline = join_cmdline(argv);

        if argv.is_empty() {
            return Err(exec::spawn_failed(cmdline, "empty command line"));
        }
        if self.missing_programs.borrow().contains(&argv[0]) {
            return Err(exec::spawn_failed(cmdline, "No such file or directory"));
        }
        if let Some((_, out)) = self
            .overrides
            .borrow()
            .iter()
            .find(|(needle, _)| cmdline.contains(needle.as_str()))
        {
            return Ok(out.clone());
        }

        Ok(self.simulate(argv))
    }
}

fn is_query(argv: &[String]) -> bool {
    matches!(
        argv.first().map(String::as_str),
        Some("dpkg-query" | "rpm" | "grep" | "uname" | "sw_vers")
    ) || argv.get(1).is_some_and(|a| a == "-Q" || a == "list" || a == "-c" || a == "repos")
}

fn ok(output: &str) -> CommandOutput {
    status(0, output)
}

fn status(code: i32, output: &str) -> CommandOutput {
    CommandOutput {
        status: ExitOutcome::Code(code),
        output: output.to_string(),
    }
}
