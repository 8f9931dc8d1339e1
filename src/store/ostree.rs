// src/store/ostree.rs

//! Tree store backed by the `ostree` command line tool
//!
//! Every operation runs one or more `ostree` invocations with stdin
//! nullified and a per-command timeout. Failures are classified from the
//! exit status and stderr into [`StoreError`] categories.
//!
//! Commit metadata is read from the `treeota.metadata` commit metadata key,
//! so it is available after a metadata-only pull without fetching the tree.

use super::{StoreError, TreeStore, verify_path_exists};
use crate::repository::RepositoryConfig;
use crate::revision::RevisionInfo;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};
use wait_timeout::ChildExt;

/// Default timeout for a single ostree invocation (5 minutes)
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(300);

/// Commit metadata key holding the update description
pub const METADATA_KEY: &str = "treeota.metadata";

/// Settings for [`OstreeCommandStore`]
#[derive(Debug, Clone)]
pub struct OstreeStoreConfig {
    /// Path to the ostree binary
    pub binary: PathBuf,
    /// Physical root containing `ostree/repo`
    pub sysroot: PathBuf,
    /// Name the remote is registered under
    pub remote_name: String,
    /// Branch (ref) tracked on the remote
    pub branch: String,
    /// Timeout applied to every invocation
    pub timeout: Duration,
}

impl OstreeStoreConfig {
    /// Locate `ostree` on PATH and fill in defaults
    pub fn discover(sysroot: impl Into<PathBuf>, remote_name: &str, branch: &str) -> Result<Self, StoreError> {
        let binary = which::which("ostree")
            .map_err(|e| StoreError::Unavailable(format!("ostree not found in PATH: {}", e)))?;
        Ok(Self {
            binary,
            sysroot: sysroot.into(),
            remote_name: remote_name.to_string(),
            branch: branch.to_string(),
            timeout: DEFAULT_COMMAND_TIMEOUT,
        })
    }

    fn repo_path(&self) -> PathBuf {
        self.sysroot.join("ostree/repo")
    }
}

/// One deployment line from `ostree admin status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentEntry {
    pub osname: String,
    pub checksum: String,
    pub booted: bool,
    /// Trailing marker such as `pending`, `rollback` or `staged`
    pub marker: Option<String>,
}

/// Parse the deployment list printed by `ostree admin status`.
///
/// Deployment lines are the unindented ones (optionally prefixed with `* `
/// for the booted deployment); indented lines carry per-deployment details
/// and are skipped.
pub fn parse_admin_status(output: &str) -> Vec<DeploymentEntry> {
    let mut entries = Vec::new();

    for line in output.lines() {
        if line.trim().is_empty() || line.starts_with("    ") {
            continue;
        }

        let (booted, rest) = match line.strip_prefix("* ") {
            Some(rest) => (true, rest),
            None => (false, line.trim_start()),
        };

        let mut parts = rest.split_whitespace();
        let (Some(osname), Some(deployment)) = (parts.next(), parts.next()) else {
            continue;
        };

        // "<checksum>.<serial>"
        let Some((checksum, serial)) = deployment.rsplit_once('.') else {
            continue;
        };
        if checksum.is_empty() || serial.is_empty() || !serial.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        let marker = parts
            .next()
            .map(|m| m.trim_matches(|c| c == '(' || c == ')').to_string());

        entries.push(DeploymentEntry {
            osname: osname.to_string(),
            checksum: checksum.to_string(),
            booted,
            marker,
        });
    }

    entries
}

/// Strip GVariant text quoting from `ostree show --print-metadata-key` output
fn unquote_variant(raw: &str) -> String {
    let trimmed = raw.trim();
    let unwrapped = trimmed
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| trimmed.strip_prefix('"').and_then(|s| s.strip_suffix('"')));

    match unwrapped {
        Some(inner) => inner.replace("\\'", "'").replace("\\\"", "\""),
        None => trimmed.to_string(),
    }
}

/// Read a child pipe to the end on its own thread
fn drain_pipe<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

/// Join a pipe reader and decode its output; non-UTF-8 bytes are replaced
fn collect_pipe(reader: Option<JoinHandle<io::Result<Vec<u8>>>>) -> io::Result<String> {
    let Some(reader) = reader else {
        return Ok(String::new());
    };
    let bytes = reader
        .join()
        .map_err(|_| io::Error::other("pipe reader panicked"))??;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Map an ostree failure onto a store error category
fn classify_failure(stderr: &str, fallback: fn(String) -> StoreError) -> StoreError {
    let message = stderr.trim().to_string();
    let lower = message.to_lowercase();

    if lower.contains("gpg") || lower.contains("signature") {
        StoreError::Verification(message)
    } else if lower.contains("not found") || lower.contains("no such") || lower.contains("can't find") {
        StoreError::NotFound(message)
    } else if lower.contains("could not resolve")
        || lower.contains("timeout")
        || lower.contains("timed out")
        || lower.contains("connection")
        || lower.contains("server returned http")
    {
        StoreError::Network(message)
    } else {
        fallback(message)
    }
}

/// Tree store driving the `ostree` binary
pub struct OstreeCommandStore {
    config: OstreeStoreConfig,
}

impl OstreeCommandStore {
    pub fn new(config: OstreeStoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OstreeStoreConfig {
        &self.config
    }

    /// Run ostree with `args`, returning stdout on success.
    ///
    /// On failure the stderr text is passed through `classify_failure` with
    /// `fallback` as the category for unrecognized messages.
    fn run(&self, args: &[String], fallback: fn(String) -> StoreError) -> Result<String, StoreError> {
        debug!("Running {} {}", self.config.binary.display(), args.join(" "));

        let mut child = Command::new(&self.config.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| StoreError::Unavailable(format!("Failed to spawn ostree: {}", e)))?;

        // Drain both pipes while waiting so a chatty child never blocks on write
        let stdout_reader = child.stdout.take().map(drain_pipe);
        let stderr_reader = child.stderr.take().map(drain_pipe);

        let status = match child.wait_timeout(self.config.timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(StoreError::Unavailable(format!(
                    "ostree {} timed out after {} seconds",
                    args.first().map(String::as_str).unwrap_or(""),
                    self.config.timeout.as_secs()
                )));
            }
            Err(e) => return Err(StoreError::Io(format!("Failed to wait for ostree: {}", e))),
        };

        let stdout = collect_pipe(stdout_reader)
            .map_err(|e| StoreError::Io(format!("Failed to read ostree output: {}", e)))?;
        let stderr = collect_pipe(stderr_reader).unwrap_or_default();

        if status.success() {
            Ok(stdout)
        } else {
            for line in stderr.lines() {
                warn!("[ostree] {}", line);
            }
            let code = status.code().unwrap_or(-1);
            let detail = if stderr.trim().is_empty() {
                format!("ostree exited with code {}", code)
            } else {
                stderr
            };
            Err(classify_failure(&detail, fallback))
        }
    }

    fn repo_arg(&self) -> String {
        format!("--repo={}", self.config.repo_path().display())
    }

    fn sysroot_arg(&self) -> String {
        format!("--sysroot={}", self.config.sysroot.display())
    }

    fn deployments(&self) -> Result<Vec<DeploymentEntry>, StoreError> {
        let output = self.run(
            &["admin".to_string(), "status".to_string(), self.sysroot_arg()],
            StoreError::Io,
        )?;
        Ok(parse_admin_status(&output))
    }

    /// Read the update metadata recorded on a commit; missing metadata is empty
    fn commit_metadata(&self, revision: &str) -> String {
        let args = vec![
            "show".to_string(),
            self.repo_arg(),
            format!("--print-metadata-key={}", METADATA_KEY),
            revision.to_string(),
        ];
        match self.run(&args, StoreError::Io) {
            Ok(raw) => unquote_variant(&raw),
            Err(e) => {
                debug!("No metadata for {}: {}", revision, e);
                String::new()
            }
        }
    }

    fn revision_info(&self, checksum: &str) -> RevisionInfo {
        RevisionInfo::new(checksum, self.commit_metadata(checksum))
    }

    /// Register (or replace) the remote so it matches `config`
    fn configure_remote(&self, config: &RepositoryConfig) -> Result<(), StoreError> {
        let mut args = vec![
            "remote".to_string(),
            "add".to_string(),
            self.repo_arg(),
            "--force".to_string(),
            format!("--set=gpg-verify={}", config.gpg_verify),
            format!("--set=tls-permissive={}", config.tls_permissive),
        ];
        let optional = [
            ("tls-client-cert-path", &config.tls_client_cert_path),
            ("tls-client-key-path", &config.tls_client_key_path),
            ("tls-ca-path", &config.tls_ca_path),
        ];
        for (key, value) in optional {
            if !value.is_empty() {
                args.push(format!("--set={}={}", key, value));
            }
        }
        args.push(self.config.remote_name.clone());
        args.push(config.url.clone());
        args.push(self.config.branch.clone());

        self.run(&args, StoreError::Io).map(|_| ())
    }
}

impl TreeStore for OstreeCommandStore {
    fn resolve_booted(&self) -> Result<RevisionInfo, StoreError> {
        let booted = self
            .deployments()?
            .into_iter()
            .find(|d| d.booted)
            .ok_or_else(|| StoreError::NotFound("no booted deployment".to_string()))?;
        Ok(self.revision_info(&booted.checksum))
    }

    fn resolve_remote(&self, config: &RepositoryConfig) -> Result<RevisionInfo, StoreError> {
        self.configure_remote(config)?;

        let refspec = format!("{}:{}", self.config.remote_name, self.config.branch);
        info!("Fetching commit metadata for {}", refspec);
        self.run(
            &[
                "pull".to_string(),
                self.repo_arg(),
                "--commit-metadata-only".to_string(),
                self.config.remote_name.clone(),
                self.config.branch.clone(),
            ],
            StoreError::Network,
        )?;

        let revision = self
            .run(&["rev-parse".to_string(), self.repo_arg(), refspec.clone()], StoreError::NotFound)?
            .trim()
            .to_string();
        if revision.is_empty() {
            return Err(StoreError::NotFound(refspec));
        }
        Ok(self.revision_info(&revision))
    }

    fn list_rollback_candidates(&self) -> Result<Vec<RevisionInfo>, StoreError> {
        let candidates = self
            .deployments()?
            .into_iter()
            .filter(|d| !d.booted)
            .filter(|d| !matches!(d.marker.as_deref(), Some("pending") | Some("staged")))
            .map(|d| self.revision_info(&d.checksum))
            .collect();
        Ok(candidates)
    }

    fn fetch(&self, revision: &str) -> Result<(), StoreError> {
        info!("Pulling tree {} from {}", revision, self.config.remote_name);
        self.run(
            &[
                "pull".to_string(),
                self.repo_arg(),
                self.config.remote_name.clone(),
                revision.to_string(),
            ],
            StoreError::Network,
        )
        .map(|_| ())
    }

    fn set_default(&self, revision: &str) -> Result<(), StoreError> {
        info!("Deploying {} as default boot target", revision);
        self.run(
            &[
                "admin".to_string(),
                "deploy".to_string(),
                self.sysroot_arg(),
                "--retain".to_string(),
                revision.to_string(),
            ],
            StoreError::Io,
        )
        .map(|_| ())
    }

    fn cached_tree_path(&self, revision: &str) -> Option<PathBuf> {
        if revision.len() < 3 || !revision.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        let repo = self.config.repo_path();
        // A metadata-only pull leaves a partial marker next to the commit object
        let partial = repo.join("state").join(format!("{}.commitpartial", revision));
        if verify_path_exists(&partial) {
            return None;
        }
        Some(commit_object_path(&repo, revision))
    }
}

fn commit_object_path(repo: &Path, revision: &str) -> PathBuf {
    let (prefix, rest) = revision.split_at(2);
    repo.join("objects").join(prefix).join(format!("{}.commit", rest))
}
