use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// A signing identity built from one line of the key file.
#[derive(Debug)]
pub struct Account {
    secret: SecretString,
    signer: PrivateKeySigner,
}

impl Account {
    pub fn from_secret(secret: SecretString) -> Result<Self> {
        let signer = PrivateKeySigner::from_str(secret.expose_secret().trim())
            .map_err(|e| anyhow::anyhow!("Invalid private key: {}", e))?;
        Ok(Self { secret, signer })
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }

    pub fn secret(&self) -> &SecretString {
        &self.secret
    }
}

/// Reads one secret per line, creating an empty file when it is missing.
pub fn read_secrets(path: &Path) -> Result<Vec<SecretString>> {
    ensure_file(path)?;

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| SecretString::new(line.to_string()))
        .collect())
}

fn ensure_file(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.exists() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            info!("directory created: {}", dir.display());
        }
    }
    fs::write(path, "").with_context(|| format!("Failed to create {}", path.display()))?;
    info!("file created: {}", path.display());
    Ok(())
}

/// Append-only list of secrets whose run did not finish.
#[derive(Debug, Clone)]
pub struct FailureLog {
    path: PathBuf,
}

impl FailureLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self, secret: &SecretString) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        writeln!(file, "{}", secret.expose_secret())
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}
