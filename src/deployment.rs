use crate::contract::Address;
use chrono::{
    DateTime,
    FixedOffset,
    Utc,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};

pub const DEPLOYMENTS_ROOT: &str = ".deployments";
const DEPLOYMENTS_FILE: &str = "deployments.json";

/// `.deployments/<network>/deployments.json`
pub fn default_path(network_dir: &str) -> PathBuf {
    Path::new(DEPLOYMENTS_ROOT)
        .join(network_dir)
        .join(DEPLOYMENTS_FILE)
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeploymentRecord {
    pub chain_id: String,
    pub platform_address: String,
    pub deployed_at: String,
}

impl DeploymentRecord {
    pub fn new(chain_id: impl Into<String>, platform_address: Address) -> Self {
        Self {
            chain_id: chain_id.into(),
            platform_address: platform_address.to_string(),
            deployed_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn address(&self) -> Result<Address> {
        self.platform_address.parse().wrap_err_with(|| {
            format!(
                "Invalid platform address in deployment record: {}",
                self.platform_address
            )
        })
    }

    fn deployed_at(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.deployed_at).ok()
    }
}

/// Read-only view of the deployment records for one network.
#[derive(Debug)]
pub struct DeploymentStore {
    path: PathBuf,
}

impl DeploymentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A missing file means nothing has been deployed yet.
    pub fn load(&self) -> Result<Vec<DeploymentRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        read_records(&self.path)
    }

    /// Most recent record for `chain_id`. Records with an unreadable
    /// timestamp rank below dated ones; ties go to the later entry.
    pub fn latest_for(&self, chain_id: &str) -> Result<Option<DeploymentRecord>> {
        let latest = self
            .load()?
            .into_iter()
            .filter(|r| r.chain_id.eq_ignore_ascii_case(chain_id))
            .max_by_key(|r| r.deployed_at());
        Ok(latest)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_records(path: impl AsRef<Path>) -> Result<Vec<DeploymentRecord>> {
    let path = path.as_ref();
    let data = fs::read(path).wrap_err_with(|| {
        format!("Failed to read deployment records at {}", path.display())
    })?;
    if data.is_empty() {
        return Ok(Vec::new());
    }
    let records = serde_json::from_slice::<Vec<DeploymentRecord>>(&data)
        .wrap_err("Failed to parse deployment records JSON")?;
    Ok(records)
}
