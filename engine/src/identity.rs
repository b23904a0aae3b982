use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use solana_sdk::signature::{keypair_from_seed, Keypair, Signer};
use tracing::info;
use transfer_core::{constants::SECRET_KEY_ENTRY, ports::NetworkPort, FlowError};
use zeroize::Zeroizing;

use crate::funding::{ensure_minimum_balance, FundingPolicy};

const KEYPAIR_LEN: usize = 64;
const SEED_LEN: usize = 32;

pub struct LoadedIdentity {
    pub keypair: Keypair,
    /// True when this run generated and persisted the keypair.
    pub created: bool,
}

/// dotenv-style file holding `PRIVATE_KEY=[n,n,...]`, the 64 keypair bytes as a JSON array.
///
/// Once the entry exists it is the only identity this program uses.
pub struct SecretStore {
    path: PathBuf,
}

impl SecretStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored keypair, or `None` when the file or its entry is missing.
    pub fn read(&self) -> Result<Option<Keypair>, FlowError> {
        let entries = match dotenvy::from_path_iter(&self.path) {
            Ok(entries) => entries,
            Err(dotenvy::Error::Io(e)) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.read_error(e)),
        };

        for entry in entries {
            let (key, value) = match entry {
                Ok(pair) => pair,
                // Unquoted values with spaces, e.g. `[62, 167, ...]`, are not dotenv-parseable.
                Err(dotenvy::Error::LineParse(..)) => return self.scan_for_secret(),
                Err(e) => return Err(self.read_error(e)),
            };
            if key == SECRET_KEY_ENTRY {
                let value = Zeroizing::new(value);
                return parse_secret(&value).map(Some);
            }
        }
        Ok(None)
    }

    /// Line-by-line lookup of the secret entry, ignoring every other line.
    fn scan_for_secret(&self) -> Result<Option<Keypair>, FlowError> {
        let contents = Zeroizing::new(fs::read_to_string(&self.path).map_err(|source| {
            FlowError::PersistenceError {
                path: self.path.clone(),
                source,
            }
        })?);

        for line in contents.lines() {
            let line = line.trim();
            let line = line.strip_prefix("export ").map(str::trim_start).unwrap_or(line);
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            if key.trim() != SECRET_KEY_ENTRY {
                continue;
            }
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            return parse_secret(value).map(Some);
        }
        Ok(None)
    }

    /// Appends the keypair entry, creating the file (0600 on unix) if needed.
    pub fn persist(&self, keypair: &Keypair) -> Result<(), FlowError> {
        let bytes = Zeroizing::new(keypair.to_bytes().to_vec());
        let encoded = Zeroizing::new(
            serde_json::to_string(&*bytes).map_err(|e| FlowError::PersistenceError {
                path: self.path.clone(),
                source: e.into(),
            })?,
        );

        let has_content = fs::metadata(&self.path).map(|m| m.len() > 0).unwrap_or(false);
        let line = Zeroizing::new(format!(
            "{}{}={}\n",
            if has_content { "\n" } else { "" },
            SECRET_KEY_ENTRY,
            encoded.as_str()
        ));

        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        options
            .open(&self.path)
            .and_then(|mut file| {
                file.write_all(line.as_bytes())?;
                file.sync_all()
            })
            .map_err(|source| FlowError::PersistenceError {
                path: self.path.clone(),
                source,
            })
    }

    /// Loads the stored keypair, or generates and persists a new one.
    pub fn load_or_create(&self) -> Result<LoadedIdentity, FlowError> {
        if let Some(keypair) = self.read()? {
            info!("🔑 Loaded identity {} from {}", keypair.pubkey(), self.path.display());
            return Ok(LoadedIdentity {
                keypair,
                created: false,
            });
        }

        info!("📝 No identity in {}, creating one", self.path.display());
        let keypair = Keypair::new();
        self.persist(&keypair)?;
        Ok(LoadedIdentity {
            keypair,
            created: true,
        })
    }

    fn read_error(&self, err: dotenvy::Error) -> FlowError {
        match err {
            dotenvy::Error::Io(source) => FlowError::PersistenceError {
                path: self.path.clone(),
                source,
            },
            other => FlowError::CorruptIdentity(format!("{}: {}", self.path.display(), other)),
        }
    }
}

/// Rebuilds the keypair from its JSON byte array and checks the public half.
fn parse_secret(value: &str) -> Result<Keypair, FlowError> {
    let bytes: Zeroizing<Vec<u8>> = Zeroizing::new(
        serde_json::from_str(value.trim())
            .map_err(|e| FlowError::CorruptIdentity(format!("not a JSON byte array: {}", e)))?,
    );

    if bytes.len() != KEYPAIR_LEN {
        return Err(FlowError::CorruptIdentity(format!(
            "expected {} bytes, found {}",
            KEYPAIR_LEN,
            bytes.len()
        )));
    }

    let keypair = keypair_from_seed(&bytes[..SEED_LEN])
        .map_err(|e| FlowError::CorruptIdentity(format!("invalid secret key: {}", e)))?;

    if keypair.pubkey().to_bytes()[..] != bytes[SEED_LEN..] {
        return Err(FlowError::CorruptIdentity(
            "public key does not match secret key".into(),
        ));
    }
    Ok(keypair)
}

/// Loads or creates the payer identity, then makes sure it is funded.
pub async fn load_or_create_identity(
    store: &SecretStore,
    network: &dyn NetworkPort,
    policy: &FundingPolicy,
) -> Result<LoadedIdentity, FlowError> {
    let identity = store.load_or_create()?;
    ensure_minimum_balance(network, &identity.keypair.pubkey(), policy).await?;
    Ok(identity)
}
