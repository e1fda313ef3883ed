//! Keyring: an ordered, timestamped set of symmetric keys, persisted as
//! a single versioned binary file (§4.3, §6.1).

use std::fs;
use std::io;
use std::path::Path;

use rand_core::RngCore;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::codec;
use crate::error::{err, Error, ErrorKind, Result};
use crate::key::{Key, KeyType};

const FILE_FORMAT_VERSION: u32 = 1;

/// Direction a key is being selected for; changes `best_key`'s
/// selection rule (§4.3.1).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyUsage {
    Encrypt,
    Decrypt,
}

/// One entry in a keyring: a key plus the timestamps that govern when
/// it becomes eligible for selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyringEntry {
    pub creation_time: u64,
    pub valid_after: u64,
    pub key: Key,
}

/// An ordered sequence of keyring entries. Insertion order is
/// preserved; no deduplication is performed.
#[derive(Clone, Debug, Default)]
pub struct Keyring {
    entries: Vec<KeyringEntry>,
}

/// Outcome of an `auto_update` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AutoUpdateOutcome {
    /// The file did not exist and a fresh keyring was created.
    Create,
    /// The file existed and a new key was appended due to aging.
    Update,
    /// No change was necessary.
    None,
}

impl Keyring {
    /// Create an empty keyring with a suggested initial capacity
    /// (clamped to at least 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity.max(1)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[KeyringEntry] {
        &self.entries
    }

    /// Append a copy of `key` with the given timestamps. A zero
    /// timestamp is replaced with the clock's current time.
    pub fn add(&mut self, creation: u64, valid_after: u64, key: Key, clock: &dyn Clock) {
        let now = clock.now();
        let creation_time = if creation == 0 { now } else { creation };
        let valid_after = if valid_after == 0 { now } else { valid_after };
        info!(
            fingerprint = %hex::encode(key.fingerprint()),
            creation_time,
            valid_after,
            "keyring: added entry"
        );
        self.entries.push(KeyringEntry {
            creation_time,
            valid_after,
            key,
        });
    }

    /// Remove the entry at `index`, shifting later entries left.
    pub fn remove(&mut self, index: usize) -> Result<()> {
        if index >= self.entries.len() {
            return Err(err!(
                ErrorKind::NotFound,
                "keyring index {index} out of range"
            ));
        }
        self.entries.remove(index);
        Ok(())
    }

    /// Select the best key for the given usage and hint, per §4.3.1/§4.3.2.
    pub fn best_key(&self, usage: KeyUsage, hint: u64, clock: &dyn Clock) -> Result<&Key> {
        let now = clock.now();
        let mut best: Option<&KeyringEntry> = None;

        for entry in &self.entries {
            if entry.valid_after > now {
                continue;
            }
            let candidate = match usage {
                KeyUsage::Encrypt => true,
                KeyUsage::Decrypt => entry.valid_after <= hint,
            };
            if !candidate {
                continue;
            }
            // Non-strict tie-break: a later entry with an equal
            // `valid_after` replaces the current best, so insertion
            // order decides ties in favor of the most recently added
            // entry for both usages.
            let replace = match best {
                None => true,
                Some(b) => entry.valid_after >= b.valid_after,
            };
            if replace {
                best = Some(entry);
            }
        }

        best.map(|e| &e.key).ok_or_else(|| {
            err!(
                ErrorKind::NotFound,
                "no keyring entry matches usage {usage:?} hint {hint}"
            )
        })
    }

    /// Serialize the keyring to the §6.1 binary attribute stream.
    pub fn encode(&self) -> Vec<u8> {
        let mut attrs: Vec<(String, Vec<u8>)> = Vec::new();
        attrs.push(("v".to_string(), codec::encode_uint(FILE_FORMAT_VERSION)));
        attrs.push(("n".to_string(), codec::encode_uint(self.entries.len() as u32)));
        for (i, entry) in self.entries.iter().enumerate() {
            attrs.push((format!("ct{i}"), codec::encode_time(entry.creation_time)));
            attrs.push((format!("va{i}"), codec::encode_time(entry.valid_after)));
            attrs.push((format!("kt{i}"), codec::encode_uint(entry.key.key_type().to_wire())));
            attrs.push((format!("kd{i}"), entry.key.material().to_vec()));
        }
        let refs: Vec<(&str, &[u8])> = attrs.iter().map(|(n, v)| (n.as_str(), v.as_slice())).collect();
        codec::encode(&refs)
    }

    /// Parse the §6.1 binary attribute stream into a keyring. Aborts
    /// the whole decode (no partial keyring) on any corrupt entry.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let attrs = codec::decode(data)?;

        let version = codec::parse_uint(codec::require(&attrs, "v")?, "v")?;
        if version != FILE_FORMAT_VERSION {
            return Err(err!(
                ErrorKind::FileVersion,
                "unsupported keyring file version {version}"
            ));
        }

        let count = codec::parse_uint(codec::require(&attrs, "n")?, "n")?;
        let mut entries = Vec::with_capacity(count as usize);
        for i in 0..count {
            let ct = codec::parse_time(codec::require(&attrs, &format!("ct{i}"))?, "ct")?;
            let va = codec::parse_time(codec::require(&attrs, &format!("va{i}"))?, "va")?;
            let kt = codec::parse_uint(codec::require(&attrs, &format!("kt{i}"))?, "kt")?;
            let kd = codec::require(&attrs, &format!("kd{i}"))?;

            let key_type = KeyType::from_wire(kt)?;
            let key = Key::new(key_type, kd.to_vec())?;
            entries.push(KeyringEntry {
                creation_time: ct,
                valid_after: va,
                key,
            });
        }

        Ok(Self { entries })
    }

    /// Read and decode a keyring from `path`.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| map_read_error(e, path))?;
        Self::decode(&data)
    }

    /// Atomically write the keyring to `path`: serialize to a
    /// randomized temporary file in the same directory, then rename
    /// onto the target. The temporary is removed on any failure after
    /// it is created.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));

        let (mut file, tmp_path) = create_temp_file(dir)
            .map_err(|e| err!(ErrorKind::FileOpenWrite, "cannot create temporary file in {}: {e}", dir.display()))?;

        let result = (|| -> Result<()> {
            use std::io::Write;
            let encoded = self.encode();
            file.write_all(&encoded)
                .map_err(|e| err!(ErrorKind::FileWrite, "writing {}: {e}", tmp_path.display()))?;
            file.sync_all()
                .map_err(|e| err!(ErrorKind::FileWrite, "syncing {}: {e}", tmp_path.display()))?;
            drop(file);
            fs::rename(&tmp_path, path)
                .map_err(|e| err!(ErrorKind::FileWrite, "renaming {} to {}: {e}", tmp_path.display(), path.display()))
        })();

        if result.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        result
    }

    /// Reconcile the keyring at `path` with the current time (§4.3.1):
    ///
    /// - If the file is absent and `create_if_missing`, write a fresh
    ///   keyring with one new random AES-128 key and report `Create`.
    /// - Otherwise, if the newest entry's `valid_after` is older than
    ///   `lifetime` seconds, append a new random AES-128 key, rewrite
    ///   the file, and report `Update`.
    /// - Otherwise report `None`.
    ///
    /// A rewrite failure during `Update` is reported in the returned
    /// write-status rather than discarding the in-memory keyring: the
    /// caller always gets the updated keyring back. A failure creating
    /// the file from scratch is a hard error, since there is nothing
    /// sensible to hand back in that case.
    pub fn auto_update(
        path: impl AsRef<Path>,
        create_if_missing: bool,
        lifetime: u64,
        clock: &dyn Clock,
    ) -> Result<(Self, AutoUpdateOutcome, Result<()>)> {
        let path = path.as_ref();
        match Self::read(path) {
            Ok(mut ring) => {
                if lifetime == 0 {
                    return Ok((ring, AutoUpdateOutcome::None, Ok(())));
                }
                let now = clock.now();
                let newest = ring.entries.iter().map(|e| e.valid_after).max().unwrap_or(0);
                if now.saturating_sub(newest) >= lifetime {
                    let key = Key::generate(KeyType::Aes, 16)?;
                    ring.add(now, now, key, clock);
                    let write_status = ring.write(path);
                    if let Err(e) = &write_status {
                        warn!(error = %e, "keyring: rotation succeeded in memory but rewrite failed");
                    }
                    Ok((ring, AutoUpdateOutcome::Update, write_status))
                } else {
                    Ok((ring, AutoUpdateOutcome::None, Ok(())))
                }
            }
            Err(e) if e.kind() == ErrorKind::FileNotFound && create_if_missing => {
                let now = clock.now();
                let mut ring = Self::new(1);
                let key = Key::generate(KeyType::Aes, 16)?;
                ring.add(now, now, key, clock);
                ring.write(path)?;
                Ok((ring, AutoUpdateOutcome::Create, Ok(())))
            }
            Err(e) => Err(e),
        }
    }
}

fn map_read_error(e: io::Error, path: &Path) -> Error {
    match e.kind() {
        io::ErrorKind::NotFound => err!(ErrorKind::FileNotFound, "{}: {e}", path.display()),
        io::ErrorKind::PermissionDenied => err!(ErrorKind::FileOpenRead, "{}: {e}", path.display()),
        _ => err!(ErrorKind::FileRead, "{}: {e}", path.display()),
    }
}

/// Create an exclusively-opened temporary file alongside the target
/// path, with a randomized suffix, matching the "write to
/// `<path>.XXXXXX`, then rename" pattern in §4.3.1.
fn create_temp_file(dir: &Path) -> io::Result<(fs::File, std::path::PathBuf)> {
    use std::fs::OpenOptions;

    for _ in 0..16 {
        let mut suffix = [0u8; 6];
        rand_core::OsRng
            .try_fill_bytes(&mut suffix)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let name = format!(".keyring-{}.tmp", hex::encode(suffix));
        let candidate = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(file) => return Ok((file, candidate)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }
    Err(io::Error::new(io::ErrorKind::AlreadyExists, "exhausted temp file name attempts"))
}
