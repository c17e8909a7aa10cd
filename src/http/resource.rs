//! Static resource lookup.
//!
//! The router only needs a key → bytes lookup, so the filesystem sits behind
//! [`ResourceStore`]. [`FsStore`] serves a directory; [`MemoryStore`] serves
//! a fixed map and is handy for embedding and tests.
//!
//! Keys are joined onto the root as-is. A key such as `../secret` therefore
//! resolves outside the root unless [`FsStore::confine_to_root`] is enabled.

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;

use crate::config::StaticConfig;
use crate::error::ResourceError;

pub trait ResourceStore: Send + Sync + 'static {
    /// Returns the full contents stored under `key`.
    fn fetch(&self, key: &str) -> impl Future<Output = Result<Vec<u8>, ResourceError>> + Send;
}

/// Serves files below a root directory.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
    confine: bool,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            confine: false,
        }
    }

    pub fn from_config(cfg: &StaticConfig) -> Self {
        Self::new(cfg.root.clone()).confine_to_root(cfg.confine_to_root)
    }

    /// Refuse keys containing `..`, a root, or a drive prefix.
    pub fn confine_to_root(mut self, confine: bool) -> Self {
        self.confine = confine;
        self
    }

    /// Path the key resolves to. No sanitisation happens here.
    pub fn resolve(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn escapes_root(key: &str) -> bool {
        Path::new(key).components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        })
    }
}

impl ResourceStore for FsStore {
    fn fetch(&self, key: &str) -> impl Future<Output = Result<Vec<u8>, ResourceError>> + Send {
        let key = key.to_string();
        let rejected = self.confine && Self::escapes_root(&key);
        let path = self.resolve(&key);

        async move {
            if rejected {
                return Err(ResourceError::Unavailable {
                    key,
                    source: io::Error::new(
                        io::ErrorKind::PermissionDenied,
                        "target escapes the resource root",
                    ),
                });
            }

            match tokio::fs::read(&path).await {
                Ok(contents) => Ok(contents),
                // Paths the OS cannot represent, e.g. an embedded NUL
                Err(e) if e.kind() == io::ErrorKind::InvalidInput => Err(ResourceError::Internal {
                    key,
                    reason: e.to_string(),
                }),
                Err(source) => Err(ResourceError::Unavailable { key, source }),
            }
        }
    }
}

/// In-memory key → bytes map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Bytes>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, contents: impl Into<Bytes>) {
        self.entries.insert(key.into(), contents.into());
    }

    pub fn with(mut self, key: impl Into<String>, contents: impl Into<Bytes>) -> Self {
        self.insert(key, contents);
        self
    }
}

impl ResourceStore for MemoryStore {
    fn fetch(&self, key: &str) -> impl Future<Output = Result<Vec<u8>, ResourceError>> + Send {
        let found = self.entries.get(key).map(|b| b.to_vec());
        let key = key.to_string();

        async move {
            found.ok_or_else(|| ResourceError::Unavailable {
                key,
                source: io::ErrorKind::NotFound.into(),
            })
        }
    }
}
