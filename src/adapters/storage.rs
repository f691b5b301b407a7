//! Filesystem-backed document store.
//!
//! Implements [`DocumentStore`] on top of a directory.  On ESP-IDF the
//! directory is the SPIFFS mount point (`/spiffs`); on the host it is any
//! directory, which keeps the adapter testable.
//!
//! Document names are rooted paths (`/config.json`) resolved under the
//! store's root.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::warn;

use crate::app::ports::{DocumentStore, StorageError};

/// SPIFFS mount point on the device.
pub const SPIFFS_BASE: &str = "/spiffs";

pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name.trim_start_matches('/'))
    }
}

fn map_io(e: &std::io::Error) -> StorageError {
    match e.kind() {
        ErrorKind::NotFound => StorageError::NotFound,
        _ => StorageError::IoError,
    }
}

impl DocumentStore for FsDocumentStore {
    fn read_document(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        std::fs::read(self.path_of(name)).map_err(|e| map_io(&e))
    }

    fn write_document(&mut self, name: &str, data: &[u8]) -> Result<(), StorageError> {
        std::fs::write(self.path_of(name), data).map_err(|e| {
            warn!("Storage: write of {} failed: {}", name, e);
            map_io(&e)
        })
    }
}

/// Mount the SPIFFS data partition at [`SPIFFS_BASE`], formatting it if
/// the mount fails, and return a store rooted there.
#[cfg(target_os = "espidf")]
pub fn mount_spiffs() -> Result<FsDocumentStore, esp_idf_svc::sys::EspError> {
    use esp_idf_svc::sys::{esp, esp_vfs_spiffs_conf_t, esp_vfs_spiffs_register};

    let conf = esp_vfs_spiffs_conf_t {
        base_path: c"/spiffs".as_ptr(),
        partition_label: core::ptr::null(),
        max_files: 5,
        format_if_mount_failed: true,
    };
    esp!(unsafe { esp_vfs_spiffs_register(&conf) })?;
    log::info!("Storage: SPIFFS mounted at {}", SPIFFS_BASE);
    Ok(FsDocumentStore::new(SPIFFS_BASE))
}
