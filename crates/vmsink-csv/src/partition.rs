//! Block-number partitioning.
//!
//! Each sample lands in `<root>/<block_folder>/metrics-<file_id>.csv`, where
//! `block_folder` and `file_id` are the block number rounded down to the
//! folder and file granularity. The router is stateless; detecting that a
//! sample crossed into a new partition is up to the caller.

use std::fs;
use std::io::ErrorKind;
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use tracing::debug;
use vmsink_common::format::{file_name, folder_name};
use vmsink_common::BlockNum;

use crate::error::CsvError;

/// Target location of one sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub block_folder: u64,
    pub file_id: u64,
    pub dir: PathBuf,
    pub file: PathBuf,
}

/// Maps block numbers onto partition paths below a root directory.
///
/// `file_granular <= folder_granular` keeps files nested in their folder's
/// block range; other combinations still produce valid paths.
#[derive(Debug, Clone)]
pub struct PartitionRouter {
    root: PathBuf,
    folder_granular: NonZeroU64,
    file_granular: NonZeroU64,
}

impl PartitionRouter {
    pub fn new(
        root: impl Into<PathBuf>,
        folder_granular: u64,
        file_granular: u64,
    ) -> Result<Self, CsvError> {
        let folder_granular =
            NonZeroU64::new(folder_granular).ok_or(CsvError::ZeroGranularity { name: "folder" })?;
        let file_granular =
            NonZeroU64::new(file_granular).ok_or(CsvError::ZeroGranularity { name: "file" })?;
        Ok(Self::with_granularity(root, folder_granular, file_granular))
    }

    pub fn with_granularity(
        root: impl Into<PathBuf>,
        folder_granular: NonZeroU64,
        file_granular: NonZeroU64,
    ) -> Self {
        Self {
            root: root.into(),
            folder_granular,
            file_granular,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn route(&self, block_num: BlockNum) -> Partition {
        let block_folder = floor_to(block_num.0, self.folder_granular);
        let file_id = floor_to(block_num.0, self.file_granular);
        let dir = self.root.join(folder_name(block_folder));
        let file = dir.join(file_name(file_id));
        Partition {
            block_folder,
            file_id,
            dir,
            file,
        }
    }
}

fn floor_to(value: u64, granular: NonZeroU64) -> u64 {
    value / granular.get() * granular.get()
}

/// One-off routing. Fails when either granularity is zero.
pub fn route(
    root: impl Into<PathBuf>,
    block_num: BlockNum,
    folder_granular: u64,
    file_granular: u64,
) -> Result<Partition, CsvError> {
    Ok(PartitionRouter::new(root, folder_granular, file_granular)?.route(block_num))
}

/// Make sure `path` exists and is a directory.
///
/// Existing directories are accepted as-is; an existing entry of any other
/// kind is a [`CsvError::NotADirectory`] conflict.
pub fn ensure_dir(path: &Path) -> Result<(), CsvError> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(CsvError::NotADirectory {
            path: path.to_path_buf(),
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "creating partition directory");
            fs::create_dir_all(path).map_err(|source| CsvError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
        Err(source) => Err(CsvError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
