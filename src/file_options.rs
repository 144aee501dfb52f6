use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use stacked_errors::{bail_locationless, Result, StackableErr};
use tokio::{
    fs::{File, OpenOptions},
    io::{AsyncReadExt, AsyncWriteExt},
};

use crate::{acquire_dir_path, acquire_file_path};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WriteOptions {
    /// creates the file if nonexistent
    pub create: bool,
    /// truncation by default, append otherwise
    pub append: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum ReadOrWrite {
    Read,
    Write(WriteOptions),
}

/// A wrapper combining capabilities from `tokio::fs::{OpenOptions, File}` with
/// a lot of opinionated defaults and `close_file`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOptions {
    pub path: PathBuf,
    pub options: ReadOrWrite,
}

impl FileOptions {
    pub fn read(file_path: impl AsRef<Path>) -> Self {
        Self {
            path: file_path.as_ref().to_owned(),
            options: ReadOrWrite::Read,
        }
    }

    /// Sets `create` to true and `append` to false by default
    pub fn write(file_path: impl AsRef<Path>) -> Self {
        Self {
            path: file_path.as_ref().to_owned(),
            options: ReadOrWrite::Write(WriteOptions {
                create: true,
                append: false,
            }),
        }
    }

    pub fn create(mut self, create: bool) -> Result<Self> {
        if let ReadOrWrite::Write(ref mut options) = self.options {
            options.create = create;
            Ok(self)
        } else {
            bail_locationless!("{self:?}.create() -> options are readonly")
        }
    }

    pub fn append(mut self, append: bool) -> Result<Self> {
        if let ReadOrWrite::Write(ref mut options) = self.options {
            options.append = append;
            Ok(self)
        } else {
            bail_locationless!("{self:?}.append() -> options are readonly")
        }
    }

    /// Checks only for existence of the directory and file (allowing the file
    /// to not exist if `create` is true). Returns the combined path.
    pub async fn preacquire(&self) -> Result<PathBuf> {
        let dir = self
            .path
            .parent()
            .stack_err("FileOptions::preacquire() -> empty path")?;
        let mut path = acquire_dir_path(dir)
            .await
            .stack_err_with(|| format!("{self:?}.preacquire() could not acquire directory"))?;
        // we do this always for normalization purposes
        let file_name = self.path.file_name().stack_err_with(|| {
            format!("{self:?}.preacquire() could not acquire file name, was only a directory input?")
        })?;
        path.push(file_name);
        match self.options {
            ReadOrWrite::Read => (),
            ReadOrWrite::Write(WriteOptions { create, .. }) => {
                if create {
                    return Ok(path)
                }
            }
        }
        acquire_file_path(path).await.stack_err_with(|| {
            format!("{self:?}.preacquire() could not acquire path to combined directory and file \
                     name")
        })
    }

    pub async fn acquire_file(&self) -> Result<File> {
        let path = self
            .preacquire()
            .await
            .stack_err("FileOptions::acquire_file()")?;
        Ok(match self.options {
            ReadOrWrite::Read => OpenOptions::new()
                .read(true)
                .open(path)
                .await
                .stack_err_with(|| format!("{self:?}.acquire_file()"))?,
            ReadOrWrite::Write(WriteOptions { create, append }) => OpenOptions::new()
                .write(true)
                .create(create)
                .truncate(!append)
                .append(append)
                .open(path)
                .await
                .stack_err_with(|| format!("{self:?}.acquire_file()"))?,
        })
    }

    pub async fn read_to_string(file_path: impl AsRef<Path>) -> Result<String> {
        let mut file = Self::read(file_path)
            .acquire_file()
            .await
            .stack_err("FileOptions::read_to_string")?;
        let mut s = String::new();
        file.read_to_string(&mut s).await.stack()?;
        Ok(s)
    }

    /// Overwrites the file at `file_path` wholesale with `s`, creating it if
    /// absent and truncating it if present.
    pub async fn write_str(file_path: impl AsRef<Path>, s: &str) -> Result<()> {
        let mut file = Self::write(file_path)
            .acquire_file()
            .await
            .stack_err("FileOptions::write_str")?;
        file.write_all(s.as_bytes()).await.stack()?;
        close_file(file).await.stack()?;
        Ok(())
    }
}

/// If synchronization with other programs is required, this function makes
/// sure changes are flushed and `sync_all` is called to make sure the data has
/// actually been written to the filesystem.
pub async fn close_file(mut file: File) -> Result<()> {
    file.flush().await.stack()?;
    file.sync_all().await.stack()?;
    Ok(())
}
