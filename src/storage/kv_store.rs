use std::{
    io::{self, ErrorKind},
    ops::Deref,
    path::{Path, PathBuf},
};

use anyhow::Result;
use async_trait::async_trait;
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};
use tracing::debug;

#[cfg(test)]
use mockall::automock;

/// Interface for abstracting the persistent key-value storage.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value, or `None` if the key was never written.
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Replaces the stored value of `key`.
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;
}

#[async_trait]
impl<T> KeyValueStore for T
where
    T: Deref + Send + Sync,
    T::Target: KeyValueStore,
{
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.deref().get_item(key).await
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.deref().set_item(key, value).await
    }
}

/// The main realization of [KeyValueStore]. Every key lives in its own file, which is locked
/// while it is read or written so that a one-shot command and a running session don't observe
/// half written values.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: PathBuf) -> Result<Self, io::Error> {
        std::fs::create_dir_all(&dir)?;

        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key_to_file_name(key))
    }
}

/// Keys contain characters like `:` that aren't allowed in file names everywhere.
pub fn key_to_file_name(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

async fn read_value(path: &Path) -> Result<Option<String>, io::Error> {
    let mut file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    file.lock_shared()?;
    let mut value = String::new();
    let result = file.read_to_string(&mut value).await;
    file.unlock_async().await?;
    result?;
    Ok(Some(value))
}

async fn write_locked(file: &mut File, value: &str) -> Result<(), io::Error> {
    file.set_len(0).await?;
    file.rewind().await?;
    file.write_all(value.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        debug!("Reading {key} from {path:?}");
        Ok(read_value(&path).await?)
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        debug!("Writing {key} into {path:?}");
        let mut file = File::options()
            .write(true)
            .create(true)
            .read(true)
            .truncate(false)
            .open(path)
            .await?;

        // Truncation happens under the lock, opening with truncate would race with readers.
        file.lock_exclusive()?;
        let result = write_locked(&mut file, value).await;
        file.unlock_async().await?;
        Ok(result?)
    }
}
