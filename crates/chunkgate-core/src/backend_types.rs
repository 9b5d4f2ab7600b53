use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Object storage backend types
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "s3" => Ok(StorageBackend::S3),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::S3 => write!(f, "s3"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

/// Where per-file encryption keys are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretStoreBackend {
    Vault,
    Memory,
}

impl FromStr for SecretStoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "vault" => Ok(SecretStoreBackend::Vault),
            "memory" => Ok(SecretStoreBackend::Memory),
            _ => Err(anyhow::anyhow!("Invalid secret store backend: {}", s)),
        }
    }
}

impl Display for SecretStoreBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SecretStoreBackend::Vault => write!(f, "vault"),
            SecretStoreBackend::Memory => write!(f, "memory"),
        }
    }
}

/// Metadata service backend types
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilesApiBackend {
    Http,
    Memory,
}

impl FromStr for FilesApiBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" => Ok(FilesApiBackend::Http),
            "memory" => Ok(FilesApiBackend::Memory),
            _ => Err(anyhow::anyhow!("Invalid files API backend: {}", s)),
        }
    }
}

impl Display for FilesApiBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FilesApiBackend::Http => write!(f, "http"),
            FilesApiBackend::Memory => write!(f, "memory"),
        }
    }
}

/// Source of the final content digest once every part has been stored.
///
/// `Part` trusts the digest returned with the completing part; `Head` asks the
/// object store again after assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionDigest {
    Part,
    Head,
}

impl FromStr for CompletionDigest {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "part" => Ok(CompletionDigest::Part),
            "head" => Ok(CompletionDigest::Head),
            _ => Err(anyhow::anyhow!("Invalid completion digest mode: {}", s)),
        }
    }
}

impl Display for CompletionDigest {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            CompletionDigest::Part => write!(f, "part"),
            CompletionDigest::Head => write!(f, "head"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parsing_is_case_insensitive() {
        assert_eq!("S3".parse::<StorageBackend>().unwrap(), StorageBackend::S3);
        assert_eq!(
            "Memory".parse::<SecretStoreBackend>().unwrap(),
            SecretStoreBackend::Memory
        );
        assert_eq!("HTTP".parse::<FilesApiBackend>().unwrap(), FilesApiBackend::Http);
        assert_eq!("head".parse::<CompletionDigest>().unwrap(), CompletionDigest::Head);
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        assert!("nfs".parse::<StorageBackend>().is_err());
        assert!("etcd".parse::<SecretStoreBackend>().is_err());
        assert!("grpc".parse::<FilesApiBackend>().is_err());
        assert!("md5".parse::<CompletionDigest>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for backend in [StorageBackend::S3, StorageBackend::Memory] {
            assert_eq!(backend.to_string().parse::<StorageBackend>().unwrap(), backend);
        }
    }
}
