//! Provider account registration records.

pub mod metadata;
pub mod records;
pub mod storage;

pub use metadata::{ComputeMetadata, InstanceMetadata};
pub use records::{
    build_settings, AccountRecord, ProviderAccount, SettingValue, DEFAULT_ACCOUNT_NAME,
    STORAGE_CONTAINER,
};
pub use storage::{
    derive_storage_account_name, sanitize_prefix, storage_account_name, StorageBackendSection,
    STORAGE_NAME_MAX_LEN, STORAGE_PREFIX_MAX_LEN, STORAGE_SUFFIX_LEN,
};
