use crate::domain::model::{CredentialRecord, VaultSnapshot};
use crate::domain::ports::{VaultLocator, VaultSource};
use crate::utils::error::{DiffError, Result};
use keepass::db::Group;
use keepass::{Database, DatabaseKey};
use std::fs::File;
use std::io::BufReader;

/// Opens and decrypts `.kdbx` files and flattens their entry tree.
#[derive(Debug, Clone, Default)]
pub struct KdbxVaultReader;

impl KdbxVaultReader {
    pub fn new() -> Self {
        Self
    }

    fn build_key(locator: &VaultLocator) -> Result<DatabaseKey> {
        if locator.password.is_none() && locator.keyfile.is_none() {
            return Err(DiffError::MissingConfigError {
                field: format!("password or keyfile for '{}'", locator.path),
            });
        }

        let mut key = DatabaseKey::new();
        if let Some(password) = &locator.password {
            key = key.with_password(password);
        }
        if let Some(keyfile) = &locator.keyfile {
            let mut reader = BufReader::new(File::open(keyfile)?);
            key = key.with_keyfile(&mut reader)?;
        }
        Ok(key)
    }
}

fn collect_records(group: &Group, path: &str, out: &mut Vec<CredentialRecord>) {
    for entry in group.entries() {
        out.push(CredentialRecord {
            group_path: path.to_string(),
            title: entry.get_title().unwrap_or_default().to_string(),
            username: entry.get_username().unwrap_or_default().to_string(),
            url: entry.get_url().unwrap_or_default().to_string(),
            password: entry.get_password().unwrap_or_default().to_string(),
        });
    }

    for child in group.groups() {
        let child_path = if path.is_empty() {
            child.name.clone()
        } else {
            format!("{}/{}", path, child.name)
        };
        collect_records(child, &child_path, out);
    }
}

fn count_entries(group: &Group) -> usize {
    group.entries().len()
        + group
            .groups()
            .iter()
            .map(|g| count_entries(g))
            .sum::<usize>()
}

impl VaultSource for KdbxVaultReader {
    async fn load(&self, locator: &VaultLocator) -> Result<VaultSnapshot> {
        tracing::debug!("Opening database: {}", locator.path);

        let key = Self::build_key(locator)?;
        let file = File::open(&locator.path)?;
        let db = Database::open(&mut BufReader::new(file), key)?;

        let mut records = Vec::new();
        collect_records(&db.root, "", &mut records);
        let entry_count = count_entries(&db.root);

        tracing::debug!("Loaded {} entries from {}", entry_count, locator.path);

        Ok(VaultSnapshot {
            label: locator.display_label(),
            records,
            entry_count,
        })
    }
}
