use crate::domain::model::{CredentialRecord, DiffKind, Difference, VaultSnapshot};
use std::collections::HashMap;

/// Placeholder key for entries without a title.
pub const NO_TITLE: &str = "(no title)";

/// Index records by title. Later records win on duplicate titles, so entries
/// deeper in the group tree shadow same-titled entries above them.
fn index_by_title(records: &[CredentialRecord]) -> HashMap<&str, &CredentialRecord> {
    let mut index = HashMap::new();
    for record in records {
        let title = if record.title.is_empty() {
            NO_TITLE
        } else {
            record.title.as_str()
        };
        index.insert(title, record);
    }
    index
}

/// Compare two snapshots entry by entry, keyed by title.
///
/// An entry present in both databases is checked for a username mismatch
/// first; only when the usernames agree is the password compared. The result
/// is sorted by title (then kind) so the same inputs always produce the same
/// report.
pub fn compare(first: &VaultSnapshot, second: &VaultSnapshot) -> Vec<Difference> {
    let index1 = index_by_title(&first.records);
    let index2 = index_by_title(&second.records);

    let mut differences = Vec::new();

    for (title, record1) in &index1 {
        match index2.get(title) {
            Some(record2) => {
                if record1.username != record2.username {
                    differences.push(Difference {
                        title: (*title).to_string(),
                        username: record1.username.clone(),
                        kind: DiffKind::UsernameDiffers {
                            first: record1.username.clone(),
                            second: record2.username.clone(),
                        },
                    });
                } else if record1.password != record2.password {
                    differences.push(Difference {
                        title: (*title).to_string(),
                        username: record1.username.clone(),
                        kind: DiffKind::PasswordDiffers,
                    });
                }
            }
            None => {
                differences.push(Difference {
                    title: (*title).to_string(),
                    username: record1.username.clone(),
                    kind: DiffKind::OnlyInFirst,
                });
            }
        }
    }

    for (title, record2) in &index2 {
        if !index1.contains_key(*title) {
            differences.push(Difference {
                title: (*title).to_string(),
                username: record2.username.clone(),
                kind: DiffKind::OnlyInSecond,
            });
        }
    }

    differences.sort_by(|a, b| {
        a.title
            .cmp(&b.title)
            .then_with(|| a.kind.label().cmp(b.kind.label()))
    });
    differences
}

/// The subset of differences where the entry exists in both databases.
pub fn conflicts(differences: &[Difference]) -> Vec<Difference> {
    differences
        .iter()
        .filter(|diff| {
            matches!(
                diff.kind,
                DiffKind::UsernameDiffers { .. } | DiffKind::PasswordDiffers
            )
        })
        .cloned()
        .collect()
}
