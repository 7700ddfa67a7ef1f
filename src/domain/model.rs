use serde::{Deserialize, Serialize};

/// One flattened database entry. The password participates in comparison but
/// is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub group_path: String,
    pub title: String,
    pub username: String,
    pub url: String,
    #[serde(skip_serializing, default)]
    pub password: String,
}

/// An opened, decrypted database flattened into records.
#[derive(Debug, Clone)]
pub struct VaultSnapshot {
    pub label: String,
    pub records: Vec<CredentialRecord>,
    pub entry_count: usize,
}

/// The two snapshots handed from extract to transform.
#[derive(Debug, Clone)]
pub struct VaultPair {
    pub first: VaultSnapshot,
    pub second: VaultSnapshot,
}

/// How an entry differs between the two databases. `PasswordDiffers`
/// deliberately carries no values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum DiffKind {
    OnlyInFirst,
    OnlyInSecond,
    UsernameDiffers { first: String, second: String },
    PasswordDiffers,
}

impl DiffKind {
    pub fn label(&self) -> &'static str {
        match self {
            DiffKind::OnlyInFirst => "only_in_first",
            DiffKind::OnlyInSecond => "only_in_second",
            DiffKind::UsernameDiffers { .. } => "username_differs",
            DiffKind::PasswordDiffers => "password_differs",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Difference {
    pub title: String,
    pub username: String,
    #[serde(flatten)]
    pub kind: DiffKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareSummary {
    pub first_label: String,
    pub second_label: String,
    pub first_entries: usize,
    pub second_entries: usize,
    pub differences: usize,
    pub conflicts: usize,
    pub generated_at: String,
}

/// Transform output: everything the load stage needs to write reports.
#[derive(Debug, Clone)]
pub struct CompareReport {
    pub differences: Vec<Difference>,
    /// Entries present in both databases whose username or password diverge.
    pub conflicts: Vec<Difference>,
    pub summary: CompareSummary,
    pub csv_output: String,
    pub tsv_output: String,
}
