use std::collections::HashMap;

/// Recognized metadata column roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataColumn {
    SampleId,
    Group,
    Animal,
    Replicate,
    Tissue,
    Well,
    Time,
}

impl MetadataColumn {
    /// Canonical output column name.
    pub fn name(self) -> &'static str {
        match self {
            Self::SampleId => "SampleID",
            Self::Group => "Group",
            Self::Animal => "Animal",
            Self::Replicate => "Replicate",
            Self::Tissue => "Tissue",
            Self::Well => "Well",
            Self::Time => "Time",
        }
    }

    /// Accepted header spellings, matched case-insensitively.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::SampleId => &["SampleID", "Sample", "Sample ID"],
            Self::Group => &["Group"],
            Self::Animal => &["Animal"],
            Self::Replicate => &["Replicate", "Rep"],
            Self::Tissue => &["Tissue"],
            Self::Well => &["Well"],
            Self::Time => &["Time", "Timepoint"],
        }
    }

    pub const ALL: [MetadataColumn; 7] = [
        Self::SampleId,
        Self::Group,
        Self::Animal,
        Self::Replicate,
        Self::Tissue,
        Self::Well,
        Self::Time,
    ];
}

/// Case-insensitive name lookup preserving the first spelling seen.
#[derive(Debug, Clone)]
pub struct CaseInsensitiveSet {
    map: HashMap<String, String>,
}

impl CaseInsensitiveSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = HashMap::new();
        for name in names {
            let name = name.as_ref();
            let key = name.trim().to_ascii_uppercase();
            map.entry(key).or_insert_with(|| name.to_string());
        }
        Self { map }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.map
            .get(&name.trim().to_ascii_uppercase())
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(&name.trim().to_ascii_uppercase())
    }

    /// Original spelling of the first alias of `column` present in the set.
    pub fn find_column(&self, column: MetadataColumn) -> Option<&str> {
        column.aliases().iter().find_map(|alias| self.get(alias))
    }
}

/// Whether a header names one of the recognized metadata columns.
pub fn is_metadata_column(name: &str) -> bool {
    let trimmed = name.trim();
    MetadataColumn::ALL.iter().any(|column| {
        column
            .aliases()
            .iter()
            .any(|alias| alias.eq_ignore_ascii_case(trimmed))
    })
}
