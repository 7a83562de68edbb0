//! Service catalog
//!
//! In-memory index of bookable tests, health packages and IV therapies,
//! loaded once at startup from a JSON document. Read-only after load;
//! operators refresh it by restarting the process.

mod score;

pub use score::partial_ratio;

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Default minimum similarity for search hits
pub const DEFAULT_SEARCH_THRESHOLD: u8 = 60;

/// Category of a bookable service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    Test,
    Package,
    IvTherapy,
}

impl ServiceCategory {
    /// Human-readable label used in replies
    pub fn label(&self) -> &'static str {
        match self {
            ServiceCategory::Test => "Individual Test",
            ServiceCategory::Package => "Health Package",
            ServiceCategory::IvTherapy => "IV Therapy",
        }
    }
}

/// A single bookable service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub name: String,
    pub price: f64,
    pub category: ServiceCategory,
    pub turnaround: Option<String>,
    #[serde(default)]
    pub recommended_for: Vec<String>,
}

/// A search result with its similarity score
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub record: ServiceRecord,
    pub score: u8,
}

/// Search hits grouped by category, each group sorted by descending score
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults {
    pub tests: Vec<SearchHit>,
    pub packages: Vec<SearchHit>,
    pub iv_therapies: Vec<SearchHit>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty() && self.packages.is_empty() && self.iv_therapies.is_empty()
    }

    pub fn total(&self) -> usize {
        self.tests.len() + self.packages.len() + self.iv_therapies.len()
    }
}

/// Raw service row as it appears in the JSON document. Rows missing a name
/// or price are skipped at load time.
#[derive(Debug, Deserialize)]
struct RawService {
    name: Option<String>,
    price: Option<f64>,
    #[serde(default)]
    turnaround: Option<String>,
    #[serde(default)]
    recommended_for: Vec<String>,
}

/// Top-level structure of the services JSON document
#[derive(Debug, Default, Deserialize)]
struct ServicesDocument {
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    individual_tests: Vec<RawService>,
    #[serde(default)]
    wellness_packages: Vec<RawService>,
    #[serde(default)]
    iv_therapies: Vec<RawService>,
}

/// In-memory service catalog
#[derive(Debug, Clone, Default)]
pub struct ServiceCatalog {
    categories: Vec<String>,
    tests: Vec<ServiceRecord>,
    packages: Vec<ServiceRecord>,
    iv_therapies: Vec<ServiceRecord>,
}

impl ServiceCatalog {
    /// An empty catalog
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the catalog from a JSON file.
    ///
    /// A missing or unparseable file degrades to an empty catalog rather
    /// than aborting startup.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Services configuration not found at {:?}: {}", path, e);
                return Self::empty();
            }
        };

        match Self::from_json(&content) {
            Ok(catalog) => {
                info!(
                    "Loaded service catalog: {} tests, {} packages, {} IV therapies",
                    catalog.tests.len(),
                    catalog.packages.len(),
                    catalog.iv_therapies.len()
                );
                catalog
            }
            Err(e) => {
                warn!("Invalid services configuration at {:?}: {}", path, e);
                Self::empty()
            }
        }
    }

    /// Parse the catalog from a JSON string
    pub fn from_json(content: &str) -> crate::Result<Self> {
        let doc: ServicesDocument = serde_json::from_str(content)?;

        Ok(Self {
            categories: doc.categories,
            tests: collect(doc.individual_tests, ServiceCategory::Test),
            packages: collect(doc.wellness_packages, ServiceCategory::Package),
            iv_therapies: collect(doc.iv_therapies, ServiceCategory::IvTherapy),
        })
    }

    /// Service categories as listed in the document
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Health packages in document order (backs the booking menu)
    pub fn packages(&self) -> &[ServiceRecord] {
        &self.packages
    }

    /// All records across every category
    pub fn all(&self) -> impl Iterator<Item = &ServiceRecord> {
        self.tests
            .iter()
            .chain(self.packages.iter())
            .chain(self.iv_therapies.iter())
    }

    pub fn len(&self) -> usize {
        self.tests.len() + self.packages.len() + self.iv_therapies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fuzzy search across every category.
    ///
    /// Every record whose name scores at least `threshold` against the
    /// query is returned, grouped by category and sorted by descending
    /// score within each group.
    pub fn search(&self, query: &str, threshold: u8) -> SearchResults {
        SearchResults {
            tests: search_group(&self.tests, query, threshold),
            packages: search_group(&self.packages, query, threshold),
            iv_therapies: search_group(&self.iv_therapies, query, threshold),
        }
    }

    /// First record whose name contains `name` case-insensitively,
    /// checking tests, then packages, then IV therapies.
    pub fn find_exact(&self, name: &str) -> Option<&ServiceRecord> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        self.all()
            .find(|record| record.name.to_lowercase().contains(&needle))
    }

    /// Records tagged as recommended for a target group
    pub fn recommended_for(&self, group: &str) -> Vec<&ServiceRecord> {
        self.all()
            .filter(|record| record.recommended_for.iter().any(|g| g == group))
            .collect()
    }
}

fn collect(rows: Vec<RawService>, category: ServiceCategory) -> Vec<ServiceRecord> {
    rows.into_iter()
        .filter_map(|row| {
            let name = row.name?;
            let price = row.price?;
            if name.trim().is_empty() {
                return None;
            }
            Some(ServiceRecord {
                name,
                price,
                category,
                turnaround: row.turnaround,
                recommended_for: row.recommended_for,
            })
        })
        .collect()
}

fn search_group(records: &[ServiceRecord], query: &str, threshold: u8) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = records
        .iter()
        .filter_map(|record| {
            let score = partial_ratio(query, &record.name);
            (score >= threshold).then(|| SearchHit {
                record: record.clone(),
                score,
            })
        })
        .collect();

    hits.sort_by(|a, b| b.score.cmp(&a.score));
    hits
}
