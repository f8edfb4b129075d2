use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub company: Company,
    pub pdf: PdfSettings,
}

/// Company identity printed in the page header and footer of every
/// generated report.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Company {
    pub name: String,
    /// Address/contact line for the page footer.
    pub address: String,
    /// Optional logo image path for the page header.
    #[serde(default)]
    pub logo: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PdfSettings {
    pub output_dir: String,
    #[serde(default = "default_paper")]
    pub paper: String,
}

fn default_paper() -> String {
    "a4".to_string()
}
