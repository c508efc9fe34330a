//! Enriches leads with scraped LinkedIn data and writes an LLM-generated
//! message for each one.

use super::brightdata::BrightDataClient;
use super::llm::LlmClient;
use crate::core::config::{Config, PersonalizationSettings};
use crate::core::error::{AppError, Result};
use crate::utils::records::{
    export, load_rows, timestamped_filename, write_raw_json, FlatRecord, InputRow, OutputFormat,
};

use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

pub const REQUIRED_PERSONALIZATION_COLUMNS: [&str; 4] =
    ["email", "first_name", "last_name", "profile_url"];

pub const PERSONALIZED_LEAD_COLUMNS: [&str; 9] = [
    "email",
    "first_name",
    "last_name",
    "company",
    "title",
    "custom_field_1",
    "profile_url",
    "company_url",
    "company_about",
];

const ABOUT_PROMPT_CHARS: usize = 600;

/// A lead merged with whatever was scraped about them and their company.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prospect {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub title: String,
    pub about: String,
    pub location: String,
    pub education: String,
    pub profile_url: String,
    pub company_url: String,
    pub company_about: String,
    pub company_industry: String,
    pub company_size: String,
    pub company_website: String,
}

impl Prospect {
    pub fn to_record(&self, message: &str) -> FlatRecord {
        FlatRecord::from_iter([
            ("email", self.email.as_str()),
            ("first_name", self.first_name.as_str()),
            ("last_name", self.last_name.as_str()),
            ("company", self.company.as_str()),
            ("title", self.title.as_str()),
            ("custom_field_1", message),
            ("profile_url", self.profile_url.as_str()),
            ("company_url", self.company_url.as_str()),
            ("company_about", self.company_about.as_str()),
        ])
    }
}

/// Renders a scraped field as text: strings verbatim, null as empty,
/// anything else as compact JSON.
fn value_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// The first non-empty field among `keys`.
fn first_text(record: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .map(|key| value_text(record.get(*key)))
        .find(|text| !text.is_empty())
        .unwrap_or_default()
}

fn or_else(value: String, fallback: impl FnOnce() -> String) -> String {
    if value.is_empty() {
        fallback()
    } else {
        value
    }
}

/// Indexes scraped records by the first non-empty key among `url_keys`.
/// Non-object entries (e.g. scraper error markers) are ignored.
fn index_by_url<'a>(records: &'a [Value], url_keys: &[&str]) -> HashMap<String, &'a Map<String, Value>> {
    records
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|record| {
            let url = first_text(record, url_keys);
            (!url.is_empty()).then_some((url, record))
        })
        .collect()
}

/// Unique non-empty trimmed values of `column`, in first-seen order.
fn unique_column_values(rows: &[InputRow], column: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    rows.iter()
        .map(|row| row.get_trimmed(column))
        .filter(|value| !value.is_empty())
        .filter(|value| seen.insert(value.to_string()))
        .map(str::to_string)
        .collect()
}

/// Joins leads with their scraped profile and company records.
pub fn merge_leads(rows: &[InputRow], profiles: &[Value], companies: &[Value]) -> Vec<Prospect> {
    let profiles_by_url = index_by_url(profiles, &["url", "profile_url", "input_url"]);
    let companies_by_url = index_by_url(companies, &["url", "input_url"]);
    let empty = Map::new();

    let prospects: Vec<Prospect> = rows
        .iter()
        .map(|row| {
            let profile_url = row.get_trimmed("profile_url").to_string();
            let company_url = row.get_trimmed("company_url").to_string();
            let profile = profiles_by_url.get(&profile_url).copied().unwrap_or(&empty);
            let company_rec = companies_by_url.get(&company_url).copied().unwrap_or(&empty);

            let title = or_else(first_text(profile, &["headline"]), || row.get("title").to_string());
            let company = title
                .rsplit_once(" at ")
                .map(|(_, company)| company.trim().to_string())
                .unwrap_or_default();
            let company = or_else(company, || row.get("company").to_string());
            let company = or_else(company, || first_text(company_rec, &["name"]));
            let about = or_else(first_text(profile, &["summary", "about"]), || {
                row.get("about").to_string()
            });

            Prospect {
                email: row.get("email").to_string(),
                first_name: row.get("first_name").to_string(),
                last_name: row.get("last_name").to_string(),
                company,
                title,
                about,
                location: first_text(profile, &["location", "city"]),
                education: first_text(profile, &["educations_details"]),
                profile_url,
                company_url,
                company_about: first_text(company_rec, &["about"]),
                company_industry: first_text(company_rec, &["industries"]),
                company_size: first_text(company_rec, &["company_size"]),
                company_website: first_text(company_rec, &["website"]),
            }
        })
        .collect();

    tracing::info!(target: "lead_task",
        "Merged leads with {} profiles and {} companies.",
        profiles_by_url.len(), companies_by_url.len()
    );
    prospects
}

/// The outreach prompt for one prospect.
pub fn build_prompt(prospect: &Prospect, product_description: &str) -> String {
    let about: String = prospect.about.chars().take(ABOUT_PROMPT_CHARS).collect();
    format!(
        "You are a sales outreach specialist. Craft a concise, highly personalized cold email \
that feels written just for this person. Limit to 140-160 words, avoid fluff, and make one clear CTA.\n\n\
Use the data below thoughtfully, referencing only what is relevant and authentic. If a field is empty, just skip it.\n\
- Name: {first} {last}\n\
- Title: {title}\n\
- Location: {location}\n\
- Education: {education}\n\
- About/Bio: {about}\n\
- Company: {company}\n\
- Company about: {company_about}\n\
- Company industry: {industry}\n\
- Company size: {size}\n\
- Company website: {website}\n\n\
Product: {product}\n\n\
Structure:\n\
1) One-line opener that shows you've actually read their background (title, location, education, or company mission; pick the best hook).\n\
2) One-sentence bridge linking their context to your product's specific value (be concrete: metrics, outcomes, or workflow saved).\n\
3) One short bullet or micro-example that proves the benefit (no jargon; relevant to their audience if applicable).\n\
4) Close with a single, low-friction CTA (e.g., 10-minute intro this week) and offer to share a tailored example.\n\
Keep tone warm, professional, and direct.",
        first = prospect.first_name,
        last = prospect.last_name,
        title = prospect.title,
        location = prospect.location,
        education = prospect.education,
        about = about,
        company = prospect.company,
        company_about = prospect.company_about,
        industry = prospect.company_industry,
        size = prospect.company_size,
        website = prospect.company_website,
        product = product_description,
    )
}

pub struct PersonalizationPipeline {
    config: Config,
    llm: LlmClient,
}

impl PersonalizationPipeline {
    /// Fails early when no LLM key is configured, before any scraping is paid for.
    pub fn new(config: &Config) -> Result<Self> {
        let llm = LlmClient::new(config)?;
        Ok(Self {
            config: config.clone(),
            llm,
        })
    }

    fn settings(&self) -> &PersonalizationSettings {
        &self.config.personalization
    }

    /// Loads leads, enriches them, writes messages and exports `leads_<stamp>`.
    pub async fn run(&self, input: &Path, output_dir: &Path, format: OutputFormat) -> Result<PathBuf> {
        tracing::info!(target: "lead_task", "=== Starting Personalization Pipeline ===");
        std::fs::create_dir_all(output_dir)?;

        let rows = load_rows(input, &REQUIRED_PERSONALIZATION_COLUMNS)?;
        let profiles = self.fetch_profiles(&rows, output_dir).await?;
        let companies = self.fetch_companies(&rows, output_dir).await?;
        let prospects = merge_leads(&rows, &profiles, &companies);
        let records = self.personalize(&prospects).await?;

        let path = export(output_dir, "leads", format, &records, &PERSONALIZED_LEAD_COLUMNS)?;
        tracing::info!(target: "lead_task", "=== Pipeline complete. leads={} ===", records.len());
        Ok(path)
    }

    /// Profiles from the configured local JSON file, or scraped from `profile_url`.
    pub async fn fetch_profiles(&self, rows: &[InputRow], output_dir: &Path) -> Result<Vec<Value>> {
        if let Some(ref local_path) = self.settings().local_profiles_path {
            let path = Path::new(local_path);
            if !path.is_file() {
                return Err(AppError::InputNotFound(path.to_path_buf()));
            }
            let profiles: Vec<Value> = serde_json::from_str(&std::fs::read_to_string(path)?)?;
            tracing::info!(target: "lead_task", "Loaded {} profiles from {}", profiles.len(), path.display());
            return Ok(profiles);
        }

        let profile_urls = unique_column_values(rows, "profile_url");
        if profile_urls.is_empty() {
            return Err(AppError::InsufficientInput(
                "No profile_url values found in the leads file.".to_string(),
            ));
        }

        let client = BrightDataClient::new(&self.config, &self.settings().profile_dataset_id)?;
        let profiles = client.fetch(&profile_urls).await?;
        self.save_raw(output_dir, "enriched_profiles", &profiles)?;
        Ok(profiles)
    }

    /// Company pages, scraped only when the input has a populated `company_url` column.
    pub async fn fetch_companies(&self, rows: &[InputRow], output_dir: &Path) -> Result<Vec<Value>> {
        let company_urls = unique_column_values(rows, "company_url");
        if company_urls.is_empty() {
            return Ok(Vec::new());
        }

        let client = BrightDataClient::new(&self.config, &self.settings().company_dataset_id)?;
        let companies = client.fetch(&company_urls).await?;
        self.save_raw(output_dir, "enriched_companies", &companies)?;
        Ok(companies)
    }

    fn save_raw(&self, output_dir: &Path, prefix: &str, values: &[Value]) -> Result<()> {
        let path = output_dir.join(timestamped_filename(prefix, "json"));
        write_raw_json(&path, values)?;
        tracing::info!(target: "brightdata", "Saved raw Bright Data results to {}", path.display());
        Ok(())
    }

    /// Generates one message per prospect. The first LLM failure aborts the run.
    pub async fn personalize(&self, prospects: &[Prospect]) -> Result<Vec<FlatRecord>> {
        let total = prospects.len();
        let mut records = Vec::with_capacity(total);
        for (idx, prospect) in prospects.iter().enumerate() {
            tracing::info!(target: "llm",
                "Generating message {}/{} for {} {} ({})",
                idx + 1, total, prospect.first_name, prospect.last_name, self.llm.model()
            );
            let prompt = build_prompt(prospect, &self.settings().product_description);
            let message = self.llm.complete(&prompt).await.inspect_err(|e| {
                tracing::error!(target: "llm", "Failed to generate message for {}: {}", prospect.email, e)
            })?;
            records.push(prospect.to_record(&message));
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SecretString;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn row(index: usize, fields: &[(&str, &str)]) -> InputRow {
        InputRow {
            index,
            fields: fields.iter().copied().collect(),
        }
    }

    #[test]
    fn test_merge_uses_headline_company_and_profile_fields() {
        let rows = vec![row(0, &[
            ("email", "jane@acme.com"),
            ("first_name", "Jane"),
            ("last_name", "Doe"),
            ("profile_url", " https://linkedin.com/in/jane "),
            ("company", "Old Corp"),
        ])];
        let profiles = vec![
            json!("error marker"),
            json!({
                "input_url": "https://linkedin.com/in/jane",
                "headline": "VP Sales at Widgets at Acme",
                "about": "Builds teams.",
                "city": "Berlin",
                "educations_details": ["TU Berlin", "MBA"]
            }),
        ];

        let prospects = merge_leads(&rows, &profiles, &[]);

        let p = &prospects[0];
        assert_eq!(p.title, "VP Sales at Widgets at Acme");
        assert_eq!(p.company, "Acme");
        assert_eq!(p.about, "Builds teams.");
        assert_eq!(p.location, "Berlin");
        assert_eq!(p.education, r#"["TU Berlin","MBA"]"#);
        assert_eq!(p.profile_url, "https://linkedin.com/in/jane");
    }

    #[test]
    fn test_merge_falls_back_to_lead_then_company_record() {
        let rows = vec![
            row(0, &[
                ("profile_url", "https://linkedin.com/in/a"),
                ("title", "Engineer"),
                ("company", "LeadCo"),
                ("about", "From CSV"),
                ("company_url", "https://linkedin.com/company/x"),
            ]),
            row(1, &[
                ("profile_url", "https://linkedin.com/in/b"),
                ("company_url", "https://linkedin.com/company/x"),
            ]),
        ];
        let companies = vec![json!({
            "url": "https://linkedin.com/company/x",
            "name": "X Inc",
            "about": "We make X.",
            "industries": "Software",
            "company_size": "51-200",
            "website": "https://x.io"
        })];

        let prospects = merge_leads(&rows, &[], &companies);

        assert_eq!(prospects[0].title, "Engineer");
        assert_eq!(prospects[0].company, "LeadCo");
        assert_eq!(prospects[0].about, "From CSV");
        assert_eq!(prospects[0].company_about, "We make X.");
        assert_eq!(prospects[1].company, "X Inc");
        assert_eq!(prospects[1].company_size, "51-200");
        assert_eq!(prospects[1].company_website, "https://x.io");
        assert_eq!(prospects[1].title, "");
    }

    #[test]
    fn test_prompt_truncates_about_and_includes_product() {
        let prospect = Prospect {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            about: "é".repeat(700),
            ..Prospect::default()
        };
        let prompt = build_prompt(&prospect, "Acme CRM");

        assert!(prompt.contains("- Name: Jane Doe\n"));
        assert!(prompt.contains(&format!("- About/Bio: {}\n", "é".repeat(600))));
        assert!(!prompt.contains(&"é".repeat(601)));
        assert!(prompt.contains("Product: Acme CRM\n"));
    }

    #[test]
    fn test_record_has_exact_output_columns() {
        let prospect = Prospect {
            email: "jane@acme.com".into(),
            about: "not exported".into(),
            ..Prospect::default()
        };
        let record = prospect.to_record("Hello Jane");
        assert_eq!(record.columns().collect::<Vec<_>>(), PERSONALIZED_LEAD_COLUMNS.to_vec());
        assert_eq!(record.get("custom_field_1"), Some("Hello Jane"));
    }

    #[test]
    fn test_new_requires_llm_key() {
        assert!(matches!(
            PersonalizationPipeline::new(&Config::default()),
            Err(AppError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_run_with_local_profiles() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "Hi Jane, quick idea for Acme." } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("leads.csv");
        std::fs::write(
            &input,
            "email,first_name,last_name,profile_url\njane@acme.com,Jane,Doe,https://linkedin.com/in/jane\n",
        )
        .unwrap();
        let profiles = dir.path().join("profiles.json");
        std::fs::write(
            &profiles,
            json!([{ "url": "https://linkedin.com/in/jane", "headline": "CTO at Acme" }]).to_string(),
        )
        .unwrap();

        let mut config = Config::default();
        config.personalization.openai_api_key = SecretString::new("sk-test");
        config.personalization.openai_api_url = server.uri();
        config.personalization.local_profiles_path = Some(profiles.to_string_lossy().into_owned());

        let output_dir = dir.path().join("out");
        let pipeline = PersonalizationPipeline::new(&config).unwrap();
        let path = pipeline.run(&input, &output_dir, OutputFormat::Csv).await.unwrap();

        let written = std::fs::read_to_string(path).unwrap();
        let mut lines = written.lines();
        assert_eq!(
            lines.next(),
            Some("email,first_name,last_name,company,title,custom_field_1,profile_url,company_url,company_about")
        );
        assert_eq!(
            lines.next(),
            Some("jane@acme.com,Jane,Doe,Acme,CTO at Acme,\"Hi Jane, quick idea for Acme.\",https://linkedin.com/in/jane,,")
        );
    }

    #[tokio::test]
    async fn test_missing_local_profiles_file_is_fatal() {
        let mut config = Config::default();
        config.personalization.openai_api_key = SecretString::new("sk-test");
        config.personalization.local_profiles_path = Some("/no/such/profiles.json".into());
        let pipeline = PersonalizationPipeline::new(&config).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let err = pipeline.fetch_profiles(&[], dir.path()).await.unwrap_err();
        assert!(matches!(err, AppError::InputNotFound(_)));
    }

    #[tokio::test]
    async fn test_no_profile_urls_is_fatal() {
        let mut config = Config::default();
        config.personalization.openai_api_key = SecretString::new("sk-test");
        config.personalization.brightdata_api_key = SecretString::new("bd");
        let pipeline = PersonalizationPipeline::new(&config).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let rows = vec![row(0, &[("profile_url", "  ")])];
        let err = pipeline.fetch_profiles(&rows, dir.path()).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientInput(_)));
    }
}
