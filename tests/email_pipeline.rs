use lead_sleuth_core::{
    export, initialize_sleuth, load_leads, process_leads, ConfigBuilder, FlatRecord, LeadOutcome,
    OutputFormat, EXPORT_PRIORITY_COLUMNS,
};
use serde_json::json;
use std::fs;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn reacher_stub() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v0/check_email"))
        .and(body_json(json!({ "to_email": "john.smith@acme.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "is_reachable": "safe",
            "misc": { "is_disposable": false, "is_role_account": false },
            "mx": { "records": ["mx.acme.com."] },
            "smtp": { "is_deliverable": true }
        })))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v0/check_email"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "is_reachable": "invalid",
            "smtp": { "is_deliverable": false }
        })))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_csv_leads_are_searched_and_exported() {
    let server = reacher_stub().await;
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("leads.csv");
    fs::write(
        &input,
        "first_name,last_name,company_domain,title\n\
         John,Smith,https://www.acme.com/about,CTO\n\
         Jane,,acme.com,CEO\n\
         Ann,Lee,lee.io,VP\n",
    )
    .unwrap();

    let config = ConfigBuilder::new()
        .skip_default_locations()
        .reacher_api_url(server.uri())
        .max_patterns_per_lead(3)
        .validation_delay_seconds(0.0)
        .build()
        .unwrap();
    let sleuth = initialize_sleuth(&config).unwrap();

    let leads = load_leads(&input).unwrap();
    assert_eq!(leads.len(), 3);

    let mut progress = Vec::new();
    let outcomes = process_leads(&sleuth, leads, |done| progress.push(done)).await;
    assert_eq!(progress, vec![1, 2, 3]);

    let john = outcomes[0].enriched().unwrap();
    assert_eq!(john.validated_email(), Some("john.smith@acme.com"));
    assert_eq!(john.lead.domain, "acme.com");
    assert_eq!(john.outcome.validation_status(), "safe");
    assert_eq!(john.outcome.patterns_tested, 2);
    assert_eq!(john.outcome.patterns_hit, 1);

    match &outcomes[1] {
        LeadOutcome::Skipped { lead, reason } => {
            assert_eq!(lead.first_name, "Jane");
            assert_eq!(reason, "Missing last name");
        }
        other => panic!("expected a skipped lead, got {:?}", other),
    }

    let ann = outcomes[2].enriched().unwrap();
    assert_eq!(ann.validated_email(), None);
    assert_eq!(ann.outcome.validation_status(), "none_found");
    assert!(ann.outcome.patterns_tested > 0);
    assert_eq!(ann.outcome.patterns_hit, 0);

    let records: Vec<FlatRecord> = outcomes
        .iter()
        .filter_map(LeadOutcome::enriched)
        .map(|enriched| enriched.to_record())
        .collect();
    let output_dir = dir.path().join("output");
    let written = export(
        &output_dir,
        "validated_emails",
        OutputFormat::Csv,
        &records,
        &EXPORT_PRIORITY_COLUMNS,
    )
    .unwrap();

    let mut reader = csv::Reader::from_path(&written).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    let mut expected: Vec<String> = EXPORT_PRIORITY_COLUMNS.iter().map(|c| c.to_string()).collect();
    expected.push("mx_records".into());
    expected.push("title".into());
    assert_eq!(headers, expected);

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][3], "john.smith@acme.com");
    assert_eq!(&rows[0][11], "mx.acme.com.");
    assert_eq!(&rows[0][12], "CTO");
    assert_eq!(&rows[1][4], "none_found");
}

#[tokio::test]
async fn test_missing_required_columns_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("leads.csv");
    fs::write(&input, "first_name,company\nJohn,Acme\n").unwrap();

    let err = load_leads(&input).unwrap_err().to_string();
    assert!(err.contains("last_name"), "unexpected error: {}", err);
    assert!(err.contains("company_domain"), "unexpected error: {}", err);
}
