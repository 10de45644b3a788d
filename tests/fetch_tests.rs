use author_list::fetch::{
    load_profiles, parse_profile, Checkpoint, FetchArgs, OrcidClient, Profile, ProfileFetchFailed,
    CHECKPOINT_FILE, FAILED_FILE, PROFILES_FILE,
};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ORCID: &str = "0000-0002-1825-0097";
const RECORD: &str = include_str!("fixtures/orcid_record.json");

fn record_json() -> serde_json::Value {
    serde_json::from_str(RECORD).unwrap()
}

fn read_jsonl<T: serde::de::DeserializeOwned>(path: &std::path::Path) -> Vec<T> {
    BufReader::new(File::open(path).unwrap())
        .lines()
        .filter_map(|l| l.ok())
        .filter_map(|l| serde_json::from_str(&l).ok())
        .collect()
}

#[test]
fn test_parse_profile_reads_names_email_and_affiliations() {
    let profile = parse_profile(ORCID, RECORD).unwrap();

    assert_eq!(profile.orcid, ORCID);
    assert_eq!(profile.given_name.as_deref(), Some("josiah"));
    assert_eq!(profile.family_name.as_deref(), Some("CARBERRY"));
    assert_eq!(profile.primary_email.as_deref(), Some("josiah@example.org"));

    assert_eq!(profile.affiliations.len(), 3);
    let brown = &profile.affiliations[0];
    assert_eq!(brown.institution_name, "Brown University");
    assert_eq!(brown.department.as_deref(), Some("Department of   Psychiatry"));
    assert_eq!(brown.disambiguated_id.as_deref(), Some("6752"));
    assert_eq!(brown.disambiguation_source.as_deref(), Some("RINGGOLD"));
    assert!(brown.is_current());

    let wesleyan = &profile.affiliations[1];
    assert_eq!(wesleyan.end_date.as_deref(), Some("2011-08"));
    assert!(!wesleyan.is_current());
    assert_eq!(wesleyan.disambiguated_id, None);

    let broad = &profile.affiliations[2];
    assert_eq!(broad.institution_name, "Broad Institute");
    assert!(broad.is_current());
}

#[test]
fn test_raw_affiliation_to_record_normalizes_and_fills_blanks() {
    let profile = parse_profile(ORCID, RECORD).unwrap();
    let record = profile.affiliations[0].to_record();

    assert_eq!(record.department(), "Department of Psychiatry");
    assert_eq!(record.region(), "RI");

    let broad = profile.affiliations[2].to_record();
    assert_eq!(broad.department(), "");
    assert_eq!(broad.disambiguated_id(), "");
}

#[test]
fn test_parse_profile_sparse_record() {
    let body = r#"{"person": {"name": {"given-names": {"value": "Ada"}, "family-name": null}, "emails": null}, "activities-summary": null}"#;
    let profile = parse_profile(ORCID, body).unwrap();

    assert_eq!(profile.given_name.as_deref(), Some("Ada"));
    assert_eq!(profile.family_name, None);
    assert_eq!(profile.primary_email, None);
    assert!(profile.affiliations.is_empty());
}

#[test]
fn test_parse_profile_ignores_unverified_primary_email() {
    let body = r#"{"person": {"name": null, "emails": {"email": [{"email": "a@b.org", "primary": true, "verified": false}]}}}"#;
    let profile = parse_profile(ORCID, body).unwrap();
    assert_eq!(profile.primary_email, None);
}

#[tokio::test]
async fn test_fetch_profile_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/v3.0/{}/record", ORCID)))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(record_json()))
        .mount(&mock_server)
        .await;

    let client = OrcidClient::new(mock_server.uri(), 30).unwrap();
    let profile = client.fetch_profile(ORCID).await.unwrap();

    let profile = profile.expect("profile should be found");
    assert_eq!(profile.family_name.as_deref(), Some("CARBERRY"));
}

#[tokio::test]
async fn test_fetch_profile_not_found_returns_none() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = OrcidClient::new(mock_server.uri(), 30).unwrap();
    let result = client.fetch_profile("0000-0000-0000-0000").await;

    assert!(result.is_ok());
    assert_eq!(result.unwrap(), None);
}

#[tokio::test]
async fn test_fetch_profile_server_error_is_err() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = OrcidClient::new(mock_server.uri(), 30).unwrap();
    let err = client.fetch_profile(ORCID).await.unwrap_err();

    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn test_fetch_profile_retries_after_rate_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(record_json()))
        .mount(&mock_server)
        .await;

    let client = OrcidClient::new(mock_server.uri(), 30).unwrap();
    let profile = client.fetch_profile(ORCID).await.unwrap();

    assert!(profile.is_some());
}

#[test]
fn test_checkpoint_save_and_load() {
    let temp_dir = TempDir::new().unwrap();
    let checkpoint_path = temp_dir.path().join("test.checkpoint");

    let mut checkpoint = Checkpoint::new(&checkpoint_path);
    checkpoint.mark_processed("0000-0000-0000-0001");
    checkpoint.mark_processed("0000-0000-0000-0002");
    checkpoint.save().unwrap();

    let loaded = Checkpoint::load(&checkpoint_path).unwrap();

    assert_eq!(loaded.len(), 2);
    assert!(loaded.is_processed("0000-0000-0000-0001"));
    assert!(loaded.is_processed("0000-0000-0000-0002"));
    assert!(!loaded.is_processed("0000-0000-0000-0003"));
}

#[test]
fn test_checkpoint_load_nonexistent_returns_empty() {
    let temp_dir = TempDir::new().unwrap();
    let checkpoint = Checkpoint::load(temp_dir.path().join("nonexistent.checkpoint")).unwrap();
    assert!(checkpoint.is_empty());
}

#[test]
fn test_load_profiles_skips_blank_and_bad_lines() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(PROFILES_FILE);
    let profile = parse_profile(ORCID, RECORD).unwrap();
    let content = format!("{}\n\nnot json\n", serde_json::to_string(&profile).unwrap());
    fs::write(&path, content).unwrap();

    let profiles = load_profiles(&path).unwrap();

    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles.get(ORCID), Some(&profile));
}

fn write_contributions(dir: &std::path::Path, orcids: &[&str]) -> std::path::PathBuf {
    let path = dir.join("contributions.tsv");
    let mut content = String::from("name\torcid\tsite\temail\tcontributions\n");
    for orcid in orcids {
        content.push_str(&format!("Someone\t{}\tSite\t\tanalysis, writing\n", orcid));
    }
    fs::write(&path, content).unwrap();
    path
}

fn fetch_args(
    input: std::path::PathBuf,
    output: std::path::PathBuf,
    base_url: String,
    resume: bool,
) -> FetchArgs {
    FetchArgs {
        input,
        output,
        base_url,
        timeout: 5,
        resume,
        orcid_column: 1,
        contributions_column: 4,
    }
}

#[tokio::test]
async fn test_fetch_full_pipeline() {
    let temp_dir = TempDir::new().unwrap();
    let output_dir = temp_dir.path().join("work");
    let missing = "0000-0000-0000-0000";
    let input = write_contributions(temp_dir.path(), &[ORCID, missing]);

    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v3.0/{}/record", ORCID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(record_json()))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v3.0/{}/record", missing)))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    author_list::fetch::run_async(fetch_args(input, output_dir.clone(), mock_server.uri(), false))
        .await
        .unwrap();

    let profiles: Vec<Profile> = read_jsonl(&output_dir.join(PROFILES_FILE));
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].orcid, ORCID);

    let failed: Vec<ProfileFetchFailed> = read_jsonl(&output_dir.join(FAILED_FILE));
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].orcid, missing);

    let checkpoint = Checkpoint::load(output_dir.join(CHECKPOINT_FILE)).unwrap();
    assert!(checkpoint.is_processed(ORCID));
    assert!(checkpoint.is_processed(missing));
}

#[tokio::test]
async fn test_fetch_resume_skips_processed_orcids() {
    let temp_dir = TempDir::new().unwrap();
    let output_dir = temp_dir.path().join("work");
    fs::create_dir_all(&output_dir).unwrap();
    let input = write_contributions(temp_dir.path(), &[ORCID]);

    let mut checkpoint = Checkpoint::new(output_dir.join(CHECKPOINT_FILE));
    checkpoint.mark_processed(ORCID);
    checkpoint.save().unwrap();

    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(record_json()))
        .expect(0)
        .mount(&mock_server)
        .await;

    author_list::fetch::run_async(fetch_args(input, output_dir.clone(), mock_server.uri(), true))
        .await
        .unwrap();

    assert!(!output_dir.join(PROFILES_FILE).exists());
}
