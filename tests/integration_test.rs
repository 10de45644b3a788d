use author_list::build::BuildArgs;
use author_list::fetch::FetchArgs;
use author_list::render::{AuthorListDocument, OutputFormat};
use author_list::Tier;
use std::fs::{self, File};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn orcid_record(
    given: &str,
    family: &str,
    institutions: &[(&str, Option<&str>)],
) -> serde_json::Value {
    let groups: Vec<serde_json::Value> = institutions
        .iter()
        .map(|(name, end_year)| {
            serde_json::json!({
                "summaries": [{
                    "employment-summary": {
                        "department-name": null,
                        "end-date": end_year.map(|y| serde_json::json!({"year": {"value": y}})),
                        "organization": {
                            "name": name,
                            "address": {"city": null, "region": null, "country": "US"}
                        }
                    }
                }]
            })
        })
        .collect();

    serde_json::json!({
        "person": {
            "name": {"given-names": {"value": given}, "family-name": {"value": family}},
            "emails": {"email": []}
        },
        "activities-summary": {"employments": {"affiliation-group": groups}}
    })
}

#[tokio::test]
async fn test_full_pipeline_fetch_build() {
    let temp_dir = TempDir::new().unwrap();
    let work_dir = temp_dir.path().join("work");

    let contributions = temp_dir.path().join("contributions.tsv");
    fs::write(
        &contributions,
        "name\torcid\tsite\temail\tcontributions\n\
         Z\t0000-0000-0000-0001\tx\t\tanalysis\n\
         A\t0000-0000-0000-0002\tx\t\tanalysis\n\
         B\t0000-0000-0000-0003\tx\t\tPI\n\
         R\t0000-0000-0000-0004\tx\t\tanalysis\n\
         N\t0000-0000-0000-0005\tx\t\tanalysis\n",
    )
    .unwrap();

    let mock_server = MockServer::start().await;
    let records = [
        ("0000-0000-0000-0001", orcid_record("zed", "zale", &[("Inst-B", None), ("Inst-C", None)])),
        ("0000-0000-0000-0002", orcid_record("ann", "adams", &[("Inst-A", None), ("Inst-B", None)])),
        ("0000-0000-0000-0003", orcid_record("bea", "brook", &[("Inst-D", None)])),
        ("0000-0000-0000-0004", orcid_record("stephan", "ripke", &[("Inst-C", None)])),
        ("0000-0000-0000-0005", orcid_record("no", "current", &[("Inst-Old", Some("2009"))])),
    ];
    for (orcid, record) in &records {
        Mock::given(method("GET"))
            .and(path(format!("/v3.0/{}/record", orcid)))
            .respond_with(ResponseTemplate::new(200).set_body_json(record))
            .mount(&mock_server)
            .await;
    }

    // Step 1: Fetch
    let fetch_args = FetchArgs {
        input: contributions.clone(),
        output: work_dir.clone(),
        base_url: mock_server.uri(),
        timeout: 5,
        resume: false,
        orcid_column: 1,
        contributions_column: 4,
    };
    author_list::fetch::run_async(fetch_args).await.unwrap();

    // Step 2: Build
    let roster = temp_dir.path().join("roster.json");
    fs::write(&roster, r#"{"lead_author": "Stephan Ripke"}"#).unwrap();
    let output = temp_dir.path().join("authors.json");

    let build_args = BuildArgs {
        input: work_dir,
        contributions,
        roster,
        canonical: None,
        output: output.clone(),
        format: OutputFormat::Json,
        orcid_column: 1,
        contributions_column: 4,
    };
    author_list::build::run(build_args).unwrap();

    let document: AuthorListDocument =
        serde_json::from_reader(File::open(&output).unwrap()).unwrap();

    let names: Vec<&str> = document.authors.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["Stephan Ripke", "Ann Adams", "Zed Zale", "Bea Brook"]);
    assert_eq!(document.authors[0].tier, Tier::Lead);
    assert_eq!(document.authors[3].tier, Tier::PrincipalInvestigator);

    let institutions: Vec<&str> = document
        .affiliations
        .iter()
        .map(|a| a.affiliation.institution_name())
        .collect();
    assert_eq!(institutions, vec!["Inst-C", "Inst-A", "Inst-B", "Inst-D"]);

    let counts: Vec<usize> = document.affiliations.iter().map(|a| a.count).collect();
    assert_eq!(counts, vec![2, 1, 2, 1]);

    assert_eq!(document.authors[1].affiliation_indices, vec![2, 3]);
    assert_eq!(document.authors[2].affiliation_indices, vec![1, 3]);
}
