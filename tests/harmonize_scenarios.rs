use fair_harness::config::{parse_config, Config, TermMap};
use fair_harness::error::Error;
use fair_harness::gather::{gatherer_for_profile, DefaultGatherer};
use fair_harness::harmonize::{Harmonizer, Resolution};
use fair_harness::i18n::Localizer;
use fair_harness::models::{FieldRef, HarmonizedValue, MetadataRow, MetadataTable};
use fair_harness::validate::Validator;
use fair_harness::vocabulary::VocabularyRegistry;

const SPDX_LIST: &str = r#"{"licenses": [
    {"licenseId": "CC-BY-4.0", "reference": "https://spdx.org/licenses/CC-BY-4.0.html",
     "detailsUrl": "https://spdx.org/licenses/CC-BY-4.0.json", "isDeprecatedLicenseId": false}
]}"#;

fn row(element: &str, qualifier: Option<&str>, value: &str) -> MetadataRow {
    MetadataRow::new("dc", element, qualifier, value)
}

fn table(rows: Vec<MetadataRow>) -> MetadataTable {
    rows.into_iter().collect()
}

fn config(term_id: &str, terms: &[&str], map: TermMap) -> Config {
    let mut config = Config::minimal();
    config.plugin.term_lists.insert(
        term_id.to_string(),
        terms.iter().map(|t| t.to_string()).collect(),
    );
    config.plugin.terms_map = map;
    config
}

fn values(raw: &[&str]) -> Vec<HarmonizedValue> {
    raw.iter().map(|v| HarmonizedValue::from(*v)).collect()
}

// ─── Resolution ─────────────────────────────────────────────────────────

#[test]
fn test_single_identifier_resolves_fully() {
    let config = config(
        "identifier_term",
        &["Metadata Identifier"],
        TermMap::new().with("Metadata Identifier", vec![FieldRef::element("identifier")]),
    );
    let metadata = table(vec![row("identifier", None, "10.1234/abc")]);
    let localizer = Localizer::default();
    let harmonizer = Harmonizer::new(&config, &metadata, &DefaultGatherer, &localizer);

    let payload = harmonizer
        .resolve("identifier_term", false)
        .unwrap()
        .into_payload()
        .unwrap();
    assert_eq!(payload.points, 100.0);
    assert_eq!(payload.values("Metadata Identifier"), values(&["10.1234/abc"]).as_slice());
    assert!(payload.get("Metadata Identifier").unwrap().validation.is_none());

    let json = serde_json::to_value(&payload).unwrap();
    assert_eq!(json["Metadata Identifier"], serde_json::json!(["10.1234/abc"]));
    assert_eq!(json["points"], 100.0);
}

#[test]
fn test_missing_term_map_entry_is_not_defined() {
    let config = config("terms_access", &["Metadata for accesibility"], TermMap::new());
    let metadata = table(vec![row("rights", None, "open")]);
    let localizer = Localizer::default();
    let harmonizer = Harmonizer::new(&config, &metadata, &DefaultGatherer, &localizer);

    let resolution = harmonizer.resolve("terms_access", false).unwrap();
    assert!(!resolution.is_resolved());
    let zero = resolution.into_payload().unwrap_err();
    assert_eq!(zero.points, 0.0);
    assert!(zero.message.to_text().contains("not defined in configuration"));
}

#[test]
fn test_absent_field_contributes_nothing() {
    let config = config(
        "terms_cv",
        &["Keywords"],
        TermMap::new().with(
            "Keywords",
            vec![
                FieldRef::qualified("subject", "keyword"),
                FieldRef::element("subject"),
            ],
        ),
    );
    let metadata = table(vec![row("subject", None, "soil"), row("subject", None, "water")]);
    let localizer = Localizer::default();
    let harmonizer = Harmonizer::new(&config, &metadata, &DefaultGatherer, &localizer);

    let payload = harmonizer.resolve("terms_cv", false).unwrap().into_payload().unwrap();
    assert_eq!(payload.values("Keywords"), values(&["soil", "water"]).as_slice());
}

#[test]
fn test_no_rows_for_any_term_is_unavailable() {
    let config = config(
        "terms_license",
        &["License"],
        TermMap::new().with("License", vec![FieldRef::element("rights")]),
    );
    let metadata = table(vec![row("title", None, "A dataset")]);
    let localizer = Localizer::default();
    let harmonizer = Harmonizer::new(&config, &metadata, &DefaultGatherer, &localizer);

    match harmonizer.resolve("terms_license", false).unwrap() {
        Resolution::Unavailable { message } => {
            assert!(message.contains("No metadata can be found for: License"));
            assert!(message.contains("'terms_license'"));
        }
        other => panic!("expected no metadata, got {:?}", other),
    }
}

#[test]
fn test_score_never_decreases_as_rows_are_added() {
    let map = TermMap::new()
        .with("Keywords", vec![FieldRef::element("subject")])
        .with("Format", vec![FieldRef::element("format")])
        .with("License", vec![FieldRef::element("rights")]);
    let config = config("terms", &["Keywords", "Format", "License"], map);
    let localizer = Localizer::default();

    let all_rows = vec![
        row("subject", None, "soil"),
        row("format", None, "text/csv"),
        row("rights", None, "MIT"),
    ];
    let mut previous = 0.0;
    for n in 1..=all_rows.len() {
        let metadata = table(all_rows[..n].to_vec());
        let harmonizer = Harmonizer::new(&config, &metadata, &DefaultGatherer, &localizer);
        let points = match harmonizer.resolve("terms", false).unwrap() {
            Resolution::Resolved(payload) => payload.points,
            Resolution::Unavailable { .. } => 0.0,
        };
        assert!(points >= previous, "{} < {} with {} rows", points, previous, n);
        assert!((0.0..=100.0).contains(&points));
        previous = points;
    }
    assert_eq!(previous, 100.0);
}

#[test]
fn test_bracketed_profile_unwraps_person_identifiers() {
    let config = config(
        "terms",
        &["Person Identifier"],
        TermMap::new().with("Person Identifier", vec![FieldRef::element("creator")]),
    );
    let metadata = table(vec![row("creator", None, "Carberry, Josiah [0000-0002-1825-0097]")]);
    let localizer = Localizer::default();
    let gatherer = gatherer_for_profile("bracketed");
    let harmonizer = Harmonizer::new(&config, &metadata, gatherer.as_ref(), &localizer);

    let payload = harmonizer.resolve("terms", false).unwrap().into_payload().unwrap();
    assert_eq!(
        payload.values("Person Identifier"),
        values(&["0000-0002-1825-0097"]).as_slice()
    );
}

#[test]
fn test_unparseable_spatial_coverage_is_a_fault() {
    let config = config(
        "terms",
        &["Spatial Coverage"],
        TermMap::new().with("Spatial Coverage", vec![FieldRef::element("coverage")]),
    );
    let metadata = table(vec![row("coverage", None, "Iberian Peninsula")]);
    let localizer = Localizer::default();
    let harmonizer = Harmonizer::new(&config, &metadata, &DefaultGatherer, &localizer);

    assert!(matches!(
        harmonizer.resolve("terms", false),
        Err(Error::Homogenization { .. })
    ));
}

// ─── Validation ─────────────────────────────────────────────────────────

#[test]
fn test_spdx_license_url_is_valid() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("licenses.json"), SPDX_LIST).unwrap();
    let config = parse_config(&format!(
        r#"
[plugin]
name = "test"

[plugin.term_lists]
terms_license = ["License"]

[[plugin.terms_map]]
term = "License"
fields = ["rights"]

[controlled_vocabularies.License]
spdx = "https://spdx.org/licenses/licenses.json"

[cache]
root = "{}"

[vocabularies.spdx]
enable_remote_check = false
local_path = "licenses.json"
"#,
        dir.path().display()
    ))
    .unwrap();
    let metadata = table(vec![row(
        "rights",
        None,
        "https://spdx.org/licenses/CC-BY-4.0.html",
    )]);
    let registry = VocabularyRegistry::from_config(&config).unwrap();
    let validator = Validator::new(&config, &registry);
    let localizer = Localizer::default();
    let harmonizer = Harmonizer::new(&config, &metadata, &DefaultGatherer, &localizer)
        .with_validator(&validator);

    let payload = harmonizer
        .resolve("terms_license", true)
        .unwrap()
        .into_payload()
        .unwrap();
    let validation = payload.get("License").unwrap().validation.as_ref().unwrap();
    assert_eq!(
        validation["spdx"].valid,
        values(&["https://spdx.org/licenses/CC-BY-4.0.html"])
    );
    assert!(validation["spdx"].non_valid.is_empty());
}

#[test]
fn test_malformed_orcid_is_non_valid() {
    let config = parse_config(
        r#"
[plugin]
name = "test"

[plugin.term_lists]
terms_cv = ["Person Identifier"]

[[plugin.terms_map]]
term = "Person Identifier"
fields = ["creator"]

[controlled_vocabularies."Person Identifier"]
orcid = "https://orcid.org"

[vocabularies.orcid]
remote_path = "https://orcid.org"
enable_remote_check = false
"#,
    )
    .unwrap();
    let metadata = table(vec![row("creator", None, "not-an-orcid")]);
    let registry = VocabularyRegistry::from_config(&config).unwrap();
    let validator = Validator::new(&config, &registry);
    let localizer = Localizer::default();
    let harmonizer = Harmonizer::new(&config, &metadata, &DefaultGatherer, &localizer)
        .with_validator(&validator);

    let payload = harmonizer.resolve("terms_cv", true).unwrap().into_payload().unwrap();
    let validation = payload
        .get("Person Identifier")
        .unwrap()
        .validation
        .as_ref()
        .unwrap();
    assert!(validation["orcid"].valid.is_empty());
    assert_eq!(validation["orcid"].non_valid, values(&["not-an-orcid"]));
}
