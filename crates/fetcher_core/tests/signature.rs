use fetcher_core::{TypeSignatures, DEFAULT_EXTENSIONS};
use pretty_assertions::assert_eq;

#[test]
fn matches_known_extensions_case_insensitively() {
    let signatures = TypeSignatures::default();

    assert!(signatures.matches("https://example.com/a.pdf"));
    assert!(signatures.matches("https://example.com/c.SQL"));
    assert!(signatures.matches("https://example.com/backup/site.TAR.GZ"));
    assert!(signatures.matches("http://files.example.com/keys/id_rsa.pub"));
    assert!(!signatures.matches("https://example.com/b.html"));
    assert!(!signatures.matches("https://example.com/"));
}

#[test]
fn ignores_query_and_fragment() {
    let signatures = TypeSignatures::default();

    assert!(signatures.matches("https://example.com/report.xlsx?version=2#sheet1"));
    assert!(!signatures.matches("https://example.com/index.php?file=dump.sql"));
    assert!(!signatures.matches("https://example.com/page#notes.txt"));
}

#[test]
fn extension_must_end_the_path() {
    let signatures = TypeSignatures::default();

    assert!(!signatures.matches("https://example.com/data.json/view"));
    assert!(!signatures.matches("https://example.com/archive.zipper"));
}

#[test]
fn handles_urls_without_scheme() {
    let signatures = TypeSignatures::default();

    assert!(signatures.matches("example.com/dump.sql"));
    assert!(signatures.matches("example.com/dump.sql?dl=1"));
    assert!(!signatures.matches("example.com/about"));
    assert!(!signatures.matches(""));
}

#[test]
fn bare_host_has_no_path_to_match() {
    let signatures = TypeSignatures::default();

    assert!(!signatures.matches("backup.example.sh"));
    assert!(!signatures.matches("files.example.zip?x=1"));
    assert!(signatures.matches("backup.example.sh/run.sh"));
    assert!(signatures.matches("/exports/dump.sql"));
}

#[test]
fn filter_preserves_order() {
    let signatures = TypeSignatures::default();
    let urls = vec![
        "https://example.com/a.pdf",
        "https://example.com/b.html",
        "https://example.com/c.SQL",
    ];

    assert_eq!(
        signatures.filter(urls),
        vec![
            "https://example.com/a.pdf".to_string(),
            "https://example.com/c.SQL".to_string(),
        ]
    );
}

#[test]
fn filter_is_idempotent() {
    let signatures = TypeSignatures::default();
    let urls = vec![
        "https://example.com/x.csv".to_string(),
        "https://example.com/y".to_string(),
        "not a url at all".to_string(),
        "https://example.com/z.Key".to_string(),
        "https://example.com/w.png".to_string(),
    ];

    let once = signatures.filter(urls);
    let twice = signatures.filter(once.clone());
    assert_eq!(once, twice);
    assert_eq!(once.len(), 2);
}

#[test]
fn custom_set_normalizes_entries() {
    let signatures = TypeSignatures::new([".PDF", "  env ", "", "pdf", ".env"]);

    assert_eq!(signatures.extensions().collect::<Vec<_>>(), vec!["pdf", "env"]);
    assert!(signatures.matches("https://example.com/.env"));
    assert!(!signatures.matches("https://example.com/a.sql"));
}

#[test]
fn empty_set_matches_nothing() {
    let signatures = TypeSignatures::new(Vec::<String>::new());

    assert!(signatures.is_empty());
    assert!(!signatures.matches("https://example.com/a.pdf"));
}

#[test]
fn default_set_covers_every_listed_extension() {
    let signatures = TypeSignatures::default();

    for ext in DEFAULT_EXTENSIONS {
        let url = format!("https://example.com/file.{}", ext.to_uppercase());
        assert!(signatures.matches(&url), "{url} should match");
    }
}
