use std::io::Write as _;

use serial_test::serial;

use super::*;

struct EnvGuard {
    key: &'static str,
    prev: Option<String>,
}

impl EnvGuard {
    fn set(key: &'static str, value: &str) -> Self {
        let prev = std::env::var(key).ok();
        unsafe {
            std::env::set_var(key, value);
        }
        Self { key, prev }
    }

    fn unset(key: &'static str) -> Self {
        let prev = std::env::var(key).ok();
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, prev }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match &self.prev {
            Some(value) => unsafe { std::env::set_var(self.key, value) },
            None => unsafe { std::env::remove_var(self.key) },
        }
    }
}

fn fixture_raw() -> RawSettings {
    let mut raw = RawSettings::default();
    raw.cms.fixtures = Some(PathBuf::from("fixtures/blog.json"));
    raw
}

#[test]
fn defaults_are_applied() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(
        settings.server.addr,
        "127.0.0.1:3000".parse::<SocketAddr>().unwrap()
    );
    assert_eq!(settings.server.graceful_shutdown, Duration::from_secs(30));
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert_eq!(settings.cms.dataset, "production");
    assert_eq!(settings.cms.api_version, "2024-01-01");
    assert!(!settings.cms.use_cdn);
    assert_eq!(settings.revalidation.secret, None);
    assert_eq!(
        settings.revalidation.consistency_window,
        Duration::from_millis(3000)
    );
    assert!(settings.cache.enabled);
    assert_eq!(settings.cache.query_limit, 256);
    assert_eq!(settings.client.base_url, "http://127.0.0.1:3000");
    assert_eq!(settings.client.search_debounce, Duration::from_millis(500));
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = fixture_raw();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());
    raw.revalidation.secret = Some("from-file".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        logging: LoggingOverrides {
            log_level: Some("debug".to_string()),
            log_json: Some(true),
        },
        revalidate_secret: Some("from-cli".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert!(matches!(settings.logging.format, LogFormat::Json));
    assert_eq!(settings.revalidation.secret.as_deref(), Some("from-cli"));
}

#[test]
fn blank_secret_is_treated_as_missing() {
    let mut raw = fixture_raw();
    raw.revalidation.secret = Some("   ".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.revalidation.secret, None);
}

#[test]
fn api_version_accepts_leading_v() {
    let mut raw = fixture_raw();
    raw.cms.api_version = Some("v2023-05-03".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.cms.api_version, "2023-05-03");
}

#[test]
fn invalid_values_name_their_key() {
    let cases: [(fn(&mut RawSettings), &str); 6] = [
        (|raw| raw.server.port = Some(0), "server.port"),
        (
            |raw| raw.logging.level = Some("chatty".to_string()),
            "logging.level",
        ),
        (
            |raw| raw.cms.dataset = Some("prod data".to_string()),
            "cms.dataset",
        ),
        (
            |raw| raw.cms.api_version = Some("latest".to_string()),
            "cms.api_version",
        ),
        (|raw| raw.cache.query_limit = Some(0), "cache.query_limit"),
        (
            |raw| raw.client.base_url = Some("ftp://example.com".to_string()),
            "client.base_url",
        ),
    ];

    for (mutate, expected) in cases {
        let mut raw = fixture_raw();
        mutate(&mut raw);
        match Settings::from_raw(raw) {
            Err(LoadError::Invalid { key, .. }) => assert_eq!(key, expected),
            other => panic!("expected invalid `{expected}`, got {other:?}"),
        }
    }
}

#[test]
fn serve_requires_a_cms_backend() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");
    let err = settings.cms.ensure_backend().expect_err("no backend");
    assert!(matches!(err, LoadError::Invalid { key: "cms", .. }));

    let settings = Settings::from_raw(fixture_raw()).expect("valid settings");
    settings.cms.ensure_backend().expect("fixture backend");
}

#[test]
#[serial]
fn default_to_serve_command() {
    let _secret = EnvGuard::unset("SANITY_REVALIDATE_SECRET");

    let args = CliArgs::parse_from(["sitewire"]);
    let command = args.resolved_command().expect("default command");
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_query_arguments() {
    let args = CliArgs::parse_from([
        "sitewire",
        "query",
        "--server",
        "http://localhost:8080",
        "--search",
        "grid",
        "--sort",
        "asc",
    ]);

    match args.command.expect("query command") {
        Command::Query(query) => {
            assert_eq!(query.server.as_deref(), Some("http://localhost:8080"));
            assert_eq!(query.search.as_deref(), Some("grid"));
            assert_eq!(query.category, None);
            assert_eq!(query.sort.as_deref(), Some("asc"));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn query_rejects_unknown_sort() {
    let result = CliArgs::try_parse_from(["sitewire", "query", "--sort", "sideways"]);
    assert!(result.is_err());
}

#[test]
#[serial]
fn environment_overrides_files_and_cli_overrides_environment() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config");
    writeln!(
        file,
        "[server]\nport = 4100\n\n[cms]\nfixtures = \"fixtures/blog.json\"\ndataset = \"staging\"\n"
    )
    .expect("write config");

    let _secret = EnvGuard::unset("SANITY_REVALIDATE_SECRET");
    let _port = EnvGuard::set("SITEWIRE__SERVER__PORT", "4200");
    let _dataset = EnvGuard::set("SITEWIRE__CMS__DATASET", "preview");

    let path = file.path().to_str().expect("utf8 path");
    let cli = CliArgs::parse_from([
        "sitewire",
        "--config-file",
        path,
        "serve",
        "--cms-dataset",
        "live",
    ]);
    let settings = load(&cli).expect("settings");

    assert_eq!(settings.server.addr.port(), 4200);
    assert_eq!(settings.cms.dataset, "live");
    assert_eq!(
        settings.cms.fixtures.as_deref(),
        Some(std::path::Path::new("fixtures/blog.json"))
    );
    assert_eq!(settings.revalidation.secret, None);
}

#[test]
#[serial]
fn revalidate_secret_is_read_from_its_own_variable() {
    let _secret = EnvGuard::set("SANITY_REVALIDATE_SECRET", "s3cret");
    let _fixtures = EnvGuard::set("SITEWIRE__CMS__FIXTURES", "fixtures/blog.json");

    let cli = CliArgs::parse_from(["sitewire", "serve"]);
    let settings = load(&cli).expect("settings");
    assert_eq!(settings.revalidation.secret.as_deref(), Some("s3cret"));
}

#[test]
#[serial]
fn bare_invocation_reads_revalidate_secret_like_serve() {
    let _secret = EnvGuard::set("SANITY_REVALIDATE_SECRET", "s3cret");
    let _fixtures = EnvGuard::set("SITEWIRE__CMS__FIXTURES", "fixtures/blog.json");

    let bare = load(&CliArgs::parse_from(["sitewire"])).expect("bare settings");
    let serve = load(&CliArgs::parse_from(["sitewire", "serve"])).expect("serve settings");
    assert_eq!(bare.revalidation.secret.as_deref(), Some("s3cret"));
    assert_eq!(bare.revalidation.secret, serve.revalidation.secret);
}

#[test]
#[serial]
fn query_command_needs_no_cms_backend() {
    let _fixtures = EnvGuard::unset("SITEWIRE__CMS__FIXTURES");
    let _project = EnvGuard::unset("SITEWIRE__CMS__PROJECT_ID");

    let cli = CliArgs::parse_from(["sitewire", "query", "--server", "http://10.0.0.2:3000"]);
    let settings = load(&cli).expect("settings");
    assert_eq!(settings.client.base_url, "http://10.0.0.2:3000");
}
