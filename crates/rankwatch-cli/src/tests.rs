use std::path::PathBuf;

use rankwatch_core::{KeywordSnapshot, Language, TrackedKeyword, TrackedKeywordsFile};

use super::*;
use crate::keywords::group_ranked;
use crate::keywords::query::{fmt_average, fmt_position};

#[test]
fn parses_db_ping_command() {
    let cli =
        Cli::try_parse_from(["rankwatch-cli", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli =
        Cli::try_parse_from(["rankwatch-cli", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["rankwatch-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_keywords_import_with_file() {
    let cli = Cli::try_parse_from(["rankwatch-cli", "keywords", "import", "rankings.json"])
        .expect("expected valid cli args");

    match cli.command {
        Some(Commands::Keywords {
            command: KeywordsCommands::Import { file, dry_run },
        }) => {
            assert_eq!(file, PathBuf::from("rankings.json"));
            assert!(!dry_run);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn keywords_import_requires_file() {
    let result = Cli::try_parse_from(["rankwatch-cli", "keywords", "import"]);
    assert!(result.is_err());
}

#[test]
fn parses_keywords_update_dry_run() {
    let cli = Cli::try_parse_from(["rankwatch-cli", "keywords", "update", "--dry-run"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Keywords {
            command: KeywordsCommands::Update { dry_run: true }
        })
    ));
}

#[test]
fn keywords_list_defaults_to_all_languages() {
    let cli = Cli::try_parse_from(["rankwatch-cli", "keywords", "list"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Keywords {
            command: KeywordsCommands::List { language: None }
        })
    ));
}

#[test]
fn keywords_list_parses_language_case_insensitively() {
    let cli =
        Cli::try_parse_from(["rankwatch-cli", "keywords", "list", "--language", "ES"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Keywords {
            command: KeywordsCommands::List {
                language: Some(Language::Es)
            }
        })
    ));
}

#[test]
fn keywords_list_rejects_unknown_language() {
    let result = Cli::try_parse_from(["rankwatch-cli", "keywords", "list", "--language", "pt"]);
    assert!(result.is_err());
}

#[test]
fn keywords_report_requires_language() {
    assert!(Cli::try_parse_from(["rankwatch-cli", "keywords", "report"]).is_err());

    let cli =
        Cli::try_parse_from(["rankwatch-cli", "keywords", "report", "--language", "zh"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Keywords {
            command: KeywordsCommands::Report {
                language: Language::Zh
            }
        })
    ));
}

#[test]
fn keywords_alerts_defaults_to_preview() {
    let cli = Cli::try_parse_from(["rankwatch-cli", "keywords", "alerts"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Keywords {
            command: KeywordsCommands::Alerts {
                threshold: None,
                send: false
            }
        })
    ));
}

#[test]
fn keywords_alerts_with_threshold_and_send() {
    let cli = Cli::try_parse_from([
        "rankwatch-cli",
        "keywords",
        "alerts",
        "--threshold",
        "5",
        "--send",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Keywords {
            command: KeywordsCommands::Alerts {
                threshold: Some(5),
                send: true
            }
        })
    ));
}

#[test]
fn keywords_history_defaults_to_thirty_days() {
    let cli = Cli::try_parse_from([
        "rankwatch-cli",
        "keywords",
        "history",
        "--keyword",
        "sniper bot",
        "--language",
        "en",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Keywords {
            command: KeywordsCommands::History {
                ref keyword,
                language: Language::En,
                days: 30
            }
        }) if keyword == "sniper bot"
    ));
}

#[test]
fn keywords_history_rejects_days_outside_range() {
    for days in ["0", "366"] {
        let result = Cli::try_parse_from([
            "rankwatch-cli",
            "keywords",
            "history",
            "--keyword",
            "sniper bot",
            "--language",
            "en",
            "--days",
            days,
        ]);
        assert!(result.is_err(), "days {days} should be rejected");
    }
}

#[test]
fn keywords_history_requires_keyword() {
    let result = Cli::try_parse_from(["rankwatch-cli", "keywords", "history", "--language", "en"]);
    assert!(result.is_err());
}

#[test]
fn fmt_position_renders_dash_for_missing_value() {
    assert_eq!(fmt_position(Some(7)), "7");
    assert_eq!(fmt_position(None), "\u{2014}");
}

#[test]
fn fmt_average_uses_one_decimal() {
    assert_eq!(fmt_average(Some(8.5)), "8.5");
    assert_eq!(fmt_average(Some(4.0)), "4.0");
    assert_eq!(fmt_average(None), "\u{2014}");
}

#[test]
fn group_ranked_counts_tracked_keywords_per_language() {
    let tracked = TrackedKeywordsFile {
        keywords: [
            ("sniper bot", Language::En),
            ("trading bot", Language::En),
            ("krypto bot", Language::De),
        ]
        .into_iter()
        .map(|(keyword, language)| TrackedKeyword {
            keyword: keyword.to_string(),
            language,
            url: format!("https://example.com/{}", language.code()),
        })
        .collect(),
    };
    let snapshots = vec![KeywordSnapshot::new(
        "sniper bot",
        Language::En,
        4,
        "https://example.com/en",
    )];

    let groups = group_ranked(&tracked, &snapshots);
    assert_eq!(groups.len(), 2);
    let (language, tracked_count, ranked) = &groups[0];
    assert_eq!(*language, Language::De);
    assert_eq!(*tracked_count, 1);
    assert!(ranked.is_empty());
    let (language, tracked_count, ranked) = &groups[1];
    assert_eq!(*language, Language::En);
    assert_eq!(*tracked_count, 2);
    assert_eq!(ranked[0].position, 4);
}
